/// Relative weight of each dimension in the composite total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionWeights {
    pub quality: f64,
    pub consistency: f64,
    pub speed: f64,
    pub volume: f64,
}

pub const WEIGHTS: DimensionWeights = DimensionWeights {
    quality: 0.40,
    consistency: 0.30,
    speed: 0.20,
    volume: 0.10,
};

pub const BASE_SCORE: f64 = 100.0;

pub const REJECTION_PENALTY: f64 = 15.0;
pub const FAILED_INSPECTION_PENALTY: f64 = 10.0;

/// Total deducted from consistency when every recurring ticket was skipped.
pub const SKIP_PENALTY_POOL: f64 = 50.0;
pub const PERFECT_STREAK_BONUS: f64 = 10.0;

pub const SPEED_PENALTY_PER_HOUR: f64 = 5.0;
pub const SPEED_FLOOR: f64 = -100.0;
