use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::tickets::TicketServiceError;

/// Top-level error for the binaries. HTTP handlers map [`TicketServiceError`]
/// to status codes themselves.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ticket error: {0}")]
    Ticket(#[from] TicketServiceError),
    #[error("input error: {0}")]
    Input(String),
}
