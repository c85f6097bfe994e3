use super::domain::{PhotoRecord, PhotoTag, TicketRecord};
use crate::rules::TicketId;

/// Raised when a ticket is submitted for review without the required photos.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvidenceError {
    #[error("ticket {0} needs at least one photo before it can be submitted for review")]
    MissingProof(TicketId),
    #[error("inspection ticket {ticket_id} needs a '{}' photo before it can be submitted for review", .missing.label())]
    MissingInspectionPhoto {
        ticket_id: TicketId,
        missing: PhotoTag,
    },
}

/// Inspection tickets need both a before and an after photo; every other ticket
/// needs at least one photo of any kind.
pub fn require_submission_evidence(
    ticket: &TicketRecord,
    photos: &[PhotoRecord],
) -> Result<(), EvidenceError> {
    if !ticket.inspection {
        if photos.is_empty() {
            return Err(EvidenceError::MissingProof(ticket.id.clone()));
        }
        return Ok(());
    }

    for required in [PhotoTag::Before, PhotoTag::After] {
        if !photos.iter().any(|photo| photo.tag == required) {
            return Err(EvidenceError::MissingInspectionPhoto {
                ticket_id: ticket.id.clone(),
                missing: required,
            });
        }
    }
    Ok(())
}
