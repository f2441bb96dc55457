//! Pipeline state machine rules.
//!
//! Permissive mode accepts any move between distinct statuses. Strict mode only accepts
//! the edges in [`allowed_next`].

use crate::errors::AppError;
use crate::models::{LeadStatus, PipelineMode};

/// Result of checking a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    /// Target equals the current status; nothing is written or recorded.
    NoOp,
    Allowed,
}

/// Forward edges of the strict table.
pub fn allowed_next(from: LeadStatus) -> &'static [LeadStatus] {
    use LeadStatus::*;
    match from {
        New => &[Contacted, Qualified, Nurture, Lost],
        Contacted => &[Qualified, AppointmentScheduled, Nurture, Lost],
        Qualified => &[AppointmentScheduled, Nurture, Lost],
        AppointmentScheduled => &[InspectionCompleted, Qualified, Nurture, Lost],
        InspectionCompleted => &[QuoteSent, Nurture, Lost],
        QuoteSent => &[Negotiation, Won, Lost, Nurture],
        Negotiation => &[QuoteSent, Won, Lost],
        Won => &[],
        Lost => &[Nurture],
        Nurture => &[Contacted, Lost],
    }
}

pub fn check_transition(
    from: LeadStatus,
    to: LeadStatus,
    mode: PipelineMode,
) -> Result<TransitionCheck, AppError> {
    if from == to {
        return Ok(TransitionCheck::NoOp);
    }
    match mode {
        PipelineMode::Permissive => Ok(TransitionCheck::Allowed),
        PipelineMode::Strict if allowed_next(from).contains(&to) => Ok(TransitionCheck::Allowed),
        PipelineMode::Strict => Err(AppError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_status_is_noop_in_both_modes() {
        for mode in [PipelineMode::Permissive, PipelineMode::Strict] {
            for status in LeadStatus::ALL {
                assert_eq!(
                    check_transition(status, status, mode).unwrap(),
                    TransitionCheck::NoOp
                );
            }
        }
    }

    #[test]
    fn test_permissive_allows_everything() {
        for from in LeadStatus::ALL {
            for to in LeadStatus::ALL.into_iter().filter(|to| *to != from) {
                assert_eq!(
                    check_transition(from, to, PipelineMode::Permissive).unwrap(),
                    TransitionCheck::Allowed
                );
            }
        }
    }

    #[test]
    fn test_strict_enforces_table() {
        assert!(check_transition(LeadStatus::New, LeadStatus::Contacted, PipelineMode::Strict).is_ok());
        assert!(check_transition(LeadStatus::QuoteSent, LeadStatus::Won, PipelineMode::Strict).is_ok());

        let err = check_transition(LeadStatus::New, LeadStatus::Won, PipelineMode::Strict).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn test_strict_terminal_states() {
        for to in LeadStatus::ALL.into_iter().filter(|s| *s != LeadStatus::Won) {
            assert!(check_transition(LeadStatus::Won, to, PipelineMode::Strict).is_err());
        }
        assert!(check_transition(LeadStatus::Lost, LeadStatus::Nurture, PipelineMode::Strict).is_ok());
        assert!(check_transition(LeadStatus::Lost, LeadStatus::New, PipelineMode::Strict).is_err());
    }

    #[test]
    fn test_strict_table_never_lists_self_edges() {
        for status in LeadStatus::ALL {
            assert!(!allowed_next(status).contains(&status));
        }
    }
}
