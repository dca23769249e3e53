//! The canonical job transition table.
//!
//! Built into the binary as a constant lookup. The table encodes
//! legitimate rework loops (QC failure back to `IN_PROGRESS`, parts
//! discovered missing mid-repair back to `WAITING_PARTS`), so the
//! back-edges are intentional.

use super::status::JobStatus;

/// Returns the statuses directly reachable from `from`. Empty for `PAID`.
pub fn valid_next(from: JobStatus) -> &'static [JobStatus] {
    use JobStatus::*;
    match from {
        New => &[WaitingDropOff, DroppedOff, WaitingWriteup],
        WaitingDropOff => &[DroppedOff, New],
        DroppedOff => &[WaitingWriteup, EstimateCreated],
        WaitingWriteup => &[EstimateCreated],
        EstimateCreated => &[WaitingInsurance, Approved, AssignedToTech],
        WaitingInsurance => &[WaitingAdjuster, Approved],
        WaitingAdjuster => &[AdjusterScheduled, WaitingInsurance],
        AdjusterScheduled => &[AdjusterInspected, WaitingAdjuster],
        AdjusterInspected => &[WaitingApproval, Approved],
        WaitingApproval => &[Approved, WaitingAdjuster],
        Approved => &[WaitingParts, AssignedToTech],
        WaitingParts => &[PartsOrdered],
        PartsOrdered => &[PartsReceived, WaitingParts],
        PartsReceived => &[AssignedToTech],
        AssignedToTech => &[InProgress],
        InProgress => &[TechComplete, WaitingParts],
        TechComplete => &[WaitingQc],
        WaitingQc => &[QcComplete, InProgress],
        QcComplete => &[WaitingDetail, ReadyForPickup],
        WaitingDetail => &[DetailComplete],
        DetailComplete => &[ReadyForPickup],
        ReadyForPickup => &[Completed],
        Completed => &[Invoiced],
        Invoiced => &[Paid],
        Paid => &[],
    }
}

/// Whether `from -> to` is an edge of the transition table.
pub fn is_valid_transition(from: JobStatus, to: JobStatus) -> bool {
    valid_next(from).contains(&to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::status::ALL_STATUSES;

    #[test]
    fn test_paid_is_terminal() {
        assert!(valid_next(JobStatus::Paid).is_empty());
        for status in ALL_STATUSES {
            assert!(!is_valid_transition(JobStatus::Paid, *status));
        }
    }

    #[test]
    fn test_every_next_status_is_a_member() {
        for status in ALL_STATUSES {
            for next in valid_next(*status) {
                assert!(ALL_STATUSES.contains(next));
            }
        }
    }

    #[test]
    fn test_no_self_loops() {
        for status in ALL_STATUSES {
            assert!(
                !is_valid_transition(*status, *status),
                "{} must not loop to itself",
                status
            );
        }
    }

    #[test]
    fn test_every_status_is_reachable_from_new() {
        use std::collections::BTreeSet;

        let mut seen: BTreeSet<JobStatus> = BTreeSet::new();
        let mut frontier = vec![JobStatus::New];
        while let Some(status) = frontier.pop() {
            if seen.insert(status) {
                frontier.extend(valid_next(status).iter().copied());
            }
        }
        assert_eq!(seen.len(), ALL_STATUSES.len());
    }

    #[test]
    fn test_rework_back_edges_are_present() {
        // QC failure returns to the technician.
        assert!(is_valid_transition(JobStatus::WaitingQc, JobStatus::InProgress));
        // Repair may stall on parts again.
        assert!(is_valid_transition(JobStatus::InProgress, JobStatus::WaitingParts));
        // Adjuster scheduling can bounce.
        assert!(is_valid_transition(JobStatus::AdjusterScheduled, JobStatus::WaitingAdjuster));
        assert!(is_valid_transition(JobStatus::WaitingApproval, JobStatus::WaitingAdjuster));
    }

    #[test]
    fn test_happy_path_edges() {
        let path = [
            JobStatus::New,
            JobStatus::DroppedOff,
            JobStatus::EstimateCreated,
            JobStatus::Approved,
            JobStatus::AssignedToTech,
            JobStatus::InProgress,
            JobStatus::TechComplete,
            JobStatus::WaitingQc,
            JobStatus::QcComplete,
            JobStatus::ReadyForPickup,
            JobStatus::Completed,
            JobStatus::Invoiced,
            JobStatus::Paid,
        ];
        for pair in path.windows(2) {
            assert!(
                is_valid_transition(pair[0], pair[1]),
                "{} -> {} should be valid",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_invalid_edges_rejected() {
        assert!(!is_valid_transition(JobStatus::New, JobStatus::Paid));
        assert!(!is_valid_transition(JobStatus::EstimateCreated, JobStatus::Paid));
        assert!(!is_valid_transition(JobStatus::Completed, JobStatus::Paid));
        assert!(!is_valid_transition(JobStatus::DroppedOff, JobStatus::New));
    }
}
