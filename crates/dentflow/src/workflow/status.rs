//! The repair-job status set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical job lifecycle states. `New` is the unique initial state and
/// `Paid` is the unique terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    New,
    WaitingDropOff,
    DroppedOff,
    WaitingWriteup,
    EstimateCreated,
    WaitingInsurance,
    WaitingAdjuster,
    AdjusterScheduled,
    AdjusterInspected,
    WaitingApproval,
    Approved,
    WaitingParts,
    PartsOrdered,
    PartsReceived,
    AssignedToTech,
    InProgress,
    TechComplete,
    WaitingQc,
    QcComplete,
    WaitingDetail,
    DetailComplete,
    ReadyForPickup,
    Completed,
    Invoiced,
    Paid,
}

/// Every status, in lifecycle order.
pub const ALL_STATUSES: &[JobStatus] = &[
    JobStatus::New,
    JobStatus::WaitingDropOff,
    JobStatus::DroppedOff,
    JobStatus::WaitingWriteup,
    JobStatus::EstimateCreated,
    JobStatus::WaitingInsurance,
    JobStatus::WaitingAdjuster,
    JobStatus::AdjusterScheduled,
    JobStatus::AdjusterInspected,
    JobStatus::WaitingApproval,
    JobStatus::Approved,
    JobStatus::WaitingParts,
    JobStatus::PartsOrdered,
    JobStatus::PartsReceived,
    JobStatus::AssignedToTech,
    JobStatus::InProgress,
    JobStatus::TechComplete,
    JobStatus::WaitingQc,
    JobStatus::QcComplete,
    JobStatus::WaitingDetail,
    JobStatus::DetailComplete,
    JobStatus::ReadyForPickup,
    JobStatus::Completed,
    JobStatus::Invoiced,
    JobStatus::Paid,
];

impl JobStatus {
    /// The status code as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "NEW",
            JobStatus::WaitingDropOff => "WAITING_DROP_OFF",
            JobStatus::DroppedOff => "DROPPED_OFF",
            JobStatus::WaitingWriteup => "WAITING_WRITEUP",
            JobStatus::EstimateCreated => "ESTIMATE_CREATED",
            JobStatus::WaitingInsurance => "WAITING_INSURANCE",
            JobStatus::WaitingAdjuster => "WAITING_ADJUSTER",
            JobStatus::AdjusterScheduled => "ADJUSTER_SCHEDULED",
            JobStatus::AdjusterInspected => "ADJUSTER_INSPECTED",
            JobStatus::WaitingApproval => "WAITING_APPROVAL",
            JobStatus::Approved => "APPROVED",
            JobStatus::WaitingParts => "WAITING_PARTS",
            JobStatus::PartsOrdered => "PARTS_ORDERED",
            JobStatus::PartsReceived => "PARTS_RECEIVED",
            JobStatus::AssignedToTech => "ASSIGNED_TO_TECH",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::TechComplete => "TECH_COMPLETE",
            JobStatus::WaitingQc => "WAITING_QC",
            JobStatus::QcComplete => "QC_COMPLETE",
            JobStatus::WaitingDetail => "WAITING_DETAIL",
            JobStatus::DetailComplete => "DETAIL_COMPLETE",
            JobStatus::ReadyForPickup => "READY_FOR_PICKUP",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Invoiced => "INVOICED",
            JobStatus::Paid => "PAID",
        }
    }

    /// Whether this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Paid)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STATUSES
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_count() {
        assert_eq!(ALL_STATUSES.len(), 25);
    }

    #[test]
    fn test_round_trip_all_codes() {
        for status in ALL_STATUSES {
            let parsed: JobStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, *status);
        }
    }

    #[test]
    fn test_parse_unknown_code() {
        assert!("SCHEDULED".parse::<JobStatus>().is_err());
        assert!("".parse::<JobStatus>().is_err());
        assert!("new".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_status_codes() {
        let json = serde_json::to_string(&JobStatus::ReadyForPickup).unwrap();
        assert_eq!(json, "\"READY_FOR_PICKUP\"");
        let back: JobStatus = serde_json::from_str("\"WAITING_QC\"").unwrap();
        assert_eq!(back, JobStatus::WaitingQc);
    }

    #[test]
    fn test_terminal_state() {
        assert!(JobStatus::Paid.is_terminal());
        assert!(!JobStatus::Completed.is_terminal());
    }
}
