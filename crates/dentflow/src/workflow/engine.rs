//! The job state machine.
//!
//! Owns the transition table lookup, persists status changes together with
//! their audit history and auto-timestamps in one transaction, and invokes
//! the notification orchestrator best-effort after commit.

use std::sync::Arc;

use chrono::Utc;

use crate::db::job_repo::{self, JobRow};
use crate::db::{history_repo, Database};
use crate::notify::{DispatchOutcome, NotificationOrchestrator};

use super::error::WorkflowError;
use super::status::JobStatus;
use super::transitions;

/// Fields for creating a repair job. Every job starts in `NEW`.
#[derive(Debug, Clone, Default)]
pub struct NewJob {
    pub job_number: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub vehicle_description: Option<String>,
    pub assigned_tech: Option<String>,
    /// Defaults to "normal".
    pub priority: Option<String>,
    pub scheduled_drop_off: Option<String>,
    pub scheduled_pickup: Option<String>,
}

/// Result of a successful transition. `dispatch` reports what the
/// notification pipeline did; it is diagnostic only and never affects
/// whether the transition succeeded.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub job_id: String,
    pub from: JobStatus,
    pub to: JobStatus,
    pub dispatch: Option<DispatchOutcome>,
}

/// The job workflow engine.
///
/// The orchestrator is an explicit optional collaborator: when absent,
/// transitions simply skip notification.
pub struct WorkflowEngine {
    db: Database,
    orchestrator: Option<Arc<NotificationOrchestrator>>,
}

impl WorkflowEngine {
    /// Creates an engine without notifications.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            orchestrator: None,
        }
    }

    /// Creates an engine that notifies customers after each transition.
    pub fn with_orchestrator(db: Database, orchestrator: Arc<NotificationOrchestrator>) -> Self {
        Self {
            db,
            orchestrator: Some(orchestrator),
        }
    }

    /// Creates a job in `NEW` with its initial history entry.
    pub fn create_job(&self, new: NewJob) -> Result<JobRow, WorkflowError> {
        let now = Utc::now().to_rfc3339();
        let row = JobRow {
            id: uuid::Uuid::new_v4().to_string(),
            job_number: new.job_number,
            status: JobStatus::New.as_str().to_string(),
            customer_id: new.customer_id,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            vehicle_description: new.vehicle_description,
            assigned_tech: new.assigned_tech,
            priority: new.priority.unwrap_or_else(|| "normal".to_string()),
            parts_status: None,
            scheduled_drop_off: new.scheduled_drop_off,
            actual_drop_off: None,
            scheduled_pickup: new.scheduled_pickup,
            actual_pickup: None,
            completed_at: None,
            status_changed_at: Some(now.clone()),
            status_changed_by: None,
            deleted: false,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            job_repo::insert_tx(&tx, &row)?;
            history_repo::append_tx(
                &tx,
                &row.id,
                None,
                JobStatus::New.as_str(),
                None,
                None,
                false,
                &now,
            )?;
            tx.commit()?;
            Ok(())
        })?;

        log::info!("Created job {} ({})", row.job_number, row.id);
        Ok(row)
    }

    /// Requests a validated status transition.
    ///
    /// On success the new status, history entry, and any auto-timestamps are
    /// committed atomically, after which the orchestrator (if configured) is
    /// invoked. Orchestrator failures never fail the transition.
    pub fn request_transition(
        &self,
        job_id: &str,
        target: JobStatus,
        actor: Option<&str>,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.transition_inner(job_id, target, actor, note, true)
    }

    /// Administrative override that bypasses the transition table.
    ///
    /// The history entry is tagged as forced so the audit trail
    /// distinguishes it from a validated transition.
    pub fn force_transition(
        &self,
        job_id: &str,
        target: JobStatus,
        actor: Option<&str>,
        note: Option<&str>,
    ) -> Result<TransitionOutcome, WorkflowError> {
        self.transition_inner(job_id, target, actor, note, false)
    }

    /// Returns the statuses reachable from the job's current status.
    /// Empty for a job in `PAID`.
    pub fn valid_next_statuses(&self, job_id: &str) -> Result<Vec<JobStatus>, WorkflowError> {
        let (_, current) = self.load_job(job_id)?;
        Ok(transitions::valid_next(current).to_vec())
    }

    fn load_job(&self, job_id: &str) -> Result<(JobRow, JobStatus), WorkflowError> {
        let job = job_repo::find_active(&self.db, job_id)?
            .ok_or_else(|| WorkflowError::JobNotFound(job_id.to_string()))?;
        let current: JobStatus =
            job.status
                .parse()
                .map_err(|_| WorkflowError::CorruptStatus {
                    job_id: job_id.to_string(),
                    stored: job.status.clone(),
                })?;
        Ok((job, current))
    }

    fn transition_inner(
        &self,
        job_id: &str,
        target: JobStatus,
        actor: Option<&str>,
        note: Option<&str>,
        validate: bool,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let (job, current) = self.load_job(job_id)?;

        if validate && target != current && !transitions::is_valid_transition(current, target) {
            return Err(WorkflowError::InvalidTransition {
                job_id: job.id,
                current,
                requested: target,
                valid_next: transitions::valid_next(current).to_vec(),
            });
        }

        let forced = !validate;
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            job_repo::update_status_tx(&tx, job_id, target.as_str(), &now, actor)?;
            match target {
                JobStatus::DroppedOff => job_repo::stamp_drop_off_tx(&tx, job_id, &now)?,
                JobStatus::Completed => job_repo::stamp_completion_tx(&tx, job_id, &now)?,
                _ => {}
            }
            history_repo::append_tx(
                &tx,
                job_id,
                Some(current.as_str()),
                target.as_str(),
                actor,
                note,
                forced,
                &now,
            )?;
            tx.commit()?;
            Ok(())
        })?;

        log::info!(
            "Job {} transitioned {} -> {}{}",
            job_id,
            current,
            target,
            if forced { " (forced)" } else { "" }
        );

        // Best-effort: the orchestrator isolates its own failures.
        let dispatch = self
            .orchestrator
            .as_ref()
            .map(|orch| orch.notify_status_change(job_id, Some(current), target, note));

        Ok(TransitionOutcome {
            job_id: job.id,
            from: current,
            to: target,
            dispatch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::history_repo;
    use crate::workflow::status::ALL_STATUSES;

    fn test_engine() -> WorkflowEngine {
        WorkflowEngine::new(Database::open_in_memory().unwrap())
    }

    fn sample_new_job() -> NewJob {
        NewJob {
            job_number: "JOB-2026-0001".to_string(),
            customer_id: "cust-1".to_string(),
            customer_name: "Jane Miller".to_string(),
            customer_email: Some("jane@example.com".to_string()),
            customer_phone: Some("+15555550100".to_string()),
            vehicle_description: Some("2023 BMW X5".to_string()),
            ..Default::default()
        }
    }

    fn engine_db(engine: &WorkflowEngine) -> &Database {
        &engine.db
    }

    /// Forces a job's stored status without touching history, for sweeping
    /// the transition table from arbitrary states.
    fn set_status(engine: &WorkflowEngine, job_id: &str, status: JobStatus) {
        engine_db(engine)
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE jobs SET status = ?2 WHERE id = ?1",
                    rusqlite::params![job_id, status.as_str()],
                )?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_create_job_starts_in_new_with_history() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();
        assert_eq!(job.status, "NEW");
        assert_eq!(job.priority, "normal");

        let history = history_repo::list_for_job(engine_db(&engine), &job.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].from_status, None);
        assert_eq!(history[0].to_status, "NEW");
    }

    #[test]
    fn test_valid_transition_updates_status() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();

        let outcome = engine
            .request_transition(&job.id, JobStatus::DroppedOff, Some("amy"), None)
            .unwrap();
        assert_eq!(outcome.from, JobStatus::New);
        assert_eq!(outcome.to, JobStatus::DroppedOff);
        assert!(outcome.dispatch.is_none());

        let stored = job_repo::find_by_id(engine_db(&engine), &job.id).unwrap().unwrap();
        assert_eq!(stored.status, "DROPPED_OFF");
        assert_eq!(stored.status_changed_by.as_deref(), Some("amy"));
    }

    #[test]
    fn test_transition_closure_over_full_table() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();

        for from in ALL_STATUSES {
            for to in ALL_STATUSES {
                if to == from {
                    continue;
                }
                set_status(&engine, &job.id, *from);
                let result = engine.request_transition(&job.id, *to, None, None);
                if transitions::is_valid_transition(*from, *to) {
                    let outcome = result.unwrap();
                    assert_eq!(outcome.to, *to);
                    let stored =
                        job_repo::find_by_id(engine_db(&engine), &job.id).unwrap().unwrap();
                    assert_eq!(stored.status, to.as_str());
                } else {
                    match result {
                        Err(WorkflowError::InvalidTransition {
                            current,
                            requested,
                            valid_next,
                            ..
                        }) => {
                            assert_eq!(current, *from);
                            assert_eq!(requested, *to);
                            assert_eq!(valid_next, transitions::valid_next(*from).to_vec());
                        }
                        other => panic!("{} -> {} should be invalid, got {:?}", from, to, other.is_ok()),
                    }
                }
            }
        }
    }

    #[test]
    fn test_no_transition_out_of_paid() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();
        set_status(&engine, &job.id, JobStatus::Paid);

        assert!(engine.valid_next_statuses(&job.id).unwrap().is_empty());
        for target in ALL_STATUSES {
            if *target == JobStatus::Paid {
                continue;
            }
            assert!(engine.request_transition(&job.id, *target, None, None).is_err());
        }
    }

    #[test]
    fn test_history_is_ordered_and_chained() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();

        let path = [
            JobStatus::DroppedOff,
            JobStatus::EstimateCreated,
            JobStatus::Approved,
            JobStatus::AssignedToTech,
        ];
        for target in path {
            engine.request_transition(&job.id, target, None, None).unwrap();
        }

        let history = history_repo::list_for_job(engine_db(&engine), &job.id).unwrap();
        assert_eq!(history.len(), 5);
        for pair in history.windows(2) {
            assert_eq!(pair[1].from_status.as_deref(), Some(pair[0].to_status.as_str()));
        }
    }

    #[test]
    fn test_dropped_off_stamps_actual_drop_off() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();

        engine.request_transition(&job.id, JobStatus::DroppedOff, None, None).unwrap();
        let stored = job_repo::find_by_id(engine_db(&engine), &job.id).unwrap().unwrap();
        assert!(stored.actual_drop_off.is_some());
        assert!(stored.completed_at.is_none());
    }

    #[test]
    fn test_completed_stamps_pickup_and_completion_together() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();
        set_status(&engine, &job.id, JobStatus::ReadyForPickup);

        let before = job_repo::find_by_id(engine_db(&engine), &job.id).unwrap().unwrap();
        assert!(before.actual_pickup.is_none());
        assert!(before.completed_at.is_none());

        engine.request_transition(&job.id, JobStatus::Completed, None, None).unwrap();
        let stored = job_repo::find_by_id(engine_db(&engine), &job.id).unwrap().unwrap();
        assert!(stored.actual_pickup.is_some());
        assert_eq!(stored.actual_pickup, stored.completed_at);
    }

    #[test]
    fn test_invalid_transition_leaves_no_side_effects() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();

        let err = engine
            .request_transition(&job.id, JobStatus::Paid, None, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

        let stored = job_repo::find_by_id(engine_db(&engine), &job.id).unwrap().unwrap();
        assert_eq!(stored.status, "NEW");
        let history = history_repo::list_for_job(engine_db(&engine), &job.id).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_unknown_job_is_not_found() {
        let engine = test_engine();
        let err = engine
            .request_transition("missing", JobStatus::DroppedOff, None, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::JobNotFound(_)));
        assert!(engine.valid_next_statuses("missing").is_err());
    }

    #[test]
    fn test_soft_deleted_job_is_not_found() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();
        job_repo::soft_delete(engine_db(&engine), &job.id, "2026-01-02T00:00:00Z").unwrap();

        let err = engine
            .request_transition(&job.id, JobStatus::DroppedOff, None, None)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::JobNotFound(_)));
    }

    #[test]
    fn test_force_transition_bypasses_table_and_tags_history() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();

        let outcome = engine
            .force_transition(&job.id, JobStatus::Paid, Some("admin"), Some("write-off"))
            .unwrap();
        assert_eq!(outcome.to, JobStatus::Paid);

        let history = history_repo::list_for_job(engine_db(&engine), &job.id).unwrap();
        let last = history.last().unwrap();
        assert!(last.forced);
        assert_eq!(last.note.as_deref(), Some("write-off"));
        assert_eq!(last.changed_by.as_deref(), Some("admin"));
    }

    #[test]
    fn test_scenario_new_dropped_estimate_then_paid_rejected() {
        let engine = test_engine();
        let job = engine.create_job(sample_new_job()).unwrap();

        engine.request_transition(&job.id, JobStatus::DroppedOff, None, None).unwrap();
        engine
            .request_transition(&job.id, JobStatus::EstimateCreated, None, None)
            .unwrap();

        match engine.request_transition(&job.id, JobStatus::Paid, None, None) {
            Err(WorkflowError::InvalidTransition { valid_next, .. }) => {
                assert_eq!(
                    valid_next,
                    vec![
                        JobStatus::WaitingInsurance,
                        JobStatus::Approved,
                        JobStatus::AssignedToTech,
                    ]
                );
            }
            other => panic!("expected InvalidTransition, got ok={}", other.is_ok()),
        }
    }
}
