use chrono::{DateTime, Utc};

use super::domain::{CandidacyStatus, Job};
use super::error::{ConflictKind, MatchingError};
use super::store::JobTransaction;

/// Finalizes a job and credits both parties exactly once.
pub struct CompletionTracker;

impl CompletionTracker {
    /// Close the job, move its bound row to Completed, and reject any row still pending.
    ///
    /// A job closed without a bound worker credits nobody.
    pub fn finalize(tx: &mut JobTransaction, now: DateTime<Utc>) -> Result<Job, MatchingError> {
        if tx.job().is_completed {
            return Err(ConflictKind::JobCompleted.into());
        }

        let mut credited_worker = None;
        for row in tx.candidacies_mut() {
            match row.status {
                CandidacyStatus::Accepted => {
                    row.status = CandidacyStatus::Completed;
                    row.updated_at = now;
                    credited_worker = Some(row.worker_id);
                }
                CandidacyStatus::Pending => {
                    row.status = CandidacyStatus::Rejected;
                    row.updated_at = now;
                }
                CandidacyStatus::Rejected | CandidacyStatus::Completed => {}
            }
        }

        let owner = tx.job().owner_id;
        tx.job_mut().is_completed = true;
        if let Some(worker) = credited_worker {
            tx.credit_completed_work(owner);
            tx.credit_completed_work(worker);
        }
        Ok(tx.job().clone())
    }
}
