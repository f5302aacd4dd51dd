use chrono::{DateTime, Utc};

use super::assignment::AssignmentResolver;
use super::domain::{Candidacy, CandidacyId, CandidacyStatus};
use super::error::{ConflictKind, MatchingError};
use super::store::JobTransaction;

/// Party whose consent bit is being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentSide {
    Worker,
    Client,
}

/// Tracks the independent worker/client consent bits on a candidacy.
///
/// A row becomes Accepted only once both bits are set, and the first row to get there wins
/// the job: every other open row on the job is rejected in the same transaction.
pub struct ConsentStateMachine;

impl ConsentStateMachine {
    pub fn record(
        tx: &mut JobTransaction,
        candidacy_id: CandidacyId,
        side: ConsentSide,
        now: DateTime<Utc>,
    ) -> Result<Candidacy, MatchingError> {
        if tx.job().is_completed {
            return Err(ConflictKind::JobCompleted.into());
        }

        let row = tx
            .candidacy(&candidacy_id)
            .ok_or_else(|| MatchingError::not_found("candidacy", candidacy_id))?;
        match row.status {
            CandidacyStatus::Rejected | CandidacyStatus::Completed => {
                return Err(ConflictKind::CandidacyClosed.into());
            }
            // both bits are already set on an accepted row
            CandidacyStatus::Accepted => return Ok(row.clone()),
            CandidacyStatus::Pending => {}
        }

        if let Some(holder) = tx.holder() {
            if holder.id != candidacy_id {
                return Err(ConflictKind::JobAlreadyMatched.into());
            }
        }

        let fully_accepted = match tx.candidacy_mut(&candidacy_id) {
            Some(row) => {
                match side {
                    ConsentSide::Worker => row.worker_accepted = true,
                    ConsentSide::Client => row.client_accepted = true,
                }
                row.updated_at = now;
                row.worker_accepted && row.client_accepted
            }
            None => return Err(MatchingError::not_found("candidacy", candidacy_id)),
        };

        if fully_accepted {
            AssignmentResolver::bind(tx, candidacy_id, now);
        }

        tx.candidacy(&candidacy_id)
            .cloned()
            .ok_or_else(|| MatchingError::not_found("candidacy", candidacy_id))
    }

    /// Withdraw a candidacy that has not been accepted yet.
    pub fn decline(
        tx: &mut JobTransaction,
        candidacy_id: CandidacyId,
        now: DateTime<Utc>,
    ) -> Result<Candidacy, MatchingError> {
        if tx.job().is_completed {
            return Err(ConflictKind::JobCompleted.into());
        }

        let row = tx
            .candidacy_mut(&candidacy_id)
            .ok_or_else(|| MatchingError::not_found("candidacy", candidacy_id))?;
        if row.status != CandidacyStatus::Pending {
            return Err(ConflictKind::CandidacyClosed.into());
        }
        row.status = CandidacyStatus::Rejected;
        row.updated_at = now;
        Ok(row.clone())
    }
}
