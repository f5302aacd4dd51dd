use chrono::{DateTime, Utc};

use super::domain::{Candidacy, UserId};
use super::error::{ConflictKind, MatchingError};
use super::store::JobTransaction;

/// Records worker interest in a job, one row per (job, worker).
pub struct OfferLedger;

impl OfferLedger {
    /// Stage a new Pending candidacy on the transaction's job.
    ///
    /// The caller has already checked that `worker_id` carries the worker role.
    pub fn record(
        tx: &mut JobTransaction,
        worker_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Candidacy, MatchingError> {
        if tx.job().is_completed {
            return Err(ConflictKind::JobCompleted.into());
        }
        if tx.candidacy_for_worker(&worker_id).is_some() {
            return Err(ConflictKind::CandidacyExists.into());
        }
        if tx.holder().is_some() {
            return Err(ConflictKind::JobAlreadyMatched.into());
        }

        let candidacy = Candidacy::pending(tx.job().id, worker_id, now);
        tx.insert_candidacy(candidacy.clone())
            .map_err(|_| MatchingError::Conflict(ConflictKind::CandidacyExists))?;
        Ok(candidacy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::matching::domain::CandidacyStatus;
    use crate::workflows::matching::tests::common::{open_job, transaction_for};

    #[test]
    fn record_stages_pending_row() {
        let job = open_job();
        let mut tx = transaction_for(&job, Vec::new());
        let worker = UserId::new();

        let row = OfferLedger::record(&mut tx, worker, Utc::now()).expect("recorded");

        assert_eq!(row.status, CandidacyStatus::Pending);
        assert!(!row.worker_accepted && !row.client_accepted);
        assert_eq!(tx.candidacies().len(), 1);
    }

    #[test]
    fn record_refuses_second_row_for_same_worker() {
        let job = open_job();
        let mut tx = transaction_for(&job, Vec::new());
        let worker = UserId::new();
        OfferLedger::record(&mut tx, worker, Utc::now()).expect("first row");

        match OfferLedger::record(&mut tx, worker, Utc::now()) {
            Err(MatchingError::Conflict(ConflictKind::CandidacyExists)) => {}
            other => panic!("expected candidacy conflict, got {other:?}"),
        }
        assert_eq!(tx.candidacies().len(), 1);
    }

    #[test]
    fn record_refuses_completed_job() {
        let mut job = open_job();
        job.is_completed = true;
        let mut tx = transaction_for(&job, Vec::new());

        match OfferLedger::record(&mut tx, UserId::new(), Utc::now()) {
            Err(MatchingError::Conflict(ConflictKind::JobCompleted)) => {}
            other => panic!("expected completed conflict, got {other:?}"),
        }
    }
}
