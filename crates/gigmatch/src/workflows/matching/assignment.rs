use chrono::{DateTime, Utc};

use super::domain::{CandidacyId, CandidacyStatus, Job, UserId};
use super::error::{ConflictKind, MatchingError};
use super::store::JobTransaction;

/// Narrows a job's candidacy pool to exactly one bound worker.
pub struct AssignmentResolver;

impl AssignmentResolver {
    /// Owner-driven assignment of a worker who already applied.
    ///
    /// Applying counts as the worker's consent and the owner's pick as the client's, so the
    /// winning row ends with both consent bits set just like the dual-consent path.
    pub fn assign(
        tx: &mut JobTransaction,
        worker_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Job, MatchingError> {
        if tx.job().is_completed {
            return Err(ConflictKind::JobCompleted.into());
        }
        if tx.holder().is_some() {
            return Err(ConflictKind::JobAlreadyMatched.into());
        }

        let winner = tx
            .candidacy_for_worker(&worker_id)
            .filter(|row| row.status == CandidacyStatus::Pending)
            .map(|row| row.id)
            .ok_or_else(|| {
                MatchingError::not_found(
                    "pending candidacy",
                    format!("{}/{}", tx.job().id, worker_id),
                )
            })?;

        if let Some(row) = tx.candidacy_mut(&winner) {
            row.worker_accepted = true;
            row.client_accepted = true;
        }
        Self::bind(tx, winner, now);
        Ok(tx.job().clone())
    }

    /// Mark `winner` Accepted, point the job at its worker, and reject every other open row.
    pub(crate) fn bind(tx: &mut JobTransaction, winner: CandidacyId, now: DateTime<Utc>) {
        let mut bound_worker = None;
        for row in tx.candidacies_mut() {
            if row.id == winner {
                row.status = CandidacyStatus::Accepted;
                row.updated_at = now;
                bound_worker = Some(row.worker_id);
            } else if row.status == CandidacyStatus::Pending {
                row.status = CandidacyStatus::Rejected;
                row.updated_at = now;
            }
        }
        tx.job_mut().assigned_worker = bound_worker;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::matching::domain::Candidacy;
    use crate::workflows::matching::tests::common::{open_job, transaction_for};

    #[test]
    fn assign_accepts_winner_and_rejects_rest() {
        let job = open_job();
        let winner = UserId::new();
        let loser = UserId::new();
        let rows = vec![
            Candidacy::pending(job.id, winner, Utc::now()),
            Candidacy::pending(job.id, loser, Utc::now()),
        ];
        let mut tx = transaction_for(&job, rows);

        let updated = AssignmentResolver::assign(&mut tx, winner, Utc::now()).expect("assigned");

        assert_eq!(updated.assigned_worker, Some(winner));
        let won = tx.candidacy_for_worker(&winner).expect("winner row");
        assert_eq!(won.status, CandidacyStatus::Accepted);
        assert!(won.worker_accepted && won.client_accepted);
        let lost = tx.candidacy_for_worker(&loser).expect("loser row");
        assert_eq!(lost.status, CandidacyStatus::Rejected);
    }

    #[test]
    fn assign_requires_existing_candidacy() {
        let job = open_job();
        let mut tx = transaction_for(&job, Vec::new());

        match AssignmentResolver::assign(&mut tx, UserId::new(), Utc::now()) {
            Err(MatchingError::NotFound { entity, .. }) => assert_eq!(entity, "pending candidacy"),
            other => panic!("expected not found, got {other:?}"),
        }
        assert_eq!(tx.job().assigned_worker, None);
    }

    #[test]
    fn assign_refuses_rejected_candidacy() {
        let job = open_job();
        let worker = UserId::new();
        let mut row = Candidacy::pending(job.id, worker, Utc::now());
        row.status = CandidacyStatus::Rejected;
        let mut tx = transaction_for(&job, vec![row]);

        assert!(matches!(
            AssignmentResolver::assign(&mut tx, worker, Utc::now()),
            Err(MatchingError::NotFound { .. })
        ));
    }

    #[test]
    fn assign_refuses_when_job_already_held() {
        let job = open_job();
        let first = UserId::new();
        let second = UserId::new();
        let rows = vec![
            Candidacy::pending(job.id, first, Utc::now()),
            Candidacy::pending(job.id, second, Utc::now()),
        ];
        let mut tx = transaction_for(&job, rows);
        AssignmentResolver::assign(&mut tx, first, Utc::now()).expect("first assignment");

        match AssignmentResolver::assign(&mut tx, second, Utc::now()) {
            Err(MatchingError::Conflict(ConflictKind::JobAlreadyMatched)) => {}
            other => panic!("expected already matched, got {other:?}"),
        }
        assert_eq!(tx.job().assigned_worker, Some(first));
    }
}
