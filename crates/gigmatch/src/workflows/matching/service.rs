use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::assignment::AssignmentResolver;
use super::commands::{CandidacyCommand, CommandOutcome};
use super::completion::CompletionTracker;
use super::consent::{ConsentSide, ConsentStateMachine};
use super::domain::{Candidacy, CandidacyFilter, CandidacyId, CandidacyStatus, Job, JobId, UserId};
use super::error::MatchingError;
use super::ledger::OfferLedger;
use super::policy::AssignmentMode;
use super::store::EntityStore;

/// Command surface composing the ledger, consent machine, resolver, and completion tracker
/// over an [`EntityStore`].
pub struct MatchingService<S> {
    pub(super) store: Arc<S>,
    mode: AssignmentMode,
}

impl<S> MatchingService<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>, mode: AssignmentMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> AssignmentMode {
        self.mode
    }

    /// Record a worker's interest in a job as a Pending candidacy.
    pub fn create_offer(
        &self,
        job_id: JobId,
        worker_id: UserId,
    ) -> Result<Candidacy, MatchingError> {
        let worker = self
            .store
            .user(&worker_id)?
            .ok_or_else(|| MatchingError::not_found("user", worker_id))?;
        if !worker.is_worker() {
            return Err(MatchingError::invalid(
                "worker_id",
                format!("user {worker_id} is not registered as a worker"),
            ));
        }

        let candidacy = self
            .store
            .transaction(&job_id, |tx| OfferLedger::record(tx, worker_id, Utc::now()))
            .inspect_err(|err| log_rejection("create_offer", err))?;

        info!(
            candidacy_id = %candidacy.id,
            job_id = %job_id,
            worker_id = %worker_id,
            "candidacy recorded"
        );
        Ok(candidacy)
    }

    /// Pooled-application entry point; shares the ledger's preconditions.
    pub fn apply(&self, job_id: JobId, worker_id: UserId) -> Result<Candidacy, MatchingError> {
        debug!(job_id = %job_id, worker_id = %worker_id, "application received");
        self.create_offer(job_id, worker_id)
    }

    /// Candidacies newest first, snapshotted at call time.
    pub fn list_offers(&self, filter: CandidacyFilter) -> Result<Vec<Candidacy>, MatchingError> {
        let rows = self.store.candidacies(&filter)?;
        debug!(count = rows.len(), ?filter, "listed candidacies");
        Ok(rows)
    }

    pub fn get_candidacy(&self, id: &CandidacyId) -> Result<Candidacy, MatchingError> {
        self.store
            .candidacy(id)?
            .ok_or_else(|| MatchingError::not_found("candidacy", id))
    }

    pub fn set_worker_consent(
        &self,
        offer_id: CandidacyId,
        actor_id: UserId,
    ) -> Result<Candidacy, MatchingError> {
        self.record_consent(
            offer_id,
            CandidacyCommand::WorkerConsent { actor_id },
            ConsentSide::Worker,
        )
    }

    pub fn set_client_consent(
        &self,
        offer_id: CandidacyId,
        actor_id: UserId,
    ) -> Result<Candidacy, MatchingError> {
        self.record_consent(
            offer_id,
            CandidacyCommand::ClientConsent { actor_id },
            ConsentSide::Client,
        )
    }

    /// Either party withdraws a candidacy that has not been accepted.
    pub fn decline(
        &self,
        offer_id: CandidacyId,
        actor_id: UserId,
    ) -> Result<Candidacy, MatchingError> {
        let command = CandidacyCommand::Decline { actor_id };
        let (candidacy, job) = self.candidacy_with_job(&offer_id)?;
        self.authorize(&command, Some(&candidacy.worker_id), &job)?;

        let declined = self
            .store
            .transaction(&job.id, |tx| {
                ConsentStateMachine::decline(tx, offer_id, Utc::now())
            })
            .inspect_err(|err| log_rejection("decline", err))?;

        info!(candidacy_id = %offer_id, job_id = %job.id, actor_id = %actor_id, "candidacy declined");
        Ok(declined)
    }

    /// Bind `worker_id` to the job and reject every competing candidacy atomically.
    pub fn assign(
        &self,
        job_id: JobId,
        worker_id: UserId,
        actor_id: UserId,
    ) -> Result<Job, MatchingError> {
        let command = CandidacyCommand::Assign { actor_id };
        let job = self.job(&job_id)?;
        self.authorize(&command, Some(&worker_id), &job)?;

        let job = self
            .store
            .transaction(&job_id, |tx| {
                AssignmentResolver::assign(tx, worker_id, Utc::now())
            })
            .inspect_err(|err| log_rejection("assign", err))?;

        info!(job_id = %job_id, worker_id = %worker_id, "job assigned");
        Ok(job)
    }

    /// Close the job and credit both parties once.
    pub fn complete(&self, job_id: JobId, actor_id: UserId) -> Result<Job, MatchingError> {
        let command = CandidacyCommand::Complete { actor_id };
        let job = self.job(&job_id)?;
        self.authorize(&command, None, &job)?;

        let job = self
            .store
            .transaction(&job_id, |tx| CompletionTracker::finalize(tx, Utc::now()))
            .inspect_err(|err| log_rejection("complete", err))?;

        info!(
            job_id = %job_id,
            worker_id = ?job.assigned_worker,
            "job completed"
        );
        Ok(job)
    }

    /// Dispatch a tagged command issued against one candidacy.
    pub fn execute(
        &self,
        offer_id: CandidacyId,
        command: CandidacyCommand,
    ) -> Result<CommandOutcome, MatchingError> {
        let outcome = match command {
            CandidacyCommand::WorkerConsent { actor_id } => {
                CommandOutcome::Candidacy(self.set_worker_consent(offer_id, actor_id)?.view())
            }
            CandidacyCommand::ClientConsent { actor_id } => {
                CommandOutcome::Candidacy(self.set_client_consent(offer_id, actor_id)?.view())
            }
            CandidacyCommand::Decline { actor_id } => {
                CommandOutcome::Candidacy(self.decline(offer_id, actor_id)?.view())
            }
            CandidacyCommand::Assign { actor_id } => {
                let candidacy = self.get_candidacy(&offer_id)?;
                CommandOutcome::Job(self.assign(candidacy.job_id, candidacy.worker_id, actor_id)?)
            }
            CandidacyCommand::Complete { actor_id } => {
                // only the row holding the job may close it; a Completed row falls through to
                // the tracker's job_completed conflict
                let (candidacy, job) = self.candidacy_with_job(&offer_id)?;
                self.authorize(&command, None, &job)?;
                if matches!(
                    candidacy.status,
                    CandidacyStatus::Pending | CandidacyStatus::Rejected
                ) {
                    return Err(MatchingError::invalid(
                        "command",
                        format!(
                            "candidacy {offer_id} is {} and does not hold its job",
                            candidacy.status.label()
                        ),
                    ));
                }
                CommandOutcome::Job(self.complete(candidacy.job_id, actor_id)?)
            }
        };
        Ok(outcome)
    }

    fn record_consent(
        &self,
        offer_id: CandidacyId,
        command: CandidacyCommand,
        side: ConsentSide,
    ) -> Result<Candidacy, MatchingError> {
        let (candidacy, job) = self.candidacy_with_job(&offer_id)?;
        self.authorize(&command, Some(&candidacy.worker_id), &job)?;

        let updated = self
            .store
            .transaction(&job.id, |tx| {
                ConsentStateMachine::record(tx, offer_id, side, Utc::now())
            })
            .inspect_err(|err| log_rejection(command.action(), err))?;

        info!(
            candidacy_id = %offer_id,
            job_id = %job.id,
            ?side,
            status = updated.status.label(),
            "consent recorded"
        );
        Ok(updated)
    }

    /// Checks the actor against the command's role before anything is staged.
    fn authorize(
        &self,
        command: &CandidacyCommand,
        worker: Option<&UserId>,
        job: &Job,
    ) -> Result<(), MatchingError> {
        let actor = command.actor();
        if !command.authority().permits(&actor, worker, &job.owner_id) {
            warn!(actor_id = %actor, job_id = %job.id, action = command.action(), "unauthorized command");
            return Err(MatchingError::unauthorized(actor, command.action()));
        }
        if !command.enabled_in(self.mode) {
            return Err(MatchingError::invalid(
                "command",
                format!("cannot {} in {} mode", command.action(), self.mode),
            ));
        }
        Ok(())
    }

    pub(super) fn job(&self, id: &JobId) -> Result<Job, MatchingError> {
        self.store
            .job(id)?
            .ok_or_else(|| MatchingError::not_found("job", id))
    }

    fn candidacy_with_job(&self, id: &CandidacyId) -> Result<(Candidacy, Job), MatchingError> {
        let candidacy = self.get_candidacy(id)?;
        let job = self.job(&candidacy.job_id)?;
        Ok((candidacy, job))
    }
}

fn log_rejection(action: &str, err: &MatchingError) {
    match err {
        MatchingError::Conflict(kind) => {
            warn!(action, code = kind.code(), "command rejected by conflict")
        }
        MatchingError::Internal(source) => {
            error!(action, %source, "store failure rolled back command")
        }
        other => debug!(action, error = %other, "command rejected"),
    }
}
