use super::domain::{
    Candidacy, CandidacyFilter, CandidacyId, Job, JobFilter, JobId, User, UserFilter, UserId,
};

/// Storage abstraction over users, jobs, and candidacy rows.
///
/// Every write touching a job's candidacy pool goes through [`EntityStore::transaction`],
/// which serializes work per job and commits the staged [`JobTransaction`] as one unit.
pub trait EntityStore: Send + Sync {
    fn user(&self, id: &UserId) -> Result<Option<User>, StoreError>;
    /// Registered users matching `filter`, oldest first.
    fn users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;
    /// Fails with [`StoreError::Conflict`] when the id or the email (case-insensitive) is taken.
    fn insert_user(&self, user: User) -> Result<User, StoreError>;
    /// Flags the account as verified in place, leaving every other column untouched.
    fn set_verified(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    fn job(&self, id: &JobId) -> Result<Option<Job>, StoreError>;
    fn insert_job(&self, job: Job) -> Result<Job, StoreError>;
    fn jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError>;
    /// Removes the job and every candidacy row that references it.
    fn delete_job(&self, id: &JobId) -> Result<(), StoreError>;

    fn candidacy(&self, id: &CandidacyId) -> Result<Option<Candidacy>, StoreError>;
    /// Snapshot of matching rows, newest first.
    fn candidacies(&self, filter: &CandidacyFilter) -> Result<Vec<Candidacy>, StoreError>;

    /// Runs `work` against a staged view of `job_id` under that job's exclusive lock.
    ///
    /// Staged writes are committed only when `work` returns `Ok`; on any error, including a
    /// failed commit, the store is left exactly as it was before the call.
    fn transaction<T, E, F>(&self, job_id: &JobId, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut JobTransaction) -> Result<T, E>,
        E: From<StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("job {0} does not exist")]
    MissingJob(JobId),
    #[error("record already exists")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store state corrupt: {0}")]
    Corrupt(String),
}

/// Staged copy of one job and its candidacy pool.
///
/// Counter increments are kept as deltas so the committing store applies them against the
/// latest user record instead of overwriting it with a stale snapshot.
#[derive(Debug, Clone)]
pub struct JobTransaction {
    job: Job,
    candidacies: Vec<Candidacy>,
    completion_credits: Vec<UserId>,
}

/// Writes produced by a successful transaction, handed back to the store for commit.
#[derive(Debug, Clone)]
pub struct StagedWrites {
    pub job: Job,
    pub candidacies: Vec<Candidacy>,
    pub completion_credits: Vec<UserId>,
}

impl JobTransaction {
    pub fn new(job: Job, candidacies: Vec<Candidacy>) -> Self {
        Self {
            job,
            candidacies,
            completion_credits: Vec::new(),
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn job_mut(&mut self) -> &mut Job {
        &mut self.job
    }

    pub fn candidacies(&self) -> &[Candidacy] {
        &self.candidacies
    }

    pub fn candidacy(&self, id: &CandidacyId) -> Option<&Candidacy> {
        self.candidacies.iter().find(|row| &row.id == id)
    }

    pub fn candidacy_mut(&mut self, id: &CandidacyId) -> Option<&mut Candidacy> {
        self.candidacies.iter_mut().find(|row| &row.id == id)
    }

    pub fn candidacy_for_worker(&self, worker_id: &UserId) -> Option<&Candidacy> {
        self.candidacies
            .iter()
            .find(|row| &row.worker_id == worker_id)
    }

    /// Row currently bound to the job, if any.
    pub fn holder(&self) -> Option<&Candidacy> {
        self.candidacies.iter().find(|row| row.status.holds_job())
    }

    pub fn candidacies_mut(&mut self) -> impl Iterator<Item = &mut Candidacy> {
        self.candidacies.iter_mut()
    }

    pub fn insert_candidacy(&mut self, candidacy: Candidacy) -> Result<(), StoreError> {
        let duplicate = self.candidacies.iter().any(|row| {
            row.id == candidacy.id
                || (row.job_id == candidacy.job_id && row.worker_id == candidacy.worker_id)
        });
        if duplicate {
            return Err(StoreError::Conflict);
        }
        self.candidacies.push(candidacy);
        Ok(())
    }

    pub fn credit_completed_work(&mut self, user_id: UserId) {
        self.completion_credits.push(user_id);
    }

    pub fn completion_credits(&self) -> &[UserId] {
        &self.completion_credits
    }

    pub fn into_writes(self) -> StagedWrites {
        StagedWrites {
            job: self.job,
            candidacies: self.candidacies,
            completion_credits: self.completion_credits,
        }
    }
}
