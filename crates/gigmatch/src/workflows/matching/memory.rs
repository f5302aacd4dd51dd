use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::domain::{
    Candidacy, CandidacyFilter, CandidacyId, Job, JobFilter, JobId, User, UserFilter, UserId,
};
use super::store::{EntityStore, JobTransaction, StagedWrites, StoreError};

/// Process-local [`EntityStore`] backed by hash maps.
///
/// A per-job lock serializes transactions on the same job while the shared data mutex is
/// held only long enough to snapshot or commit.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    job_locks: Mutex<JobLocks>,
}

type JobLocks = HashMap<JobId, Arc<Mutex<()>>>;

#[derive(Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    jobs: HashMap<JobId, Job>,
    // insertion order doubles as the creation-order tie breaker
    candidacies: Vec<Candidacy>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Corrupt("store mutex poisoned".to_string()))
    }

    fn lock_table(&self) -> Result<MutexGuard<'_, JobLocks>, StoreError> {
        self.job_locks
            .lock()
            .map_err(|_| StoreError::Corrupt("job lock table poisoned".to_string()))
    }

    // Entries exist only for stored jobs; delete_job drops them again.
    fn job_lock(&self, id: &JobId) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut locks = self.lock_table()?;
        if let Some(lock) = locks.get(id) {
            return Ok(lock.clone());
        }
        if !self.state()?.jobs.contains_key(id) {
            return Err(StoreError::MissingJob(*id));
        }
        Ok(locks.entry(*id).or_default().clone())
    }

    #[cfg(test)]
    pub(crate) fn tracked_job_locks(&self) -> usize {
        self.lock_table().map_or(0, |locks| locks.len())
    }

    fn commit(&self, writes: StagedWrites) -> Result<(), StoreError> {
        let mut state = self.state()?;

        // validate everything before the first write so a failed commit leaves no trace
        if let Some(missing) = writes
            .completion_credits
            .iter()
            .find(|id| !state.users.contains_key(id))
        {
            return Err(StoreError::Corrupt(format!(
                "completion credit for unknown user {missing}"
            )));
        }
        if !state.jobs.contains_key(&writes.job.id) {
            return Err(StoreError::MissingJob(writes.job.id));
        }

        for user_id in &writes.completion_credits {
            if let Some(user) = state.users.get_mut(user_id) {
                user.completed_works = user.completed_works.saturating_add(1);
            }
        }

        for row in writes.candidacies {
            match state.candidacies.iter_mut().find(|stored| stored.id == row.id) {
                Some(stored) => *stored = row,
                None => state.candidacies.push(row),
            }
        }
        state.jobs.insert(writes.job.id, writes.job);
        Ok(())
    }
}

impl EntityStore for InMemoryStore {
    fn user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.state()?.users.get(id).cloned())
    }

    fn users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let state = self.state()?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|user| filter.matches(user))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut state = self.state()?;
        let taken = state.users.values().any(|stored| {
            stored.id == user.id || stored.email.eq_ignore_ascii_case(&user.email)
        });
        if taken {
            return Err(StoreError::Conflict);
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn set_verified(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let mut state = self.state()?;
        Ok(state.users.get_mut(id).map(|user| {
            user.is_verified = true;
            user.clone()
        }))
    }

    fn job(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.state()?.jobs.get(id).cloned())
    }

    fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        let mut state = self.state()?;
        if state.jobs.contains_key(&job.id) {
            return Err(StoreError::Conflict);
        }
        state.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        let state = self.state()?;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    fn delete_job(&self, id: &JobId) -> Result<(), StoreError> {
        let lock = self.job_lock(id)?;
        let _held = lock
            .lock()
            .map_err(|_| StoreError::Corrupt(format!("job {id} lock poisoned")))?;

        let removed = {
            let mut state = self.state()?;
            if state.jobs.remove(id).is_none() {
                return Err(StoreError::MissingJob(*id));
            }
            let before = state.candidacies.len();
            state.candidacies.retain(|row| &row.job_id != id);
            before - state.candidacies.len()
        };
        self.lock_table()?.remove(id);
        debug!(job_id = %id, removed, "cascaded job delete");
        Ok(())
    }

    fn candidacy(&self, id: &CandidacyId) -> Result<Option<Candidacy>, StoreError> {
        let state = self.state()?;
        Ok(state.candidacies.iter().find(|row| &row.id == id).cloned())
    }

    fn candidacies(&self, filter: &CandidacyFilter) -> Result<Vec<Candidacy>, StoreError> {
        let state = self.state()?;
        let mut rows: Vec<Candidacy> = state
            .candidacies
            .iter()
            .rev()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        // stable sort keeps later inserts first when timestamps tie
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn transaction<T, E, F>(&self, job_id: &JobId, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut JobTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let lock = self.job_lock(job_id)?;
        let _held = lock
            .lock()
            .map_err(|_| StoreError::Corrupt(format!("job {job_id} lock poisoned")))?;

        let mut staged = {
            let state = self.state()?;
            let job = state
                .jobs
                .get(job_id)
                .cloned()
                .ok_or(StoreError::MissingJob(*job_id))?;
            let rows = state
                .candidacies
                .iter()
                .filter(|row| &row.job_id == job_id)
                .cloned()
                .collect();
            JobTransaction::new(job, rows)
        };

        let output = work(&mut staged)?;
        self.commit(staged.into_writes())?;
        Ok(output)
    }
}
