use chrono::Utc;
use tracing::{debug, info};

use super::domain::{Job, JobFilter, JobId, NewJob, NewUser, Role, User, UserFilter, UserId};
use super::error::{ConflictKind, MatchingError};
use super::service::MatchingService;
use super::store::{EntityStore, StoreError};

/// Account and job-posting bookkeeping around the matching core.
impl<S> MatchingService<S>
where
    S: EntityStore + 'static,
{
    pub fn register_user(&self, signup: NewUser) -> Result<User, MatchingError> {
        validate_signup(&signup)?;

        let NewUser {
            full_name,
            email,
            role,
            city,
            service_category,
            experience_years,
            hourly_rate,
        } = signup;
        let user = User {
            id: UserId::new(),
            full_name: full_name.trim().to_string(),
            email: email.trim().to_ascii_lowercase(),
            role,
            is_verified: false,
            city: city
                .map(|city| city.trim().to_string())
                .filter(|city| !city.is_empty()),
            service_category,
            experience_years,
            hourly_rate,
            completed_works: 0,
            created_at: Utc::now(),
        };

        let stored = self.store.insert_user(user).map_err(|err| match err {
            StoreError::Conflict => MatchingError::Conflict(ConflictKind::EmailTaken),
            other => other.into(),
        })?;
        info!(user_id = %stored.id, role = stored.role.label(), "user registered");
        Ok(stored)
    }

    /// Admins flag accounts whose documents have been checked.
    pub fn verify_user(&self, user_id: UserId, actor_id: UserId) -> Result<User, MatchingError> {
        let actor = self.get_user(&actor_id)?;
        if actor.role != Role::Admin {
            return Err(MatchingError::unauthorized(actor_id, "verify users"));
        }

        let user = self
            .store
            .set_verified(&user_id)?
            .ok_or_else(|| MatchingError::not_found("user", user_id))?;
        info!(user_id = %user_id, actor_id = %actor_id, "user verified");
        Ok(user)
    }

    /// Directory listing; `unverified_only` backs the admin review queue.
    pub fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, MatchingError> {
        let users = self.store.users(filter)?;
        debug!(count = users.len(), ?filter, "listed users");
        Ok(users)
    }

    pub fn get_user(&self, id: &UserId) -> Result<User, MatchingError> {
        self.store
            .user(id)?
            .ok_or_else(|| MatchingError::not_found("user", id))
    }

    pub fn post_job(&self, posting: NewJob) -> Result<Job, MatchingError> {
        let owner = self
            .store
            .user(&posting.owner_id)?
            .ok_or_else(|| MatchingError::invalid("owner_id", "user does not exist"))?;
        if owner.role != Role::Client {
            return Err(MatchingError::invalid(
                "owner_id",
                format!("user {} is not registered as a client", owner.id),
            ));
        }
        if posting.title.trim().is_empty() {
            return Err(MatchingError::invalid("title", "must not be empty"));
        }
        if posting.budget == 0 {
            return Err(MatchingError::invalid("budget", "must be greater than zero"));
        }
        if posting.location.trim().is_empty() {
            return Err(MatchingError::invalid("location", "must not be empty"));
        }

        let job = Job {
            id: JobId::new(),
            title: posting.title.trim().to_string(),
            description: posting.description,
            owner_id: posting.owner_id,
            category: posting.category,
            budget: posting.budget,
            location: posting.location.trim().to_string(),
            is_completed: false,
            assigned_worker: None,
            created_at: Utc::now(),
        };
        let stored = self.store.insert_job(job)?;
        info!(job_id = %stored.id, owner_id = %stored.owner_id, budget = stored.budget, "job posted");
        Ok(stored)
    }

    pub fn get_job(&self, id: &JobId) -> Result<Job, MatchingError> {
        self.job(id)
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, MatchingError> {
        Ok(self.store.jobs(filter)?)
    }

    /// Owner removes an open posting together with its candidacy pool.
    pub fn withdraw_job(&self, job_id: JobId, actor_id: UserId) -> Result<(), MatchingError> {
        let job = self.job(&job_id)?;
        if job.owner_id != actor_id {
            return Err(MatchingError::unauthorized(actor_id, "withdraw the job"));
        }
        if job.is_completed {
            return Err(ConflictKind::JobCompleted.into());
        }

        self.store.delete_job(&job_id)?;
        info!(job_id = %job_id, "job withdrawn");
        Ok(())
    }
}

fn validate_signup(signup: &NewUser) -> Result<(), MatchingError> {
    if signup.full_name.trim().is_empty() {
        return Err(MatchingError::invalid("full_name", "must not be empty"));
    }
    let email = signup.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(MatchingError::invalid("email", "must be a valid address")),
    }

    if signup.role == Role::Worker {
        if signup
            .service_category
            .as_deref()
            .map_or(true, |category| category.trim().is_empty())
        {
            return Err(MatchingError::invalid(
                "service_category",
                "is required for workers",
            ));
        }
        if signup.experience_years.is_none() {
            return Err(MatchingError::invalid(
                "experience_years",
                "is required for workers",
            ));
        }
        if signup.hourly_rate.map_or(true, |rate| rate == 0) {
            return Err(MatchingError::invalid("hourly_rate", "is required for workers"));
        }
    }
    Ok(())
}
