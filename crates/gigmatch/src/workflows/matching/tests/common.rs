use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::workflows::matching::domain::{
    Candidacy, CandidacyFilter, CandidacyId, Job, JobFilter, JobId, NewJob, NewUser, Role, User,
    UserFilter, UserId,
};
use crate::workflows::matching::completion::CompletionTracker;
use crate::workflows::matching::error::MatchingError;
use crate::workflows::matching::memory::InMemoryStore;
use crate::workflows::matching::policy::AssignmentMode;
use crate::workflows::matching::service::MatchingService;
use crate::workflows::matching::store::{EntityStore, JobTransaction, StoreError};

pub(crate) fn open_job() -> Job {
    Job {
        id: JobId::new(),
        title: "Fix leaking kitchen tap".to_string(),
        description: "Mixer tap drips constantly".to_string(),
        owner_id: UserId::new(),
        category: Some("plumbing".to_string()),
        budget: 100,
        location: "Pune".to_string(),
        is_completed: false,
        assigned_worker: None,
        created_at: Utc::now(),
    }
}

pub(crate) fn transaction_for(job: &Job, rows: Vec<Candidacy>) -> JobTransaction {
    JobTransaction::new(job.clone(), rows)
}

pub(crate) fn client_signup(name: &str) -> NewUser {
    NewUser {
        full_name: name.to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase().replace(' ', ".")),
        role: Role::Client,
        city: Some("Pune".to_string()),
        service_category: None,
        experience_years: None,
        hourly_rate: None,
    }
}

pub(crate) fn worker_signup(name: &str) -> NewUser {
    NewUser {
        full_name: name.to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase().replace(' ', ".")),
        role: Role::Worker,
        city: Some("Pune".to_string()),
        service_category: Some("plumbing".to_string()),
        experience_years: Some(4),
        hourly_rate: Some(350),
    }
}

pub(crate) fn job_posting(owner_id: UserId) -> NewJob {
    NewJob {
        owner_id,
        title: "Fix leaking kitchen tap".to_string(),
        description: "Mixer tap drips constantly".to_string(),
        category: Some("plumbing".to_string()),
        budget: 100,
        location: "Pune".to_string(),
    }
}

/// A client with one open job and two registered workers.
pub(crate) struct Marketplace<S> {
    pub(crate) service: Arc<MatchingService<S>>,
    pub(crate) owner: User,
    pub(crate) worker_a: User,
    pub(crate) worker_b: User,
    pub(crate) job: Job,
}

pub(crate) fn marketplace() -> (Marketplace<InMemoryStore>, Arc<InMemoryStore>) {
    marketplace_with_mode(AssignmentMode::Both)
}

pub(crate) fn marketplace_with_mode(
    mode: AssignmentMode,
) -> (Marketplace<InMemoryStore>, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let service = Arc::new(MatchingService::new(store.clone(), mode));
    (seed(service), store)
}

pub(crate) fn seed<S: EntityStore + 'static>(service: Arc<MatchingService<S>>) -> Marketplace<S> {
    let owner = service
        .register_user(client_signup("Asha Client"))
        .expect("client registers");
    let worker_a = service
        .register_user(worker_signup("Ravi Worker"))
        .expect("worker a registers");
    let worker_b = service
        .register_user(worker_signup("Meena Worker"))
        .expect("worker b registers");
    let job = service
        .post_job(job_posting(owner.id))
        .expect("job posts");
    Marketplace {
        service,
        owner,
        worker_a,
        worker_b,
        job,
    }
}

/// Store wrapper that can refuse commits after the work has run, or commit a job completion
/// right before the next verification write lands.
#[derive(Default)]
pub(crate) struct FlakyStore {
    pub(crate) inner: InMemoryStore,
    pub(crate) refuse_commits: AtomicBool,
    pub(crate) complete_before_verify: Mutex<Option<JobId>>,
}

impl FlakyStore {
    pub(crate) fn refuse_commits(&self, refuse: bool) {
        self.refuse_commits.store(refuse, Ordering::SeqCst);
    }

    pub(crate) fn complete_before_verify(&self, job_id: JobId) {
        *self.complete_before_verify.lock().expect("hook mutex") = Some(job_id);
    }
}

impl EntityStore for FlakyStore {
    fn user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.inner.user(id)
    }

    fn users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        self.inner.users(filter)
    }

    fn insert_user(&self, user: User) -> Result<User, StoreError> {
        self.inner.insert_user(user)
    }

    fn set_verified(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let queued = self.complete_before_verify.lock().expect("hook mutex").take();
        if let Some(job_id) = queued {
            self.inner
                .transaction(&job_id, |tx| -> Result<Job, MatchingError> {
                    CompletionTracker::finalize(tx, Utc::now())
                })
                .expect("interleaved completion commits");
        }
        self.inner.set_verified(id)
    }

    fn job(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        self.inner.job(id)
    }

    fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        self.inner.insert_job(job)
    }

    fn jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        self.inner.jobs(filter)
    }

    fn delete_job(&self, id: &JobId) -> Result<(), StoreError> {
        self.inner.delete_job(id)
    }

    fn candidacy(&self, id: &CandidacyId) -> Result<Option<Candidacy>, StoreError> {
        self.inner.candidacy(id)
    }

    fn candidacies(&self, filter: &CandidacyFilter) -> Result<Vec<Candidacy>, StoreError> {
        self.inner.candidacies(filter)
    }

    fn transaction<T, E, F>(&self, job_id: &JobId, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut JobTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.inner.transaction(job_id, |tx| {
            let output = work(tx)?;
            if self.refuse_commits.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("commit refused".to_string()).into());
            }
            Ok(output)
        })
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
