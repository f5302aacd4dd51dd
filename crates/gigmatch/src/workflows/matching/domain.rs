use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered marketplace account.
    UserId
);
entity_id!(
    /// Identifier of a job posting.
    JobId
);
entity_id!(
    /// Identifier of a single (job, worker) candidacy row.
    CandidacyId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Worker,
    Client,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Client => "client",
            Role::Admin => "admin",
        }
    }
}

/// Marketplace account as held by the entity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub is_verified: bool,
    pub city: Option<String>,
    pub service_category: Option<String>,
    pub experience_years: Option<u8>,
    pub hourly_rate: Option<u32>,
    pub completed_works: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_worker(&self) -> bool {
        self.role == Role::Worker
    }
}

/// Signup payload accepted by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub experience_years: Option<u8>,
    #[serde(default)]
    pub hourly_rate: Option<u32>,
}

/// Job posting. `assigned_worker` mirrors the candidacy row currently holding the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: String,
    pub owner_id: UserId,
    pub category: Option<String>,
    pub budget: u32,
    pub location: String,
    pub is_completed: bool,
    pub assigned_worker: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJob {
    pub owner_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub budget: u32,
    pub location: String,
}

/// Persisted lifecycle status of a candidacy row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidacyStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl CandidacyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CandidacyStatus::Pending => "pending",
            CandidacyStatus::Accepted => "accepted",
            CandidacyStatus::Rejected => "rejected",
            CandidacyStatus::Completed => "completed",
        }
    }

    /// Accepted and Completed rows bind the job to their worker.
    pub const fn holds_job(self) -> bool {
        matches!(self, CandidacyStatus::Accepted | CandidacyStatus::Completed)
    }
}

/// Combined acceptance state derived from the status and both consent bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceState {
    Pending,
    WorkerHeld,
    ClientHeld,
    Accepted,
    Rejected,
    Completed,
}

/// A worker's declared interest in one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidacy {
    pub id: CandidacyId,
    pub job_id: JobId,
    pub worker_id: UserId,
    pub worker_accepted: bool,
    pub client_accepted: bool,
    pub status: CandidacyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidacy {
    pub fn pending(job_id: JobId, worker_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: CandidacyId::new(),
            job_id,
            worker_id,
            worker_accepted: false,
            client_accepted: false,
            status: CandidacyStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn acceptance(&self) -> AcceptanceState {
        match self.status {
            CandidacyStatus::Rejected => AcceptanceState::Rejected,
            CandidacyStatus::Completed => AcceptanceState::Completed,
            CandidacyStatus::Accepted => AcceptanceState::Accepted,
            CandidacyStatus::Pending => match (self.worker_accepted, self.client_accepted) {
                (true, false) => AcceptanceState::WorkerHeld,
                (false, true) => AcceptanceState::ClientHeld,
                (true, true) => AcceptanceState::Accepted,
                (false, false) => AcceptanceState::Pending,
            },
        }
    }

    pub fn view(&self) -> CandidacyView {
        CandidacyView {
            id: self.id,
            job_id: self.job_id,
            worker_id: self.worker_id,
            worker_accepted: self.worker_accepted,
            client_accepted: self.client_accepted,
            status: self.status.label(),
            acceptance: self.acceptance(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serialized representation returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidacyView {
    pub id: CandidacyId,
    pub job_id: JobId,
    pub worker_id: UserId,
    pub worker_accepted: bool,
    pub client_accepted: bool,
    pub status: &'static str,
    pub acceptance: AcceptanceState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional filters for candidacy listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidacyFilter {
    #[serde(default)]
    pub job_id: Option<JobId>,
    #[serde(default)]
    pub worker_id: Option<UserId>,
}

impl CandidacyFilter {
    pub fn matches(&self, candidacy: &Candidacy) -> bool {
        self.job_id.map_or(true, |id| candidacy.job_id == id)
            && self.worker_id.map_or(true, |id| candidacy.worker_id == id)
    }
}

/// Directory query over registered users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilter {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub unverified_only: bool,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.role.map_or(true, |role| user.role == role)
            && self.city.as_deref().map_or(true, |city| {
                user.city
                    .as_deref()
                    .is_some_and(|stored| stored.eq_ignore_ascii_case(city))
            })
            && self.service_category.as_deref().map_or(true, |category| {
                user.service_category.as_deref() == Some(category)
            })
            && (!self.unverified_only || !user.is_verified)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub open_only: bool,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        self.owner_id.map_or(true, |id| job.owner_id == id)
            && self
                .category
                .as_deref()
                .map_or(true, |category| job.category.as_deref() == Some(category))
            && (!self.open_only || !job.is_completed)
    }
}
