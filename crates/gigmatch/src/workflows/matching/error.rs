use super::store::StoreError;

/// Error raised by every matching operation.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("user {actor} may not {action}")]
    Unauthorized { actor: String, action: &'static str },
    #[error(transparent)]
    Conflict(#[from] ConflictKind),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("store failure: {0}")]
    Internal(StoreError),
}

impl MatchingError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn unauthorized(actor: impl ToString, action: &'static str) -> Self {
        Self::Unauthorized {
            actor: actor.to_string(),
            action,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            MatchingError::NotFound { .. } => "not_found",
            MatchingError::Unauthorized { .. } => "unauthorized",
            MatchingError::Conflict(kind) => kind.code(),
            MatchingError::Invalid { .. } => "invalid",
            MatchingError::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for MatchingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::MissingJob(id) => MatchingError::not_found("job", id),
            other => MatchingError::Internal(other),
        }
    }
}

/// Uniqueness, race, and final-state violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConflictKind {
    #[error("worker already holds a candidacy for this job")]
    CandidacyExists,
    #[error("job already has an accepted worker")]
    JobAlreadyMatched,
    #[error("job is already completed")]
    JobCompleted,
    #[error("candidacy is no longer open")]
    CandidacyClosed,
    #[error("email address already registered")]
    EmailTaken,
}

impl ConflictKind {
    pub const fn code(self) -> &'static str {
        match self {
            ConflictKind::CandidacyExists => "candidacy_exists",
            ConflictKind::JobAlreadyMatched => "job_already_matched",
            ConflictKind::JobCompleted => "job_completed",
            ConflictKind::CandidacyClosed => "candidacy_closed",
            ConflictKind::EmailTaken => "email_taken",
        }
    }

    /// Whether re-fetching current state and retrying the command can succeed.
    pub const fn retryable(self) -> bool {
        !matches!(self, ConflictKind::EmailTaken)
    }
}
