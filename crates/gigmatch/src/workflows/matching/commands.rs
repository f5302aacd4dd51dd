use serde::{Deserialize, Serialize};

use super::domain::{CandidacyView, Job, UserId};
use super::policy::AssignmentMode;

/// Per-role command set accepted against a single candidacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CandidacyCommand {
    WorkerConsent { actor_id: UserId },
    ClientConsent { actor_id: UserId },
    Decline { actor_id: UserId },
    Assign { actor_id: UserId },
    Complete { actor_id: UserId },
}

/// Who may issue a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    CandidacyWorker,
    JobOwner,
    EitherParty,
}

impl Authority {
    /// `worker` is absent for job-scoped commands that carry no candidacy.
    pub fn permits(self, actor: &UserId, worker: Option<&UserId>, owner: &UserId) -> bool {
        match self {
            Authority::CandidacyWorker => worker == Some(actor),
            Authority::JobOwner => actor == owner,
            Authority::EitherParty => worker == Some(actor) || actor == owner,
        }
    }
}

impl CandidacyCommand {
    pub fn actor(&self) -> UserId {
        match *self {
            CandidacyCommand::WorkerConsent { actor_id }
            | CandidacyCommand::ClientConsent { actor_id }
            | CandidacyCommand::Decline { actor_id }
            | CandidacyCommand::Assign { actor_id }
            | CandidacyCommand::Complete { actor_id } => actor_id,
        }
    }

    pub fn authority(&self) -> Authority {
        match self {
            CandidacyCommand::WorkerConsent { .. } => Authority::CandidacyWorker,
            CandidacyCommand::Decline { .. } => Authority::EitherParty,
            CandidacyCommand::ClientConsent { .. }
            | CandidacyCommand::Assign { .. }
            | CandidacyCommand::Complete { .. } => Authority::JobOwner,
        }
    }

    /// Human readable action used in authorization errors and logs.
    pub fn action(&self) -> &'static str {
        match self {
            CandidacyCommand::WorkerConsent { .. } => "give worker consent",
            CandidacyCommand::ClientConsent { .. } => "give client consent",
            CandidacyCommand::Decline { .. } => "decline the candidacy",
            CandidacyCommand::Assign { .. } => "assign the job",
            CandidacyCommand::Complete { .. } => "complete the job",
        }
    }

    pub fn enabled_in(&self, mode: AssignmentMode) -> bool {
        match self {
            CandidacyCommand::WorkerConsent { .. } | CandidacyCommand::ClientConsent { .. } => {
                mode.allows_consent()
            }
            CandidacyCommand::Assign { .. } => mode.allows_assignment(),
            CandidacyCommand::Decline { .. } | CandidacyCommand::Complete { .. } => true,
        }
    }
}

/// Result of dispatching a [`CandidacyCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandOutcome {
    Candidacy(CandidacyView),
    Job(Job),
}
