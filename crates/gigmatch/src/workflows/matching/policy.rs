use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selects which acceptance paths may bind a worker to a job.
///
/// Both paths uphold the same single-holder invariant; the mode only decides which commands
/// are accepted from the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// Worker and client each record consent on the candidacy.
    DualConsent,
    /// The job owner picks one worker from the applicant pool.
    ClientAssignment,
    #[default]
    Both,
}

impl AssignmentMode {
    pub const fn allows_consent(self) -> bool {
        matches!(self, AssignmentMode::DualConsent | AssignmentMode::Both)
    }

    pub const fn allows_assignment(self) -> bool {
        matches!(self, AssignmentMode::ClientAssignment | AssignmentMode::Both)
    }

    pub const fn label(self) -> &'static str {
        match self {
            AssignmentMode::DualConsent => "dual_consent",
            AssignmentMode::ClientAssignment => "client_assignment",
            AssignmentMode::Both => "both",
        }
    }
}

impl fmt::Display for AssignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown assignment mode '{0}'")]
pub struct UnknownAssignmentMode(pub String);

impl FromStr for AssignmentMode {
    type Err = UnknownAssignmentMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dual_consent" | "dual-consent" | "consent" => Ok(Self::DualConsent),
            "client_assignment" | "client-assignment" | "assign" => Ok(Self::ClientAssignment),
            "both" | "" => Ok(Self::Both),
            other => Err(UnknownAssignmentMode(other.to_string())),
        }
    }
}
