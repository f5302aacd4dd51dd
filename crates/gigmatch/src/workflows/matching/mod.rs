//! Job candidacy matching: worker interest, consent, assignment, and completion.
//!
//! Each component operates on a staged [`JobTransaction`] so the service can run it under
//! the store's per-job transaction boundary and commit all of its writes at once.

pub mod assignment;
pub mod commands;
pub mod completion;
pub mod consent;
mod directory;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod policy;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use assignment::AssignmentResolver;
pub use commands::{Authority, CandidacyCommand, CommandOutcome};
pub use completion::CompletionTracker;
pub use consent::{ConsentSide, ConsentStateMachine};
pub use domain::{
    AcceptanceState, Candidacy, CandidacyFilter, CandidacyId, CandidacyStatus, CandidacyView,
    Job, JobFilter, JobId, NewJob, NewUser, Role, User, UserFilter, UserId,
};
pub use error::{ConflictKind, MatchingError};
pub use ledger::OfferLedger;
pub use memory::InMemoryStore;
pub use policy::{AssignmentMode, UnknownAssignmentMode};
pub use router::matching_router;
pub use service::MatchingService;
pub use store::{EntityStore, JobTransaction, StagedWrites, StoreError};
