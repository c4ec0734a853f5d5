//! # roomballot-types
//!
//! Shared types, errors, and configuration for the **roomballot** allocation
//! engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`RoomId`], [`PublicationIndex`]
//! - **Preference model**: [`Participant`], [`Ballot`], [`BallotSummary`]
//! - **Matching slots**: [`Entrant`], [`Outcome`]
//! - **Allocation model**: [`Allocation`], [`AllocationRow`], [`Placement`]
//! - **Publication model**: [`PublicArtifact`], [`PublishedRow`], [`PrivateToken`]
//! - **Configuration**: [`BallotConfig`], [`AllocationParams`], [`CostConfig`],
//!   [`CollusionConfig`]
//! - **Errors**: [`BallotError`] with `RB_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod allocation;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod participant;
pub mod publication;
pub mod slot;

// Re-export all primary types at crate root for ergonomic imports:
//   use roomballot_types::{Ballot, Participant, Entrant, Outcome, ...};

pub use allocation::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use participant::*;
pub use publication::*;
pub use slot::*;

// Constants are accessed via `roomballot_types::constants::FOO`
// (not re-exported to avoid name collisions).
