//! # roomballot-secrets
//!
//! Publishes who-got-what without publishing who-is-who.
//!
//! - [`pad`]: fixed-width names, one-time pads, XOR secret identities
//! - [`publish`]: content-seeded publication order and the artifact digest
//! - [`anonymizer`]: turns an [`Allocation`](roomballot_types::Allocation)
//!   into a [`PublicArtifact`](roomballot_types::PublicArtifact) plus one
//!   private token per participant
//! - [`verify`]: checks a participant's claim against a loaded artifact
//! - [`replay`]: re-runs the matching from a loaded artifact alone
//!
//! Two random sources are involved and both are passed in: an
//! entropy-backed one for pads, and a generator seeded from the name list
//! for the publication order.

pub mod anonymizer;
pub mod pad;
pub mod publish;
pub mod replay;
pub mod verify;

pub use anonymizer::{Anonymizer, Publication};
pub use pad::{SecretRecord, generate_pad, pad_name, xor};
pub use publish::{
    artifact_from_json, artifact_to_json, audit_publication_order, compute_artifact_digest,
    publication_order, publication_seed, verify_artifact_digest,
};
pub use replay::{ReplayReport, replay_allocation};
pub use verify::{Claim, verify_claim, verify_secret};
