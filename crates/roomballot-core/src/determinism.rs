//! Determinism checks for allocation runs.
//!
//! Two runs over the same ballot, shuffled with the same seed, must produce
//! the same rows in the same order. The `allocation_root` hash lets tests and
//! audit logs compare runs without diffing full payloads.

use roomballot_types::{AllocationRow, Placement};
use sha2::{Digest, Sha256};

/// Compute the allocation root over a set of rows.
///
/// Commits to, in row order: participant id, ballot position, priority,
/// preferences and placement. Display names are left out.
#[must_use]
pub fn compute_allocation_root(rows: &[AllocationRow]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"roomballot:allocation_root:v1:");
    hasher.update((rows.len() as u64).to_le_bytes());

    for row in rows {
        let p = &row.participant;
        hasher.update((p.id.len() as u64).to_le_bytes());
        hasher.update(p.id.as_bytes());
        hasher.update((row.ballot_position as u64).to_le_bytes());
        hasher.update(p.priority.to_le_bytes());
        hasher.update((p.preferences.len() as u64).to_le_bytes());
        for room in &p.preferences {
            hasher.update((room.0.len() as u64).to_le_bytes());
            hasher.update(room.0.as_bytes());
        }
        match &row.placement {
            Placement::Room { room, rank } => {
                hasher.update([0u8]);
                hasher.update((*rank as u64).to_le_bytes());
                hasher.update(room.0.as_bytes());
            }
            Placement::Kicked { pre_removed } => {
                hasher.update([1u8, u8::from(*pre_removed)]);
            }
        }
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Recompute the root and compare it with `expected_root`.
#[must_use]
pub fn verify_allocation_root(rows: &[AllocationRow], expected_root: &[u8; 32]) -> bool {
    compute_allocation_root(rows) == *expected_root
}
