//! # roomballot-core
//!
//! **Pure allocation engine for roomballot.**
//!
//! Takes a validated [`Ballot`](roomballot_types::Ballot) and produces the
//! globally cheapest one-to-one [`Allocation`](roomballot_types::Allocation):
//!
//! - **Cost model**: preference rank, priority and room category to a scalar
//! - **Balancer**: capacity pre-removal, kicked slots and padding to a square problem
//! - **Solver**: exact minimum-cost perfect matching behind a narrow trait
//! - **Collusion scan**: read-only grouping of shared preference prefixes
//!
//! ```text
//! Ballot → shuffle → Balancer → CostMatrix → AssignmentSolver → Allocation
//! ```
//!
//! No I/O and no ambient randomness: every random source is passed in.

pub mod allocator;
pub mod balancer;
pub mod collusion;
pub mod cost;
pub mod determinism;
pub mod solver;

pub use allocator::{Allocator, shuffle_ballot};
pub use balancer::{BalancedProblem, Balancer};
pub use collusion::{
    CollusionCluster, CollusionReport, OverlapPair, find_overlaps, find_prefix_clusters, scan,
};
pub use cost::CostModel;
pub use determinism::{compute_allocation_root, verify_allocation_root};
pub use solver::{
    AssignmentSolver, CostMatrix, HungarianSolver, linear_assignment, verify_permutation,
};
