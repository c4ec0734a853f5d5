//! System-wide constants for the roomballot engine.

/// Fixed width every real name is padded to before anonymisation.
pub const NAME_WIDTH: usize = 32;

/// Byte used to right-pad names up to [`NAME_WIDTH`].
pub const PAD_FILLER: u8 = b' ';

/// Upper bound of the cost of any wanted room (the last choice costs exactly this).
pub const DEFAULT_CUT: f64 = 0.99;

/// Sentinel cost of assigning a participant to a room they did not list.
pub const DEFAULT_UNWANTED_COST: f64 = 500.0;

/// Base cost of being kicked off the ballot.
pub const DEFAULT_KICK_COST: f64 = 1.5;

/// Extra kick cost, divided by priority; priority 1 is the most expensive to kick.
pub const DEFAULT_KICK_PRIORITY_WEIGHT: f64 = 0.25;

/// Amount subtracted from the cost of a room in a desirable category.
pub const DEFAULT_CATEGORY_BIAS: f64 = 0.001;

/// Pairwise overlap size the full-preference collusion scan flags by default.
pub const DEFAULT_OVERLAP_THRESHOLD: usize = 6;

/// Label written in place of a room for kicked participants.
pub const KICKED_LABEL: &str = "KICKED";

/// Format version of the public artifact.
pub const ARTIFACT_VERSION: u32 = 2;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "roomballot";
