//! Error types for the roomballot engine.
//!
//! All errors use the `RB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Input malformation
//! - 2xx: Configuration errors
//! - 3xx: Solver precondition violations
//! - 4xx: Internal invariant violations
//! - 5xx: Anonymisation errors
//! - 6xx: Verification failures
//! - 9xx: General / I/O errors

use thiserror::Error;

/// Coarse classification of a [`BallotError`].
///
/// Lets callers tell user mistakes apart from bugs in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input data; the user can fix it.
    Input,
    /// Bad configuration; the user can fix it.
    Config,
    /// A programming error at an internal API boundary.
    Precondition,
    /// The engine produced an impossible result.
    Invariant,
    /// Secret material could not be generated.
    Anonymization,
    /// A claimed identity did not check out.
    Verification,
    /// Disk or serialization failure.
    Io,
}

/// Central error enum for all roomballot operations.
#[derive(Debug, Error)]
pub enum BallotError {
    // =================================================================
    // Input Errors (1xx)
    // =================================================================
    /// The ballot has no participants.
    #[error("RB_ERR_100: Ballot has no participants")]
    EmptyBallot,

    /// Participants listed different numbers of choices.
    #[error(
        "RB_ERR_101: Ragged preferences: participant {participant} made {actual} choices, expected {expected}"
    )]
    RaggedPreferences {
        participant: usize,
        expected: usize,
        actual: usize,
    },

    /// A priority field was not a positive integer.
    #[error("RB_ERR_102: Invalid priority for participant {participant}: {value:?}")]
    InvalidPriority { participant: usize, value: String },

    /// A required field was empty or absent.
    #[error("RB_ERR_103: Missing {field} for participant {participant}")]
    MissingField {
        participant: usize,
        field: &'static str,
    },

    /// Every participant listed zero choices.
    #[error("RB_ERR_104: Participants must list at least one choice")]
    NoChoices,

    /// A collusion prefix longer than the shared preference length was requested.
    #[error("RB_ERR_105: Prefix length {requested} exceeds the {choices} choices per participant")]
    InvalidPrefixLength { requested: usize, choices: usize },

    // =================================================================
    // Configuration Errors (2xx)
    // =================================================================
    /// A configuration value breaks the cost ordering or is out of range.
    #[error("RB_ERR_200: Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // =================================================================
    // Solver Precondition Errors (3xx)
    // =================================================================
    /// The two sides handed to the assignment solver differ in length.
    #[error("RB_ERR_300: Assignment requires equal sides: {agents} agents vs {tasks} tasks")]
    DimensionMismatch { agents: usize, tasks: usize },

    /// The cost function returned NaN or an infinity.
    #[error("RB_ERR_301: Non-finite cost at ({row}, {col})")]
    NonFiniteCost { row: usize, col: usize },

    // =================================================================
    // Invariant Errors (4xx)
    // =================================================================
    /// The solver placed someone in a room they never listed.
    #[error("RB_ERR_400: Participant {participant} assigned unwanted room {room}")]
    UnwantedAssignment { participant: usize, room: String },

    /// The solver output is not a permutation.
    #[error("RB_ERR_401: Assignment is not a bijection: {reason}")]
    NotABijection { reason: String },

    // =================================================================
    // Anonymisation Errors (5xx)
    // =================================================================
    /// A name is too long to pad without truncation.
    #[error("RB_ERR_500: Name of participant {participant} is {len} bytes, limit is {max}")]
    NameTooLong {
        participant: usize,
        len: usize,
        max: usize,
    },

    // =================================================================
    // Verification Errors (6xx)
    // =================================================================
    /// The claim did not match the published result. Carries no detail.
    #[error("RB_ERR_600: Verification failed")]
    VerificationFailed,

    /// The public artifact digest does not match its contents.
    #[error("RB_ERR_601: Public artifact digest mismatch")]
    ArtifactTampered,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("RB_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("RB_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (disk).
    #[error("RB_ERR_903: I/O error: {0}")]
    Io(String),
}

impl BallotError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyBallot
            | Self::RaggedPreferences { .. }
            | Self::InvalidPriority { .. }
            | Self::MissingField { .. }
            | Self::NoChoices
            | Self::InvalidPrefixLength { .. } => ErrorKind::Input,
            Self::InvalidConfig { .. } => ErrorKind::Config,
            Self::DimensionMismatch { .. } | Self::NonFiniteCost { .. } => {
                ErrorKind::Precondition
            }
            Self::UnwantedAssignment { .. } | Self::NotABijection { .. } | Self::Internal(_) => {
                ErrorKind::Invariant
            }
            Self::NameTooLong { .. } => ErrorKind::Anonymization,
            Self::VerificationFailed | Self::ArtifactTampered => ErrorKind::Verification,
            Self::Serialization(_) | Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether the user can fix this by changing their input or config.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Input | ErrorKind::Config | ErrorKind::Anonymization
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BallotError>;

impl From<std::io::Error> for BallotError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BallotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
