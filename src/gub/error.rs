use thiserror::Error;

/// Error type returned by the GUB layers.
///
/// These replace internal consistency checks: a driver receiving one
/// should rebuild its basis from scratch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GubError {
    #[error("Set member ranges overlap or are out of order")]
    OverlappingSets,
    #[error("Set lower bound exceeds its upper bound")]
    BadSetBounds,
    #[error("Set {0} has no basic member to become its key")]
    NoBasicMember(usize),
    #[error("Column is not a member of the set")]
    NotAMember,
    #[error("Sequence is out of range or has no column")]
    UnknownSequence,
    #[error("No free slot in the dynamic column window")]
    WindowFull,
    #[error("Vector length does not match the matrix")]
    IncompatibleDimension,
}
