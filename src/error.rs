//! Error type for data-integrity faults.
//!
//! Negative analysis results (a fragment that does not extend a track, a track
//! that never enters a restrictor) are ordinary values, not errors. Errors are
//! reserved for inputs that cannot be reasoned about at all.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FlightTrackError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlightTrackError {
    /// A track with no trackpoints was passed where at least one is required.
    #[error("empty track: {0}")]
    EmptyTrack(String),

    #[error("invalid restrictor: {0}")]
    InvalidRestrictor(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
