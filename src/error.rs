//! Error types for pcm_player_rs.
//!
//! Construction of a player fails with one of these; steady-state writes never do.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The audio library could not be initialized (or was already shut down)
    #[error("Failed to initialize audio library: {0}")]
    Initialization(String),

    /// No usable output device
    #[error("No usable output device: {0}")]
    Device(String),

    /// The stream could not be opened with the requested parameters
    #[error("Failed to open audio stream: {0}")]
    StreamOpen(String),

    /// The stream opened but could not be started
    #[error("Failed to start audio stream: {0}")]
    StreamStart(String),

    #[error("Failed to spawn playback thread: {0}")]
    Thread(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
