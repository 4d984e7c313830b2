//! The seam between a player and the native audio library it drives.

use std::time::Duration;
use thiserror::Error;

/// Diagnostic text reported by the native audio library.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl From<alsa::Error> for BackendError {
    fn from(err: alsa::Error) -> Self {
        BackendError(err.to_string())
    }
}

/// Output device resolved by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    /// Latency the device reports as safe for non-interactive playback
    pub default_high_output_latency: Duration,
}

/// Parameters used only while opening an output stream.
///
/// Samples are always 32-bit float; there is no format negotiation.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamParams {
    pub device: String,
    pub channels: u32,
    pub suggested_latency: Duration,
    pub sample_rate: u32,
    pub frames_per_buffer: usize,
}

/// Outcome of a single blocking write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Complete,
    /// The device ran dry after `written` samples were accepted; the stream
    /// has been re-armed
    Underflow { written: usize },
    Failed,
}

/// A native audio library capable of opening blocking output streams.
pub trait Backend: Send + Sync {
    type Stream: OutputStream;

    /// Initialize process-wide library state.
    fn initialize(&self) -> Result<(), BackendError>;

    /// Release process-wide library state.
    fn terminate(&self);

    fn default_output_device(&self) -> Result<DeviceInfo, BackendError>;

    fn open_output(&self, params: &StreamParams) -> Result<Self::Stream, BackendError>;
}

/// An open output stream in blocking-write mode.
pub trait OutputStream: Send {
    fn start(&mut self) -> Result<(), BackendError>;

    /// Block until `samples` are accepted by the library.
    fn write(&mut self, samples: &[f32]) -> WriteStatus;

    /// Stop the stream, letting queued audio play out.
    fn stop(&mut self) -> Result<(), BackendError>;

    /// Release the native stream handle.
    fn close(self);
}
