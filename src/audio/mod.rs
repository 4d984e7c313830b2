//! audio - Mono float playback through ALSA
//!
//! A player opens one blocking output stream on the default device and
//! forwards sample buffers to it. The native library is initialized once per
//! [`AudioContext`] and released by an explicit shutdown.

mod alsa_backend;
pub mod audio_player;
pub mod backend;
mod context;
#[cfg(test)]
pub(crate) mod mock;
mod player;
mod playback;

pub use alsa_backend::{AlsaBackend, AlsaStream, DEFAULT_DEVICE, DEFAULT_HIGH_OUTPUT_LATENCY};
pub use audio_player::AudioPlayer;
pub use context::{AudioContext, LibraryState, ShutdownGuard};
pub use player::{PcmPlayer, PlayerConfig};
pub use playback::{PlaybackStats, PlaybackSystem};
