//! pcm_player_rs - mono float audio output on the default ALSA device.

pub mod audio;
pub mod config;
pub mod error;

pub use audio::{AudioContext, AudioPlayer, PcmPlayer, PlaybackSystem, PlayerConfig};
pub use error::{Error, Result};
