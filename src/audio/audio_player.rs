//! Generic audio player interface.

/// A sink for mono float samples at a fixed sample rate.
pub trait AudioPlayer: Send {
    /// Sample rate in Hz.
    fn rate(&self) -> u32;

    /// Play `samples`, blocking until they are accepted.
    ///
    /// Returns `false` when the samples could not be delivered; playback
    /// continues and the caller decides whether to drop, log or escalate.
    fn write(&mut self, samples: &[f32]) -> bool;
}
