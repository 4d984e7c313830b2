//! Dedicated playback thread.
//!
//! Uses std::thread (NOT a tokio task) because every write blocks until the
//! device accepts the samples. The thread waits for buffers on a private
//! current-thread runtime so a stop request can wake it even while senders
//! are still alive.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::runtime::{self, Runtime};
use tokio::sync::{mpsc, oneshot};

use super::backend::Backend;
use super::context::AudioContext;
use super::player::{PcmPlayer, PlayerConfig};
use crate::error::Result;

/// Counters reported when the playback thread finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub buffers_written: u64,
    pub buffers_dropped: u64,
    pub underflows: u64,
}

/// Owns a player on its own thread and feeds it from a channel.
///
/// - Playback thread: `rx` → `PcmPlayer::write`
pub struct PlaybackSystem {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<PlaybackStats>>,
}

impl PlaybackSystem {
    /// Open the player on the calling thread and hand it to a playback thread.
    ///
    /// Construction errors are returned here; nothing is spawned on failure.
    pub fn start<B: Backend + 'static>(
        context: Arc<AudioContext<B>>,
        config: PlayerConfig,
        rx: mpsc::Receiver<Vec<f32>>,
    ) -> Result<Self> {
        let player = PcmPlayer::open(context, &config)?;
        let runtime = runtime::Builder::new_current_thread().build()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = thread::Builder::new()
            .name("audio-play".into())
            .spawn(move || play_thread(player, rx, shutdown_rx, runtime))?;

        Ok(Self {
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Wait for the playback thread to drain its channel and exit.
    ///
    /// The thread exits once every sender has been dropped.
    pub fn finish(mut self) -> PlaybackStats {
        self.join()
    }

    /// Stop playback now, discarding queued buffers.
    ///
    /// Returns once the current write has finished and the stream is closed.
    pub fn stop(&mut self) -> PlaybackStats {
        if let Some(shutdown) = self.shutdown.take() {
            // The thread may already be gone
            let _ = shutdown.send(());
        }
        self.join()
    }

    fn join(&mut self) -> PlaybackStats {
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                log::error!("Playback thread panicked");
                PlaybackStats::default()
            }
            None => PlaybackStats::default(),
        }
    }
}

impl Drop for PlaybackSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

enum Next {
    Buffer(Vec<f32>),
    Closed,
    Shutdown,
}

fn play_thread<B: Backend>(
    mut player: PcmPlayer<B>,
    mut rx: mpsc::Receiver<Vec<f32>>,
    mut shutdown: oneshot::Receiver<()>,
    runtime: Runtime,
) -> PlaybackStats {
    let mut stats = PlaybackStats::default();

    log::info!(
        "Playback started: rate={}, buffer_size={}",
        player.rate(),
        player.buffer_size()
    );

    loop {
        // Block until we receive a buffer, the channel closes or stop is requested
        let next = runtime.block_on(async {
            tokio::select! {
                biased;
                _ = &mut shutdown => Next::Shutdown,
                msg = rx.recv() => match msg {
                    Some(samples) => Next::Buffer(samples),
                    None => Next::Closed,
                },
            }
        });

        match next {
            Next::Buffer(samples) => {
                if samples.is_empty() {
                    continue;
                }
                if player.write(&samples) {
                    stats.buffers_written += 1;
                } else {
                    stats.buffers_dropped += 1;
                    log::warn!("Dropped {} samples after failed write", samples.len());
                }
            }
            Next::Closed => {
                log::info!("Playback channel closed");
                break;
            }
            Next::Shutdown => {
                log::info!("Playback stop requested");
                break;
            }
        }
    }

    stats.underflows = player.underflows();
    player.close();
    log::info!("Playback stopped");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::WriteStatus;
    use crate::audio::mock::MockBackend;
    use crate::error::Error;

    fn config() -> PlayerConfig {
        PlayerConfig {
            buffer_size: 16,
            ..PlayerConfig::default()
        }
    }

    #[test]
    fn writes_every_queued_buffer() {
        let backend = MockBackend::new();
        let ctx = AudioContext::new(backend.clone());
        let (tx, rx) = mpsc::channel(4);

        let system = PlaybackSystem::start(ctx, config(), rx).unwrap();
        for i in 0..6 {
            tx.blocking_send(vec![i as f32; 16]).unwrap();
        }
        drop(tx);

        let stats = system.finish();
        assert_eq!(
            stats,
            PlaybackStats {
                buffers_written: 6,
                buffers_dropped: 0,
                underflows: 0,
            }
        );

        let state = backend.state();
        assert_eq!(state.writes.len(), 6);
        assert_eq!(state.writes[5], vec![5.0; 16]);
        assert_eq!(state.events, vec!["start", "stop", "close"]);
    }

    #[test]
    fn failed_writes_are_counted_as_dropped() {
        let backend = MockBackend::new();
        backend.script_writes(&[
            WriteStatus::Underflow { written: 0 },
            WriteStatus::Complete,
            WriteStatus::Failed,
        ]);
        let ctx = AudioContext::new(backend.clone());
        let (tx, rx) = mpsc::channel(4);

        let system = PlaybackSystem::start(ctx, config(), rx).unwrap();
        tx.blocking_send(vec![0.0; 16]).unwrap();
        tx.blocking_send(vec![0.0; 16]).unwrap();
        tx.blocking_send(Vec::new()).unwrap();
        drop(tx);

        let stats = system.finish();
        assert_eq!(stats.buffers_written, 1);
        assert_eq!(stats.buffers_dropped, 1);
        assert_eq!(stats.underflows, 1);
        assert_eq!(backend.state().writes.len(), 3);
    }

    #[test]
    fn drop_closes_stream_while_sender_is_alive() {
        let backend = MockBackend::new();
        let ctx = AudioContext::new(backend.clone());
        let (tx, rx) = mpsc::channel(4);

        let system = PlaybackSystem::start(ctx, config(), rx).unwrap();
        tx.blocking_send(vec![0.0; 16]).unwrap();
        thread::sleep(std::time::Duration::from_millis(50));
        drop(system);

        assert_eq!(backend.state().events, vec!["start", "stop", "close"]);
        assert!(tx.blocking_send(vec![0.0; 16]).is_err());
    }

    #[test]
    fn stop_reports_stats_and_is_repeatable() {
        let backend = MockBackend::new();
        let ctx = AudioContext::new(backend.clone());
        let (tx, rx) = mpsc::channel(4);

        let mut system = PlaybackSystem::start(ctx, config(), rx).unwrap();
        tx.blocking_send(vec![0.0; 16]).unwrap();
        while backend.state().writes.is_empty() {
            thread::yield_now();
        }

        let stats = system.stop();
        assert_eq!(stats.buffers_written, 1);
        assert_eq!(system.stop(), PlaybackStats::default());
        drop(system);
        assert_eq!(backend.state().events, vec!["start", "stop", "close"]);
    }

    #[test]
    fn construction_errors_surface_synchronously() {
        let backend = MockBackend::new();
        backend.state().no_device = true;
        let ctx = AudioContext::new(backend.clone());
        let (_tx, rx) = mpsc::channel(1);

        assert!(matches!(
            PlaybackSystem::start(ctx, config(), rx),
            Err(Error::Device(_))
        ));
    }
}
