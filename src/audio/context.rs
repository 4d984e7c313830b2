//! Shared audio library context.
//!
//! The native library is initialized lazily by the first player that needs it
//! and released once, by an explicit [`AudioContext::shutdown`] from the
//! process's top-level code or when the last handle to the context is dropped.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use super::alsa_backend::AlsaBackend;
use super::backend::Backend;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryState {
    Uninitialized,
    Ready,
    /// Released; never initialized again
    Terminated,
}

pub struct AudioContext<B: Backend = AlsaBackend> {
    backend: B,
    state: Mutex<LibraryState>,
}

impl AudioContext<AlsaBackend> {
    /// Process-wide ALSA context, created on first use.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<AudioContext<AlsaBackend>>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| AudioContext::new(AlsaBackend))
            .clone()
    }
}

impl<B: Backend> AudioContext<B> {
    pub fn new(backend: B) -> Arc<Self> {
        Arc::new(Self {
            backend,
            state: Mutex::new(LibraryState::Uninitialized),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> LibraryState {
        *self.lock_state()
    }

    /// Initialize the library unless that already happened.
    ///
    /// Concurrent callers are serialized, so the backend initializes at most
    /// once. A failed attempt leaves the context uninitialized and the next
    /// call tries again.
    pub fn ensure_initialized(&self) -> Result<()> {
        let mut state = self.lock_state();
        match *state {
            LibraryState::Ready => Ok(()),
            LibraryState::Terminated => Err(Error::Initialization(
                "audio library has already been shut down".to_string(),
            )),
            LibraryState::Uninitialized => {
                self.backend
                    .initialize()
                    .map_err(|e| Error::Initialization(e.to_string()))?;
                *state = LibraryState::Ready;
                log::info!("Audio library initialized");
                Ok(())
            }
        }
    }

    /// Release the library. Safe to call more than once.
    ///
    /// Streams still open at this point are the caller's responsibility.
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        if *state == LibraryState::Ready {
            self.backend.terminate();
            log::info!("Audio library released");
        }
        *state = LibraryState::Terminated;
    }

    /// Guard that shuts the library down when it goes out of scope, on early
    /// returns and error paths included.
    pub fn shutdown_guard(self: &Arc<Self>) -> ShutdownGuard<B> {
        ShutdownGuard {
            context: self.clone(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, LibraryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Calls [`AudioContext::shutdown`] on drop.
pub struct ShutdownGuard<B: Backend = AlsaBackend> {
    context: Arc<AudioContext<B>>,
}

impl<B: Backend> Drop for ShutdownGuard<B> {
    fn drop(&mut self) {
        self.context.shutdown();
    }
}

impl<B: Backend> Drop for AudioContext<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
