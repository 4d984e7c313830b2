//! Scripted in-memory backend for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::backend::{Backend, BackendError, DeviceInfo, OutputStream, StreamParams, WriteStatus};

#[derive(Debug)]
pub struct MockState {
    pub fail_init: Option<String>,
    pub no_device: bool,
    pub fail_open: Option<String>,
    pub fail_start: Option<String>,
    pub device_latency: Duration,
    /// Statuses returned by successive writes; `Complete` once exhausted
    pub write_script: VecDeque<WriteStatus>,

    pub init_calls: usize,
    pub terminate_calls: usize,
    pub device_queries: usize,
    pub opened: Vec<StreamParams>,
    pub writes: Vec<Vec<f32>>,
    /// Stream lifecycle calls in order: "start", "stop", "close"
    pub events: Vec<&'static str>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            fail_init: None,
            no_device: false,
            fail_open: None,
            fail_start: None,
            device_latency: Duration::from_millis(80),
            write_script: VecDeque::new(),
            init_calls: 0,
            terminate_calls: 0,
            device_queries: 0,
            opened: Vec::new(),
            writes: Vec::new(),
            events: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap()
    }

    pub fn script_writes(&self, statuses: &[WriteStatus]) {
        self.state().write_script.extend(statuses.iter().copied());
    }
}

impl Backend for MockBackend {
    type Stream = MockStream;

    fn initialize(&self) -> Result<(), BackendError> {
        let mut state = self.state();
        state.init_calls += 1;
        match &state.fail_init {
            Some(msg) => Err(BackendError(msg.clone())),
            None => Ok(()),
        }
    }

    fn terminate(&self) {
        self.state().terminate_calls += 1;
    }

    fn default_output_device(&self) -> Result<DeviceInfo, BackendError> {
        let mut state = self.state();
        state.device_queries += 1;
        if state.no_device {
            return Err(BackendError("no default output device".to_string()));
        }
        Ok(DeviceInfo {
            name: "mock".to_string(),
            default_high_output_latency: state.device_latency,
        })
    }

    fn open_output(&self, params: &StreamParams) -> Result<MockStream, BackendError> {
        let mut state = self.state();
        if let Some(msg) = &state.fail_open {
            return Err(BackendError(msg.clone()));
        }
        state.opened.push(params.clone());
        Ok(MockStream {
            inner: self.inner.clone(),
        })
    }
}

pub struct MockStream {
    inner: Arc<Mutex<MockState>>,
}

impl OutputStream for MockStream {
    fn start(&mut self) -> Result<(), BackendError> {
        let mut state = self.inner.lock().unwrap();
        state.events.push("start");
        match &state.fail_start {
            Some(msg) => Err(BackendError(msg.clone())),
            None => Ok(()),
        }
    }

    fn write(&mut self, samples: &[f32]) -> WriteStatus {
        let mut state = self.inner.lock().unwrap();
        state.writes.push(samples.to_vec());
        state
            .write_script
            .pop_front()
            .unwrap_or(WriteStatus::Complete)
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        self.inner.lock().unwrap().events.push("stop");
        Ok(())
    }

    fn close(self) {
        self.inner.lock().unwrap().events.push("close");
    }
}
