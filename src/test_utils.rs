//! Scripted fakes for the agent's hardware and network seams.
//!
//! Each fake hands out a cloneable handle so a test can inspect or steer it
//! after ownership has moved into a cycle.

#![cfg(any(test, feature = "benchmark"))]

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::clock::Clock;
use crate::link::Link;
use crate::sensor::{TemperatureSensor, WaveformSensor};
use crate::transport::{Transport, TransportError, TransportResponse};
use crate::types::Sample;
use crate::{AgentError, Result};

#[derive(Debug, Default)]
struct WaveformState {
    advanced: AtomicUsize,
    unavailable: AtomicBool,
    init_failures: AtomicU32,
}

/// Waveform sensor producing sample `i` as `(i, 1000 + i)`.
///
/// The read cursor persists across fills.
#[derive(Debug, Clone)]
pub struct ScriptedWaveform {
    cursor: u32,
    stall_at: Option<u32>,
    state: Arc<WaveformState>,
}

impl ScriptedWaveform {
    pub fn always_ready() -> Self {
        Self { cursor: 0, stall_at: None, state: Arc::default() }
    }

    /// Stops reporting data once `count` samples have been consumed.
    pub fn stalls_after(count: u32) -> Self {
        Self { stall_at: Some(count), ..Self::always_ready() }
    }

    /// Fail `failures` initialization attempts before succeeding.
    pub fn with_init_failures(self, failures: u32) -> Self {
        self.state.init_failures.store(failures, Ordering::SeqCst);
        self
    }

    pub fn handle(&self) -> WaveformHandle {
        WaveformHandle { state: Arc::clone(&self.state) }
    }
}

impl WaveformSensor for ScriptedWaveform {
    fn initialize(&mut self) -> Result<()> {
        fail_once(&self.state.init_failures, "waveform")
    }

    fn data_available(&mut self) -> bool {
        if self.state.unavailable.load(Ordering::SeqCst) {
            return false;
        }
        self.stall_at.is_none_or(|limit| self.cursor < limit)
    }

    fn read_sample(&mut self) -> Sample {
        Sample::new(self.cursor, 1000 + self.cursor)
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.state.advanced.fetch_add(1, Ordering::SeqCst);
    }
}

/// Inspects and steers a [`ScriptedWaveform`].
#[derive(Debug, Clone)]
pub struct WaveformHandle {
    state: Arc<WaveformState>,
}

impl WaveformHandle {
    /// Samples consumed so far.
    pub fn advanced(&self) -> usize {
        self.state.advanced.load(Ordering::SeqCst)
    }

    pub fn set_available(&self, available: bool) {
        self.state.unavailable.store(!available, Ordering::SeqCst);
    }
}

/// Temperature sensor with a constant reading.
#[derive(Debug, Clone)]
pub struct FixedTemperature {
    celsius: f32,
    init_failures: Arc<AtomicU32>,
}

impl FixedTemperature {
    pub fn new(celsius: f32) -> Self {
        Self { celsius, init_failures: Arc::default() }
    }

    pub fn with_init_failures(self, failures: u32) -> Self {
        self.init_failures.store(failures, Ordering::SeqCst);
        self
    }
}

impl TemperatureSensor for FixedTemperature {
    fn initialize(&mut self) -> Result<()> {
        fail_once(&self.init_failures, "temperature")
    }

    fn read_temperature_c(&mut self) -> f32 {
        self.celsius
    }
}

fn fail_once(remaining: &AtomicU32, sensor: &str) -> Result<()> {
    let left = remaining.load(Ordering::SeqCst);
    if left == 0 {
        return Ok(());
    }
    remaining.store(left - 1, Ordering::SeqCst);
    Err(AgentError::sensor_init(sensor, "device did not acknowledge"))
}

/// Clock moved by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
    wall: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set_wall_time(&self, time: DateTime<Utc>) {
        *self.wall.lock().unwrap() = Some(time);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn wall_time(&self) -> Option<DateTime<Utc>> {
        *self.wall.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
struct SentRequest {
    at: Instant,
    body: Vec<u8>,
    timeout: Duration,
}

/// Transport replaying a fixed list of results.
///
/// Once the script is exhausted it answers with the repeating response, or a
/// transport error when there is none.
#[derive(Debug)]
pub struct ScriptedTransport {
    script: VecDeque<std::result::Result<TransportResponse, TransportError>>,
    repeat: Option<TransportResponse>,
    sent: Arc<Mutex<Vec<SentRequest>>>,
}

impl ScriptedTransport {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = std::result::Result<TransportResponse, TransportError>>,
    {
        Self { script: script.into_iter().collect(), repeat: None, sent: Arc::default() }
    }

    /// Answers every request with `response`.
    pub fn repeating(response: TransportResponse) -> Self {
        Self { script: VecDeque::new(), repeat: Some(response), sent: Arc::default() }
    }

    pub fn handle(&self) -> TransportHandle {
        TransportHandle { sent: Arc::clone(&self.sent) }
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(
        &mut self,
        body: &[u8],
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        self.sent.lock().unwrap().push(SentRequest {
            at: Instant::now(),
            body: body.to_vec(),
            timeout,
        });
        match self.script.pop_front() {
            Some(result) => result,
            None => match &self.repeat {
                Some(response) => Ok(response.clone()),
                None => Err(TransportError::Other("script exhausted".to_string())),
            },
        }
    }
}

/// Requests seen by a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct TransportHandle {
    sent: Arc<Mutex<Vec<SentRequest>>>,
}

impl TransportHandle {
    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn bodies(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().iter().map(|r| r.body.clone()).collect()
    }

    pub fn sent_at(&self) -> Vec<Instant> {
        self.sent.lock().unwrap().iter().map(|r| r.at).collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.sent.lock().unwrap().iter().map(|r| r.timeout).collect()
    }
}

#[derive(Debug, Default)]
struct LinkState {
    associated: AtomicBool,
    reconnect_succeeds: AtomicBool,
    reconnects: AtomicUsize,
}

/// Link whose association is set by the test.
#[derive(Debug, Clone)]
pub struct FakeLink {
    state: Arc<LinkState>,
}

impl FakeLink {
    pub fn up() -> Self {
        Self::with(true, true)
    }

    /// Down, and stays down on reconnect.
    pub fn down() -> Self {
        Self::with(false, false)
    }

    /// Down until the first reconnect.
    pub fn down_until_reconnect() -> Self {
        Self::with(false, true)
    }

    fn with(associated: bool, reconnect_succeeds: bool) -> Self {
        let state = LinkState {
            associated: AtomicBool::new(associated),
            reconnect_succeeds: AtomicBool::new(reconnect_succeeds),
            reconnects: AtomicUsize::new(0),
        };
        Self { state: Arc::new(state) }
    }

    pub fn handle(&self) -> FakeLink {
        self.clone()
    }

    pub fn reconnects(&self) -> usize {
        self.state.reconnects.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Link for FakeLink {
    fn is_associated(&self) -> bool {
        self.state.associated.load(Ordering::SeqCst)
    }

    async fn reconnect(&mut self) -> bool {
        self.state.reconnects.fetch_add(1, Ordering::SeqCst);
        let ok = self.state.reconnect_succeeds.load(Ordering::SeqCst);
        self.state.associated.store(ok, Ordering::SeqCst);
        ok
    }
}
