//! Agent assembly: startup sequence and wiring of the cycles.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::acquisition::AcquisitionCycle;
use crate::clock::{Clock, SystemClock};
use crate::config::{AgentConfig, SchedulingMode};
use crate::delivery::DeliveryProtocol;
use crate::driver::{Driver, DriverHandle};
use crate::estimator::{EstimatorAdapter, PeakRatioEstimator};
use crate::link::Link;
use crate::scheduler::Scheduler;
use crate::sensor::{TemperatureSensor, WaveformSensor, initialize_until_ready};
use crate::transmission::TransmissionCycle;
use crate::transport::Transport;
use crate::Result;

/// Hardware and network collaborators of one agent.
pub struct Peripherals<W, T, X, L> {
    pub waveform: W,
    pub temperature: T,
    pub estimator: EstimatorAdapter,
    pub transport: X,
    pub link: L,
}

/// Telemetry agent built from a validated configuration.
///
/// # Example
///
/// ```no_run
/// use vitalink::{Agent, AgentConfig, AlwaysOnline, HttpTransport, Peripherals};
/// use vitalink::sim::{SimulatedPpg, SimulatedThermometer};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> vitalink::Result<()> {
/// let config = AgentConfig::default();
/// let agent = Agent::new(config.clone())?;
/// let peripherals = Peripherals {
///     waveform: SimulatedPpg::default(),
///     temperature: SimulatedThermometer::default(),
///     estimator: agent.default_estimator(),
///     transport: HttpTransport::new(&config.collector_url)?,
///     link: AlwaysOnline,
/// };
/// agent.run(peripherals, CancellationToken::new()).await;
/// # Ok(())
/// # }
/// ```
pub struct Agent {
    config: AgentConfig,
    clock: Arc<dyn Clock>,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, clock: Arc::new(SystemClock::new()) })
    }

    /// Replace the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Reference estimator at the configured sample rate.
    pub fn default_estimator(&self) -> EstimatorAdapter {
        EstimatorAdapter::new(PeakRatioEstimator::with_sample_rate(
            self.config.estimator.sample_rate_hz,
        ))
    }

    /// Run the startup sequence and build both cycles.
    ///
    /// A failed initial association is logged and startup continues; sensor
    /// initialization is retried until every sensor answers.
    pub async fn start<W, T, X, L>(
        &self,
        peripherals: Peripherals<W, T, X, L>,
    ) -> (AcquisitionCycle, TransmissionCycle)
    where
        W: WaveformSensor,
        T: TemperatureSensor,
        X: Transport,
        L: Link,
    {
        let Peripherals { mut waveform, mut temperature, estimator, transport, mut link } =
            peripherals;

        info!(device_id = self.config.device_id, collector = %self.config.collector_url, "Agent starting");

        if !link.is_associated() && !link.reconnect().await {
            warn!("Initial network association failed; continuing without network");
        }

        let retry = self.config.startup.sensor_retry();
        initialize_until_ready("waveform", retry, || waveform.initialize()).await;
        initialize_until_ready("temperature", retry, || temperature.initialize()).await;

        let (acquisition, estimates) = AcquisitionCycle::new(
            waveform,
            estimator,
            self.config.acquisition.capacity,
            self.config.acquisition.fill_policy(),
            self.config.acquisition.interval(),
        );
        let transmission = TransmissionCycle::new(
            temperature,
            DeliveryProtocol::new(transport, link, self.config.delivery.policy()),
            estimates,
            Arc::clone(&self.clock),
            self.config.device_id,
            self.config.transmission.interval(),
        );

        (acquisition, transmission)
    }

    /// Start and return the cooperative scheduler.
    pub async fn scheduler<W, T, X, L>(&self, peripherals: Peripherals<W, T, X, L>) -> Scheduler
    where
        W: WaveformSensor,
        T: TemperatureSensor,
        X: Transport,
        L: Link,
    {
        let (acquisition, transmission) = self.start(peripherals).await;
        Scheduler::new(
            acquisition,
            transmission,
            Arc::clone(&self.clock),
            self.config.scheduler.pass_delay(),
        )
    }

    /// Start and spawn both cycles as concurrent tasks.
    pub async fn spawn<W, T, X, L>(&self, peripherals: Peripherals<W, T, X, L>) -> DriverHandle
    where
        W: WaveformSensor,
        T: TemperatureSensor,
        X: Transport,
        L: Link,
    {
        let (acquisition, transmission) = self.start(peripherals).await;
        Driver::spawn(
            acquisition,
            transmission,
            Arc::clone(&self.clock),
            self.config.scheduler.pass_delay(),
        )
    }

    /// Run in the configured scheduling mode until `cancel` fires.
    pub async fn run<W, T, X, L>(&self, peripherals: Peripherals<W, T, X, L>, cancel: CancellationToken)
    where
        W: WaveformSensor,
        T: TemperatureSensor,
        X: Transport,
        L: Link,
    {
        match self.config.scheduler.mode {
            SchedulingMode::Cooperative => self.scheduler(peripherals).await.run(cancel).await,
            SchedulingMode::Concurrent => {
                let handle = self.spawn(peripherals).await;
                cancel.cancelled().await;
                handle.shutdown().await;
            }
        }
        info!("Agent stopped");
    }
}
