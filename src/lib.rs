//! Device-resident vital-sign telemetry agent.
//!
//! vitalink samples a photoplethysmography (PPG) sensor and a skin temperature
//! sensor, derives heart rate and SpO2 from complete sample windows, and posts
//! the readings to a remote collector over an unreliable network link.
//!
//! # Features
//!
//! - **Acquisition**: fixed-size sample windows, never estimated from when partial
//! - **Delivery**: bounded retries with constant backoff and link recovery
//! - **Scheduling**: one cooperative loop, or two tasks joined by a single-slot mailbox
//! - **Pluggable hardware**: sensors, estimator, transport, link and clock are traits
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vitalink::{Agent, AgentConfig, AlwaysOnline, HttpTransport, Peripherals};
//! use vitalink::sim::{SimulatedPpg, SimulatedThermometer};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> vitalink::Result<()> {
//!     let config = AgentConfig::load("vitalink.yaml")?;
//!     let agent = Agent::new(config.clone())?;
//!     let peripherals = Peripherals {
//!         waveform: SimulatedPpg::default(),
//!         temperature: SimulatedThermometer::default(),
//!         estimator: agent.default_estimator(),
//!         transport: HttpTransport::new(&config.collector_url)?,
//!         link: AlwaysOnline,
//!     };
//!
//!     let mut scheduler = agent.scheduler(peripherals).await;
//!     let summary = scheduler.run_pass().await;
//!     println!("first pass: {:?}", summary);
//!
//!     scheduler.run(CancellationToken::new()).await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Collaborator seams
pub mod clock;
pub mod estimator;
pub mod link;
pub mod sensor;
pub mod sim;
pub mod transport;

// Cycles and scheduling
pub mod acquisition;
pub mod agent;
pub mod config;
pub mod delivery;
pub mod driver;
pub mod retry;
pub mod scheduler;
pub mod transmission;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use acquisition::AcquisitionCycle;
pub use agent::{Agent, Peripherals};
pub use clock::{Clock, SystemClock};
pub use config::{AgentConfig, SchedulingMode};
pub use delivery::{DeliveryPolicy, DeliveryProtocol};
pub use driver::{Driver, DriverHandle};
pub use estimator::{Estimator, EstimatorAdapter, PeakRatioEstimator};
pub use link::{AlwaysOnline, CandidateAssociation, Link, NetworkCandidate, NetworkInterface};
pub use retry::RetryPolicy;
pub use scheduler::{IntervalGate, PassSummary, Scheduler};
pub use sensor::{TemperatureSensor, WaveformSensor};
pub use transmission::TransmissionCycle;
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
