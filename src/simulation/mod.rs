//! Simulated sensor and central for running without hardware.

pub mod central;
pub mod dht;

pub use central::run_simulated_central;
pub use dht::SimulatedDht;
