//! BLE Health Thermometer peripheral library.
//!
//! This library samples a DHT-family sensor and serves the temperature as an
//! IEEE-11073 Temperature Measurement characteristic, readable on demand and
//! pushed by indication to a subscribed peer.

pub mod config;
pub mod error;
pub mod gatt;
pub mod sensor;
pub mod simulation;
