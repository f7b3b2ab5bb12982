//! Shared last-known temperature.
//!
//! Provides thread-safe shared state written by the sensor poll task and
//! read by the GATT service from the transport's callback context.
//!
//! The value is kept as its IEEE-754 bit pattern in an `AtomicU32`, so loads
//! and stores are word-atomic on every target without a lock.

use super::{NotifiableSensor, Sensor};
use crate::gatt::PushNotifier;
use log::trace;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe temperature cell, last write wins.
///
/// Starts at `0.0` °C, which is what a read returns before the first
/// successful poll.
pub struct TemperatureCell {
    bits: AtomicU32,
    version: AtomicU32,
    /// Set after the GATT service is registered via `set_notifier()`.
    notifier: RwLock<Option<PushNotifier>>,
}

impl TemperatureCell {
    pub fn new() -> Self {
        Self {
            bits: AtomicU32::new(0.0f32.to_bits()),
            version: AtomicU32::new(0),
            notifier: RwLock::new(None),
        }
    }

    /// Get the current temperature in degrees Celsius.
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::SeqCst))
    }

    /// Store a new temperature. Always increments version.
    ///
    /// Every store counts as an update, even if the value is unchanged, so a
    /// configured notifier fires once per successful poll.
    pub fn set(&self, celsius: f32) {
        self.bits.store(celsius.to_bits(), Ordering::SeqCst);
        self.version.fetch_add(1, Ordering::SeqCst);
        if let Some(notifier) = self.notifier.read().as_ref() {
            notifier.notify();
            trace!("push signalled for attr_handle={}", notifier.attr_handle().0);
        }
    }
}

impl Default for TemperatureCell {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifiableSensor for TemperatureCell {
    fn set_notifier(&self, notifier: PushNotifier) {
        *self.notifier.write() = Some(notifier);
    }
}

impl Sensor for TemperatureCell {
    fn version(&self) -> u32 {
        self.version.load(Ordering::SeqCst)
    }
}
