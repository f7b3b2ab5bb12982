//! Push trigger for temperature indications.
//!
//! When the sensor cell is written it signals the push loop, which offers an
//! indication to the subscribed peer from the transport's own context.

use super::transport::AttrHandle;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Signal that wakes [`TemperatureService::run_push_loop`](super::TemperatureService::run_push_loop).
pub type PushSignal = Signal<CriticalSectionRawMutex, ()>;

/// Wakes the indication push loop when the temperature is stored.
///
/// Signals coalesce: several stores before the loop wakes produce one push,
/// which always carries the latest value.
///
/// # Usage
/// ```ignore
/// // In the cell's set() method:
/// if let Some(notifier) = self.notifier.read().as_ref() {
///     notifier.notify();
/// }
/// ```
pub struct PushNotifier {
    signal: &'static PushSignal,
    attr_handle: AttrHandle,
}

impl PushNotifier {
    /// Create a notifier for the characteristic at `attr_handle`.
    pub fn new(signal: &'static PushSignal, attr_handle: AttrHandle) -> Self {
        Self {
            signal,
            attr_handle,
        }
    }

    /// Get the characteristic value handle this notifier is configured for.
    pub fn attr_handle(&self) -> AttrHandle {
        self.attr_handle
    }

    /// Non-blocking.
    pub fn notify(&self) {
        self.signal.signal(());
    }
}
