//! GATT side of the peripheral.
//!
//! This module provides the Health Thermometer service that bridges the
//! shared temperature cell to the BLE host stack, plus the codec and
//! subscription tracking it is built from.

pub mod ieee11073;
pub mod loopback;
pub mod notifier;
pub mod subscription;
pub mod temperature_service;
pub mod transport;
pub mod uuids;

// Re-export for convenience
pub use ieee11073::Float11073;
pub use loopback::{Indication, LoopbackTransport, ResponseBuf};
pub use notifier::{PushNotifier, PushSignal};
pub use subscription::{SubscriptionSlot, SubscriptionState};
pub use temperature_service::{TemperatureMeasurement, TemperatureService, log_register_event};
pub use transport::{
    AccessOp, AttrHandle, CharacteristicFlags, ConnHandle, GattTransport, RegisterEvent,
    ResponseSink, SubscribeEvent,
};
