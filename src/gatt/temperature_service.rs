//! Health Thermometer service exposing the Temperature Measurement characteristic.
//!
//! The characteristic (0x2A1C) is readable and indicatable. Every read and
//! every indication carries a 5-byte measurement: a flags byte (always 0x00,
//! Celsius with no timestamp and no temperature type) followed by the
//! temperature as an IEEE-11073 FLOAT.
//!
//! For example: 21.37°C is sent as `00 59 08 00 FE`.

use super::ieee11073::Float11073;
use super::notifier::PushSignal;
use super::subscription::{SubscriptionSlot, SubscriptionState};
use super::transport::{
    AccessOp, AttrHandle, CharacteristicFlags, GattTransport, RegisterEvent, ResponseSink,
    SubscribeEvent,
};
use super::uuids::{self, HEALTH_THERMOMETER_SERVICE, TEMPERATURE_MEASUREMENT, uuid16};
use crate::error::{AttError, TransportError};
use crate::sensor::TemperatureCell;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Flags byte: Celsius, no timestamp, no temperature type.
pub const FLAGS_CELSIUS: u8 = 0x00;

/// Length of a Temperature Measurement value on the wire.
pub const MEASUREMENT_LEN: usize = 5;

/// Temperature Measurement characteristic value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemperatureMeasurement {
    flags: u8,
    value: Float11073,
}

impl TemperatureMeasurement {
    pub fn celsius(t: f32) -> Self {
        Self {
            flags: FLAGS_CELSIUS,
            value: Float11073::from_celsius(t),
        }
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn value(&self) -> Float11073 {
        self.value
    }

    pub fn to_bytes(&self) -> [u8; MEASUREMENT_LEN] {
        let float = self.value.to_bytes();
        [self.flags, float[0], float[1], float[2], float[3]]
    }

    /// Parse a received value. Only the 5-byte Celsius form is accepted.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; MEASUREMENT_LEN] = bytes.try_into().ok()?;
        let [flags, b0, b1, b2, b3] = bytes;
        if flags != FLAGS_CELSIUS {
            return None;
        }
        Some(Self {
            flags,
            value: Float11073::from_bytes([b0, b1, b2, b3]),
        })
    }
}

/// Serves the temperature characteristic on top of a [`GattTransport`].
///
/// Reads always encode the current cell value; nothing is cached. Pushes go
/// to the single subscribed peer, see [`SubscriptionSlot`].
pub struct TemperatureService<T: GattTransport> {
    transport: Arc<T>,
    cell: Arc<TemperatureCell>,
    val_handle: AttrHandle,
    subscription: SubscriptionSlot,
    indications_sent: AtomicU32,
}

impl<T: GattTransport> TemperatureService<T> {
    /// Register the characteristic with the transport.
    pub fn register(transport: Arc<T>, cell: Arc<TemperatureCell>) -> Result<Self, TransportError> {
        let val_handle = transport.register_attribute(
            uuid16(HEALTH_THERMOMETER_SERVICE),
            uuid16(TEMPERATURE_MEASUREMENT),
            CharacteristicFlags::READ_INDICATE,
        )?;
        info!(
            "Temperature Measurement characteristic registered with val_handle={}",
            val_handle.0
        );

        Ok(Self {
            transport,
            cell,
            val_handle,
            subscription: SubscriptionSlot::new(),
            indications_sent: AtomicU32::new(0),
        })
    }

    pub fn val_handle(&self) -> AttrHandle {
        self.val_handle
    }

    /// Encode the current temperature.
    pub fn encode_current(&self) -> TemperatureMeasurement {
        TemperatureMeasurement::celsius(self.cell.get())
    }

    /// Access callback for the characteristic value.
    ///
    /// Only characteristic reads are supported.
    pub fn handle_access<S: ResponseSink + ?Sized>(
        &self,
        op: AccessOp,
        sink: &mut S,
    ) -> Result<(), AttError> {
        match op {
            AccessOp::ReadCharacteristic => self.handle_read(sink).map(|_| ()),
            other => {
                warn!("Unsupported access operation {:?} on temperature characteristic", other);
                Err(AttError::Unlikely)
            }
        }
    }

    /// Encode the current temperature into the transport's response buffer.
    ///
    /// A full buffer fails this request only; it is not retried.
    pub fn handle_read<S: ResponseSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> Result<TemperatureMeasurement, AttError> {
        let celsius = self.cell.get();
        let measurement = TemperatureMeasurement::celsius(celsius);

        if let Err(e) = sink.append(&measurement.to_bytes()) {
            error!("Failed to append temperature data: {}", e);
            return Err(e.into());
        }

        info!("Temperature read: {:.2}°C", celsius);
        Ok(measurement)
    }

    /// Subscription-change callback from the transport.
    ///
    /// Events for other attribute handles are ignored.
    pub fn on_subscribe_change(&self, event: &SubscribeEvent) {
        match event.conn_handle {
            Some(conn_handle) => info!(
                "subscribe event; conn_handle={} attr_handle={} indicate={}",
                conn_handle, event.attr_handle.0, event.cur_indicate
            ),
            None => info!(
                "subscribe by host stack; attr_handle={} indicate={}",
                event.attr_handle.0, event.cur_indicate
            ),
        }

        if event.attr_handle != self.val_handle {
            return;
        }

        let previous = self
            .subscription
            .update(event.conn_handle, event.cur_indicate);
        let current = self.subscription.snapshot();
        if previous.is_subscribed() != current.is_subscribed() {
            debug!(
                "temperature subscription {} -> {}",
                phase(&previous),
                phase(&current)
            );
        }
    }

    pub fn subscription(&self) -> SubscriptionState {
        self.subscription.snapshot()
    }

    /// Offer an indication of the current value.
    ///
    /// Returns `true` if an indication was handed to the transport. Does not
    /// wait for the previous indication's confirmation; back-pressure is the
    /// transport's concern.
    pub fn trigger_push(&self) -> bool {
        let Some(peer) = self.subscription.push_target() else {
            debug!("no temperature subscriber, skipping indication");
            return false;
        };

        match self.transport.send_indication(peer, self.val_handle) {
            Ok(()) => {
                self.indications_sent.fetch_add(1, Ordering::SeqCst);
                info!("temp indication sent to conn_handle={}", peer);
                true
            }
            Err(e) => {
                warn!("temp indication to conn_handle={} failed: {}", peer, e);
                false
            }
        }
    }

    pub fn indications_sent(&self) -> u32 {
        self.indications_sent.load(Ordering::SeqCst)
    }

    /// Push an indication each time `signal` fires. Runs forever.
    pub async fn run_push_loop(&self, signal: &'static PushSignal) {
        info!("Temperature push loop started");
        loop {
            signal.wait().await;
            self.trigger_push();
        }
    }
}

fn phase(state: &SubscriptionState) -> &'static str {
    if state.is_subscribed() {
        "Subscribed"
    } else {
        "Unsubscribed"
    }
}

/// Registration callback: logs each attribute database entry.
pub fn log_register_event(event: &RegisterEvent) {
    match event {
        RegisterEvent::Service { uuid, handle } => {
            debug!(
                "Registered service {} with handle={}",
                uuids::display(uuid),
                handle
            );
        }
        RegisterEvent::Characteristic { uuid, val_handle } => {
            debug!(
                "Registered characteristic {} with val_handle={}",
                uuids::display(uuid),
                val_handle.0
            );
        }
        RegisterEvent::Descriptor { uuid, handle } => {
            debug!(
                "Registered descriptor {} with handle={}",
                uuids::display(uuid),
                handle
            );
        }
    }
}
