//! Boundary between the temperature service and the BLE host stack.
//!
//! The host stack owns advertising, connections and the attribute database.
//! It is reached through [`GattTransport`], and it hands the service a
//! [`ResponseSink`] for every read access.

use crate::error::{BufferError, TransportError};
use strum::FromRepr;
use uuid::Uuid;

/// Connection handle assigned by the host stack.
pub type ConnHandle = u16;

/// Connection handle value meaning "no connection".
pub const CONN_HANDLE_NONE: ConnHandle = 0xFFFF;

/// Attribute handle of a registered characteristic value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttrHandle(pub u16);

/// Characteristic properties requested at registration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharacteristicFlags {
    pub read: bool,
    pub indicate: bool,
}

impl CharacteristicFlags {
    pub const READ_INDICATE: Self = Self {
        read: true,
        indicate: true,
    };
}

/// Attribute access operation delivered to the access callback.
#[derive(Clone, Copy, Debug, Eq, PartialEq, FromRepr)]
#[repr(u8)]
pub enum AccessOp {
    ReadCharacteristic = 0,
    WriteCharacteristic = 1,
    ReadDescriptor = 2,
    WriteDescriptor = 3,
}

/// A peer changed its Client Characteristic Configuration for a handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscribeEvent {
    /// `None` when the host stack itself generated the event.
    pub conn_handle: Option<ConnHandle>,
    pub attr_handle: AttrHandle,
    pub cur_indicate: bool,
}

/// Attribute database registration, reported once per entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegisterEvent {
    Service { uuid: Uuid, handle: u16 },
    Characteristic { uuid: Uuid, val_handle: AttrHandle },
    Descriptor { uuid: Uuid, handle: u16 },
}

/// Outgoing attribute value buffer for a single access.
pub trait ResponseSink {
    /// Append `bytes` in full or not at all.
    fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError>;
}

/// Unbounded sink. On a concrete `Vec`, `sink.append(..)` resolves to the
/// inherent `Vec::append`; call `ResponseSink::append(&mut sink, ..)` instead.
impl ResponseSink for Vec<u8> {
    fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Operations the service consumes from the host stack.
pub trait GattTransport: Send + Sync {
    /// Add a characteristic under a primary service and return its value handle.
    fn register_attribute(
        &self,
        service_uuid: Uuid,
        characteristic_uuid: Uuid,
        flags: CharacteristicFlags,
    ) -> Result<AttrHandle, TransportError>;

    /// Queue an indication of `handle` to `peer`.
    ///
    /// The host stack reads the value through the access callback and waits
    /// for the peer's confirmation on its own; this call does not block on it.
    fn send_indication(&self, peer: ConnHandle, handle: AttrHandle) -> Result<(), TransportError>;
}
