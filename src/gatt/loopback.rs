//! In-process GATT transport.
//!
//! Stands in for the BLE host stack: it assigns attribute handles, tracks
//! connections and their indication subscriptions, and pulls characteristic
//! values through the registered access callback. Indications are recorded
//! instead of going over the air.

use super::transport::{
    AccessOp, AttrHandle, CharacteristicFlags, ConnHandle, GattTransport, RegisterEvent,
    ResponseSink, SubscribeEvent,
};
use super::uuids::{self, CLIENT_CHARACTERISTIC_CONFIGURATION, uuid16};
use crate::error::{AttError, BufferError, TransportError};
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU16, Ordering};
use uuid::Uuid;

/// Default ATT MTU before any exchange
pub const ATT_DEFAULT_MTU: usize = 23;

/// Largest value a single Read Response can carry at the default MTU
pub const ATT_READ_PAYLOAD: usize = ATT_DEFAULT_MTU - 1;

/// Fixed-capacity response buffer.
///
/// Appends are all-or-nothing: a value that does not fit leaves the buffer
/// unchanged and reports a [`BufferError`].
#[derive(Debug, Default)]
pub struct ResponseBuf<const N: usize> {
    buf: heapless::Vec<u8, N>,
}

impl<const N: usize> ResponseBuf<N> {
    pub fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        N - self.buf.len()
    }
}

impl<const N: usize> ResponseSink for ResponseBuf<N> {
    fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let available = self.remaining();
        self.buf.extend_from_slice(bytes).map_err(|_| BufferError {
            needed: bytes.len(),
            available,
        })
    }
}

/// Callback type for characteristic value access
pub type AccessCallback =
    Box<dyn Fn(AccessOp, &mut dyn ResponseSink) -> Result<(), AttError> + Send + Sync>;

/// Callback type for subscription changes
pub type SubscribeCallback = Box<dyn Fn(&SubscribeEvent) + Send + Sync>;

/// Callback type for attribute registration
pub type RegisterCallback = Box<dyn Fn(&RegisterEvent) + Send + Sync>;

/// An indication handed to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Indication {
    pub conn_handle: ConnHandle,
    pub attr_handle: AttrHandle,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone)]
struct RegisteredCharacteristic {
    service_uuid: Uuid,
    characteristic_uuid: Uuid,
    flags: CharacteristicFlags,
    val_handle: AttrHandle,
}

pub struct LoopbackTransport {
    next_handle: AtomicU16,
    services: RwLock<HashMap<Uuid, u16>>,
    characteristics: RwLock<Vec<RegisteredCharacteristic>>,
    /// Connected peers and the value handles each has enabled indications for
    connections: RwLock<HashMap<ConnHandle, HashSet<AttrHandle>>>,
    access_callback: RwLock<Option<AccessCallback>>,
    subscribe_callback: RwLock<Option<SubscribeCallback>>,
    register_callback: RwLock<Option<RegisterCallback>>,
    indications: Mutex<Vec<Indication>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU16::new(1),
            services: RwLock::new(HashMap::new()),
            characteristics: RwLock::new(Vec::new()),
            connections: RwLock::new(HashMap::new()),
            access_callback: RwLock::new(None),
            subscribe_callback: RwLock::new(None),
            register_callback: RwLock::new(None),
            indications: Mutex::new(Vec::new()),
        }
    }

    /// Set the callback used to read characteristic values
    pub fn set_access_callback(&self, callback: AccessCallback) {
        *self.access_callback.write() = Some(callback);
    }

    /// Set the callback for subscription-change events
    pub fn set_subscribe_callback(&self, callback: SubscribeCallback) {
        *self.subscribe_callback.write() = Some(callback);
    }

    /// Set the callback for registration events. Must be set before registering.
    pub fn set_register_callback(&self, callback: RegisterCallback) {
        *self.register_callback.write() = Some(callback);
    }

    pub fn connect(&self, conn_handle: ConnHandle) {
        self.connections.write().entry(conn_handle).or_default();
        info!("connection established; conn_handle={}", conn_handle);
    }

    /// Drop a connection. Active indication subscriptions are reported as
    /// disabled, as the host stack does on link loss.
    pub fn disconnect(&self, conn_handle: ConnHandle) {
        let subscribed = self.connections.write().remove(&conn_handle);
        info!("disconnect; conn_handle={}", conn_handle);

        for attr_handle in subscribed.into_iter().flatten() {
            self.emit_subscribe(&SubscribeEvent {
                conn_handle: Some(conn_handle),
                attr_handle,
                cur_indicate: false,
            });
        }
    }

    pub fn is_connected(&self, conn_handle: ConnHandle) -> bool {
        self.connections.read().contains_key(&conn_handle)
    }

    /// A peer writes the Client Characteristic Configuration of `attr_handle`.
    pub fn write_cccd(
        &self,
        conn_handle: ConnHandle,
        attr_handle: AttrHandle,
        indicate: bool,
    ) -> Result<(), TransportError> {
        let chr = self
            .characteristic(attr_handle)
            .ok_or(TransportError::UnknownHandle(attr_handle.0))?;
        if !chr.flags.indicate {
            return Err(TransportError::UnknownHandle(attr_handle.0));
        }
        debug!(
            "CCCD write for {} in service {}; conn_handle={} indicate={}",
            uuids::display(&chr.characteristic_uuid),
            uuids::display(&chr.service_uuid),
            conn_handle,
            indicate
        );

        {
            let mut connections = self.connections.write();
            let subscribed = connections
                .get_mut(&conn_handle)
                .ok_or(TransportError::NotConnected(conn_handle))?;
            if indicate {
                subscribed.insert(attr_handle);
            } else {
                subscribed.remove(&attr_handle);
            }
        }

        self.emit_subscribe(&SubscribeEvent {
            conn_handle: Some(conn_handle),
            attr_handle,
            cur_indicate: indicate,
        });
        Ok(())
    }

    /// A peer reads the value of `attr_handle`.
    pub fn read(&self, conn_handle: ConnHandle, attr_handle: AttrHandle) -> Result<Vec<u8>, AttError> {
        if !self.is_connected(conn_handle) {
            return Err(AttError::Unlikely);
        }
        match self.characteristic(attr_handle) {
            Some(chr) if chr.flags.read => {}
            _ => return Err(AttError::InvalidHandle),
        }

        self.read_value(AccessOp::ReadCharacteristic)
    }

    /// Drain the recorded indications.
    pub fn take_indications(&self) -> Vec<Indication> {
        std::mem::take(&mut *self.indications.lock())
    }

    pub fn indication_count(&self) -> usize {
        self.indications.lock().len()
    }

    fn read_value(&self, op: AccessOp) -> Result<Vec<u8>, AttError> {
        let callback = self.access_callback.read();
        let Some(callback) = callback.as_ref() else {
            return Err(AttError::Unlikely);
        };

        let mut buf = ResponseBuf::<ATT_READ_PAYLOAD>::new();
        callback(op, &mut buf)?;
        Ok(buf.as_slice().to_vec())
    }

    fn characteristic(&self, attr_handle: AttrHandle) -> Option<RegisteredCharacteristic> {
        self.characteristics
            .read()
            .iter()
            .find(|c| c.val_handle == attr_handle)
            .cloned()
    }

    fn allocate_handle(&self) -> u16 {
        self.next_handle.fetch_add(1, Ordering::SeqCst)
    }

    fn emit_register(&self, event: &RegisterEvent) {
        if let Some(callback) = self.register_callback.read().as_ref() {
            callback(event);
        }
    }

    fn emit_subscribe(&self, event: &SubscribeEvent) {
        if let Some(callback) = self.subscribe_callback.read().as_ref() {
            callback(event);
        }
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl GattTransport for LoopbackTransport {
    fn register_attribute(
        &self,
        service_uuid: Uuid,
        characteristic_uuid: Uuid,
        flags: CharacteristicFlags,
    ) -> Result<AttrHandle, TransportError> {
        if !flags.read && !flags.indicate {
            return Err(TransportError::RegistrationFailed(format!(
                "characteristic {} has no properties",
                characteristic_uuid
            )));
        }

        let existing = self.services.read().get(&service_uuid).copied();
        if existing.is_none() {
            let handle = self.allocate_handle();
            self.services.write().insert(service_uuid, handle);
            self.emit_register(&RegisterEvent::Service {
                uuid: service_uuid,
                handle,
            });
        }

        // Declaration first, then the value
        let _declaration = self.allocate_handle();
        let val_handle = AttrHandle(self.allocate_handle());
        self.characteristics.write().push(RegisteredCharacteristic {
            service_uuid,
            characteristic_uuid,
            flags,
            val_handle,
        });
        self.emit_register(&RegisterEvent::Characteristic {
            uuid: characteristic_uuid,
            val_handle,
        });

        if flags.indicate {
            let handle = self.allocate_handle();
            self.emit_register(&RegisterEvent::Descriptor {
                uuid: uuid16(CLIENT_CHARACTERISTIC_CONFIGURATION),
                handle,
            });
        }

        debug!(
            "characteristic {} under service {} at val_handle={}",
            uuids::display(&characteristic_uuid),
            uuids::display(&service_uuid),
            val_handle.0
        );
        Ok(val_handle)
    }

    fn send_indication(&self, peer: ConnHandle, handle: AttrHandle) -> Result<(), TransportError> {
        if !self.is_connected(peer) {
            return Err(TransportError::NotConnected(peer));
        }
        if self.characteristic(handle).is_none() {
            return Err(TransportError::UnknownHandle(handle.0));
        }

        let payload = self
            .read_value(AccessOp::ReadCharacteristic)
            .map_err(|e| TransportError::IndicationFailed(e.to_string()))?;

        self.indications.lock().push(Indication {
            conn_handle: peer,
            attr_handle: handle,
            payload,
        });
        Ok(())
    }
}
