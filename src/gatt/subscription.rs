//! Indication subscription tracking for the temperature characteristic.
//!
//! There is exactly one slot: the most recent subscription event for the
//! characteristic wins, and only one peer can receive indications at a time.
//! After a peer unsubscribes its connection handle stays in the slot, but it
//! is never used again until a new event overwrites it.

use super::transport::{CONN_HANDLE_NONE, ConnHandle};
use parking_lot::RwLock;

/// Snapshot of the subscription slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionState {
    pub conn_handle: ConnHandle,
    pub initialized: bool,
    pub indicate_enabled: bool,
}

impl Default for SubscriptionState {
    fn default() -> Self {
        Self {
            conn_handle: CONN_HANDLE_NONE,
            initialized: false,
            indicate_enabled: false,
        }
    }
}

impl SubscriptionState {
    /// Peer to indicate, if a push is currently permitted.
    ///
    /// A slot recorded from a stack-originated event holds
    /// [`CONN_HANDLE_NONE`] and never yields a target.
    pub fn push_target(&self) -> Option<ConnHandle> {
        if self.initialized && self.indicate_enabled && self.conn_handle != CONN_HANDLE_NONE {
            Some(self.conn_handle)
        } else {
            None
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.push_target().is_some()
    }
}

/// Single subscription slot shared between the transport callback context
/// and the push path.
///
/// The whole state is replaced under one write lock so the push path never
/// sees a peer from one event paired with the flag from another.
#[derive(Default)]
pub struct SubscriptionSlot {
    state: RwLock<SubscriptionState>,
}

impl SubscriptionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a subscription change and return the previous state.
    pub fn update(&self, conn_handle: Option<ConnHandle>, indicate_enabled: bool) -> SubscriptionState {
        let mut state = self.state.write();
        let previous = *state;
        *state = SubscriptionState {
            conn_handle: conn_handle.unwrap_or(CONN_HANDLE_NONE),
            initialized: true,
            indicate_enabled,
        };
        previous
    }

    pub fn snapshot(&self) -> SubscriptionState {
        *self.state.read()
    }

    pub fn push_target(&self) -> Option<ConnHandle> {
        self.state.read().push_target()
    }
}
