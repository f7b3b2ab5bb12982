//! Simulated central for exercising the peripheral without a radio.
//!
//! Connects over the loopback transport, reads the characteristic once,
//! enables indications and then logs every indication it receives. The
//! subscription is toggled periodically so both push paths get exercised.

use crate::gatt::{AttrHandle, ConnHandle, LoopbackTransport, TemperatureMeasurement};
use log::{info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval, sleep};

/// Connection handle the simulated central uses
pub const CENTRAL_CONN_HANDLE: ConnHandle = 1;

/// Rounds between subscription toggles
const TOGGLE_EVERY: u32 = 6;

/// Render a received Temperature Measurement for logging.
pub fn describe_measurement(payload: &[u8]) -> String {
    match TemperatureMeasurement::from_bytes(payload) {
        Some(measurement) => format!("{:.2}°C", measurement.value().to_f64()),
        None => format!("malformed payload {:02X?}", payload),
    }
}

/// Spawn the simulated central.
///
/// # Returns
///
/// A `JoinHandle` that can be used to abort the simulation task.
pub fn run_simulated_central(
    transport: Arc<LoopbackTransport>,
    val_handle: AttrHandle,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        transport.connect(CENTRAL_CONN_HANDLE);
        sleep(period).await;

        match transport.read(CENTRAL_CONN_HANDLE, val_handle) {
            Ok(payload) => info!("[Sim] Read temperature: {}", describe_measurement(&payload)),
            Err(e) => warn!("[Sim] Read failed with ATT error 0x{:02X}: {}", e.code(), e),
        }

        if let Err(e) = transport.write_cccd(CENTRAL_CONN_HANDLE, val_handle, true) {
            warn!("[Sim] Failed to enable indications: {}", e);
            return;
        }
        info!("[Sim] Indications enabled");

        let mut ticker = interval(period);
        let mut rounds: u32 = 0;
        loop {
            ticker.tick().await;

            for indication in transport.take_indications() {
                info!(
                    "[Sim] Indication on conn_handle={}: {}",
                    indication.conn_handle,
                    describe_measurement(&indication.payload)
                );
            }

            rounds = rounds.wrapping_add(1);
            if rounds % TOGGLE_EVERY == 0 {
                let enable = (rounds / TOGGLE_EVERY) % 2 == 0;
                info!(
                    "[Sim] {} indications",
                    if enable { "Enabling" } else { "Disabling" }
                );
                if let Err(e) = transport.write_cccd(CENTRAL_CONN_HANDLE, val_handle, enable) {
                    warn!("[Sim] CCCD write failed: {}", e);
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_measurement() {
        assert_eq!(
            describe_measurement(&[0x00, 0x42, 0x0E, 0x00, 0xFE]),
            "36.50°C"
        );
        assert_eq!(
            describe_measurement(&[0x00, 0x01]),
            "malformed payload [00, 01]"
        );
    }
}
