//! Sensor state management for the temperature characteristic.
//!
//! The [`SensorReader`] polls a [`SensorDriver`] and stores the latest
//! temperature in a shared [`TemperatureCell`], which the GATT service reads
//! on every attribute access.
//!
//! Sensors implement the [`Sensor`] trait which provides version tracking
//! for change detection. Sensors that support live updates also implement
//! [`NotifiableSensor`] to wake the indication push loop.

pub mod reader;
pub mod temperature_cell;

pub use reader::SensorReader;
pub use temperature_cell::TemperatureCell;

use crate::error::SensorError;
use crate::gatt::PushNotifier;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

/// DHT-family sensor variants understood by the driver.
///
/// Discriminants match the driver's sensor type constants.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, FromRepr, EnumString, Display, Serialize, Deserialize,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SensorType {
    Dht11 = 0,
    /// AM2301 / DHT22
    Am2301 = 1,
    Si7021 = 2,
}

/// One successful sensor transaction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Reading {
    /// Relative humidity in percent
    pub humidity: f32,
    /// Temperature in degrees Celsius
    pub temperature: f32,
}

/// Sensor driver boundary.
///
/// Each call performs exactly one bus transaction. Bus timing, retries and
/// checksum validation belong to the implementation; the timeout must be
/// bounded.
pub trait SensorDriver: Send {
    fn read_sensor(&mut self, sensor_type: SensorType, pin: u8) -> Result<Reading, SensorError>;
}

/// Trait for sensors with change detection.
///
/// The version number should be incremented atomically each time the sensor
/// value is stored.
pub trait Sensor: Send + Sync {
    /// Get the current version number.
    fn version(&self) -> u32;
}

/// Trait for sensors that wake the indication push loop on every store.
pub trait NotifiableSensor: Sensor {
    /// Set the notifier for this sensor.
    ///
    /// Called once the GATT service is registered and its value handle known.
    fn set_notifier(&self, notifier: PushNotifier);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_type_parse() {
        assert_eq!("am2301".parse::<SensorType>().unwrap(), SensorType::Am2301);
        assert_eq!("DHT11".parse::<SensorType>().unwrap(), SensorType::Dht11);
        assert!("bme280".parse::<SensorType>().is_err());
        assert_eq!(SensorType::Si7021.to_string(), "si7021");
    }

    #[test]
    fn test_sensor_type_from_repr() {
        assert_eq!(SensorType::from_repr(1), Some(SensorType::Am2301));
        assert_eq!(SensorType::from_repr(7), None);
    }
}
