//! Simulated DHT-family sensor.
//!
//! Produces a slow random walk around a starting point and fails a
//! configurable fraction of transactions, so the last-known-value behaviour
//! is exercised without hardware.

use crate::error::SensorError;
use crate::sensor::{Reading, SensorDriver, SensorType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct SimulatedDht {
    rng: StdRng,
    temperature: f32,
    humidity: f32,
    failure_rate: f64,
}

impl SimulatedDht {
    /// `failure_rate` is clamped to `0.0..=1.0`.
    pub fn new(initial_celsius: f32, failure_rate: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), initial_celsius, failure_rate)
    }

    /// Deterministic sequence for a given seed.
    pub fn seeded(seed: u64, initial_celsius: f32, failure_rate: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), initial_celsius, failure_rate)
    }

    fn with_rng(rng: StdRng, initial_celsius: f32, failure_rate: f64) -> Self {
        let failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        Self {
            rng,
            temperature: initial_celsius,
            humidity: 45.0,
            failure_rate,
        }
    }

    /// Resolution the sensor type reports at.
    fn resolution(sensor_type: SensorType) -> f32 {
        match sensor_type {
            SensorType::Dht11 => 1.0,
            SensorType::Am2301 | SensorType::Si7021 => 0.1,
        }
    }
}

impl SensorDriver for SimulatedDht {
    fn read_sensor(&mut self, sensor_type: SensorType, _pin: u8) -> Result<Reading, SensorError> {
        if self.rng.gen_bool(self.failure_rate) {
            return Err(if self.rng.gen_bool(0.5) {
                SensorError::Timeout
            } else {
                SensorError::ChecksumMismatch
            });
        }

        self.temperature = (self.temperature + self.rng.gen_range(-0.3..=0.3)).clamp(-40.0, 80.0);
        self.humidity = (self.humidity + self.rng.gen_range(-1.0..=1.0)).clamp(0.0, 100.0);

        let step = Self::resolution(sensor_type);
        Ok(Reading {
            humidity: (self.humidity / step).round() * step,
            temperature: (self.temperature / step).round() * step,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_fails_at_zero_rate() {
        let mut dht = SimulatedDht::seeded(7, 22.0, 0.0);
        for _ in 0..100 {
            let reading = dht.read_sensor(SensorType::Am2301, 4).unwrap();
            assert!((-40.0..=80.0).contains(&reading.temperature));
            assert!((0.0..=100.0).contains(&reading.humidity));
        }
    }

    #[test]
    fn test_always_fails_at_full_rate() {
        let mut dht = SimulatedDht::seeded(7, 22.0, 1.0);
        for _ in 0..20 {
            let err = dht.read_sensor(SensorType::Am2301, 4).unwrap_err();
            assert!(matches!(
                err,
                SensorError::Timeout | SensorError::ChecksumMismatch
            ));
        }
    }

    #[test]
    fn test_out_of_range_rate_is_clamped() {
        let mut dht = SimulatedDht::seeded(1, 22.0, 5.0);
        assert!(dht.read_sensor(SensorType::Am2301, 4).is_err());
        let mut dht = SimulatedDht::seeded(1, 22.0, -1.0);
        assert!(dht.read_sensor(SensorType::Am2301, 4).is_ok());
    }

    #[test]
    fn test_dht11_reports_whole_degrees() {
        let mut dht = SimulatedDht::seeded(3, 22.0, 0.0);
        let reading = dht.read_sensor(SensorType::Dht11, 4).unwrap();
        assert_eq!(reading.temperature.fract(), 0.0);
    }

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = SimulatedDht::seeded(42, 20.0, 0.2);
        let mut b = SimulatedDht::seeded(42, 20.0, 0.2);
        for _ in 0..10 {
            assert_eq!(
                a.read_sensor(SensorType::Am2301, 4),
                b.read_sensor(SensorType::Am2301, 4)
            );
        }
    }
}
