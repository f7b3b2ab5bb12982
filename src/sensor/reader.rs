//! Periodic sensor poller.

use super::{SensorDriver, SensorType, TemperatureCell};
use crate::error::SensorError;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

/// Polls the sensor driver and keeps the shared cell at the last good value.
///
/// A failed poll never reaches the GATT service: the cell keeps its previous
/// value and reads keep serving it.
pub struct SensorReader<D: SensorDriver> {
    driver: D,
    sensor_type: SensorType,
    pin: u8,
    cell: Arc<TemperatureCell>,
    last_humidity: Option<f32>,
    polls: u32,
    failures: u32,
}

impl<D: SensorDriver> SensorReader<D> {
    pub fn new(driver: D, sensor_type: SensorType, pin: u8, cell: Arc<TemperatureCell>) -> Self {
        Self {
            driver,
            sensor_type,
            pin,
            cell,
            last_humidity: None,
            polls: 0,
            failures: 0,
        }
    }

    /// Perform one sensor transaction.
    ///
    /// On success the cell is overwritten with the new temperature. On failure
    /// the cell is left untouched and the error is returned for logging only.
    pub fn poll(&mut self) -> Result<f32, SensorError> {
        self.polls = self.polls.wrapping_add(1);

        match self.driver.read_sensor(self.sensor_type, self.pin) {
            Ok(reading) => {
                self.cell.set(reading.temperature);
                self.last_humidity = Some(reading.humidity);
                info!(
                    "Temperature: {:.1}°C, Humidity: {:.1}%",
                    reading.temperature, reading.humidity
                );
                Ok(reading.temperature)
            }
            Err(e) => {
                self.failures = self.failures.wrapping_add(1);
                error!(
                    "Could not read data from {} sensor on GPIO {}, error: {} ({})",
                    self.sensor_type,
                    self.pin,
                    e.code(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Last successfully stored temperature, `0.0` before the first success.
    pub fn get_current(&self) -> f32 {
        self.cell.get()
    }

    /// Humidity from the last successful poll.
    pub fn last_humidity(&self) -> Option<f32> {
        self.last_humidity
    }

    pub fn poll_count(&self) -> u32 {
        self.polls
    }

    pub fn failure_count(&self) -> u32 {
        self.failures
    }

    /// Shared cell this reader writes to.
    pub fn cell(&self) -> Arc<TemperatureCell> {
        self.cell.clone()
    }

    /// Poll forever at the given period.
    ///
    /// Errors are already logged by `poll()`; the loop just keeps going.
    pub async fn run(mut self, period: Duration) {
        info!(
            "Polling {} sensor on GPIO {} every {:?}",
            self.sensor_type, self.pin, period
        );

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let _ = self.poll();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{Reading, Sensor};
    use std::collections::VecDeque;

    struct ScriptedDriver {
        script: VecDeque<Result<Reading, SensorError>>,
        calls: Arc<std::sync::atomic::AtomicU32>,
    }

    impl ScriptedDriver {
        fn new(script: Vec<Result<Reading, SensorError>>) -> Self {
            Self {
                script: script.into(),
                calls: Arc::new(std::sync::atomic::AtomicU32::new(0)),
            }
        }
    }

    impl SensorDriver for ScriptedDriver {
        fn read_sensor(
            &mut self,
            sensor_type: SensorType,
            pin: u8,
        ) -> Result<Reading, SensorError> {
            assert_eq!(sensor_type, SensorType::Am2301);
            assert_eq!(pin, 4);
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.script.pop_front().unwrap_or(Err(SensorError::Timeout))
        }
    }

    fn reading(temperature: f32, humidity: f32) -> Reading {
        Reading {
            humidity,
            temperature,
        }
    }

    fn reader(script: Vec<Result<Reading, SensorError>>) -> SensorReader<ScriptedDriver> {
        SensorReader::new(
            ScriptedDriver::new(script),
            SensorType::Am2301,
            4,
            Arc::new(TemperatureCell::new()),
        )
    }

    #[test]
    fn test_initial_value_is_zero() {
        let reader = reader(vec![]);
        assert_eq!(reader.get_current(), 0.0);
        assert_eq!(reader.last_humidity(), None);
    }

    #[test]
    fn test_successful_poll_updates_value() {
        let mut reader = reader(vec![Ok(reading(21.37, 40.2))]);

        assert_eq!(reader.poll(), Ok(21.37));
        assert_eq!(reader.get_current(), 21.37);
        assert_eq!(reader.last_humidity(), Some(40.2));
        assert_eq!(reader.cell().version(), 1);
    }

    #[test]
    fn test_failed_poll_keeps_last_value() {
        let mut reader = reader(vec![
            Ok(reading(19.5, 50.0)),
            Err(SensorError::ChecksumMismatch),
            Err(SensorError::Timeout),
        ]);

        reader.poll().unwrap();
        assert_eq!(reader.poll(), Err(SensorError::ChecksumMismatch));
        assert_eq!(reader.get_current(), 19.5);
        assert_eq!(reader.poll(), Err(SensorError::Timeout));
        assert_eq!(reader.get_current(), 19.5);

        assert_eq!(reader.poll_count(), 3);
        assert_eq!(reader.failure_count(), 2);
        assert_eq!(reader.cell().version(), 1);
    }

    #[test]
    fn test_failure_before_first_success_keeps_zero() {
        let mut reader = reader(vec![Err(SensorError::Bus(-1))]);
        assert!(reader.poll().is_err());
        assert_eq!(reader.get_current(), 0.0);
    }

    #[test]
    fn test_one_transaction_per_poll() {
        let driver = ScriptedDriver::new(vec![Ok(reading(1.0, 1.0)), Err(SensorError::Timeout)]);
        let calls = driver.calls.clone();
        let mut reader =
            SensorReader::new(driver, SensorType::Am2301, 4, Arc::new(TemperatureCell::new()));

        let _ = reader.poll();
        let _ = reader.poll();
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_periodically() {
        let driver = ScriptedDriver::new(vec![
            Ok(reading(20.0, 45.0)),
            Ok(reading(20.5, 45.0)),
            Ok(reading(21.0, 45.0)),
        ]);
        let cell = Arc::new(TemperatureCell::new());
        let reader = SensorReader::new(driver, SensorType::Am2301, 4, cell.clone());

        let task = tokio::spawn(reader.run(Duration::from_millis(2000)));

        // First tick fires immediately, then every 2s
        tokio::time::sleep(Duration::from_millis(4100)).await;
        assert_eq!(cell.version(), 3);
        assert_eq!(cell.get(), 21.0);

        task.abort();
    }
}
