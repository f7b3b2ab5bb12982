use crate::error::{Result, ThermoError};
use crate::sensor::SensorType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: We're single-threaded at this point (called before any async runtime)
            unsafe { std::env::set_var(key, value) };
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }

            pairs.push((key, value));
        }
    }

    pairs
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sensor: SensorConfig,
    pub gatt: GattConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub sensor_type: SensorType,
    pub gpio_pin: u8,
    pub poll_interval_ms: u64,
}

impl SensorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GattConfig {
    pub device_name: String,
    /// Offer an indication after every successful sensor poll.
    pub push_on_poll: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensor: SensorConfig {
                sensor_type: SensorType::Am2301,
                gpio_pin: 4,
                poll_interval_ms: 2000,
            },
            gatt: GattConfig {
                device_name: "thermo-peripheral".to_string(),
                push_on_poll: true,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(sensor_type) = std::env::var("SENSOR_TYPE")
            && let Ok(t) = sensor_type.parse()
        {
            config.sensor.sensor_type = t;
        }
        if let Ok(pin) = std::env::var("SENSOR_GPIO")
            && let Ok(p) = pin.parse()
        {
            config.sensor.gpio_pin = p;
        }
        if let Ok(interval) = std::env::var("SENSOR_POLL_INTERVAL_MS")
            && let Ok(i) = interval.parse()
        {
            config.sensor.poll_interval_ms = i;
        }
        if let Ok(name) = std::env::var("GATT_DEVICE_NAME") {
            config.gatt.device_name = name;
        }
        if let Ok(push) = std::env::var("GATT_PUSH_ON_POLL")
            && let Ok(p) = push.parse()
        {
            config.gatt.push_on_poll = p;
        }

        config
    }

    /// Reject settings the poll loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sensor.poll_interval_ms == 0 {
            return Err(ThermoError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.gatt.device_name.is_empty() {
            return Err(ThermoError::InvalidConfig(
                "device name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sensor.sensor_type, SensorType::Am2301);
        assert_eq!(config.sensor.gpio_pin, 4);
        assert_eq!(config.sensor.poll_interval(), Duration::from_secs(2));
        assert!(config.gatt.push_on_poll);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.sensor.poll_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ThermoError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_parse_dotenv() {
        let content = "# comment\n\nSENSOR_GPIO=5\nGATT_DEVICE_NAME = \"Kitchen Probe\"\nBROKEN LINE\nX='a b'\n";
        let pairs = parse_dotenv(content);
        assert_eq!(
            pairs,
            vec![
                ("SENSOR_GPIO", "5"),
                ("GATT_DEVICE_NAME", "Kitchen Probe"),
                ("X", "a b"),
            ]
        );
    }
}
