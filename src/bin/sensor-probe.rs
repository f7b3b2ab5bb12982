//! Bring-up binary for the temperature/humidity sensor.
//!
//! Usage:
//!   cargo run --bin sensor-probe
//!   cargo run --bin sensor-probe -- --json
//!
//! Reads the sensor every two seconds and logs the temperature and humidity,
//! or the driver error code when a read fails. Nothing is exposed over GATT.

use clap::Parser;
use log::{error, info};
use thermo_peripheral::config::Config;
use thermo_peripheral::sensor::SensorDriver;
use thermo_peripheral::simulation::SimulatedDht;
use tokio::time::{Duration, interval};

#[derive(Parser, Debug)]
#[command(about = "Read the temperature sensor in a loop")]
struct Args {
    /// Print each successful reading as a JSON line on stdout
    #[arg(long)]
    json: bool,

    /// Fraction of simulated reads that fail
    #[arg(long, env = "SIM_FAILURE_RATE", default_value_t = 0.1)]
    failure_rate: f64,
}

#[tokio::main]
async fn main() {
    // Load .env file before anything else
    thermo_peripheral::config::load_dotenv();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::from_env();
    info!(
        "Probing {} sensor on GPIO {}",
        config.sensor.sensor_type, config.sensor.gpio_pin
    );

    let mut driver = SimulatedDht::new(22.0, args.failure_rate);
    let mut ticker = interval(Duration::from_secs(2));

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Probe stopped.");
                return;
            }
        }

        match driver.read_sensor(config.sensor.sensor_type, config.sensor.gpio_pin) {
            Ok(reading) => {
                info!(
                    "Temperature: {:.1}°C, Humidity: {:.1}%",
                    reading.temperature, reading.humidity
                );
                if args.json {
                    match serde_json::to_string(&reading) {
                        Ok(line) => println!("{}", line),
                        Err(e) => error!("Failed to serialize reading: {}", e),
                    }
                }
            }
            Err(e) => {
                error!(
                    "Could not read data from sensor, error: {} ({})",
                    e.code(),
                    e
                );
            }
        }
    }
}
