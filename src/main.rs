use clap::Parser;
use embassy_sync::signal::Signal;
use log::{error, info};
use static_cell::StaticCell;
use std::sync::Arc;
use thermo_peripheral::config::{self, Config};
use thermo_peripheral::error::{AttError, Result};
use thermo_peripheral::gatt::{
    AccessOp, LoopbackTransport, PushNotifier, PushSignal, ResponseSink, SubscribeEvent,
    TemperatureService, log_register_event,
};
use thermo_peripheral::sensor::{NotifiableSensor, SensorReader, SensorType, TemperatureCell};
use thermo_peripheral::simulation::{SimulatedDht, run_simulated_central};
use tokio::signal;
use tokio::time::Duration;

static PUSH_SIGNAL: StaticCell<PushSignal> = StaticCell::new();

/// Health Thermometer peripheral running against a simulated sensor and central.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Sensor poll period in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// GPIO the sensor data line is attached to
    #[arg(long)]
    gpio: Option<u8>,

    /// Sensor variant (dht11, am2301, si7021)
    #[arg(long)]
    sensor_type: Option<SensorType>,

    /// Fraction of simulated sensor reads that fail
    #[arg(long, env = "SIM_FAILURE_RATE", default_value_t = 0.1)]
    failure_rate: f64,

    /// Starting temperature of the simulated sensor
    #[arg(long, env = "SIM_INITIAL_CELSIUS", default_value_t = 22.0)]
    initial_celsius: f32,
}

/// Register the temperature service, wire the host callbacks to it and start
/// the push loop on the host thread.
fn start_host(
    config: &Config,
    cell: Arc<TemperatureCell>,
    push_signal: &'static PushSignal,
) -> Result<(Arc<LoopbackTransport>, Arc<TemperatureService<LoopbackTransport>>)> {
    let transport = Arc::new(LoopbackTransport::new());
    transport.set_register_callback(Box::new(log_register_event));
    let service = Arc::new(TemperatureService::register(transport.clone(), cell.clone())?);

    let weak = Arc::downgrade(&service);
    transport.set_access_callback(Box::new(
        move |op: AccessOp, sink: &mut dyn ResponseSink| match weak.upgrade() {
            Some(service) => service.handle_access(op, sink),
            None => Err(AttError::Unlikely),
        },
    ));
    let weak = Arc::downgrade(&service);
    transport.set_subscribe_callback(Box::new(move |event: &SubscribeEvent| {
        if let Some(service) = weak.upgrade() {
            service.on_subscribe_change(event);
        }
    }));

    if config.gatt.push_on_poll {
        cell.set_notifier(PushNotifier::new(push_signal, service.val_handle()));
    }

    // The host stack delivers callbacks from its own context, so the push
    // loop runs on a dedicated thread
    let host_service = service.clone();
    std::thread::Builder::new()
        .name("ble-host".into())
        .spawn(move || {
            futures_lite::future::block_on(host_service.run_push_loop(push_signal));
        })?;

    Ok((transport, service))
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    config::load_dotenv();
    init_logger();
    let cli = Cli::parse();
    info!("Starting thermo-peripheral");

    let mut config = Config::from_env();
    if let Some(interval) = cli.poll_interval_ms {
        config.sensor.poll_interval_ms = interval;
    }
    if let Some(pin) = cli.gpio {
        config.sensor.gpio_pin = pin;
    }
    if let Some(sensor_type) = cli.sensor_type {
        config.sensor.sensor_type = sensor_type;
    }
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Configuration loaded:");
    info!("  Device Name: {}", config.gatt.device_name);
    info!("  Sensor: {} on GPIO {}", config.sensor.sensor_type, config.sensor.gpio_pin);
    info!("  Poll Interval: {} ms", config.sensor.poll_interval_ms);
    info!("  Push On Poll: {}", config.gatt.push_on_poll);

    let push_signal: &'static PushSignal = PUSH_SIGNAL.init(Signal::new());
    let cell = Arc::new(TemperatureCell::new());

    let (transport, service) = match start_host(&config, cell.clone(), push_signal) {
        Ok(started) => started,
        Err(e) => {
            error!("Failed to start BLE host: {}", e);
            std::process::exit(1);
        }
    };

    let reader = SensorReader::new(
        SimulatedDht::new(cli.initial_celsius, cli.failure_rate),
        config.sensor.sensor_type,
        config.sensor.gpio_pin,
        cell.clone(),
    );
    let poll_task = tokio::spawn(reader.run(config.sensor.poll_interval()));

    let central_task = run_simulated_central(
        transport.clone(),
        service.val_handle(),
        Duration::from_millis(config.sensor.poll_interval_ms.saturating_mul(2)),
    );

    info!("thermo-peripheral is running");
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    poll_task.abort();
    central_task.abort();

    info!(
        "thermo-peripheral stopped after {} indications",
        service.indications_sent()
    );
}
