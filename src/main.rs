use color_eyre::{eyre::eyre, Result};
use rovcontrol::cli;
use rovcontrol::config::RovConfig;
use rovcontrol::controller::{CollectorError, ControllerError, ControllerHandle};
use rovcontrol::depth::depth_register;
use rovcontrol::mqtt::{MqttHandler, MqttMessage};
use rovcontrol::runtime::{
    period_from_rate, supervise, DepthFeed, DepthLoop, LoopTasks, RuntimeError, ThrusterLoop,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Sensor messages buffered between the MQTT event loop and the depth feed
const SENSOR_QUEUE_CAPACITY: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
    let command = match cli::parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{}", cli::USAGE);
            std::process::exit(1);
        }
    };

    setup()?;
    let config = RovConfig::load()
        .await
        .map_err(|e| eyre!("Failed to load config: {}", e))?;
    info!("Starting {:?}", command);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested"),
            Err(e) => error!("Failed to listen for shutdown signal: {}", e),
        }
        signal_token.cancel();
    });

    // Open the gamepad before touching the network
    let controller = if command.runs_joystick() {
        match ControllerHandle::spawn(config.input.controller_settings(), shutdown.clone()).await {
            Ok(pair) => Some(pair),
            Err(ControllerError::CollectorError(CollectorError::NoGamepadError(reason))) => {
                error!("No joystick found. Exiting...");
                return Err(eyre!("No joystick found: {}", reason));
            }
            Err(e) => return Err(eyre!("Failed to start controller: {}", e)),
        }
    } else {
        None
    };

    let (mut mqtt_handler, publisher) = MqttHandler::new(&config.mqtt);
    let mut tasks = LoopTasks::new();

    if let Some(setpoint) = command.depth_setpoint() {
        let (sensor_tx, sensor_rx) = mpsc::channel::<MqttMessage>(SENSOR_QUEUE_CAPACITY);
        mqtt_handler.subscribe(config.topics.depth_sensor.clone(), sensor_tx);

        let (writer, reader) = depth_register(0.0);
        let feed = DepthFeed::new(sensor_rx, writer);
        let token = shutdown.clone();
        tasks.spawn(async move {
            feed.run(token).await;
            Ok(())
        });

        let depth_loop = DepthLoop::new(
            setpoint,
            reader,
            publisher.clone(),
            config.topics.depth_correction.clone(),
        );
        let period = period_from_rate(config.depth.rate_hz);
        let token = shutdown.clone();
        tasks.spawn(async move {
            depth_loop.run(period, token).await;
            Ok(())
        });
    }

    let mut controller_handle = None;
    if let Some((handle, sampler)) = controller {
        info!("Using gamepad {}", handle.gamepad_name());
        let thruster_loop = ThrusterLoop::new(sampler, publisher.clone(), config.topics.clone());
        let period = period_from_rate(config.input.rate_hz);
        let token = shutdown.clone();
        tasks.spawn(async move { thruster_loop.run(period, token).await.map_err(RuntimeError::from) });
        controller_handle = Some(handle);
    }

    let token = shutdown.clone();
    tasks.spawn(async move {
        mqtt_handler.run(token).await;
        Ok(())
    });

    let outcome = supervise(tasks, shutdown).await;

    if let Some(handle) = controller_handle {
        handle.shutdown().await;
    }

    if let Err(e) = outcome {
        error!("Exiting after failure: {}", e);
        return Err(eyre!("{}", e));
    }

    info!("Shut down cleanly");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_env_filter(log_filter())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

// RUST_LOG directives, info when unset or unparsable
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn log_level_follows_rust_log() {
        std::env::set_var("RUST_LOG", "debug");
        assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::DEBUG));

        std::env::remove_var("RUST_LOG");
        assert_eq!(log_filter().max_level_hint(), Some(LevelFilter::INFO));
    }
}
