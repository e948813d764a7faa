mod config;
mod logging;
mod rumqttc_wrapper;

use std::thread;
use std::time::Duration;

use config::Config;
use log::{error, info};
use rumqttc_wrapper::RumqttcWrapper;
use solplus2mqtt::home_assistant::HomeAssistant;
use solplus2mqtt::inverter::Inverter;
use solplus2mqtt::metric_collector::MetricCollector;
use solplus2mqtt::simple_mqtt::SimpleMqtt;

static UPDATE_INTERVAL_DEFAULT: u64 = 30_500;

fn main() {
    logging::init_logger();
    info!("Running revision: {}", env!("GIT_HASH"));
    if std::env::args().len() > 1 {
        error!("Arguments passed. Tool is configured by config.toml in its path");
    }

    let config = Config::load();
    if !config.is_valid() {
        error!("configuration is incomplete: at least one device and one MQTT output are required");
        std::process::exit(1);
    }

    let update_interval = match config.update_interval {
        Some(value) if value > UPDATE_INTERVAL_DEFAULT => {
            info!(
                "using non-default update interval of {:.2}s",
                (value as f64 / 1000.)
            );
            value
        }
        _ => {
            info!(
                "using default update interval of {:.2}s",
                (UPDATE_INTERVAL_DEFAULT as f64 / 1000.)
            );
            UPDATE_INTERVAL_DEFAULT
        }
    };

    let mut inverters: Vec<Inverter> = config
        .devices
        .iter()
        .map(|(device_id, device)| {
            info!(
                "device {device_id}: {} at {}",
                device.name, device.ip_address
            );
            Inverter::new(
                device_id,
                &device.name,
                &device.ip_address,
                config.log_http_errors,
            )
        })
        .collect();

    for inverter in &mut inverters {
        if !inverter.assert_can_connect() {
            error!(
                "Could not connect to SOLPLUS Inverter on ip: {}",
                inverter.ip_address()
            );
        }
    }

    let mut output_channels: Vec<Box<dyn MetricCollector>> = Vec::new();
    if let Some(config) = &config.home_assistant {
        info!("Publishing to Home Assistant");
        output_channels.push(Box::new(HomeAssistant::<RumqttcWrapper>::new(config)));
    }

    if let Some(config) = &config.simple_mqtt {
        info!("Publishing to simple MQTT broker");
        output_channels.push(Box::new(SimpleMqtt::<RumqttcWrapper>::new(config)));
    }

    loop {
        for inverter in &mut inverters {
            if let Some(reading) = inverter.update_state() {
                output_channels.iter_mut().for_each(|channel| {
                    channel.publish(&reading);
                })
            }
        }

        thread::sleep(Duration::from_millis(update_interval));
    }
}
