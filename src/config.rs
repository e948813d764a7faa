use std::{collections::BTreeMap, env, fs};

use log::{info, warn};
use serde::Deserialize;
use solplus2mqtt::mqtt_config::MqttConfig;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log_http_errors: bool,
    pub update_interval: Option<u64>,
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceConfig>,
    pub home_assistant: Option<MqttConfig>,
    pub simple_mqtt: Option<MqttConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub ip_address: String,
}

impl Config {
    pub fn is_valid(&self) -> bool {
        self.devices
            .values()
            .any(|device| !device.ip_address.is_empty())
            && (self.home_assistant.as_ref().is_some_and(|x| x.is_valid())
                || self.simple_mqtt.as_ref().is_some_and(|x| x.is_valid()))
    }

    pub fn load() -> Config {
        // parse config from TOML file, looked up in the current working dir
        // or next to the executable if the former fails
        let mut path = std::env::current_dir().expect("can't retrieve current dir");
        path.push("config.toml");
        if !path.exists() {
            info!(
                "{} does not exist. Trying relative path",
                path.to_str().expect("Cannot retrieve path")
            );
            path = std::env::current_exe().expect("Unable to get current executable path");
            path.pop();
            path.push("config.toml");
        }
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => {
                info!(
                    "loaded configuration from {}",
                    path.to_str().expect("Cannot retrieve path")
                );
                contents
            }
            Err(e) => {
                warn!("Could not read config.toml: {e}");
                "".into()
            }
        };
        let mut config = match toml::from_str::<Config>(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("toml config unparsable: {e}");
                Config::default()
            }
        };

        // overwrite config if environment variables are set
        // $SOLPLUS_IP_ADDRESS / $SOLPLUS_NAME inject a device named "inverter"
        if let Ok(ip_address) = env::var("SOLPLUS_IP_ADDRESS") {
            config
                .devices
                .entry("inverter".to_string())
                .or_default()
                .ip_address = ip_address;
        }
        if let Ok(name) = env::var("SOLPLUS_NAME") {
            config
                .devices
                .entry("inverter".to_string())
                .or_default()
                .name = name;
        }
        for device in config.devices.values_mut() {
            if device.name.is_empty() {
                device.name = "SOLPLUS Inverter".to_string();
            }
        }
        // $LOG_HTTP_ERRORS
        if let Ok(log_http_errors) = env::var("LOG_HTTP_ERRORS") {
            config.log_http_errors = log_http_errors.parse().unwrap_or(false);
        }
        // $MQTT_BROKER_HOST
        let mut mqtt_config_overwritten = false;
        if let Ok(host) = env::var("MQTT_BROKER_HOST") {
            config
                .home_assistant
                .get_or_insert(MqttConfig::default())
                .host = host;
            mqtt_config_overwritten = true;
        }
        // $MQTT_USERNAME (optional)
        if let Ok(username) = env::var("MQTT_USERNAME") {
            config
                .home_assistant
                .get_or_insert(MqttConfig::default())
                .username = Some(username);
            mqtt_config_overwritten = true;
        }
        // $MQTT_PASSWORD (optional)
        if let Ok(password) = env::var("MQTT_PASSWORD") {
            config
                .home_assistant
                .get_or_insert(MqttConfig::default())
                .password = Some(password);
            mqtt_config_overwritten = true;
        }
        // $MQTT_PORT (optional)
        if let Ok(port) = env::var("MQTT_PORT") {
            config
                .home_assistant
                .get_or_insert(MqttConfig::default())
                .port = Some(port.parse().unwrap_or(1883));
            mqtt_config_overwritten = true;
        }
        if mqtt_config_overwritten {
            config.simple_mqtt = config.home_assistant.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        log_http_errors = true
        update_interval = 60000

        [devices.garage]
        name = "Garage Roof"
        ip_address = "192.168.1.50"

        [devices.barn]
        name = "Barn"
        ip_address = "192.168.1.51"

        [home_assistant]
        host = "broker.local"
    "#;

    #[test]
    fn parses_devices_map() {
        let config: Config = toml::from_str(EXAMPLE).unwrap();
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices["garage"].name, "Garage Roof");
        assert_eq!(config.devices["garage"].ip_address, "192.168.1.50");
        assert_eq!(config.update_interval, Some(60000));
        assert!(config.log_http_errors);
        assert!(config.is_valid());
    }

    #[test]
    fn log_http_errors_defaults_to_false() {
        let config: Config = toml::from_str(
            r#"
            [devices.garage]
            name = "Garage Roof"
            ip_address = "192.168.1.50"

            [home_assistant]
            host = "broker.local"
            "#,
        )
        .unwrap();
        assert!(!config.log_http_errors);
    }

    #[test]
    fn config_without_devices_is_invalid() {
        let config: Config = toml::from_str(
            r#"
            [home_assistant]
            host = "broker.local"
            "#,
        )
        .unwrap();
        assert!(!config.is_valid());
    }

    #[test]
    fn config_without_mqtt_output_is_invalid() {
        let config: Config = toml::from_str(
            r#"
            [devices.garage]
            name = "Garage Roof"
            ip_address = "192.168.1.50"
            "#,
        )
        .unwrap();
        assert!(!config.is_valid());
    }

    #[test]
    fn empty_config_is_invalid() {
        let config = Config::default();
        assert!(!config.is_valid());
    }
}
