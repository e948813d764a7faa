use crate::home_assistant_config::{DeviceConfig, SensorConfig};
use crate::metric_collector::MetricCollector;
use crate::mqtt_config::MqttConfig;
use crate::mqtt_wrapper::MqttWrapper;
use crate::reading::SolplusReading;

use chrono::Local;
use log::{debug, error};
use serde_json::json;

pub struct HomeAssistant<MQTT: MqttWrapper> {
    client: MQTT,
}

impl<MQTT: MqttWrapper> HomeAssistant<MQTT> {
    pub fn new(config: &MqttConfig) -> Self {
        let client = MQTT::new(config, "-ha");
        Self { client }
    }

    fn publish_json(&mut self, topic: &str, payload: serde_json::Value) {
        debug!("Publishing to {topic} with payload {payload}");

        let payload = serde_json::to_string(&payload).unwrap();
        if let Err(e) =
            self.client
                .publish(topic, crate::mqtt_wrapper::QoS::AtMostOnce, true, payload)
        {
            error!("Failed to publish message: {e:?}");
        }
    }

    fn publish_configs(&mut self, config_topic: &str, sensor_configs: &Vec<SensorConfig>) {
        // configs let home assistant know what sensors are available and where to find them
        for sensor_config in sensor_configs {
            let config_topic = format!("{}/{}/config", config_topic, sensor_config.unique_id);
            let config_payload = serde_json::to_value(sensor_config).unwrap();
            self.publish_json(&config_topic, config_payload);
        }
    }

    fn publish_states(&mut self, reading: &SolplusReading, state_topic: &str) {
        // states contain the actual data
        let json_payload = reading.to_json_payload();
        self.publish_json(state_topic, json_payload);
    }
}

impl<MQTT: MqttWrapper> MetricCollector for HomeAssistant<MQTT> {
    fn publish(&mut self, reading: &SolplusReading) {
        let config_topic = format!("homeassistant/sensor/{}", reading.device_identifier());
        let state_topic = format!("solar/{}/state", reading.device_identifier());

        let sensor_configs = reading.create_sensor_configs(&state_topic);

        self.publish_configs(&config_topic, &sensor_configs);
        self.publish_states(reading, &state_topic);
    }
}

impl SolplusReading {
    fn to_json_payload(&self) -> serde_json::Value {
        // when modifying this function, modify create_sensor_configs accordingly
        json!({
            "energy": self.energy_at(Local::now().time()),
            "power": self.power,
            "ac_voltage": self.ac_voltage,
            "dc_voltage": self.dc_voltage,
        })
    }

    fn create_sensor_configs(&self, state_topic: &str) -> Vec<SensorConfig> {
        let device_config = DeviceConfig::new(
            self.name.clone(),
            "SOLPLUS".to_string(),
            Vec::from([self.device_identifier()]),
        );

        Vec::from([
            SensorConfig::energy(
                state_topic,
                &device_config,
                &format!("{} Energy", self.name),
                "energy",
            ),
            SensorConfig::power(
                state_topic,
                &device_config,
                &format!("{} Power", self.name),
                "power",
            ),
            SensorConfig::voltage(
                state_topic,
                &device_config,
                &format!("{} AC Voltage", self.name),
                "ac_voltage",
            ),
            SensorConfig::voltage(
                state_topic,
                &device_config,
                &format!("{} DC Voltage", self.name),
                "dc_voltage",
            ),
        ])
    }
}
