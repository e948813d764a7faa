use crate::{
    metric_collector::MetricCollector,
    mqtt_config::MqttConfig,
    mqtt_wrapper::{MqttWrapper, QoS},
    reading::SolplusReading,
};

use chrono::Local;
use log::{debug, warn};

pub struct SimpleMqtt<MQTT: MqttWrapper> {
    client: MQTT,
}

impl<MQTT: MqttWrapper> SimpleMqtt<MQTT> {
    pub fn new(config: &MqttConfig) -> Self {
        let client = MQTT::new(config, "-sm");
        Self { client }
    }
}

impl<MQTT: MqttWrapper> MetricCollector for SimpleMqtt<MQTT> {
    fn publish(&mut self, reading: &SolplusReading) {
        debug!("{reading:?}");

        let now = Local::now();
        let base = format!("solplus/{}", reading.device_id);

        let topic_payload_pairs = [
            (format!("{base}/name"), reading.name.clone()),
            (
                format!("{base}/last_seen"),
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
            (
                format!("{base}/energy"),
                reading.energy_at(now.time()).to_string(),
            ),
            (format!("{base}/power"), reading.power.to_string()),
            (format!("{base}/ac_voltage"), reading.ac_voltage.to_string()),
            (format!("{base}/dc_voltage"), reading.dc_voltage.to_string()),
        ];

        topic_payload_pairs
            .into_iter()
            .for_each(|(topic, payload)| {
                if let Err(e) = self.client.publish(topic, QoS::AtMostOnce, true, payload) {
                    warn!("mqtt error: {e:?}")
                }
            });
    }
}
