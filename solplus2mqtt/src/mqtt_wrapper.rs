use crate::mqtt_config::MqttConfig;

#[derive(Clone, Copy)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

// This trait decouples library code from the concrete MQTT client. Calling
// code wraps its MQTT implementation in a new type that implements the trait.
pub trait MqttWrapper {
    fn publish<S, V>(&mut self, topic: S, qos: QoS, retain: bool, payload: V) -> anyhow::Result<()>
    where
        S: Clone + Into<String>,
        V: Clone + Into<Vec<u8>>;

    fn new(config: &MqttConfig, suffix: &str) -> Self;
}
