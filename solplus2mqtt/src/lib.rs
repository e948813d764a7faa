// externally visible interfaces
pub mod home_assistant;
pub mod inverter;
pub mod metric_collector;
pub mod mqtt_config;
pub mod mqtt_wrapper;
pub mod reading;
pub mod simple_mqtt;

// internal interfaces
mod home_assistant_config;
