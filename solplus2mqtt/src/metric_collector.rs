use crate::reading::SolplusReading;

pub trait MetricCollector {
    fn publish(&mut self, reading: &SolplusReading);
}
