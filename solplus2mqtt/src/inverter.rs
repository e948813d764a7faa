use std::sync::LazyLock;
use std::time::Duration;

use log::{debug, error, info};
use regex::Regex;
use ureq::Agent;

use crate::reading::SolplusReading;

static REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

// The status page is German throughout, independent of any browser language
// setting, so the labels are stable anchors.
static ENERGY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<li>Energie Tag:\s*([\d.,]+)\s*kWh").expect("valid pattern"));
static POWER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<b>Leistung AC:\s*([\d.,]+)\s*Watt</b>").expect("valid pattern"));
static AC_VOLTAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<b>Netzspannung:\s*([\d.,]+)\s*Volt</b>").expect("valid pattern"));
static DC_VOLTAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<b>Gleichspannung:\s*([\d.,]+)\s*Volt</b>").expect("valid pattern")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum NetworkState {
    Unknown,
    Online,
    Offline,
}

pub struct Inverter {
    device_id: String,
    name: String,
    ip_address: String,
    log_http_errors: bool,
    state: NetworkState,
    agent: Agent,
}

impl Inverter {
    pub fn new(device_id: &str, name: &str, ip_address: &str, log_http_errors: bool) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        Self {
            device_id: device_id.to_string(),
            name: name.to_string(),
            ip_address: ip_address.to_string(),
            log_http_errors,
            state: NetworkState::Unknown,
            agent,
        }
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    fn set_state(&mut self, new_state: NetworkState) {
        if self.state != new_state {
            self.state = new_state;
            info!("Inverter {} is {new_state:?}", self.name);
        }
    }

    /// One startup probe per device to surface misconfigured addresses early.
    pub fn assert_can_connect(&mut self) -> bool {
        if self.update_state().is_some() {
            info!("Asserted connectivity to inverter {}", self.name);
            return true;
        }
        false
    }

    /// Fetches and parses the inverter's status page. Returns `None` on any
    /// failure; connection errors are only logged at error level when the
    /// `log_http_errors` flag is set, since a sleeping inverter is routine.
    pub fn update_state(&mut self) -> Option<SolplusReading> {
        let url = format!("http://{}/", self.ip_address);

        let mut response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code)) => {
                error!(
                    "Could connect to inverter {} but it returned status code {code}",
                    self.name
                );
                self.set_state(NetworkState::Offline);
                return None;
            }
            Err(e) => {
                if self.log_http_errors {
                    error!("Could not connect to inverter {}: {e}", self.name);
                } else {
                    debug!("Could not connect to inverter {}: {e}", self.name);
                }
                self.set_state(NetworkState::Offline);
                return None;
            }
        };

        let body = match response.body_mut().read_to_vec() {
            Ok(body) => body,
            Err(e) => {
                if self.log_http_errors {
                    error!("Could not read response from inverter {}: {e}", self.name);
                } else {
                    debug!("Could not read response from inverter {}: {e}", self.name);
                }
                self.set_state(NetworkState::Offline);
                return None;
            }
        };

        // The firmware serves ISO-8859-1, which maps bytes 1:1 onto the
        // first 256 code points.
        let html: String = body.iter().map(|&byte| byte as char).collect();

        let Some(page) = parse_status_page(&html) else {
            error!("HTML was received from inverter {}, but parsing failed", self.name);
            self.set_state(NetworkState::Offline);
            return None;
        };

        self.set_state(NetworkState::Online);
        Some(SolplusReading {
            device_id: self.device_id.clone(),
            name: self.name.clone(),
            energy: page.energy,
            power: page.power,
            ac_voltage: page.ac_voltage,
            dc_voltage: page.dc_voltage,
        })
    }
}

struct StatusPage {
    energy: u32,
    power: u32,
    ac_voltage: u32,
    dc_voltage: u32,
}

fn parse_status_page(html: &str) -> Option<StatusPage> {
    Some(StatusPage {
        energy: capture_metric(&ENERGY_PATTERN, html)?,
        power: capture_metric(&POWER_PATTERN, html)?,
        ac_voltage: capture_metric(&AC_VOLTAGE_PATTERN, html)?,
        dc_voltage: capture_metric(&DC_VOLTAGE_PATTERN, html)?,
    })
}

fn capture_metric(pattern: &Regex, html: &str) -> Option<u32> {
    let capture = pattern.captures(html)?.get(1)?;
    // German-style group/decimal separators, e.g. "1.234" or "12,5"
    capture.as_str().replace(['.', ','], "").parse().ok()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const STATUS_PAGE: &str = "<html><head><title>SOLPLUS 50</title></head><body>\n\
        <ul><li>Energie Tag: 12,5 kWh</li></ul>\n\
        <b>Leistung AC: 1.234 Watt</b><br>\n\
        <b>Netzspannung: 230 Volt</b><br>\n\
        <b>Gleichspannung: 398 Volt</b>\n\
        </body></html>";

    #[test]
    fn parses_all_metrics_from_status_page() {
        let page = parse_status_page(STATUS_PAGE).unwrap();
        assert_eq!(page.energy, 125);
        assert_eq!(page.power, 1234);
        assert_eq!(page.ac_voltage, 230);
        assert_eq!(page.dc_voltage, 398);
    }

    #[test]
    fn strips_group_and_decimal_separators() {
        assert_eq!(capture_metric(&POWER_PATTERN, "<b>Leistung AC: 1.234,5 Watt</b>"), Some(12345));
        assert_eq!(capture_metric(&POWER_PATTERN, "<b>Leistung AC: 42 Watt</b>"), Some(42));
    }

    #[test]
    fn missing_metric_fails_whole_parse() {
        let truncated = STATUS_PAGE.replace("<b>Gleichspannung: 398 Volt</b>", "");
        assert!(parse_status_page(&truncated).is_none());
    }

    #[test]
    fn unrelated_html_fails_parse() {
        assert!(parse_status_page("<html><body>404 Not Found</body></html>").is_none());
    }

    struct ErrorCountingLogger;

    static ERROR_COUNT: AtomicUsize = AtomicUsize::new(0);
    static LOGGER: ErrorCountingLogger = ErrorCountingLogger;

    impl log::Log for ErrorCountingLogger {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if record.level() == log::Level::Error {
                ERROR_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn flush(&self) {}
    }

    // both flag states in one test, since a process can only install one logger
    #[test]
    fn connect_failures_log_errors_only_when_flag_set() {
        log::set_logger(&LOGGER).expect("no other logger installed");
        log::set_max_level(log::LevelFilter::Debug);

        // port 1 on loopback refuses connections immediately
        let mut quiet = Inverter::new("quiet", "Quiet", "127.0.0.1:1", false);
        assert!(quiet.update_state().is_none());
        assert_eq!(ERROR_COUNT.load(Ordering::SeqCst), 0);

        let mut loud = Inverter::new("loud", "Loud", "127.0.0.1:1", true);
        assert!(loud.update_state().is_none());
        assert!(ERROR_COUNT.load(Ordering::SeqCst) >= 1);
    }
}
