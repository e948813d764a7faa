use chrono::NaiveTime;

/// One snapshot of the inverter's status page. Values are integers with the
/// page's separators stripped, in the units the page prints them in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolplusReading {
    pub device_id: String,
    pub name: String,
    /// Daily yield in kWh.
    pub energy: u32,
    /// AC output power in W.
    pub power: u32,
    /// Grid voltage in V.
    pub ac_voltage: u32,
    /// Panel-side voltage in V.
    pub dc_voltage: u32,
}

impl SolplusReading {
    pub fn device_identifier(&self) -> String {
        format!("solplus_{}", self.device_id)
    }

    /// Daily energy as it should be published at `now`. The inverter keeps
    /// reporting the previous day's yield after sundown; forcing 0 overnight
    /// lets the total_increasing series start the new solar day at zero.
    pub fn energy_at(&self, now: NaiveTime) -> u32 {
        let reset_start = NaiveTime::from_hms_opt(23, 0, 0).expect("valid time");
        let reset_end = NaiveTime::from_hms_opt(3, 0, 0).expect("valid time");
        if is_time_in_range(reset_start, reset_end, now) {
            0
        } else {
            self.energy
        }
    }
}

fn is_time_in_range(start: NaiveTime, end: NaiveTime, time: NaiveTime) -> bool {
    if start <= end {
        start <= time && time <= end
    } else {
        // range wraps midnight
        start <= time || time <= end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn reading() -> SolplusReading {
        SolplusReading {
            device_id: "garage".to_string(),
            name: "Garage Roof".to_string(),
            energy: 125,
            power: 1234,
            ac_voltage: 230,
            dc_voltage: 398,
        }
    }

    #[test]
    fn time_range_wrapping_midnight() {
        assert!(is_time_in_range(at(23, 0), at(3, 0), at(23, 30)));
        assert!(is_time_in_range(at(23, 0), at(3, 0), at(1, 0)));
        assert!(!is_time_in_range(at(23, 0), at(3, 0), at(12, 0)));
        assert!(!is_time_in_range(at(23, 0), at(3, 0), at(22, 59)));
    }

    #[test]
    fn time_range_without_wrap() {
        assert!(is_time_in_range(at(9, 0), at(17, 0), at(12, 0)));
        assert!(!is_time_in_range(at(9, 0), at(17, 0), at(18, 0)));
    }

    #[test]
    fn energy_zeroed_inside_overnight_window() {
        assert_eq!(reading().energy_at(at(23, 30)), 0);
        assert_eq!(reading().energy_at(at(2, 0)), 0);
    }

    #[test]
    fn energy_untouched_during_the_day() {
        assert_eq!(reading().energy_at(at(12, 0)), 125);
        assert_eq!(reading().energy_at(at(3, 1)), 125);
    }

    #[test]
    fn device_identifier_carries_prefix() {
        assert_eq!(reading().device_identifier(), "solplus_garage");
    }
}
