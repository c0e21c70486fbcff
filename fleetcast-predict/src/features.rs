use chrono::{DateTime, Datelike, Timelike, Utc};

/// Feature vector consumed by the demand model. Field order here matches the
/// feature list the training pipeline persists into the artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandFeatures {
    /// Dense encoding of the candidate zone id, taken from the artifact.
    pub zone_code: u32,
    pub hour: u32,
    /// 0..=6, Monday = 0.
    pub day_of_week: u32,
    pub month: u32,
    pub is_weekend: bool,
    pub is_peak_hour: bool,
}

impl DemandFeatures {
    pub fn extract(zone_code: u32, at: DateTime<Utc>) -> Self {
        let hour = at.hour();
        let day_of_week = at.weekday().num_days_from_monday();
        Self {
            zone_code,
            hour,
            day_of_week,
            month: at.month(),
            is_weekend: day_of_week >= 5,
            // Commute windows: 7-10 and 16-20 inclusive
            is_peak_hour: (7..=10).contains(&hour) || (16..=20).contains(&hour),
        }
    }

    /// Flatten into the model's input layout:
    /// `[zone_code, hour, day_of_week, month, is_weekend, is_peak_hour]`.
    pub fn to_input(&self) -> [f64; 6] {
        [
            f64::from(self.zone_code),
            f64::from(self.hour),
            f64::from(self.day_of_week),
            f64::from(self.month),
            f64::from(u8::from(self.is_weekend)),
            f64::from(u8::from(self.is_peak_hour)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn weekday_morning_commute() {
        // Monday 2025-03-10, 08:30
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 8, 30, 0).unwrap();
        let f = DemandFeatures::extract(4, at);
        assert_eq!(f.zone_code, 4);
        assert_eq!(f.hour, 8);
        assert_eq!(f.day_of_week, 0);
        assert_eq!(f.month, 3);
        assert!(!f.is_weekend);
        assert!(f.is_peak_hour);
    }

    #[test]
    fn saturday_midday_is_weekend_off_peak() {
        // Saturday 2025-03-15, 13:00
        let at = Utc.with_ymd_and_hms(2025, 3, 15, 13, 0, 0).unwrap();
        let f = DemandFeatures::extract(0, at);
        assert_eq!(f.day_of_week, 5);
        assert!(f.is_weekend);
        assert!(!f.is_peak_hour);
    }

    #[test]
    fn peak_window_edges() {
        let day = |hour| {
            let at = Utc.with_ymd_and_hms(2025, 3, 11, hour, 0, 0).unwrap();
            DemandFeatures::extract(0, at).is_peak_hour
        };
        assert!(!day(6));
        assert!(day(7));
        assert!(day(10));
        assert!(!day(11));
        assert!(!day(15));
        assert!(day(16));
        assert!(day(20));
        assert!(!day(21));
    }

    #[test]
    fn input_layout_matches_feature_order() {
        let at = Utc.with_ymd_and_hms(2025, 3, 16, 18, 0, 0).unwrap(); // Sunday
        let f = DemandFeatures::extract(7, at);
        assert_eq!(f.to_input(), [7.0, 18.0, 6.0, 3.0, 1.0, 1.0]);
    }
}
