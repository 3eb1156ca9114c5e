//! Explicit cleaning steps applied before analysis.
//!
//! Estimators never drop or rescale samples on their own; callers choose
//! which of these steps to run.

use contracts::{SensorFamily, Session};
use serde::{Deserialize, Serialize};

/// Remove every sample with a NaN/Inf value in any channel.
///
/// Returns the cleaned session and the number of dropped samples.
pub fn drop_non_finite(session: &Session) -> (Session, usize) {
    let mut keep = vec![true; session.len()];
    for column in session.columns().values() {
        for (k, v) in keep.iter_mut().zip(column) {
            *k &= v.is_finite();
        }
    }
    let dropped = keep.iter().filter(|&&k| !k).count();
    if dropped == 0 {
        return (session.clone(), 0);
    }
    (session.filter_rows(&keep), dropped)
}

/// Count-to-unit factors per sensor family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleCoefficients {
    pub acc: f64,
    pub gyro: f64,
    pub mag: f64,
}

impl ScaleCoefficients {
    /// MPU9250 at ±2 g, ±250 °/s and the 16-bit AK8963 range
    pub const MPU9250: Self = Self {
        acc: 2.0 / 32768.0,
        gyro: 250.0 / 32768.0,
        mag: 4912.0 / 32760.0,
    };

    pub fn for_family(&self, family: SensorFamily) -> f64 {
        match family {
            SensorFamily::Acc => self.acc,
            SensorFamily::Gyro => self.gyro,
            SensorFamily::Mag => self.mag,
        }
    }
}

impl Default for ScaleCoefficients {
    fn default() -> Self {
        Self::MPU9250
    }
}

/// Convert raw register counts to g, °/s and µT.
pub fn scale_raw_counts(session: &Session, coefficients: &ScaleCoefficients) -> Session {
    session.map_columns(|channel, column| {
        let factor = coefficients.for_family(channel.family);
        column.iter().map(|v| v * factor).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use contracts::{Channel, Sample};

    fn session(rows: &[(f64, f64)]) -> Session {
        let t0 = NaiveDate::from_ymd_opt(2019, 3, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let samples: Vec<Sample> = rows
            .iter()
            .enumerate()
            .map(|(i, &(acc, mag))| {
                Sample::new(t0 + Duration::milliseconds(10 * i as i64))
                    .with(Channel::ACC_Z, acc)
                    .with(Channel::MAG_X, mag)
            })
            .collect();
        Session::from_samples("s".into(), 0.01, &samples).unwrap()
    }

    #[test]
    fn test_drop_non_finite_rows() {
        let s = session(&[(1.0, 2.0), (f64::NAN, 2.0), (3.0, f64::INFINITY), (4.0, 5.0)]);
        let (clean, dropped) = drop_non_finite(&s);
        assert_eq!(dropped, 2);
        assert_eq!(clean.len(), 2);
        assert_eq!(clean.channel(Channel::ACC_Z).unwrap(), &[1.0, 4.0]);
        assert_eq!(clean.timestamps()[1], s.timestamps()[3]);
    }

    #[test]
    fn test_clean_session_untouched() {
        let s = session(&[(1.0, 2.0), (3.0, 4.0)]);
        let (clean, dropped) = drop_non_finite(&s);
        assert_eq!(dropped, 0);
        assert_eq!(clean, s);
    }

    #[test]
    fn test_scale_per_family() {
        let s = session(&[(-16384.0, 32760.0)]);
        let scaled = scale_raw_counts(&s, &ScaleCoefficients::default());
        assert_eq!(scaled.channel(Channel::ACC_Z).unwrap(), &[-1.0]);
        assert_eq!(scaled.channel(Channel::MAG_X).unwrap(), &[4912.0]);
    }
}
