//! Read-only analysis view over one session.

use chrono::NaiveDateTime;
use contracts::{Channel, ContractError, SensorFamily, Session, SessionId};

/// Borrowed view handed to every estimator; never copies samples.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesFrame<'a> {
    session: &'a Session,
}

impl<'a> TimeSeriesFrame<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub fn id(&self) -> &'a SessionId {
        self.session.id()
    }

    /// Nominal seconds between samples (configuration, not measured)
    pub fn measurement_interval(&self) -> f64 {
        self.session.measurement_interval()
    }

    pub fn len(&self) -> usize {
        self.session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }

    pub fn timestamps(&self) -> &'a [NaiveDateTime] {
        self.session.timestamps()
    }

    /// # Errors
    /// `MissingChannel` if the session did not record `channel`.
    pub fn channel(&self, channel: Channel) -> Result<&'a [f64], ContractError> {
        self.session.channel(channel)
    }

    /// x/y/z columns of one family.
    ///
    /// # Errors
    /// `MissingChannel` for the first absent axis.
    pub fn family(&self, family: SensorFamily) -> Result<[&'a [f64]; 3], ContractError> {
        let [x, y, z] = family.channels();
        Ok([self.channel(x)?, self.channel(y)?, self.channel(z)?])
    }

    pub fn has_family(&self, family: SensorFamily) -> bool {
        family
            .channels()
            .iter()
            .all(|&c| self.session.has_channel(c))
    }

    /// Recorded channels in column order
    pub fn channels(&self) -> impl Iterator<Item = Channel> + 'a {
        self.session.channels()
    }
}

impl<'a> From<&'a Session> for TimeSeriesFrame<'a> {
    fn from(session: &'a Session) -> Self {
        Self::new(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::Sample;

    #[test]
    fn test_family_lookup() {
        let t = NaiveDate::from_ymd_opt(2019, 3, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let sample = SensorFamily::Acc
            .channels()
            .into_iter()
            .fold(Sample::new(t), |s, c| s.with(c, 1.0));
        let session = Session::from_samples("s".into(), 0.01, &[sample.clone(), sample]).unwrap();
        let frame = TimeSeriesFrame::from(&session);

        assert!(frame.has_family(SensorFamily::Acc));
        assert!(!frame.has_family(SensorFamily::Mag));
        assert_eq!(frame.family(SensorFamily::Acc).unwrap()[2], &[1.0, 1.0]);
        assert!(matches!(
            frame.family(SensorFamily::Mag),
            Err(ContractError::MissingChannel { .. })
        ));
        assert_eq!(frame.len(), 2);
    }
}
