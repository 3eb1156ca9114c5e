//! Channel - one scalar column of the 9-axis chair sensor

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical sensor of the MPU9250 board
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorFamily {
    /// Accelerometer
    Acc,
    /// Gyroscope
    Gyro,
    /// Magnetometer
    Mag,
}

impl SensorFamily {
    pub const ALL: [SensorFamily; 3] = [SensorFamily::Acc, SensorFamily::Gyro, SensorFamily::Mag];

    pub fn prefix(self) -> &'static str {
        match self {
            SensorFamily::Acc => "acc",
            SensorFamily::Gyro => "gyro",
            SensorFamily::Mag => "mag",
        }
    }

    /// The x/y/z channels of this family, in axis order
    pub fn channels(self) -> [Channel; 3] {
        Axis::ALL.map(|axis| Channel::new(self, axis))
    }
}

impl fmt::Display for SensorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn suffix(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

/// One of the nine scalar channels (`acc_x` .. `mag_z`).
///
/// Ordering follows the column order of recorded files: accelerometer,
/// gyroscope, magnetometer, each x/y/z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel {
    pub family: SensorFamily,
    pub axis: Axis,
}

impl Channel {
    pub const ACC_X: Channel = Channel::new(SensorFamily::Acc, Axis::X);
    pub const ACC_Y: Channel = Channel::new(SensorFamily::Acc, Axis::Y);
    pub const ACC_Z: Channel = Channel::new(SensorFamily::Acc, Axis::Z);
    pub const GYRO_X: Channel = Channel::new(SensorFamily::Gyro, Axis::X);
    pub const GYRO_Y: Channel = Channel::new(SensorFamily::Gyro, Axis::Y);
    pub const GYRO_Z: Channel = Channel::new(SensorFamily::Gyro, Axis::Z);
    pub const MAG_X: Channel = Channel::new(SensorFamily::Mag, Axis::X);
    pub const MAG_Y: Channel = Channel::new(SensorFamily::Mag, Axis::Y);
    pub const MAG_Z: Channel = Channel::new(SensorFamily::Mag, Axis::Z);

    /// All nine channels in file column order
    pub const ALL: [Channel; 9] = [
        Channel::ACC_X,
        Channel::ACC_Y,
        Channel::ACC_Z,
        Channel::GYRO_X,
        Channel::GYRO_Y,
        Channel::GYRO_Z,
        Channel::MAG_X,
        Channel::MAG_Y,
        Channel::MAG_Z,
    ];

    pub const fn new(family: SensorFamily, axis: Axis) -> Self {
        Self { family, axis }
    }

    /// Canonical column name, e.g. `gyro_y`
    pub fn name(self) -> &'static str {
        match (self.family, self.axis) {
            (SensorFamily::Acc, Axis::X) => "acc_x",
            (SensorFamily::Acc, Axis::Y) => "acc_y",
            (SensorFamily::Acc, Axis::Z) => "acc_z",
            (SensorFamily::Gyro, Axis::X) => "gyro_x",
            (SensorFamily::Gyro, Axis::Y) => "gyro_y",
            (SensorFamily::Gyro, Axis::Z) => "gyro_z",
            (SensorFamily::Mag, Axis::X) => "mag_x",
            (SensorFamily::Mag, Axis::Y) => "mag_y",
            (SensorFamily::Mag, Axis::Z) => "mag_z",
        }
    }

    /// Parse a column header as written by the different recorder versions
    /// (`acc_x`, `accel_x`, `Acc_X`, `gyro x`, `magn_z`, ...).
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized = header.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        let (family, axis) = normalized.rsplit_once('_')?;
        let family = match family {
            "acc" | "accel" | "accelerometer" => SensorFamily::Acc,
            "gyro" | "gyroscope" => SensorFamily::Gyro,
            "mag" | "magn" | "magnetometer" => SensorFamily::Mag,
            _ => return None,
        };
        let axis = match axis {
            "x" => Axis::X,
            "y" => Axis::Y,
            "z" => Axis::Z,
            _ => return None,
        };
        Some(Self::new(family, axis))
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_header(s).ok_or_else(|| format!("unknown channel '{s}'"))
    }
}

impl Serialize for Channel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_aliases() {
        assert_eq!(Channel::from_header("acc_x"), Some(Channel::ACC_X));
        assert_eq!(Channel::from_header("accel_y"), Some(Channel::ACC_Y));
        assert_eq!(Channel::from_header(" Acc_Z "), Some(Channel::ACC_Z));
        assert_eq!(Channel::from_header("Gyro X"), Some(Channel::GYRO_X));
        assert_eq!(Channel::from_header("magn_z"), Some(Channel::MAG_Z));
        assert_eq!(Channel::from_header("time"), None);
        assert_eq!(Channel::from_header("acc_w"), None);
    }

    #[test]
    fn ordering_matches_file_columns() {
        let mut shuffled = Channel::ALL;
        shuffled.reverse();
        shuffled.sort();
        assert_eq!(shuffled, Channel::ALL);
        assert_eq!(SensorFamily::Mag.channels()[2], Channel::MAG_Z);
    }

    #[test]
    fn serde_uses_column_name() {
        let json = serde_json::to_string(&Channel::GYRO_Z).unwrap();
        assert_eq!(json, "\"gyro_z\"");
        let parsed: Vec<Channel> = serde_json::from_str(r#"["acc_x","accel_y"]"#).unwrap();
        assert_eq!(parsed, vec![Channel::ACC_X, Channel::ACC_Y]);
    }
}
