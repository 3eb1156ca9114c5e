//! ChairSensor trait - 9-axis sensor capability
//!
//! The collector only needs "give me the current x/y/z of one family"; real
//! hardware drivers and the simulated chair both implement this.

use crate::{ContractError, SensorFamily};

/// One 9-axis chair sensor (accelerometer, gyroscope, magnetometer).
///
/// # Example
///
/// ```ignore
/// let mut sensor: Box<dyn ChairSensor> = Box::new(SimulatedChair::new(42));
/// let [x, y, z] = sensor.read(SensorFamily::Acc)?;
/// ```
pub trait ChairSensor: Send {
    /// Sensor name (used for logging)
    fn name(&self) -> &str;

    /// Current reading of one family, in x/y/z order
    ///
    /// # Errors
    /// Returns an error when the device cannot be read; the collector logs
    /// it and skips the sample.
    fn read(&mut self, family: SensorFamily) -> Result<[f64; 3], ContractError>;
}
