use serde::{Deserialize, Serialize};

/// Device axis an elevation strategy integrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

/// One reading of device acceleration, gravity excluded, in m/s².
///
/// Platforms may leave any component out; a sample with no component at
/// all carries no information.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionSample {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl MotionSample {
    pub fn new(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        MotionSample { x, y, z }
    }

    /// A sample with only the given axis present.
    pub fn along(axis: Axis, value: f64) -> Self {
        let mut sample = MotionSample::default();
        match axis {
            Axis::X => sample.x = Some(value),
            Axis::Y => sample.y = Some(value),
            Axis::Z => sample.z = Some(value),
        }
        sample
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    /// Reading along `axis`. Missing and non-finite readings are `None`.
    pub fn axis(&self, axis: Axis) -> Option<f64> {
        let value = match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        };
        value.filter(|v| v.is_finite())
    }

    /// Sum of absolute accelerations; missing axes count as 0.
    pub fn magnitude(&self) -> f64 {
        [Axis::X, Axis::Y, Axis::Z]
            .into_iter()
            .filter_map(|axis| self.axis(axis))
            .map(f64::abs)
            .sum()
    }
}
