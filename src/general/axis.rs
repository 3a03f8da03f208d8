use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn address(self) -> &'static str {
        match self {
            Axis::X => "/x",
            Axis::Y => "/y",
            Axis::Z => "/z",
        }
    }

    fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address()[1..])
    }
}

impl FromStr for Axis {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('/').to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            _ => Err(BridgeError::InvalidAddress(s.to_string())),
        }
    }
}

/// Last received slider value per axis. Consumers integrate the difference
/// instead of jumping to absolute positions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisState {
    previous: [f32; 3],
}

impl AxisState {
    pub fn previous(&self, axis: Axis) -> f32 {
        self.previous[axis.index()]
    }

    /// Record `value` for `axis` and return `(value - previous) * step`.
    pub fn integrate(&mut self, axis: Axis, value: f32, step: f32) -> f32 {
        let slot = &mut self.previous[axis.index()];
        let delta = (value - *slot) * step;
        *slot = value;
        delta
    }

    pub fn reset(&mut self) {
        self.previous = [0.0; 3];
    }
}

/// State mutated by the scene node's apply handlers.
#[derive(Clone, Debug)]
pub struct SceneState {
    pub axes: AxisState,
    pub step: f32,
    /// Positions of the scene objects moved together by the sliders.
    pub objects: Vec<[f32; 3]>,
    pub last_hello: Option<String>,
}

impl SceneState {
    pub fn new(object_count: usize, step: f32) -> Self {
        SceneState {
            axes: AxisState::default(),
            step,
            objects: vec![[0.0; 3]; object_count],
            last_hello: None,
        }
    }

    /// Integrate a slider value and shift every object along `axis`.
    pub fn apply_axis(&mut self, axis: Axis, value: f32) -> f32 {
        let delta = self.axes.integrate(axis, value, self.step);
        for obj in &mut self.objects {
            obj[axis.index()] += delta;
        }
        delta
    }

    pub fn reset(&mut self) {
        self.axes.reset();
        self.objects.iter_mut().for_each(|o| *o = [0.0; 3]);
        self.last_hello = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_then_zero_on_repeat() {
        let mut axes = AxisState::default();
        axes.integrate(Axis::X, 5.0, 1.0);

        let delta = axes.integrate(Axis::X, 8.0, 0.1);
        assert!((delta - 0.3).abs() < 1e-6);
        assert_eq!(axes.integrate(Axis::X, 8.0, 0.1), 0.0);
        assert_eq!(axes.previous(Axis::X), 8.0);
    }

    #[test]
    fn test_axes_are_independent() {
        let mut axes = AxisState::default();
        axes.integrate(Axis::Y, 3.0, 1.0);
        assert_eq!(axes.previous(Axis::X), 0.0);
        assert_eq!(axes.previous(Axis::Z), 0.0);
        assert_eq!(axes.integrate(Axis::Y, 1.0, 1.0), -2.0);
    }

    #[test]
    fn test_scene_objects_follow_deltas() {
        let mut scene = SceneState::new(2, 0.1);
        scene.apply_axis(Axis::Z, 10.0);
        scene.apply_axis(Axis::Z, 4.0);
        for obj in &scene.objects {
            assert!((obj[2] - 0.4).abs() < 1e-6);
            assert_eq!(obj[0], 0.0);
        }
    }

    #[test]
    fn test_reset() {
        let mut scene = SceneState::new(1, 1.0);
        scene.apply_axis(Axis::X, 2.0);
        scene.last_hello = Some("hi".into());
        scene.reset();
        assert_eq!(scene.axes, AxisState::default());
        assert_eq!(scene.objects, vec![[0.0; 3]]);
        assert!(scene.last_hello.is_none());
    }

    #[test]
    fn test_axis_parsing() {
        assert_eq!("x".parse::<Axis>().unwrap(), Axis::X);
        assert_eq!("/Y".parse::<Axis>().unwrap(), Axis::Y);
        assert!("w".parse::<Axis>().is_err());
        assert_eq!(Axis::Z.to_string(), "z");
    }
}
