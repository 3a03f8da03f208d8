//! Drag position to (relative distance, azimuth) around a zone center, with
//! one-shot exit events per tracked element.

use std::collections::HashMap;
use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::remote::message::MessageEnvelope;

pub const AMBISONIC_PREFIX: &str = "/ambisonic";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpatialEvent {
    Inside { relative_distance: f32, azimuth: f32 },
    /// First sample outside after being inside.
    Exit,
    /// Still outside; nothing to send.
    NoOp,
}

impl SpatialEvent {
    /// `/ambisonic<id>` carrying distance and azimuth, or bare on exit.
    pub fn to_envelope(&self, element_id: &str) -> Option<MessageEnvelope> {
        let address = format!("{}{}", AMBISONIC_PREFIX, element_id);
        match *self {
            SpatialEvent::Inside {
                relative_distance,
                azimuth,
            } => Some(MessageEnvelope::new(address).vec2(relative_distance, azimuth)),
            SpatialEvent::Exit => Some(MessageEnvelope::new(address)),
            SpatialEvent::NoOp => None,
        }
    }
}

/// Polar coordinates of `current` relative to `center`, or `None` when the
/// point lies beyond `radius` or is not a finite position. Azimuth is
/// atan2(dy, dx) in (-pi, pi].
pub fn polar(current: Point, center: Point, radius: f32) -> Option<(f32, f32)> {
    let dx = current.x - center.x;
    let dy = current.y - center.y;
    let distance = dx.hypot(dy);
    if distance.is_nan() || distance > radius {
        return None;
    }
    let mut azimuth = dy.atan2(dx);
    // atan2(-0.0, negative) lands on -pi; the range is half-open at -pi.
    if azimuth <= -PI {
        azimuth = PI;
    }
    Some((distance / radius, azimuth))
}

/// Inside/outside flag per drag element.
#[derive(Debug, Default)]
pub struct SpatialTracker {
    inside: HashMap<String, bool>,
}

impl SpatialTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_elements<I, T>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut tracker = Self::new();
        for id in ids {
            tracker.track(id)?;
        }
        Ok(tracker)
    }

    /// Start tracking an element. Elements begin outside the zone.
    pub fn track(&mut self, element_id: impl Into<String>) -> Result<()> {
        let id = element_id.into();
        if self.inside.contains_key(&id) {
            return Err(BridgeError::DuplicateElement(id));
        }
        self.inside.insert(id, false);
        Ok(())
    }

    pub fn is_inside(&self, element_id: &str) -> Option<bool> {
        self.inside.get(element_id).copied()
    }

    pub fn update(
        &mut self,
        element_id: &str,
        current: Point,
        center: Point,
        radius: f32,
    ) -> Result<SpatialEvent> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(BridgeError::InvalidRadius(radius));
        }
        let inside = self
            .inside
            .get_mut(element_id)
            .ok_or_else(|| BridgeError::UnknownElement(element_id.to_string()))?;

        match polar(current, center, radius) {
            Some((relative_distance, azimuth)) => {
                *inside = true;
                Ok(SpatialEvent::Inside {
                    relative_distance,
                    azimuth,
                })
            }
            None if *inside => {
                *inside = false;
                Ok(SpatialEvent::Exit)
            }
            None => Ok(SpatialEvent::NoOp),
        }
    }

    /// Put an element back inside after its exit could not be delivered, so
    /// the next sample outside produces the exit again.
    pub fn rearm_exit(&mut self, element_id: &str) {
        if let Some(inside) = self.inside.get_mut(element_id) {
            *inside = true;
        }
    }

    /// Mark every element as outside again.
    pub fn reset(&mut self) {
        self.inside.values_mut().for_each(|v| *v = false);
    }
}
