use serde::{Deserialize, Serialize};

use crate::ecs::{Component, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl Component for Name {}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Component for Position {}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Velocity {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Component for Velocity {}

fn default_gravity() -> f64 {
    9.81
}

fn default_air_drag() -> f64 {
    0.1
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConstants {
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    #[serde(default = "default_air_drag")]
    pub air_drag: f64,
}

impl Default for PhysicsConstants {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            air_drag: default_air_drag(),
        }
    }
}

impl Resource for PhysicsConstants {}

/// Axis-aligned playfield centred on the origin. Bodies leaving it are
/// despawned when present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub half_width: f64,
    pub half_height: f64,
}

impl Bounds {
    pub fn contains(&self, position: &Position) -> bool {
        position.x.abs() <= self.half_width && position.y.abs() <= self.half_height
    }
}

impl Resource for Bounds {}
