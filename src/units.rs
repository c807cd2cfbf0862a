//! Value types for the workspace coordinate system.
//!
//! Workspace coordinates are logical units independent of any screen scale.
//! Every position the engine stores or compares is expressed in them.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub};

/// Point in the workspace coordinate system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspacePoint {
    pub x: f64,
    pub y: f64,
}

impl WorkspacePoint {
    /// The origin.
    pub const ZERO: WorkspacePoint = WorkspacePoint { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: WorkspacePoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Add for WorkspacePoint {
    type Output = WorkspacePoint;

    fn add(self, rhs: WorkspacePoint) -> WorkspacePoint {
        WorkspacePoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for WorkspacePoint {
    fn add_assign(&mut self, rhs: WorkspacePoint) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for WorkspacePoint {
    type Output = WorkspacePoint;

    fn sub(self, rhs: WorkspacePoint) -> WorkspacePoint {
        WorkspacePoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for WorkspacePoint {
    type Output = WorkspacePoint;

    fn neg(self) -> WorkspacePoint {
        WorkspacePoint::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for WorkspacePoint {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}
