// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

/*!
Geometry primitives and biological type tags.

Points are plain `[f32; 3]` triples; diameters and perimeters are `f32`
sequences stored next to them. These carry no behavior beyond storage,
equality and a few distance helpers.
*/

use core::fmt;

use serde::{Deserialize, Serialize};

/// 3D position (x, y, z)
pub type Point = [f32; 3];

/// Euclidean distance between two points
pub fn distance(a: &Point, b: &Point) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Arithmetic mean of a point set, `None` when empty
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let mut sum = [0.0f64; 3];
    for p in points {
        for axis in 0..3 {
            sum[axis] += f64::from(p[axis]);
        }
    }
    let n = points.len() as f64;
    Some([
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ])
}

/// Renders a point as `(x y z)` with the shortest float representation
pub(crate) struct PointDisplay<'a>(pub &'a Point);

impl fmt::Display for PointDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.0[0], self.0[1], self.0[2])
    }
}

/// Biological category of a neurite section
///
/// Numeric codes follow the SWC convention; codes 5..=19 are user defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    #[default]
    Undefined,
    Soma,
    Axon,
    BasalDendrite,
    ApicalDendrite,
    Custom(u8),
}

impl SectionType {
    /// Highest custom code accepted
    pub const MAX_CUSTOM: u8 = 19;

    /// Decode an SWC-style numeric code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SectionType::Undefined),
            1 => Some(SectionType::Soma),
            2 => Some(SectionType::Axon),
            3 => Some(SectionType::BasalDendrite),
            4 => Some(SectionType::ApicalDendrite),
            5..=19 => Some(SectionType::Custom(code as u8)),
            _ => None,
        }
    }

    /// SWC-style numeric code
    pub fn code(self) -> i32 {
        match self {
            SectionType::Undefined => 0,
            SectionType::Soma => 1,
            SectionType::Axon => 2,
            SectionType::BasalDendrite => 3,
            SectionType::ApicalDendrite => 4,
            SectionType::Custom(code) => i32::from(code),
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionType::Undefined => write!(f, "undefined"),
            SectionType::Soma => write!(f, "soma"),
            SectionType::Axon => write!(f, "axon"),
            SectionType::BasalDendrite => write!(f, "basal_dendrite"),
            SectionType::ApicalDendrite => write!(f, "apical_dendrite"),
            SectionType::Custom(code) => write!(f, "custom_{}", code),
        }
    }
}

/// How the source file described the cell body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SomaType {
    #[default]
    Undefined,
    SinglePoint,
    ThreePointCylinders,
    Cylinders,
    SimpleContour,
}

impl SomaType {
    /// Best guess when the decoder has nothing more specific to say
    pub fn from_point_count(count: usize) -> Self {
        match count {
            0 => SomaType::Undefined,
            1 => SomaType::SinglePoint,
            3 => SomaType::ThreePointCylinders,
            _ => SomaType::Cylinders,
        }
    }
}
