// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Cell body, kept outside the neurite forest.

use core::fmt;

use crate::error::{MorphResult, MorphologyError};
use crate::types::{centroid, distance, Point, PointDisplay, SomaType};

/// Cell body samples
///
/// The soma never receives a section id and never shows up in a traversal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Soma {
    soma_type: SomaType,
    points: Vec<Point>,
    diameters: Vec<f32>,
}

impl Soma {
    /// # Errors
    ///
    /// Returns `SomaArrayMismatch` when `points` and `diameters` differ in length
    pub fn new(soma_type: SomaType, points: Vec<Point>, diameters: Vec<f32>) -> MorphResult<Self> {
        if points.len() != diameters.len() {
            return Err(MorphologyError::SomaArrayMismatch {
                points: points.len(),
                diameters: diameters.len(),
            });
        }
        Ok(Self {
            soma_type,
            points,
            diameters,
        })
    }

    /// Soma of a morphology whose source described no cell body
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn soma_type(&self) -> SomaType {
        self.soma_type
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn diameters(&self) -> &[f32] {
        &self.diameters
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Centroid of the soma points
    pub fn center(&self) -> Option<Point> {
        centroid(&self.points)
    }

    /// Largest distance from the centroid to any soma point
    ///
    /// Zero for an empty soma, a single point, or coincident points.
    pub fn max_distance(&self) -> f32 {
        let Some(center) = self.center() else {
            return 0.0;
        };
        self.points
            .iter()
            .map(|p| distance(&center, p))
            .fold(0.0, f32::max)
    }
}

impl fmt::Display for Soma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.center() {
            Some(center) => write!(
                f,
                "Soma(n_points={}, center={})",
                self.points.len(),
                PointDisplay(&center)
            ),
            None => write!(f, "Soma(n_points=0)"),
        }
    }
}
