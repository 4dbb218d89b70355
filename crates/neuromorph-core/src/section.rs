// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Neurite sections and their borrowed handles.

use core::fmt;
use std::ptr;

use crate::iter::{IterType, Links, Traversal};
use crate::morphology::Morphology;
use crate::types::{Point, PointDisplay, SectionType};

/// Section id, unique within one morphology and assigned in build order
pub type SectionId = u32;

/// Arena record owned by a [`Morphology`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SectionData {
    pub section_type: SectionType,
    pub points: Vec<Point>,
    pub diameters: Vec<f32>,
    pub perimeters: Option<Vec<f32>>,
    pub links: Links,
}

/// Borrowed view of one neurite section
///
/// Handles are cheap to copy and never outlive the morphology they point
/// into. Parent and children are resolved through the owning arena, so a
/// handle can walk the tree in either direction.
#[derive(Clone, Copy)]
pub struct Section<'a> {
    morphology: &'a Morphology,
    id: SectionId,
}

impl<'a> Section<'a> {
    pub(crate) fn new(morphology: &'a Morphology, id: SectionId) -> Self {
        Self { morphology, id }
    }

    fn data(&self) -> &'a SectionData {
        self.morphology.section_data(self.id)
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn section_type(&self) -> SectionType {
        self.data().section_type
    }

    pub fn points(&self) -> &'a [Point] {
        &self.data().points
    }

    pub fn diameters(&self) -> &'a [f32] {
        &self.data().diameters
    }

    pub fn perimeters(&self) -> Option<&'a [f32]> {
        self.data().perimeters.as_deref()
    }

    pub fn n_points(&self) -> usize {
        self.data().points.len()
    }

    /// Number of ancestors; 0 for a root
    pub fn depth(&self) -> u32 {
        self.data().links.depth
    }

    pub fn is_root(&self) -> bool {
        self.data().links.parent.is_none()
    }

    pub fn parent(&self) -> Option<Section<'a>> {
        self.data()
            .links
            .parent
            .map(|id| Section::new(self.morphology, id))
    }

    pub fn child_ids(&self) -> &'a [SectionId] {
        &self.data().links.children
    }

    /// Children in attachment order
    pub fn children(&self) -> impl ExactSizeIterator<Item = Section<'a>> + 'a {
        let morphology = self.morphology;
        self.child_ids()
            .iter()
            .map(move |&id| Section::new(morphology, id))
    }

    /// Walk this section's subtree, or its ancestor chain for `Upstream`
    pub fn iter(&self, iter_type: IterType) -> Traversal<'a, Morphology> {
        Traversal::from_node(self.morphology, self.id, iter_type)
    }

    /// This section followed by each ancestor up to the root
    pub fn upstream(&self) -> Traversal<'a, Morphology> {
        self.iter(IterType::Upstream)
    }

    pub fn morphology(&self) -> &'a Morphology {
        self.morphology
    }
}

impl PartialEq for Section<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && ptr::eq(self.morphology, other.morphology)
    }
}

impl Eq for Section<'_> {}

impl fmt::Debug for Section<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("id", &self.id)
            .field("section_type", &self.section_type())
            .field("parent", &self.data().links.parent)
            .field("n_points", &self.n_points())
            .finish()
    }
}

/// `Section(id=0, points=[(0 0 0),..., (0 5 0)])`
impl fmt::Display for Section<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let points = self.points();
        match (points.first(), points.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "Section(id={}, points=[{},..., {}])",
                self.id,
                PointDisplay(first),
                PointDisplay(last)
            ),
            _ => write!(f, "Section(id={}, points=[])", self.id),
        }
    }
}
