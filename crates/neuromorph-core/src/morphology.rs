// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

/*!
The canonical, immutable morphology.

A [`Morphology`] owns an arena of neurite sections, the ordered list of root
ids, one [`Soma`] and optionally a [`Mitochondria`] forest. It is produced
by the tree builder and never changes afterwards, so it is `Send + Sync` and
can be shared behind an `Arc` while any number of traversals run against it.

## Example

```rust
use neuromorph_core::{build_morphology, NeuriteRow, RawMorphology, SectionType};

let raw = RawMorphology {
    neurites: vec![
        NeuriteRow::new(0, SectionType::Axon, vec![[0.0; 3], [0.0, 1.0, 0.0]], vec![1.0; 2], None),
        NeuriteRow::new(1, SectionType::Axon, vec![[0.0, 1.0, 0.0], [0.0, 2.0, 0.0]], vec![1.0; 2], Some(0)),
    ],
    ..Default::default()
};
let morphology = build_morphology(raw)?;
let ids: Vec<u32> = morphology.depth_first().map(|s| s.id()).collect();
assert_eq!(ids, vec![0, 1]);
# Ok::<(), neuromorph_core::MorphologyError>(())
```
*/

use ndarray::{Array1, Array2};

use crate::error::{MorphResult, MorphologyError};
use crate::iter::{traverse, IterType, Links, Start, Traversal, TreeTopology};
use crate::mitochondria::Mitochondria;
use crate::section::{Section, SectionData, SectionId};
use crate::soma::Soma;
use crate::types::{Point, SectionType};

/// Neurite forest plus soma and optional mitochondria
#[derive(Debug, Clone, PartialEq)]
pub struct Morphology {
    sections: Vec<SectionData>,
    root_ids: Vec<SectionId>,
    soma: Soma,
    mitochondria: Option<Mitochondria>,
}

impl Morphology {
    pub(crate) fn new(soma: Soma) -> Self {
        Self {
            sections: Vec::new(),
            root_ids: Vec::new(),
            soma,
            mitochondria: None,
        }
    }

    /// Append a section under `parent` (already present) or as a new root
    pub(crate) fn push_section(
        &mut self,
        section_type: SectionType,
        points: Vec<Point>,
        diameters: Vec<f32>,
        perimeters: Option<Vec<f32>>,
        parent: Option<SectionId>,
    ) -> SectionId {
        let id = self.sections.len() as SectionId;
        let links = match parent {
            Some(parent_id) => {
                Links::child_of(&mut self.sections[parent_id as usize].links, parent_id, id)
            }
            None => {
                self.root_ids.push(id);
                Links::default()
            }
        };
        self.sections.push(SectionData {
            section_type,
            points,
            diameters,
            perimeters,
            links,
        });
        id
    }

    pub(crate) fn set_mitochondria(&mut self, mitochondria: Option<Mitochondria>) {
        self.mitochondria = mitochondria;
    }

    pub(crate) fn section_data(&self, id: SectionId) -> &SectionData {
        &self.sections[id as usize]
    }

    pub fn n_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn root_ids(&self) -> &[SectionId] {
        &self.root_ids
    }

    /// Root sections in declared order
    pub fn root_sections(&self) -> impl ExactSizeIterator<Item = Section<'_>> + '_ {
        self.root_ids.iter().map(move |&id| Section::new(self, id))
    }

    /// # Errors
    ///
    /// Returns `SectionNotFound` for an id outside this morphology
    pub fn section(&self, id: SectionId) -> MorphResult<Section<'_>> {
        if (id as usize) < self.sections.len() {
            Ok(Section::new(self, id))
        } else {
            Err(MorphologyError::SectionNotFound(id))
        }
    }

    /// Every section in id order
    pub fn sections(&self) -> impl ExactSizeIterator<Item = Section<'_>> + '_ {
        (0..self.sections.len() as SectionId).map(move |id| Section::new(self, id))
    }

    pub fn soma(&self) -> &Soma {
        &self.soma
    }

    pub fn mitochondria(&self) -> Option<&Mitochondria> {
        self.mitochondria.as_ref()
    }

    /// Walk every root tree
    ///
    /// # Errors
    ///
    /// Returns `UpstreamFromForest` for [`IterType::Upstream`]; use
    /// [`Section::upstream`] instead.
    pub fn iter(&self, iter_type: IterType) -> MorphResult<Traversal<'_, Morphology>> {
        traverse(self, Start::Forest, iter_type)
    }

    pub fn depth_first(&self) -> Traversal<'_, Morphology> {
        Traversal::forest_depth_first(self)
    }

    pub fn breadth_first(&self) -> Traversal<'_, Morphology> {
        Traversal::forest_breadth_first(self)
    }

    /// Total number of neurite points
    pub fn n_points(&self) -> usize {
        self.sections.iter().map(|s| s.points.len()).sum()
    }

    /// All neurite points concatenated in id order, shape `(n_points, 3)`
    pub fn points(&self) -> Array2<f32> {
        let points: Vec<Point> = self
            .sections
            .iter()
            .flat_map(|s| s.points.iter().copied())
            .collect();
        Array2::from(points)
    }

    /// All neurite diameters concatenated in id order
    pub fn diameters(&self) -> Array1<f32> {
        self.sections
            .iter()
            .flat_map(|s| s.diameters.iter().copied())
            .collect()
    }

    /// Concatenated perimeters, `None` unless every section carries them
    pub fn perimeters(&self) -> Option<Array1<f32>> {
        if self.sections.is_empty() {
            return None;
        }
        let mut out = Vec::with_capacity(self.n_points());
        for section in &self.sections {
            out.extend_from_slice(section.perimeters.as_deref()?);
        }
        Some(Array1::from(out))
    }

    /// Start offset of each section in [`Morphology::points`], plus the total
    pub fn section_offsets(&self) -> Array1<usize> {
        let mut offsets = Vec::with_capacity(self.sections.len() + 1);
        let mut offset = 0;
        offsets.push(offset);
        for section in &self.sections {
            offset += section.points.len();
            offsets.push(offset);
        }
        Array1::from(offsets)
    }

    /// Section types in id order
    pub fn section_types(&self) -> Vec<SectionType> {
        self.sections.iter().map(|s| s.section_type).collect()
    }
}

impl TreeTopology for Morphology {
    type Node<'a> = Section<'a>;

    fn root_ids(&self) -> &[u32] {
        &self.root_ids
    }

    fn child_ids(&self, id: u32) -> &[u32] {
        &self.sections[id as usize].links.children
    }

    fn parent_id(&self, id: u32) -> Option<u32> {
        self.sections[id as usize].links.parent
    }

    fn len(&self) -> usize {
        self.sections.len()
    }

    fn node(&self, id: u32) -> Self::Node<'_> {
        Section::new(self, id)
    }
}

impl<'a> IntoIterator for &'a Morphology {
    type Item = Section<'a>;
    type IntoIter = Traversal<'a, Morphology>;

    fn into_iter(self) -> Self::IntoIter {
        self.depth_first()
    }
}
