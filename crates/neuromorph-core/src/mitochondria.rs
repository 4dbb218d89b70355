// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

/*!
Mitochondrial forest attached to a morphology.

Mitochondrial sections form their own forest, walked by the same traversal
engine as neurites. Each sample records a diameter, a relative path length
along its anchoring neurite section, and that section's id. Anchors are
validated by the builder, so every stored id names an existing section of the
owning morphology.
*/

use core::fmt;
use std::ptr;

use crate::error::{MorphResult, MorphologyError};
use crate::iter::{traverse, IterType, Links, Start, Traversal, TreeTopology};
use crate::morphology::Morphology;
use crate::section::{Section, SectionId};

/// Arena record owned by [`Mitochondria`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MitoSectionData {
    pub diameters: Vec<f32>,
    pub relative_path_lengths: Vec<f32>,
    pub neurite_section_ids: Vec<SectionId>,
    pub links: Links,
}

/// Forest of mitochondrial sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mitochondria {
    sections: Vec<MitoSectionData>,
    root_ids: Vec<u32>,
}

impl Mitochondria {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append a section; `parent` must already be present
    pub(crate) fn push(
        &mut self,
        diameters: Vec<f32>,
        relative_path_lengths: Vec<f32>,
        neurite_section_ids: Vec<SectionId>,
        parent: Option<u32>,
    ) -> u32 {
        let id = self.sections.len() as u32;
        let links = match parent {
            Some(parent_id) => {
                Links::child_of(&mut self.sections[parent_id as usize].links, parent_id, id)
            }
            None => {
                self.root_ids.push(id);
                Links::default()
            }
        };
        self.sections.push(MitoSectionData {
            diameters,
            relative_path_lengths,
            neurite_section_ids,
            links,
        });
        id
    }

    pub fn n_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn root_ids(&self) -> &[u32] {
        &self.root_ids
    }

    pub fn root_sections(&self) -> impl ExactSizeIterator<Item = MitoSection<'_>> + '_ {
        self.root_ids.iter().map(move |&id| MitoSection::new(self, id))
    }

    /// # Errors
    ///
    /// Returns `SectionNotFound` for an id outside this forest
    pub fn section(&self, id: u32) -> MorphResult<MitoSection<'_>> {
        if (id as usize) < self.sections.len() {
            Ok(MitoSection::new(self, id))
        } else {
            Err(MorphologyError::SectionNotFound(id))
        }
    }

    /// All sections in id order
    pub fn sections(&self) -> impl ExactSizeIterator<Item = MitoSection<'_>> + '_ {
        (0..self.sections.len() as u32).map(move |id| MitoSection::new(self, id))
    }

    /// Walk the whole forest
    ///
    /// # Errors
    ///
    /// Returns `UpstreamFromForest` for [`IterType::Upstream`]
    pub fn iter(&self, iter_type: IterType) -> MorphResult<Traversal<'_, Mitochondria>> {
        traverse(self, Start::Forest, iter_type)
    }

    pub fn depth_first(&self) -> Traversal<'_, Mitochondria> {
        Traversal::forest_depth_first(self)
    }

    pub fn breadth_first(&self) -> Traversal<'_, Mitochondria> {
        Traversal::forest_breadth_first(self)
    }
}

impl TreeTopology for Mitochondria {
    type Node<'a> = MitoSection<'a>;

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
        MitoSection::new(self, id)
    }
}

impl<'a> IntoIterator for &'a Mitochondria {
    type Item = MitoSection<'a>;
    type IntoIter = Traversal<'a, Mitochondria>;

    fn into_iter(self) -> Self::IntoIter {
        self.depth_first()
    }
}

/// Borrowed view of one mitochondrial section
#[derive(Clone, Copy)]
pub struct MitoSection<'a> {
    mitochondria: &'a Mitochondria,
    id: u32,
}

impl<'a> MitoSection<'a> {
    fn new(mitochondria: &'a Mitochondria, id: u32) -> Self {
        Self { mitochondria, id }
    }

    fn data(&self) -> &'a MitoSectionData {
        &self.mitochondria.sections[self.id as usize]
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn diameters(&self) -> &'a [f32] {
        &self.data().diameters
    }

    pub fn relative_path_lengths(&self) -> &'a [f32] {
        &self.data().relative_path_lengths
    }

    pub fn neurite_section_ids(&self) -> &'a [SectionId] {
        &self.data().neurite_section_ids
    }

    pub fn n_points(&self) -> usize {
        self.data().diameters.len()
    }

    pub fn depth(&self) -> u32 {
        self.data().links.depth
    }

    pub fn is_root(&self) -> bool {
        self.data().links.parent.is_none()
    }

    pub fn parent(&self) -> Option<MitoSection<'a>> {
        self.data()
            .links
            .parent
            .map(|id| MitoSection::new(self.mitochondria, id))
    }

    pub fn children(&self) -> impl ExactSizeIterator<Item = MitoSection<'a>> + 'a {
        let mitochondria = self.mitochondria;
        self.data()
            .links
            .children
            .iter()
            .map(move |&id| MitoSection::new(mitochondria, id))
    }

    pub fn iter(&self, iter_type: IterType) -> Traversal<'a, Mitochondria> {
        Traversal::from_node(self.mitochondria, self.id, iter_type)
    }

    pub fn upstream(&self) -> Traversal<'a, Mitochondria> {
        self.iter(IterType::Upstream)
    }

    /// Neurite sections this mitochondrion runs through, in sample order
    ///
    /// Consecutive samples on the same section yield it once.
    ///
    /// # Errors
    ///
    /// Returns `SectionNotFound` when `morphology` is not the one these
    /// mitochondria were built for and an anchor falls outside it
    pub fn neurite_sections<'m>(&self, morphology: &'m Morphology) -> MorphResult<Vec<Section<'m>>> {
        let mut anchors = self.neurite_section_ids().to_vec();
        anchors.dedup();
        anchors.into_iter().map(|id| morphology.section(id)).collect()
    }
}

impl PartialEq for MitoSection<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && ptr::eq(self.mitochondria, other.mitochondria)
    }
}

impl Eq for MitoSection<'_> {}

impl fmt::Debug for MitoSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MitoSection")
            .field("id", &self.id)
            .field("parent", &self.data().links.parent)
            .field("neurite_section_ids", &self.neurite_section_ids())
            .finish()
    }
}

/// `MitoSection(id=0, neurite_section_ids=[0,..., 0])`
impl fmt::Display for MitoSection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let anchors = self.neurite_section_ids();
        match (anchors.first(), anchors.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "MitoSection(id={}, neurite_section_ids=[{},..., {}])",
                self.id, first, last
            ),
            _ => write!(f, "MitoSection(id={}, neurite_section_ids=[])", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mitochondria {
        let mut mito = Mitochondria::new();
        mito.push(vec![10.0, 20.0], vec![0.5, 0.6], vec![0, 0], None);
        mito.push(
            vec![1.0; 4],
            vec![0.1, 0.2, 0.3, 0.4],
            vec![3, 4, 4, 5],
            Some(0),
        );
        mito.push(vec![2.0], vec![0.9], vec![1], None);
        mito
    }

    #[test]
    fn test_links() {
        let mito = sample();
        assert_eq!(mito.n_sections(), 3);
        assert_eq!(mito.root_ids(), &[0, 2]);

        let child = mito.section(1).unwrap();
        assert!(!child.is_root());
        assert_eq!(child.depth(), 1);
        assert_eq!(child.parent().map(|p| p.id()), Some(0));
        assert_eq!(
            mito.section(0).unwrap().children().map(|c| c.id()).collect::<Vec<_>>(),
            vec![1]
        );
    }

    #[test]
    fn test_orderings() {
        let mito = sample();
        let dfs: Vec<u32> = mito.depth_first().map(|s| s.id()).collect();
        let bfs: Vec<u32> = mito.breadth_first().map(|s| s.id()).collect();
        assert_eq!(dfs, vec![0, 1, 2]);
        assert_eq!(bfs, vec![0, 2, 1]);

        let up: Vec<u32> = mito.section(1).unwrap().upstream().map(|s| s.id()).collect();
        assert_eq!(up, vec![1, 0]);
        assert!(matches!(
            mito.iter(IterType::Upstream),
            Err(MorphologyError::UpstreamFromForest)
        ));
    }

    #[test]
    fn test_display() {
        let mito = sample();
        assert_eq!(
            mito.section(0).unwrap().to_string(),
            "MitoSection(id=0, neurite_section_ids=[0,..., 0])"
        );
        assert_eq!(
            mito.section(1).unwrap().to_string(),
            "MitoSection(id=1, neurite_section_ids=[3,..., 5])"
        );
    }

    #[test]
    fn test_unknown_section() {
        let mito = sample();
        assert_eq!(
            mito.section(3).unwrap_err(),
            MorphologyError::SectionNotFound(3)
        );
    }
}
