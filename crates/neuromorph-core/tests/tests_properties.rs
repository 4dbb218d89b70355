// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Property tests over randomly shaped forests

use neuromorph_core::{
    build_morphology, IterType, Morphology, NeuriteRow, RawMorphology, SectionType,
};
use proptest::prelude::*;

/// Row `i` hangs under `seed % (i + 1)`, or starts a new tree when that is `i`
fn morphology_from_seeds(seeds: &[u32]) -> Morphology {
    let neurites = seeds
        .iter()
        .enumerate()
        .map(|(i, seed)| {
            let pick = (*seed as usize) % (i + 1);
            let parent = (pick != i).then_some(pick as i64);
            let x = i as f32;
            NeuriteRow::new(
                i as i64,
                SectionType::Axon,
                vec![[x, 0.0, 0.0], [x, 1.0, 0.0]],
                vec![1.0, 1.0],
                parent,
            )
        })
        .collect();
    build_morphology(RawMorphology {
        neurites,
        ..Default::default()
    })
    .expect("parents always precede children")
}

fn seeds() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(any::<u32>(), 1..48)
}

proptest! {
    #[test]
    fn depth_first_visits_every_section_once(seeds in seeds()) {
        let m = morphology_from_seeds(&seeds);
        let mut ids: Vec<u32> = m.depth_first().map(|s| s.id()).collect();
        prop_assert_eq!(ids.len(), m.n_sections());
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), m.n_sections());
    }

    #[test]
    fn depth_first_subtrees_are_contiguous(seeds in seeds()) {
        let m = morphology_from_seeds(&seeds);
        let order: Vec<u32> = m.depth_first().map(|s| s.id()).collect();
        for section in m.sections() {
            let subtree: Vec<u32> = section.iter(IterType::DepthFirst).map(|s| s.id()).collect();
            prop_assert_eq!(subtree[0], section.id());
            let start = order.iter().position(|&id| id == section.id()).unwrap();
            prop_assert_eq!(&order[start..start + subtree.len()], subtree.as_slice());
        }
    }

    #[test]
    fn breadth_first_levels_never_decrease(seeds in seeds()) {
        let m = morphology_from_seeds(&seeds);
        let depths: Vec<u32> = m.breadth_first().map(|s| s.depth()).collect();
        prop_assert!(depths.windows(2).all(|w| w[0] <= w[1]));
        for root in m.root_sections() {
            let depths: Vec<u32> = root.iter(IterType::BreadthFirst).map(|s| s.depth()).collect();
            prop_assert!(depths.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn upstream_reaches_root_in_depth_steps(seeds in seeds()) {
        let m = morphology_from_seeds(&seeds);
        for section in m.sections() {
            let chain: Vec<_> = section.upstream().collect();
            prop_assert_eq!(chain.len() as u32, section.depth() + 1);
            prop_assert_eq!(chain[0], section);
            prop_assert!(chain.last().unwrap().is_root());
            prop_assert!(chain.windows(2).all(|w| w[0].depth() == w[1].depth() + 1));
        }
    }

    #[test]
    fn parent_and_children_agree(seeds in seeds()) {
        let m = morphology_from_seeds(&seeds);
        for section in m.sections() {
            prop_assert_eq!(section.is_root(), section.parent().is_none());
            match section.parent() {
                Some(parent) => prop_assert!(parent.children().any(|c| c == section)),
                None => prop_assert!(m.root_ids().contains(&section.id())),
            }
            for child in section.children() {
                prop_assert_eq!(child.parent(), Some(section));
            }
        }
    }
}
