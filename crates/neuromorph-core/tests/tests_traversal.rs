// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! Traversal orderings over morphologies built from rows

use neuromorph_core::{
    build_morphology, traverse, IterType, Morphology, MorphologyError, NeuriteRow, RawMorphology,
    RowId, SectionType, Start,
};

fn row(row_id: RowId, parent: Option<RowId>) -> NeuriteRow {
    let y = row_id as f32;
    NeuriteRow::new(
        row_id,
        SectionType::BasalDendrite,
        vec![[0.0, y, 0.0], [0.0, y + 1.0, 0.0]],
        vec![1.0, 1.0],
        parent,
    )
}

/// root 0 -> [1, 4]; 1 -> [2, 3]; 4 -> [5, 6]
fn single_tree() -> Morphology {
    build_morphology(RawMorphology {
        neurites: vec![
            row(0, None),
            row(1, Some(0)),
            row(2, Some(1)),
            row(3, Some(1)),
            row(4, Some(0)),
            row(5, Some(4)),
            row(6, Some(4)),
        ],
        ..Default::default()
    })
    .unwrap()
}

/// single tree plus root 7 -> [8, 9]
fn forest() -> Morphology {
    build_morphology(RawMorphology {
        neurites: vec![
            row(0, None),
            row(1, Some(0)),
            row(2, Some(1)),
            row(3, Some(1)),
            row(4, Some(0)),
            row(5, Some(4)),
            row(6, Some(4)),
            row(7, None),
            row(8, Some(7)),
            row(9, Some(7)),
        ],
        ..Default::default()
    })
    .unwrap()
}

fn ids<'a>(sections: impl Iterator<Item = neuromorph_core::Section<'a>>) -> Vec<u32> {
    sections.map(|s| s.id()).collect()
}

#[test]
fn test_single_tree_orderings() {
    let m = single_tree();
    let root = m.section(0).unwrap();
    assert_eq!(ids(root.iter(IterType::DepthFirst)), vec![0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(ids(root.iter(IterType::BreadthFirst)), vec![0, 1, 4, 2, 3, 5, 6]);
}

#[test]
fn test_forest_breadth_first_interleaves_roots() {
    let m = forest();
    assert_eq!(ids(m.breadth_first()), vec![0, 7, 1, 4, 8, 9, 2, 3, 5, 6]);
    assert_eq!(
        ids(m.iter(IterType::BreadthFirst).unwrap()),
        vec![0, 7, 1, 4, 8, 9, 2, 3, 5, 6]
    );
}

#[test]
fn test_forest_depth_first_finishes_each_tree() {
    let m = forest();
    assert_eq!(ids(m.depth_first()), (0..10).collect::<Vec<_>>());
    assert_eq!(ids((&m).into_iter()), (0..10).collect::<Vec<_>>());
}

#[test]
fn test_subtree_traversal() {
    let m = forest();
    let section = m.section(4).unwrap();
    assert_eq!(ids(section.iter(IterType::DepthFirst)), vec![4, 5, 6]);
    assert_eq!(ids(section.iter(IterType::BreadthFirst)), vec![4, 5, 6]);
    assert_eq!(ids(m.section(9).unwrap().iter(IterType::DepthFirst)), vec![9]);
}

#[test]
fn test_upstream() {
    let m = forest();
    assert_eq!(ids(m.section(3).unwrap().upstream()), vec![3, 1, 0]);
    assert_eq!(ids(m.section(0).unwrap().upstream()), vec![0]);
    assert_eq!(ids(m.section(8).unwrap().iter(IterType::Upstream)), vec![8, 7]);
}

#[test]
fn test_upstream_over_forest_is_usage_error() {
    let m = forest();
    let err = m.iter(IterType::Upstream).err().unwrap();
    assert_eq!(err, MorphologyError::UpstreamFromForest);
    assert_eq!(err.kind(), neuromorph_core::ErrorKind::Usage);
    assert!(traverse(&m, Start::Forest, IterType::Upstream).is_err());
}

#[test]
fn test_generic_traverse_entry_point() {
    let m = forest();
    let from_engine: Vec<u32> = traverse(&m, Start::Subtree(7), IterType::BreadthFirst)
        .unwrap()
        .map(|s| s.id())
        .collect();
    assert_eq!(from_engine, vec![7, 8, 9]);
    assert_eq!(
        traverse(&m, Start::Subtree(42), IterType::DepthFirst).err(),
        Some(MorphologyError::SectionNotFound(42))
    );
}

#[test]
fn test_default_strategy_is_depth_first() {
    let m = single_tree();
    let root = m.section(0).unwrap();
    assert_eq!(ids(root.iter(IterType::default())), ids(m.depth_first()));
}

#[test]
fn test_empty_morphology() {
    let m = build_morphology(RawMorphology::default()).unwrap();
    assert_eq!(m.depth_first().count(), 0);
    assert_eq!(m.breadth_first().count(), 0);
    assert_eq!(m.soma().max_distance(), 0.0);
}

#[test]
fn test_abandoned_traversal_does_not_affect_fresh_one() {
    let m = forest();
    let mut partial = m.depth_first();
    partial.next();
    partial.next();
    drop(partial);
    assert_eq!(m.depth_first().count(), 10);
}
