// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

//! The same cell stored as SWC, ASC and NMB must build into one model

use std::path::{Path, PathBuf};

use neuromorph::io::{read_raw, ReaderOptions};
use neuromorph::prelude::*;

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn load(name: &str) -> Morphology {
    load_morphology(data(name), &BuildOptions::default()).unwrap()
}

fn ids(traversal: Traversal<'_, Morphology>) -> Vec<SectionId> {
    traversal.map(|section| section.id()).collect()
}

#[test]
fn test_formats_agree() {
    let swc = load("simple.swc");
    let asc = load("simple.asc");
    let nmb = load("simple_mito.nmb");

    for cell in [&swc, &asc, &nmb] {
        assert_eq!(cell.n_sections(), 6);
        assert_eq!(ids(cell.depth_first()), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(ids(cell.breadth_first()), vec![0, 3, 1, 2, 4, 5]);
        assert_eq!(cell.root_ids(), &[0, 3]);
        assert_eq!(cell.soma().points(), &[[0.0, 0.0, 0.0]]);
        assert_eq!(cell.soma().max_distance(), 0.0);
    }

    for (a, b) in swc.sections().zip(asc.sections()) {
        assert_eq!(a.points(), b.points());
        assert_eq!(a.diameters(), b.diameters());
    }
    for (a, b) in swc.sections().zip(nmb.sections()) {
        assert_eq!(a.points(), b.points());
        assert_eq!(a.diameters(), b.diameters());
    }

    // Types differ only in spelling between the formats
    assert_eq!(asc.section(0).unwrap().section_type(), SectionType::BasalDendrite);
    assert_eq!(swc.section(0).unwrap().section_type(), SectionType::BasalDendrite);
    assert_eq!(nmb.section(3).unwrap().section_type(), SectionType::Axon);
}

#[test]
fn test_upstream_from_first_child() {
    let cell = load("simple.asc");
    let child = cell.root_sections().next().unwrap().children().next().unwrap();

    let points: Vec<Vec<Point>> = child.upstream().map(|s| s.points().to_vec()).collect();
    assert_eq!(
        points,
        vec![
            vec![[0.0, 5.0, 0.0], [-5.0, 5.0, 0.0]],
            vec![[0.0, 0.0, 0.0], [0.0, 5.0, 0.0]],
        ]
    );
    assert_eq!(
        format!("{}", cell.section(0).unwrap()),
        "Section(id=0, points=[(0 0 0),..., (0 5 0)])"
    );
}

#[test]
fn test_iterators_fixture() {
    let cell = load("iterators.asc");
    assert_eq!(cell.n_sections(), 10);
    assert_eq!(ids(cell.depth_first()), (0..10).collect::<Vec<_>>());
    assert_eq!(ids(cell.breadth_first()), vec![0, 7, 1, 4, 8, 9, 2, 3, 5, 6]);

    let root = cell.section(0).unwrap();
    assert_eq!(ids(root.iter(IterType::BreadthFirst)), vec![0, 1, 4, 2, 3, 5, 6]);
    assert_eq!(ids(cell.section(6).unwrap().upstream()), vec![6, 4, 0]);
    assert!(cell.iter(IterType::Upstream).is_err());

    assert_eq!(cell.soma().soma_type(), SomaType::SimpleContour);
    assert_eq!(cell.soma().points().len(), 3);
}

#[test]
fn test_mitochondria_from_nmb() {
    let cell = load("simple_mito.nmb");
    let mito = cell.mitochondria().unwrap();
    assert_eq!(mito.n_sections(), 3);
    assert_eq!(mito.root_ids(), &[0, 2]);

    let dfs: Vec<u32> = mito.depth_first().map(|m| m.id()).collect();
    let bfs: Vec<u32> = mito.breadth_first().map(|m| m.id()).collect();
    assert_eq!(dfs, vec![0, 1, 2]);
    assert_eq!(bfs, vec![0, 2, 1]);

    let root = mito.section(0).unwrap();
    assert_eq!(root.diameters(), &[10.0, 20.0]);
    assert_eq!(root.relative_path_lengths(), &[0.5, 0.6]);
    assert_eq!(root.neurite_section_ids(), &[0, 0]);

    let child = root.children().next().unwrap();
    assert_eq!(child.neurite_section_ids(), &[3, 4, 4, 5]);
    let anchored: Vec<SectionId> = child
        .neurite_sections(&cell)
        .unwrap()
        .iter()
        .map(|s| s.id())
        .collect();
    assert_eq!(anchored, vec![3, 4, 5]);
    assert_eq!(
        child.upstream().map(|m| m.id()).collect::<Vec<_>>(),
        vec![1, 0]
    );
}

#[test]
fn test_raw_rows_are_inspectable() {
    let raw = read_raw(data("simple.swc"), &ReaderOptions::default()).unwrap();
    assert_eq!(raw.neurites.len(), 6);
    assert!(raw.neurites[0].is_root());
    assert!(raw.mitochondria.is_empty());

    let cell = MorphologyBuilder::new(BuildOptions::default()).build(raw).unwrap();
    assert_eq!(cell.n_sections(), 6);
}

#[test]
fn test_rewrite_in_each_format() {
    let original = load("simple_mito.nmb");
    let dir = tempfile::tempdir().unwrap();

    for name in ["copy.swc", "copy.asc", "copy.nmb"] {
        let path = dir.path().join(name);
        save_morphology(&original, &path).unwrap();
        let copy = load_morphology(&path, &BuildOptions::default()).unwrap();
        assert_eq!(ids(copy.breadth_first()), ids(original.breadth_first()), "{}", name);
        assert_eq!(copy.points(), original.points(), "{}", name);
    }

    // Only the binary container carries organelles
    let copy = load_morphology(dir.path().join("copy.nmb"), &BuildOptions::default()).unwrap();
    assert_eq!(copy.mitochondria(), original.mitochondria());
}
