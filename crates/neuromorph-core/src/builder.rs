// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

/*!
Tree builder: intermediate rows in, immutable [`Morphology`] out.

Rows are consumed in the order the decoder produced them. Each neurite row
gets the next free section id, starting at 0, and must name a parent that
was seen earlier (or no parent, making it a root). Mitochondrial rows are
processed after the neurite forest is complete so their anchors can be
checked against it.

The build is all-or-nothing: the morphology under construction is private
to [`MorphologyBuilder::build`] and is only returned once every row passed.
*/

use ahash::AHashMap;
use neuromorph_config::{BuildConfig, MitoAnchorPolicy, NeuromorphConfig};
use tracing::{debug, warn};

use crate::error::{ErrorKind, MorphResult, MorphologyError};
use crate::mitochondria::Mitochondria;
use crate::morphology::Morphology;
use crate::raw::{resolve_parent, MitoRow, NeuriteRow, RawMorphology, RowId, SomaRow};
use crate::section::SectionId;
use crate::soma::Soma;
use crate::types::{SectionType, SomaType};

const MIN_SECTION_POINTS: usize = 2;
const MIN_MITO_POINTS: usize = 1;

/// Knobs that change how rows become a morphology
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub mito_anchor_policy: MitoAnchorPolicy,
    /// Reorder root subtrees axon, basal, apical, others before assigning ids
    pub nrn_order: bool,
}

impl BuildOptions {
    pub fn from_config(config: &NeuromorphConfig) -> Self {
        Self::from(&config.build)
    }

    pub fn with_mito_anchor_policy(mut self, policy: MitoAnchorPolicy) -> Self {
        self.mito_anchor_policy = policy;
        self
    }

    pub fn with_nrn_order(mut self, nrn_order: bool) -> Self {
        self.nrn_order = nrn_order;
        self
    }
}

impl From<&BuildConfig> for BuildOptions {
    fn from(config: &BuildConfig) -> Self {
        Self {
            mito_anchor_policy: config.mito_anchor_policy,
            nrn_order: config.nrn_order,
        }
    }
}

/// Turns a [`RawMorphology`] into a [`Morphology`]
#[derive(Debug, Clone, Default)]
pub struct MorphologyBuilder {
    options: BuildOptions,
}

impl MorphologyBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Validate every row and materialize the morphology
    ///
    /// # Errors
    ///
    /// Any structural or reference problem in the rows, see
    /// [`MorphologyError`]. With [`MitoAnchorPolicy::DropMitochondria`], an
    /// unresolved mitochondrial anchor is logged and the morphology is
    /// returned without mitochondria instead.
    pub fn build(&self, raw: RawMorphology) -> MorphResult<Morphology> {
        let RawMorphology {
            neurites,
            soma,
            mitochondria,
        } = raw;
        debug!(
            target: "neuromorph-core",
            neurite_rows = neurites.len(),
            mito_rows = mitochondria.len(),
            has_soma = soma.is_some(),
            nrn_order = self.options.nrn_order,
            "Building morphology"
        );

        let soma = build_soma(soma)?;
        let (neurites, remap) = if self.options.nrn_order {
            let (rows, remap) = nrn_reorder(neurites);
            (rows, Some(remap))
        } else {
            (neurites, None)
        };

        let mut morphology = Morphology::new(soma);
        build_neurites(&mut morphology, neurites)?;

        let anchors = AnchorMap {
            n_sections: morphology.n_sections(),
            remap: remap.as_deref(),
        };
        let mitochondria = match build_mitochondria(&mitochondria, anchors) {
            Ok(mitochondria) => mitochondria,
            Err(err)
                if err.kind() == ErrorKind::Reference
                    && self.options.mito_anchor_policy == MitoAnchorPolicy::DropMitochondria =>
            {
                warn!(
                    target: "neuromorph-core",
                    error = %err,
                    "Dropping mitochondria with unresolved anchor"
                );
                None
            }
            Err(err) => return Err(err),
        };
        morphology.set_mitochondria(mitochondria);

        debug!(
            target: "neuromorph-core",
            sections = morphology.n_sections(),
            roots = morphology.root_ids().len(),
            mito_sections = morphology.mitochondria().map_or(0, Mitochondria::n_sections),
            "Morphology built"
        );
        Ok(morphology)
    }
}

/// Build with default options
///
/// # Errors
///
/// See [`MorphologyBuilder::build`]
pub fn build_morphology(raw: RawMorphology) -> MorphResult<Morphology> {
    MorphologyBuilder::default().build(raw)
}

impl TryFrom<RawMorphology> for Morphology {
    type Error = MorphologyError;

    fn try_from(raw: RawMorphology) -> Result<Self, Self::Error> {
        build_morphology(raw)
    }
}

fn build_soma(row: Option<SomaRow>) -> MorphResult<Soma> {
    let Some(row) = row else {
        return Ok(Soma::empty());
    };
    let soma_type = match row.soma_type {
        SomaType::Undefined => SomaType::from_point_count(row.points.len()),
        declared => declared,
    };
    Soma::new(soma_type, row.points, row.diameters)
}

/// Sort rank of the tree a root starts; 0 is reserved for orphans
fn root_rank(section_type: SectionType) -> u8 {
    match section_type {
        SectionType::Axon => 1,
        SectionType::BasalDendrite => 2,
        SectionType::ApicalDendrite => 3,
        _ => 4,
    }
}

/// Stable reorder of whole root subtrees by root type
///
/// Rows whose parent has not been seen keep rank 0 and move to the front, so
/// they still fail the parent check once the builder reaches them.
///
/// Also returns, for each row in file order, the section id it ends up with.
/// Mitochondrial anchors use file-order ids and go through this map.
fn nrn_reorder(rows: Vec<NeuriteRow>) -> (Vec<NeuriteRow>, Vec<SectionId>) {
    let mut ranks: AHashMap<RowId, u8> = AHashMap::with_capacity(rows.len());
    let mut ranked: Vec<(u8, usize, NeuriteRow)> = rows
        .into_iter()
        .enumerate()
        .map(|(index, row)| {
            let rank = match resolve_parent(row.parent_row_id) {
                None => root_rank(row.section_type),
                Some(parent) => ranks.get(&parent).copied().unwrap_or(0),
            };
            ranks.entry(row.row_id).or_insert(rank);
            (rank, index, row)
        })
        .collect();
    ranked.sort_by_key(|(rank, _, _)| *rank);

    let mut remap: Vec<SectionId> = vec![0; ranked.len()];
    let rows = ranked
        .into_iter()
        .enumerate()
        .map(|(new_id, (_, old_id, row))| {
            remap[old_id] = new_id as SectionId;
            row
        })
        .collect();
    (rows, remap)
}

fn check_lengths(
    row_id: RowId,
    left: &'static str,
    left_len: usize,
    right: &'static str,
    right_len: usize,
) -> MorphResult<()> {
    if left_len != right_len {
        return Err(MorphologyError::ArrayLengthMismatch {
            row_id,
            left,
            left_len,
            right,
            right_len,
        });
    }
    Ok(())
}

fn check_neurite_row(row: &NeuriteRow) -> MorphResult<()> {
    let row_id = row.row_id;
    if row.section_type == SectionType::Soma {
        return Err(MorphologyError::SomaTypedNeurite { row_id });
    }
    check_lengths(
        row_id,
        "points",
        row.points.len(),
        "diameters",
        row.diameters.len(),
    )?;
    if let Some(perimeters) = &row.perimeters {
        check_lengths(
            row_id,
            "points",
            row.points.len(),
            "perimeters",
            perimeters.len(),
        )?;
    }
    if row.points.len() < MIN_SECTION_POINTS {
        return Err(MorphologyError::TooFewPoints {
            row_id,
            count: row.points.len(),
            minimum: MIN_SECTION_POINTS,
        });
    }
    Ok(())
}

fn build_neurites(morphology: &mut Morphology, rows: Vec<NeuriteRow>) -> MorphResult<()> {
    let mut sections: AHashMap<RowId, SectionId> = AHashMap::with_capacity(rows.len());

    for row in rows {
        let row_id = row.row_id;
        if row_id < 0 {
            return Err(MorphologyError::InvalidRowId { row_id });
        }
        if sections.contains_key(&row_id) {
            return Err(MorphologyError::RepeatedId { row_id });
        }
        let parent_row = resolve_parent(row.parent_row_id);
        if parent_row == Some(row_id) {
            return Err(MorphologyError::Cycle { row_id });
        }
        check_neurite_row(&row)?;

        let parent = match parent_row {
            None => None,
            Some(parent_id) => Some(
                *sections
                    .get(&parent_id)
                    .ok_or(MorphologyError::MissingParent { row_id, parent_id })?,
            ),
        };

        let id = morphology.push_section(
            row.section_type,
            row.points,
            row.diameters,
            row.perimeters,
            parent,
        );
        sections.insert(row_id, id);
    }
    Ok(())
}

/// Where mitochondrial anchors point once the neurite forest is built
#[derive(Debug, Clone, Copy)]
struct AnchorMap<'a> {
    n_sections: usize,
    /// File-order id to built id, present when neurites were reordered
    remap: Option<&'a [SectionId]>,
}

impl AnchorMap<'_> {
    /// Canonical section id for a float-encoded anchor
    fn resolve(&self, row_id: RowId, anchor: f32) -> MorphResult<SectionId> {
        let id = resolve_anchor(row_id, anchor, self.n_sections)?;
        match self.remap {
            None => Ok(id),
            Some(remap) => remap
                .get(id as usize)
                .copied()
                .ok_or(MorphologyError::UnresolvedAnchor { row_id, anchor }),
        }
    }
}

/// File-order section id for a float-encoded anchor
fn resolve_anchor(row_id: RowId, anchor: f32, n_sections: usize) -> MorphResult<SectionId> {
    let valid = anchor.is_finite()
        && anchor >= 0.0
        && anchor.fract() == 0.0
        && (anchor as usize) < n_sections;
    if !valid {
        return Err(MorphologyError::UnresolvedAnchor { row_id, anchor });
    }
    Ok(anchor as SectionId)
}

fn check_mito_row(row: &MitoRow) -> MorphResult<()> {
    let row_id = row.row_id;
    check_lengths(
        row_id,
        "diameters",
        row.diameters.len(),
        "relative_path_lengths",
        row.relative_path_lengths.len(),
    )?;
    check_lengths(
        row_id,
        "diameters",
        row.diameters.len(),
        "neurite_section_ids",
        row.neurite_section_ids.len(),
    )?;
    if row.diameters.len() < MIN_MITO_POINTS {
        return Err(MorphologyError::TooFewPoints {
            row_id,
            count: row.diameters.len(),
            minimum: MIN_MITO_POINTS,
        });
    }
    if let Some(&value) = row
        .relative_path_lengths
        .iter()
        .find(|v| !(0.0..=1.0).contains(*v))
    {
        return Err(MorphologyError::InvalidPathLength { row_id, value });
    }
    Ok(())
}

/// `None` when there are no mitochondrial rows at all
///
/// Every row passes the structural checks before any anchor is resolved, so
/// a reference error can never mask a structural one in a later row.
fn build_mitochondria(
    rows: &[MitoRow],
    anchors: AnchorMap<'_>,
) -> MorphResult<Option<Mitochondria>> {
    if rows.is_empty() {
        return Ok(None);
    }

    let mut ids: AHashMap<RowId, u32> = AHashMap::with_capacity(rows.len());
    let mut parents: Vec<Option<u32>> = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let row_id = row.row_id;
        if row_id < 0 {
            return Err(MorphologyError::InvalidRowId { row_id });
        }
        if ids.contains_key(&row_id) {
            return Err(MorphologyError::RepeatedId { row_id });
        }
        let parent_row = resolve_parent(row.parent_row_id);
        if parent_row == Some(row_id) {
            return Err(MorphologyError::Cycle { row_id });
        }
        check_mito_row(row)?;

        let parent = match parent_row {
            None => None,
            Some(parent_id) => Some(
                *ids.get(&parent_id)
                    .ok_or(MorphologyError::MissingMitoParent { row_id, parent_id })?,
            ),
        };
        parents.push(parent);
        ids.insert(row_id, index as u32);
    }

    let resolved = rows
        .iter()
        .map(|row| {
            row.neurite_section_ids
                .iter()
                .map(|&anchor| anchors.resolve(row.row_id, anchor))
                .collect::<MorphResult<Vec<_>>>()
        })
        .collect::<MorphResult<Vec<_>>>()?;

    let mut mitochondria = Mitochondria::new();
    for ((row, parent), section_ids) in rows.iter().zip(parents).zip(resolved) {
        mitochondria.push(
            row.diameters.clone(),
            row.relative_path_lengths.clone(),
            section_ids,
            parent,
        );
    }
    Ok(Some(mitochondria))
}
