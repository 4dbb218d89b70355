// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

/*!
NMB binary hierarchical container.

A flat list of named 2D datasets, stored little-endian.

```text
[Header]
- Magic: "NMB1" (4 bytes)
- Dataset count: u16
[Per dataset]
- Path length: u16, then the UTF-8 path (e.g. "/points")
- Dtype: u8 (0 = f32, 1 = i32)
- Rows: u32
- Cols: u32
- Data: rows * cols values, row-major
```

Morphology layout:

| path | dtype | shape | columns |
|---|---|---|---|
| `/points` | f32 | N x 4 | x, y, z, diameter |
| `/structure` | i32 | M x 3 | first point offset, type, parent row |
| `/perimeters` (optional) | f32 | N x 1 | perimeter |
| `/organelles/mitochondria/points` (optional) | f32 | K x 3 | neurite section id, relative path length, diameter |
| `/organelles/mitochondria/structure` (optional) | i32 | L x 2 | first point offset, parent row |

Structure row 0 of type 1 is the soma. A parent of -1, or a parent pointing
at the soma row, marks a root section.
*/

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use neuromorph_core::{
    MitoRow, Morphology, NeuriteRow, RawMorphology, RowId, SectionType, SomaRow, SomaType,
};
use tracing::debug;

use crate::decoder::MorphologyDecoder;
use crate::error::{IoError, IoResult};

/// File signature
pub const MAGIC: &[u8; 4] = b"NMB1";

pub const POINTS: &str = "/points";
pub const STRUCTURE: &str = "/structure";
pub const PERIMETERS: &str = "/perimeters";
pub const MITO_POINTS: &str = "/organelles/mitochondria/points";
pub const MITO_STRUCTURE: &str = "/organelles/mitochondria/structure";

const DTYPE_F32: u8 = 0;
const DTYPE_I32: u8 = 1;
const SOMA_CODE: i32 = 1;

//region Container

/// Typed payload of one dataset
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetData {
    F32(Vec<f32>),
    I32(Vec<i32>),
}

impl DatasetData {
    fn len(&self) -> usize {
        match self {
            DatasetData::F32(values) => values.len(),
            DatasetData::I32(values) => values.len(),
        }
    }
}

/// Named row-major 2D array
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub path: String,
    pub rows: u32,
    pub cols: u32,
    pub data: DatasetData,
}

impl Dataset {
    /// # Errors
    ///
    /// Returns `DatasetShape` when `data` does not hold `rows * cols` values
    pub fn new(path: impl Into<String>, rows: u32, cols: u32, data: DatasetData) -> IoResult<Self> {
        let path = path.into();
        if data.len() != rows as usize * cols as usize {
            return Err(IoError::shape(
                &path,
                format!("{} values do not fill {}x{}", data.len(), rows, cols),
            ));
        }
        Ok(Self {
            path,
            rows,
            cols,
            data,
        })
    }

    /// Rows of a float dataset with exactly `cols` columns
    fn f32_rows(&self, cols: u32) -> IoResult<impl Iterator<Item = &[f32]>> {
        self.check_cols(cols)?;
        match &self.data {
            DatasetData::F32(values) => Ok(values.chunks_exact(cols as usize)),
            DatasetData::I32(_) => Err(IoError::shape(&self.path, "expected f32 values")),
        }
    }

    /// Rows of an integer dataset with exactly `cols` columns
    fn i32_rows(&self, cols: u32) -> IoResult<impl Iterator<Item = &[i32]>> {
        self.check_cols(cols)?;
        match &self.data {
            DatasetData::I32(values) => Ok(values.chunks_exact(cols as usize)),
            DatasetData::F32(_) => Err(IoError::shape(&self.path, "expected i32 values")),
        }
    }

    fn check_cols(&self, cols: u32) -> IoResult<()> {
        if self.cols != cols {
            return Err(IoError::shape(
                &self.path,
                format!("expected {} columns, found {}", cols, self.cols),
            ));
        }
        Ok(())
    }
}

/// In-memory NMB file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NmbContainer {
    datasets: Vec<Dataset>,
}

/// Bounds-checked little-endian reader over a byte slice
struct Cursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, count: usize) -> IoResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(count)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                IoError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "NMB data truncated: needed {} byte(s) at offset {}, only {} available",
                        count,
                        self.position,
                        self.bytes.len()
                    ),
                ))
            })?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn u8(&mut self) -> IoResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> IoResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    fn u32(&mut self) -> IoResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }
}

impl NmbContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dataset
    pub fn insert(&mut self, dataset: Dataset) {
        match self.datasets.iter_mut().find(|d| d.path == dataset.path) {
            Some(existing) => *existing = dataset,
            None => self.datasets.push(dataset),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.path == path)
    }

    /// # Errors
    ///
    /// Returns `MissingDataset` when `path` is absent
    pub fn require(&self, path: &str) -> IoResult<&Dataset> {
        self.get(path)
            .ok_or_else(|| IoError::MissingDataset(path.to_string()))
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        // Writes into a Vec cannot fail
        let _ = out.write_u16::<LittleEndian>(self.datasets.len() as u16);
        for dataset in &self.datasets {
            let _ = out.write_u16::<LittleEndian>(dataset.path.len() as u16);
            out.extend_from_slice(dataset.path.as_bytes());
            let dtype = match dataset.data {
                DatasetData::F32(_) => DTYPE_F32,
                DatasetData::I32(_) => DTYPE_I32,
            };
            out.push(dtype);
            let _ = out.write_u32::<LittleEndian>(dataset.rows);
            let _ = out.write_u32::<LittleEndian>(dataset.cols);
            match &dataset.data {
                DatasetData::F32(values) => {
                    for &v in values {
                        let _ = out.write_f32::<LittleEndian>(v);
                    }
                }
                DatasetData::I32(values) => {
                    for &v in values {
                        let _ = out.write_i32::<LittleEndian>(v);
                    }
                }
            }
        }
        out
    }

    /// Parse bytes produced by [`NmbContainer::to_bytes`]
    ///
    /// # Errors
    ///
    /// `BadMagic` for a foreign file, `Io` for truncated data,
    /// `DatasetShape` for an unknown dtype, a non UTF-8 path or a size
    /// that does not fit in memory
    pub fn from_bytes(bytes: &[u8]) -> IoResult<Self> {
        let mut cursor = Cursor { bytes, position: 0 };
        let magic = cursor.take(4)?;
        if magic != MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            return Err(IoError::BadMagic(found));
        }

        let count = cursor.u16()?;
        let mut container = Self::new();
        for _ in 0..count {
            let path_len = cursor.u16()? as usize;
            let path = std::str::from_utf8(cursor.take(path_len)?)
                .map_err(|_| IoError::shape("<unnamed>", "dataset path is not valid UTF-8"))?
                .to_string();
            let dtype = cursor.u8()?;
            let rows = cursor.u32()?;
            let cols = cursor.u32()?;
            let n = (rows as usize)
                .checked_mul(cols as usize)
                .ok_or_else(|| IoError::shape(&path, "dataset size overflows"))?;
            let byte_len = n
                .checked_mul(4)
                .ok_or_else(|| IoError::shape(&path, "dataset size overflows"))?;
            let raw = cursor.take(byte_len)?;
            let data = match dtype {
                DTYPE_F32 => {
                    let mut values = vec![0f32; n];
                    LittleEndian::read_f32_into(raw, &mut values);
                    DatasetData::F32(values)
                }
                DTYPE_I32 => {
                    let mut values = vec![0i32; n];
                    LittleEndian::read_i32_into(raw, &mut values);
                    DatasetData::I32(values)
                }
                other => return Err(IoError::shape(&path, format!("unknown dtype {}", other))),
            };
            container.insert(Dataset::new(path, rows, cols, data)?);
        }
        Ok(container)
    }
}

//endregion

//region Decoder

/// NMB reader
#[derive(Debug, Clone, Copy, Default)]
pub struct NmbDecoder;

impl MorphologyDecoder for NmbDecoder {
    fn decode(&self, bytes: &[u8]) -> IoResult<RawMorphology> {
        let container = NmbContainer::from_bytes(bytes)?;
        decode_container(&container)
    }
}

/// Slice `[offsets[i], offsets[i + 1])` of each structure row
fn point_ranges(path: &str, offsets: &[i32], n_points: usize) -> IoResult<Vec<(usize, usize)>> {
    let mut ranges = Vec::with_capacity(offsets.len());
    for (i, &start) in offsets.iter().enumerate() {
        let end = offsets.get(i + 1).map_or(n_points as i64, |&e| i64::from(e));
        if start < 0 || i64::from(start) > end || end > n_points as i64 {
            return Err(IoError::shape(
                path,
                format!("row {} has invalid point range {}..{}", i, start, end),
            ));
        }
        ranges.push((start as usize, end as usize));
    }
    Ok(ranges)
}

fn decode_container(container: &NmbContainer) -> IoResult<RawMorphology> {
    let points: Vec<&[f32]> = container.require(POINTS)?.f32_rows(4)?.collect();
    let structure: Vec<&[i32]> = container.require(STRUCTURE)?.i32_rows(3)?.collect();
    let perimeters: Option<Vec<f32>> = match container.get(PERIMETERS) {
        Some(dataset) => Some(dataset.f32_rows(1)?.map(|row| row[0]).collect()),
        None => None,
    };
    if let Some(perimeters) = &perimeters {
        if perimeters.len() != points.len() {
            return Err(IoError::shape(
                PERIMETERS,
                format!("{} rows for {} points", perimeters.len(), points.len()),
            ));
        }
    }

    let offsets: Vec<i32> = structure.iter().map(|row| row[0]).collect();
    let ranges = point_ranges(STRUCTURE, &offsets, points.len())?;
    let has_soma = structure.first().map_or(false, |row| row[1] == SOMA_CODE);

    let mut soma = None;
    let mut neurites = Vec::with_capacity(structure.len());
    for (index, row) in structure.iter().enumerate() {
        let (start, end) = ranges[index];
        let samples = &points[start..end];
        let section_points = samples.iter().map(|p| [p[0], p[1], p[2]]).collect();
        let diameters = samples.iter().map(|p| p[3]).collect();

        if index == 0 && has_soma {
            soma = Some(SomaRow {
                soma_type: SomaType::from_point_count(samples.len()),
                points: section_points,
                diameters,
            });
            continue;
        }

        let code = row[1];
        let section_type =
            SectionType::from_code(code).ok_or(IoError::UnsupportedSectionType {
                line: index,
                code: i64::from(code),
            })?;
        let parent = row[2];
        let parent_row_id: Option<RowId> = if parent < 0 || (has_soma && parent == 0) {
            None
        } else {
            Some(RowId::from(parent))
        };

        let mut neurite = NeuriteRow::new(
            index as RowId,
            section_type,
            section_points,
            diameters,
            parent_row_id,
        );
        if let Some(perimeters) = &perimeters {
            neurite = neurite.with_perimeters(perimeters[start..end].to_vec());
        }
        neurites.push(neurite);
    }

    let mitochondria = decode_mitochondria(container)?;
    debug!(
        target: "neuromorph-io",
        sections = neurites.len(),
        mito_sections = mitochondria.len(),
        has_soma,
        "Decoded NMB"
    );
    Ok(RawMorphology {
        neurites,
        soma,
        mitochondria,
    })
}

fn decode_mitochondria(container: &NmbContainer) -> IoResult<Vec<MitoRow>> {
    let (points, structure) = match (container.get(MITO_POINTS), container.get(MITO_STRUCTURE)) {
        (None, None) => return Ok(Vec::new()),
        (Some(points), Some(structure)) => (points, structure),
        (Some(_), None) => return Err(IoError::MissingDataset(MITO_STRUCTURE.to_string())),
        (None, Some(_)) => return Err(IoError::MissingDataset(MITO_POINTS.to_string())),
    };
    let points: Vec<&[f32]> = points.f32_rows(3)?.collect();
    let structure: Vec<&[i32]> = structure.i32_rows(2)?.collect();
    let offsets: Vec<i32> = structure.iter().map(|row| row[0]).collect();
    let ranges = point_ranges(MITO_STRUCTURE, &offsets, points.len())?;

    Ok(structure
        .iter()
        .zip(ranges)
        .enumerate()
        .map(|(index, (row, (start, end)))| {
            let samples = &points[start..end];
            MitoRow {
                row_id: index as RowId,
                neurite_section_ids: samples.iter().map(|s| s[0]).collect(),
                relative_path_lengths: samples.iter().map(|s| s[1]).collect(),
                diameters: samples.iter().map(|s| s[2]).collect(),
                parent_row_id: (row[1] >= 0).then_some(RowId::from(row[1])),
            }
        })
        .collect())
}

//endregion

//region Writer

fn dataset_f32(path: &str, cols: u32, values: Vec<f32>) -> IoResult<Dataset> {
    let rows = (values.len() / cols as usize) as u32;
    Dataset::new(path, rows, cols, DatasetData::F32(values))
}

fn dataset_i32(path: &str, cols: u32, values: Vec<i32>) -> IoResult<Dataset> {
    let rows = (values.len() / cols as usize) as u32;
    Dataset::new(path, rows, cols, DatasetData::I32(values))
}

fn to_i32(value: usize, what: &str) -> IoResult<i32> {
    i32::try_from(value).map_err(|_| IoError::Unwritable(format!("{} {} exceeds i32", what, value)))
}

/// Lay a morphology out as NMB datasets
///
/// Sections keep their ids: structure row `id + 1` when a soma is present,
/// row `id` otherwise.
///
/// # Errors
///
/// Returns `Unwritable` when offsets no longer fit the i32 structure columns
pub fn to_container(morphology: &Morphology) -> IoResult<NmbContainer> {
    let soma = morphology.soma();
    let soma_rows = usize::from(!soma.is_empty());

    let mut points = Vec::with_capacity((soma.points().len() + morphology.n_points()) * 4);
    let mut structure = Vec::with_capacity((morphology.n_sections() + soma_rows) * 3);
    if soma_rows == 1 {
        structure.extend_from_slice(&[0, SOMA_CODE, -1]);
        for (p, d) in soma.points().iter().zip(soma.diameters()) {
            points.extend_from_slice(&[p[0], p[1], p[2], *d]);
        }
    }

    for section in morphology.sections() {
        let offset = to_i32(points.len() / 4, "point offset")?;
        let parent = match section.parent() {
            Some(parent) => to_i32(parent.id() as usize + soma_rows, "parent row")?,
            None if soma_rows == 1 => 0,
            None => -1,
        };
        structure.extend_from_slice(&[offset, section.section_type().code(), parent]);
        for (p, d) in section.points().iter().zip(section.diameters()) {
            points.extend_from_slice(&[p[0], p[1], p[2], *d]);
        }
    }

    let mut container = NmbContainer::new();
    container.insert(dataset_f32(POINTS, 4, points)?);
    container.insert(dataset_i32(STRUCTURE, 3, structure)?);

    if let Some(section_perimeters) = morphology.perimeters() {
        let mut perimeters = vec![0.0; soma.points().len()];
        perimeters.extend(section_perimeters.iter().copied());
        container.insert(dataset_f32(PERIMETERS, 1, perimeters)?);
    }

    if let Some(mitochondria) = morphology.mitochondria() {
        let mut mito_points = Vec::new();
        let mut mito_structure = Vec::with_capacity(mitochondria.n_sections() * 2);
        for section in mitochondria.sections() {
            let offset = to_i32(mito_points.len() / 3, "mitochondrial point offset")?;
            let parent = section.parent().map_or(-1, |p| p.id() as i32);
            mito_structure.extend_from_slice(&[offset, parent]);
            for ((anchor, path_length), diameter) in section
                .neurite_section_ids()
                .iter()
                .zip(section.relative_path_lengths())
                .zip(section.diameters())
            {
                mito_points.extend_from_slice(&[*anchor as f32, *path_length, *diameter]);
            }
        }
        container.insert(dataset_f32(MITO_POINTS, 3, mito_points)?);
        container.insert(dataset_i32(MITO_STRUCTURE, 2, mito_structure)?);
    }
    Ok(container)
}

/// Encode a morphology as NMB bytes
///
/// # Errors
///
/// See [`to_container`]
pub fn write_nmb(morphology: &Morphology) -> IoResult<Vec<u8>> {
    Ok(to_container(morphology)?.to_bytes())
}

//endregion

#[cfg(test)]
mod tests {
    use super::*;
    use neuromorph_core::{build_morphology, MorphologyError};

    fn f32_set(path: &str, rows: u32, cols: u32, values: Vec<f32>) -> Dataset {
        Dataset::new(path, rows, cols, DatasetData::F32(values)).unwrap()
    }

    fn i32_set(path: &str, rows: u32, cols: u32, values: Vec<i32>) -> Dataset {
        Dataset::new(path, rows, cols, DatasetData::I32(values)).unwrap()
    }

    /// Soma plus root 1 -> [2, 3] and two mitochondria
    fn mito_container() -> NmbContainer {
        let mut c = NmbContainer::new();
        #[rustfmt::skip]
        let points = vec![
            0.0, 0.0, 0.0, 2.0,
            0.0, 0.0, 0.0, 1.0,
            0.0, 5.0, 0.0, 1.0,
            0.0, 5.0, 0.0, 1.0,
            -5.0, 5.0, 0.0, 1.0,
            0.0, 5.0, 0.0, 1.0,
            6.0, 5.0, 0.0, 1.0,
        ];
        c.insert(f32_set(POINTS, 7, 4, points));
        #[rustfmt::skip]
        let structure = vec![
            0, 1, -1,
            1, 3, 0,
            3, 3, 1,
            5, 3, 1,
        ];
        c.insert(i32_set(STRUCTURE, 4, 3, structure));
        #[rustfmt::skip]
        let mito_points = vec![
            0.0, 0.5, 10.0,
            0.0, 0.6, 20.0,
            1.0, 0.6, 20.0,
            2.0, 0.7, 30.0,
            2.0, 0.8, 40.0,
            0.0, 0.1, 5.0,
        ];
        c.insert(f32_set(MITO_POINTS, 6, 3, mito_points));
        #[rustfmt::skip]
        let mito_structure = vec![
            0, -1,
            2, 0,
            5, -1,
        ];
        c.insert(i32_set(MITO_STRUCTURE, 3, 2, mito_structure));
        c
    }

    #[test]
    fn test_container_bytes_layout() {
        let mut c = NmbContainer::new();
        c.insert(i32_set("/a", 1, 2, vec![7, -1]));
        let bytes = c.to_bytes();
        assert_eq!(&bytes[0..4], MAGIC);
        assert_eq!(LittleEndian::read_u16(&bytes[4..6]), 1);
        assert_eq!(LittleEndian::read_u16(&bytes[6..8]), 2);
        assert_eq!(&bytes[8..10], b"/a");
        assert_eq!(bytes[10], DTYPE_I32);
        assert_eq!(bytes.len(), 10 + 1 + 8 + 8);
        assert_eq!(NmbContainer::from_bytes(&bytes).unwrap(), c);
    }

    #[test]
    fn test_bad_input() {
        assert!(matches!(
            NmbContainer::from_bytes(b"HDF5\0\0"),
            Err(IoError::BadMagic(magic)) if &magic == b"HDF5"
        ));
        let bytes = mito_container().to_bytes();
        assert!(matches!(
            NmbContainer::from_bytes(&bytes[..bytes.len() - 3]),
            Err(IoError::Io(_))
        ));
        assert!(matches!(
            NmbDecoder.decode(&NmbContainer::new().to_bytes()),
            Err(IoError::MissingDataset(path)) if path == POINTS
        ));
        assert!(Dataset::new("/x", 2, 2, DatasetData::F32(vec![1.0])).is_err());

        // rows * cols * 4 does not fit in usize
        let mut header = MAGIC.to_vec();
        header.extend_from_slice(&1u16.to_le_bytes());
        header.extend_from_slice(&1u16.to_le_bytes());
        header.push(b'/');
        header.push(DTYPE_F32);
        header.extend_from_slice(&u32::MAX.to_le_bytes());
        header.extend_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(header.len(), 23);
        assert!(matches!(
            NmbContainer::from_bytes(&header),
            Err(IoError::DatasetShape { path, .. }) if path == "/"
        ));
    }

    #[test]
    fn test_decode_mitochondria() {
        let raw = NmbDecoder.decode(&mito_container().to_bytes()).unwrap();
        assert_eq!(raw.neurites.len(), 3);
        assert!(raw.neurites[0].is_root());
        assert_eq!(raw.neurites[1].parent_row_id, Some(1));
        assert_eq!(raw.soma.as_ref().unwrap().points.len(), 1);

        let m = build_morphology(raw).unwrap();
        let mito = m.mitochondria().unwrap();
        assert_eq!(mito.root_ids(), &[0, 2]);
        let root = mito.section(0).unwrap();
        assert_eq!(root.diameters(), &[10.0, 20.0]);
        assert_eq!(root.relative_path_lengths(), &[0.5, 0.6]);
        let child = root.children().next().unwrap();
        assert_eq!(child.neurite_section_ids(), &[1, 2, 2]);
        assert_eq!(child.parent(), Some(root));
    }

    #[test]
    fn test_unresolved_anchor_surfaces_as_build_error() {
        let mut c = mito_container();
        #[rustfmt::skip]
        let mito_points = vec![
            0.0, 0.5, 10.0,
            0.0, 0.6, 20.0,
            1.0, 0.6, 20.0,
            9.0, 0.7, 30.0,
            2.0, 0.8, 40.0,
            0.0, 0.1, 5.0,
        ];
        c.insert(f32_set(MITO_POINTS, 6, 3, mito_points));
        let raw = NmbDecoder.decode(&c.to_bytes()).unwrap();
        assert!(matches!(
            build_morphology(raw),
            Err(MorphologyError::UnresolvedAnchor { row_id: 1, .. })
        ));
    }

    #[test]
    fn test_write_then_read_keeps_ids_and_mitochondria() {
        let original = build_morphology(NmbDecoder.decode(&mito_container().to_bytes()).unwrap()).unwrap();
        let bytes = write_nmb(&original).unwrap();
        let again = build_morphology(NmbDecoder.decode(&bytes).unwrap()).unwrap();
        assert_eq!(original, again);
    }

    #[test]
    fn test_perimeters_round_trip() {
        let mut c = mito_container();
        c.insert(f32_set(PERIMETERS, 7, 1, vec![0.0, 1.0, 1.5, 1.5, 2.0, 1.5, 2.5]));
        let original = build_morphology(NmbDecoder.decode(&c.to_bytes()).unwrap()).unwrap();
        assert_eq!(
            original.section(1).unwrap().perimeters(),
            Some(&[1.5, 2.0][..])
        );
        let again = build_morphology(NmbDecoder.decode(&write_nmb(&original).unwrap()).unwrap()).unwrap();
        assert_eq!(original.perimeters(), again.perimeters());
    }
}
