// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

/*!
SWC point tables.

Each non-comment line is one sample: `id type x y z radius parent`. Samples
of type 1 form the soma; every other sample belongs to a neurite. A neurite
section starts at a sample whose parent is the soma or `-1`, or whose parent
has more than one child, and runs until a sample with zero or several
children. A section that branches off another section starts with a copy of
the parent sample.

Sections are emitted depth first, roots in file order, so ids match the ones
the text and binary readers assign to the same cell.
*/

use std::fmt::Write as _;

use ahash::AHashMap;
use neuromorph_core::{
    Morphology, NeuriteRow, Point, RawMorphology, RowId, SectionType, SomaRow, SomaType,
};
use tracing::{debug, warn};

use crate::decoder::MorphologyDecoder;
use crate::error::{IoError, IoResult};

const SOMA_CODE: i32 = 1;

#[derive(Debug, Clone)]
struct Sample {
    id: i64,
    code: i32,
    point: Point,
    diameter: f32,
    parent: i64,
    line: usize,
}

impl Sample {
    fn is_soma(&self) -> bool {
        self.code == SOMA_CODE
    }
}

/// SWC reader
#[derive(Debug, Clone, Copy)]
pub struct SwcDecoder {
    strict_soma: bool,
}

impl Default for SwcDecoder {
    fn default() -> Self {
        Self { strict_soma: true }
    }
}

impl SwcDecoder {
    /// `strict_soma` rejects files whose soma samples start several chains
    pub fn new(strict_soma: bool) -> Self {
        Self { strict_soma }
    }
}

impl MorphologyDecoder for SwcDecoder {
    fn decode(&self, bytes: &[u8]) -> IoResult<RawMorphology> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| IoError::parse(0, format!("file is not valid UTF-8: {}", e)))?;
        let samples = parse_samples(text)?;
        assemble(&samples, self.strict_soma)
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, name: &str, line: usize) -> IoResult<T> {
    field
        .parse()
        .map_err(|_| IoError::parse(line, format!("could not parse {} '{}'", name, field)))
}

fn parse_line(content: &str, line: usize) -> IoResult<Sample> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    if fields.len() < 7 {
        return Err(IoError::parse(
            line,
            format!("expected 7 fields, found {}", fields.len()),
        ));
    }
    let id: i64 = parse_field(fields[0], "sample id", line)?;
    let code: i32 = parse_field(fields[1], "type", line)?;
    let x: f32 = parse_field(fields[2], "x", line)?;
    let y: f32 = parse_field(fields[3], "y", line)?;
    let z: f32 = parse_field(fields[4], "z", line)?;
    let radius: f32 = parse_field(fields[5], "radius", line)?;
    let parent: i64 = parse_field(fields[6], "parent", line)?;

    if SectionType::from_code(code).is_none() {
        return Err(IoError::UnsupportedSectionType {
            line,
            code: i64::from(code),
        });
    }
    if id == parent {
        return Err(IoError::SelfParent { line, id });
    }
    Ok(Sample {
        id,
        code,
        point: [x, y, z],
        diameter: radius * 2.0,
        parent,
        line,
    })
}

fn parse_samples(text: &str) -> IoResult<Vec<Sample>> {
    let mut samples = Vec::new();
    for (index, raw_line) in text.lines().enumerate() {
        let content = raw_line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }
        samples.push(parse_line(content, index + 1)?);
    }
    Ok(samples)
}

fn assemble(samples: &[Sample], strict_soma: bool) -> IoResult<RawMorphology> {
    let mut by_id: AHashMap<i64, usize> = AHashMap::with_capacity(samples.len());
    for (index, sample) in samples.iter().enumerate() {
        if let Some(&first) = by_id.get(&sample.id) {
            return Err(IoError::RepeatedId {
                line: sample.line,
                id: sample.id,
                first_line: samples[first].line,
            });
        }
        by_id.insert(sample.id, index);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); samples.len()];
    let mut roots = Vec::new();
    let mut soma_starts = Vec::new();
    for (index, sample) in samples.iter().enumerate() {
        let parent = if sample.parent < 0 {
            None
        } else {
            Some(*by_id.get(&sample.parent).ok_or(IoError::MissingParent {
                line: sample.line,
                id: sample.id,
                parent: sample.parent,
            })?)
        };
        match parent {
            Some(parent) if sample.is_soma() && !samples[parent].is_soma() => {
                return Err(IoError::SomaWithNeuriteParent {
                    line: sample.line,
                    id: sample.id,
                });
            }
            Some(_) if sample.is_soma() => {}
            Some(parent) if samples[parent].is_soma() => roots.push(index),
            Some(parent) => children[parent].push(index),
            None if sample.is_soma() => soma_starts.push(sample.line),
            None => roots.push(index),
        }
    }

    if soma_starts.len() > 1 {
        if strict_soma {
            return Err(IoError::MultipleSomata { lines: soma_starts });
        }
        warn!(
            target: "neuromorph-io",
            chains = soma_starts.len(),
            "Merging several soma chains into one soma"
        );
    }

    let soma_samples: Vec<&Sample> = samples.iter().filter(|s| s.is_soma()).collect();
    let soma = (!soma_samples.is_empty()).then(|| SomaRow {
        soma_type: SomaType::from_point_count(soma_samples.len()),
        points: soma_samples.iter().map(|s| s.point).collect(),
        diameters: soma_samples.iter().map(|s| s.diameter).collect(),
    });

    let neurites = build_sections(samples, &children, &roots)?;
    debug!(
        target: "neuromorph-io",
        samples = samples.len(),
        sections = neurites.len(),
        "Decoded SWC"
    );
    Ok(RawMorphology {
        neurites,
        soma,
        mitochondria: Vec::new(),
    })
}

/// Walk the sample forest depth first and cut it into sections
fn build_sections(
    samples: &[Sample],
    children: &[Vec<usize>],
    roots: &[usize],
) -> IoResult<Vec<NeuriteRow>> {
    let mut rows = Vec::new();
    let mut visited = 0usize;
    // (first sample of the section, parent row, sample to duplicate)
    let mut stack: Vec<(usize, Option<RowId>, Option<usize>)> =
        roots.iter().rev().map(|&root| (root, None, None)).collect();

    while let Some((start, parent_row, duplicate)) = stack.pop() {
        let row_id = rows.len() as RowId;
        let mut points = Vec::new();
        let mut diameters = Vec::new();
        if let Some(dup) = duplicate {
            points.push(samples[dup].point);
            diameters.push(samples[dup].diameter);
        }

        let mut current = start;
        loop {
            visited += 1;
            points.push(samples[current].point);
            diameters.push(samples[current].diameter);
            match children[current].as_slice() {
                [only] => current = *only,
                kids => {
                    for &kid in kids.iter().rev() {
                        stack.push((kid, Some(row_id), Some(current)));
                    }
                    break;
                }
            }
        }

        let code = samples[start].code;
        let section_type = SectionType::from_code(code).ok_or(IoError::UnsupportedSectionType {
            line: samples[start].line,
            code: i64::from(code),
        })?;
        rows.push(NeuriteRow::new(
            row_id,
            section_type,
            points,
            diameters,
            parent_row,
        ));
    }

    let neurite_count = samples.iter().filter(|s| !s.is_soma()).count();
    if visited != neurite_count {
        let reached: Vec<bool> = reachable(samples.len(), children, roots);
        if let Some(orphan) = samples
            .iter()
            .enumerate()
            .find(|(index, sample)| !sample.is_soma() && !reached[*index])
        {
            return Err(IoError::parse(
                orphan.1.line,
                format!("sample {} is part of a parent cycle", orphan.1.id),
            ));
        }
    }
    Ok(rows)
}

fn reachable(len: usize, children: &[Vec<usize>], roots: &[usize]) -> Vec<bool> {
    let mut reached = vec![false; len];
    let mut stack: Vec<usize> = roots.to_vec();
    while let Some(index) = stack.pop() {
        reached[index] = true;
        stack.extend(&children[index]);
    }
    reached
}

/// Render a morphology as SWC text
///
/// Soma samples come first as one chain, then each section depth first. A
/// child section's first point is assumed to repeat its parent's last point
/// and is not written. Sections with a single child are merged with it when
/// the file is read back.
pub fn write_swc(morphology: &Morphology) -> String {
    let mut out = String::from("# index type X Y Z radius parent\n");
    let mut next_id: i64 = 1;

    let soma = morphology.soma();
    for (i, (point, diameter)) in soma.points().iter().zip(soma.diameters()).enumerate() {
        let parent = if i == 0 { -1 } else { next_id - 1 };
        write_sample(&mut out, next_id, SOMA_CODE, point, *diameter, parent);
        next_id += 1;
    }
    let root_parent = if soma.is_empty() { -1 } else { 1 };

    // last written sample id of each section
    let mut last_sample: Vec<i64> = vec![0; morphology.n_sections()];
    for section in morphology.depth_first() {
        let code = section.section_type().code();
        let skip = usize::from(!section.is_root());
        let mut parent = match section.parent() {
            Some(parent) => last_sample[parent.id() as usize],
            None => root_parent,
        };
        for (point, diameter) in section
            .points()
            .iter()
            .zip(section.diameters())
            .skip(skip)
        {
            write_sample(&mut out, next_id, code, point, *diameter, parent);
            parent = next_id;
            next_id += 1;
        }
        last_sample[section.id() as usize] = parent;
    }
    out
}

fn write_sample(out: &mut String, id: i64, code: i32, point: &Point, diameter: f32, parent: i64) {
    // Writing into a String cannot fail
    let _ = writeln!(
        out,
        "{} {} {} {} {} {} {}",
        id,
        code,
        point[0],
        point[1],
        point[2],
        diameter / 2.0,
        parent
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromorph_core::build_morphology;

    const SIMPLE: &str = "\
# index type X Y Z radius parent
1 1 0 0 0 1 -1
2 3 0 0 0 1 1
3 3 0 5 0 1 2
4 3 -5 5 0 1.5 3
5 3 6 5 0 1.5 3
6 2 0 0 0 1 1
7 2 0 -4 0 1 6
8 2 6 -4 0 2 7
9 2 -5 -4 0 2 7
";

    fn decode(text: &str) -> IoResult<RawMorphology> {
        SwcDecoder::default().decode(text.as_bytes())
    }

    #[test]
    fn test_sections_cut_at_branch_points() {
        let raw = decode(SIMPLE).unwrap();
        assert_eq!(raw.neurites.len(), 6);

        let first = &raw.neurites[0];
        assert_eq!(first.section_type, SectionType::BasalDendrite);
        assert_eq!(first.points, vec![[0.0, 0.0, 0.0], [0.0, 5.0, 0.0]]);
        assert_eq!(first.diameters, vec![2.0, 2.0]);
        assert!(first.is_root());

        let branch = &raw.neurites[1];
        assert_eq!(branch.parent_row_id, Some(0));
        assert_eq!(branch.points, vec![[0.0, 5.0, 0.0], [-5.0, 5.0, 0.0]]);
        assert_eq!(branch.diameters, vec![2.0, 3.0]);

        assert_eq!(raw.neurites[3].section_type, SectionType::Axon);
        assert!(raw.neurites[3].is_root());

        let soma = raw.soma.unwrap();
        assert_eq!(soma.soma_type, SomaType::SinglePoint);
        assert_eq!(soma.diameters, vec![2.0]);
    }

    #[test]
    fn test_unbranched_chain_is_one_section() {
        let raw = decode("1 2 0 0 0 1 -1\n2 2 1 0 0 1 1\n3 2 2 0 0 1 2\n").unwrap();
        assert_eq!(raw.neurites.len(), 1);
        assert_eq!(raw.neurites[0].points.len(), 3);
        assert!(raw.soma.is_none());
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let raw = decode("# header\n\n1 2 0 0 0 1 -1 # root\n2 2 1 0 0 1 1\n").unwrap();
        assert_eq!(raw.neurites.len(), 1);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        assert!(matches!(
            decode("1 2 0 0 0 1 -1\n2 2 zero 0 0 1 1\n"),
            Err(IoError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            decode("1 42 0 0 0 1 -1\n"),
            Err(IoError::UnsupportedSectionType { line: 1, code: 42 })
        ));
        assert!(matches!(
            decode("1 2 0 0 0 1 -1\n1 2 1 0 0 1 1\n"),
            Err(IoError::RepeatedId {
                line: 2,
                id: 1,
                first_line: 1
            })
        ));
        assert!(matches!(
            decode("1 2 0 0 0 1 1\n"),
            Err(IoError::SelfParent { line: 1, id: 1 })
        ));
        assert!(matches!(
            decode("1 2 0 0 0 1 -1\n2 2 1 0 0 1 7\n"),
            Err(IoError::MissingParent {
                line: 2,
                id: 2,
                parent: 7
            })
        ));
        assert!(matches!(
            decode("1 2 0 0 0 1 -1\n2 1 1 0 0 1 1\n"),
            Err(IoError::SomaWithNeuriteParent { line: 2, id: 2 })
        ));
    }

    #[test]
    fn test_parent_cycle_detected() {
        assert!(matches!(
            decode("1 2 0 0 0 1 2\n2 2 1 0 0 1 1\n"),
            Err(IoError::Parse { .. })
        ));
    }

    #[test]
    fn test_multiple_somata() {
        let text = "1 1 0 0 0 1 -1\n2 1 5 0 0 1 -1\n3 2 0 1 0 1 1\n4 2 0 2 0 1 3\n";
        assert!(matches!(
            decode(text),
            Err(IoError::MultipleSomata { ref lines }) if lines == &vec![1, 2]
        ));

        let raw = SwcDecoder::new(false).decode(text.as_bytes()).unwrap();
        assert_eq!(raw.soma.unwrap().points.len(), 2);
        assert_eq!(raw.neurites.len(), 1);
    }

    #[test]
    fn test_write_then_read() {
        let original = build_morphology(decode(SIMPLE).unwrap()).unwrap();
        let text = write_swc(&original);
        let again = build_morphology(decode(&text).unwrap()).unwrap();

        assert_eq!(original.n_sections(), again.n_sections());
        for (a, b) in original.depth_first().zip(again.depth_first()) {
            assert_eq!(a.id(), b.id());
            assert_eq!(a.points(), b.points());
            assert_eq!(a.diameters(), b.diameters());
            assert_eq!(a.section_type(), b.section_type());
        }
        assert_eq!(original.soma().points(), again.soma().points());
    }
}
