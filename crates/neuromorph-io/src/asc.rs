// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

/*!
Neurolucida ASC text trees.

The file is a sequence of parenthesized blocks. A block carrying a
`(CellBody)` tag (or starting with the string `"CellBody"`) is the soma; a
block carrying `(Axon)`, `(Dendrite)` or `(Apical)` is a neurite. Anything
else at the top level (image coordinates, contours, markers) is skipped.

Inside a neurite, points are `(x y z d ...)` lists. A list whose first
element is itself a list opens a branch group; `|` separates sibling
branches. Each branch starts with a copy of its parent's last point.
*/

use std::fmt::Write as _;

use neuromorph_core::{
    Morphology, NeuriteRow, Point, RawMorphology, RowId, Section, SectionType, SomaRow, SomaType,
};
use tracing::debug;

use crate::decoder::MorphologyDecoder;
use crate::error::{IoError, IoResult};

/// Single-word tags that carry no geometry
const SKIPPED_TAGS: &[&str] = &[
    "Normal",
    "High",
    "Low",
    "Generated",
    "Incomplete",
    "Midpoint",
    "Origin",
    "Closed",
    "Open",
];

//region Lexer

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Pipe,
    Word(String),
    Str(String),
}

fn tokenize(text: &str) -> IoResult<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() || c == ',' => {}
            ';' => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '(' => tokens.push((Token::Open, line)),
            ')' => tokens.push((Token::Close, line)),
            '|' => tokens.push((Token::Pipe, line)),
            '"' => {
                let start = line;
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some(c) => {
                            if c == '\n' {
                                line += 1;
                            }
                            value.push(c);
                        }
                        None => return Err(IoError::UnexpectedEof { line: start }),
                    }
                }
                tokens.push((Token::Str(value), start));
            }
            c => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '(' | ')' | '|' | ';' | '"' | ',') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push((Token::Word(word), line));
            }
        }
    }
    Ok(tokens)
}

//endregion

//region S-expressions

#[derive(Debug, Clone, PartialEq)]
enum Node {
    List { items: Vec<Node>, line: usize },
    Word(String),
    Str(String),
    Pipe,
}

impl Node {
    fn items(&self) -> &[Node] {
        match self {
            Node::List { items, .. } => items.as_slice(),
            _ => &[],
        }
    }

    fn line(&self) -> usize {
        match self {
            Node::List { line, .. } => *line,
            _ => 0,
        }
    }

    /// `(Word)` lists such as `(Axon)` or `(Closed)`
    fn tag(&self) -> Option<&str> {
        match self.items() {
            [Node::Word(word)] => Some(word.as_str()),
            _ => None,
        }
    }
}

fn parse_nodes(tokens: Vec<(Token, usize)>) -> IoResult<Vec<Node>> {
    // Each open list: its opening line and collected items
    let mut stack: Vec<(usize, Vec<Node>)> = Vec::new();
    let mut top = Vec::new();

    for (token, line) in tokens {
        let node = match token {
            Token::Open => {
                stack.push((line, Vec::new()));
                continue;
            }
            Token::Close => {
                let (open_line, items) = stack.pop().ok_or(IoError::UnbalancedParens { line })?;
                Node::List {
                    items,
                    line: open_line,
                }
            }
            Token::Pipe => Node::Pipe,
            Token::Word(word) => Node::Word(word),
            Token::Str(value) => Node::Str(value),
        };
        match stack.last_mut() {
            Some((_, items)) => items.push(node),
            None => top.push(node),
        }
    }

    if let Some((open_line, _)) = stack.first() {
        return Err(IoError::UnbalancedParens { line: *open_line });
    }
    Ok(top)
}

//endregion

//region Interpretation

enum Block {
    Soma,
    Neurite(SectionType),
    Skip,
}

fn neurite_type(tag: &str) -> Option<SectionType> {
    match tag {
        "Axon" => Some(SectionType::Axon),
        "Dendrite" => Some(SectionType::BasalDendrite),
        "Apical" => Some(SectionType::ApicalDendrite),
        _ => None,
    }
}

fn classify(block: &Node) -> IoResult<Block> {
    let items = block.items();
    if matches!(items.first(), Some(Node::Str(name)) if name == "CellBody") {
        return Ok(Block::Soma);
    }
    let mut unknown_tag = None;
    for item in items {
        match item.tag() {
            Some("CellBody") => return Ok(Block::Soma),
            Some(tag) => match neurite_type(tag) {
                Some(section_type) => return Ok(Block::Neurite(section_type)),
                None if !SKIPPED_TAGS.contains(&tag) => unknown_tag = Some((tag, item.line())),
                None => {}
            },
            None => {}
        }
    }
    let has_points = items.iter().any(|item| is_point(item));
    match unknown_tag {
        Some((tag, line)) if has_points && items.first().map_or(false, is_list) => Err(
            IoError::parse(line, format!("unknown neurite type '{}'", tag)),
        ),
        _ => Ok(Block::Skip),
    }
}

fn is_list(node: &Node) -> bool {
    matches!(node, Node::List { .. })
}

fn is_number(word: &str) -> bool {
    word.parse::<f32>().is_ok()
}

/// Lists whose first element is a number
fn is_point(node: &Node) -> bool {
    matches!(node.items().first(), Some(Node::Word(word)) if is_number(word))
}

/// Lists whose first element is a list or a branch separator
fn is_branch_group(node: &Node) -> bool {
    matches!(node.items().first(), Some(Node::List { .. } | Node::Pipe))
}

fn parse_point(node: &Node) -> IoResult<(Point, f32)> {
    let values: Vec<f32> = node
        .items()
        .iter()
        .take(4)
        .map_while(|item| match item {
            Node::Word(word) => word.parse::<f32>().ok(),
            _ => None,
        })
        .collect();
    match values.as_slice() {
        [x, y, z, d] => Ok(([*x, *y, *z], *d)),
        _ => Err(IoError::parse(
            node.line(),
            "could not parse point, expected (x y z d)",
        )),
    }
}

struct NeuriteBuilder {
    rows: Vec<NeuriteRow>,
}

impl NeuriteBuilder {
    /// Emit one section and, depth first, all of its branches
    fn section(
        &mut self,
        items: &[Node],
        section_type: SectionType,
        parent: Option<(RowId, Point, f32)>,
    ) -> IoResult<()> {
        let mut points = Vec::new();
        let mut diameters = Vec::new();
        let parent_row = parent.map(|(row, _, _)| row);
        if let Some((_, point, diameter)) = parent {
            points.push(point);
            diameters.push(diameter);
        }

        let mut branches: Vec<&[Node]> = Vec::new();
        for item in items {
            if is_point(item) {
                if !branches.is_empty() {
                    return Err(IoError::parse(
                        item.line(),
                        "point found after the branches of a section",
                    ));
                }
                let (point, diameter) = parse_point(item)?;
                points.push(point);
                diameters.push(diameter);
            } else if is_branch_group(item) {
                branches.extend(item.items().split(|node| *node == Node::Pipe));
            }
        }

        let row_id = self.rows.len() as RowId;
        let last = points
            .last()
            .copied()
            .zip(diameters.last().copied());
        self.rows.push(NeuriteRow::new(
            row_id,
            section_type,
            points,
            diameters,
            parent_row,
        ));

        for branch in branches {
            let parent = last.map(|(point, diameter)| (row_id, point, diameter));
            self.section(branch, section_type, parent)?;
        }
        Ok(())
    }
}

fn soma_row(block: &Node) -> IoResult<SomaRow> {
    let mut points = Vec::new();
    let mut diameters = Vec::new();
    for item in block.items().iter().filter(|item| is_point(item)) {
        let (point, diameter) = parse_point(item)?;
        points.push(point);
        diameters.push(diameter);
    }
    let soma_type = match points.len() {
        0 => SomaType::Undefined,
        1 => SomaType::SinglePoint,
        _ => SomaType::SimpleContour,
    };
    Ok(SomaRow {
        soma_type,
        points,
        diameters,
    })
}

//endregion

/// Neurolucida ASC reader
#[derive(Debug, Clone, Copy, Default)]
pub struct AscDecoder;

impl MorphologyDecoder for AscDecoder {
    fn decode(&self, bytes: &[u8]) -> IoResult<RawMorphology> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| IoError::parse(0, format!("file is not valid UTF-8: {}", e)))?;
        let blocks = parse_nodes(tokenize(text)?)?;

        let mut soma = None;
        let mut neurites = NeuriteBuilder { rows: Vec::new() };
        for block in &blocks {
            match classify(block)? {
                Block::Soma => {
                    if soma.is_some() {
                        return Err(IoError::SomaAlreadyDefined { line: block.line() });
                    }
                    soma = Some(soma_row(block)?);
                }
                Block::Neurite(section_type) => {
                    neurites.section(block.items(), section_type, None)?;
                }
                Block::Skip => {}
            }
        }

        debug!(
            target: "neuromorph-io",
            blocks = blocks.len(),
            sections = neurites.rows.len(),
            "Decoded ASC"
        );
        Ok(RawMorphology {
            neurites: neurites.rows,
            soma,
            mitochondria: Vec::new(),
        })
    }
}

//region Writer

fn asc_tag(section_type: SectionType) -> IoResult<&'static str> {
    match section_type {
        SectionType::Axon => Ok("Axon"),
        SectionType::BasalDendrite => Ok("Dendrite"),
        SectionType::ApicalDendrite => Ok("Apical"),
        other => Err(IoError::Unwritable(format!(
            "section type {} has no ASC equivalent",
            other
        ))),
    }
}

fn asc_color(section_type: SectionType) -> &'static str {
    match section_type {
        SectionType::Axon => "Cyan",
        SectionType::ApicalDendrite => "Magenta",
        _ => "Red",
    }
}

fn write_points(out: &mut String, points: &[Point], diameters: &[f32], indent: usize) {
    for (point, diameter) in points.iter().zip(diameters) {
        let _ = writeln!(
            out,
            "{:indent$}({} {} {} {})",
            "",
            point[0],
            point[1],
            point[2],
            diameter,
            indent = indent
        );
    }
}

fn write_section(out: &mut String, section: Section<'_>, indent: usize) {
    let skip = usize::from(!section.is_root());
    let points = section.points().get(skip..).unwrap_or_default();
    let diameters = section.diameters().get(skip..).unwrap_or_default();
    write_points(out, points, diameters, indent);

    let n_children = section.child_ids().len();
    for (i, child) in section.children().enumerate() {
        let _ = writeln!(out, "{:indent$}{}", "", if i == 0 { "(" } else { "|" }, indent = indent);
        write_section(out, child, indent + 2);
        if i + 1 == n_children {
            let _ = writeln!(out, "{:indent$})", "", indent = indent);
        }
    }
}

/// Render a morphology as Neurolucida ASC text
///
/// A child section's first point is assumed to repeat its parent's last
/// point and is not written.
///
/// # Errors
///
/// Returns `Unwritable` when a root section is neither axon nor dendrite
pub fn write_asc(morphology: &Morphology) -> IoResult<String> {
    let mut out = String::new();
    let soma = morphology.soma();
    if !soma.is_empty() {
        out.push_str("(\"CellBody\"\n  (Color Red)\n  (CellBody)\n");
        write_points(&mut out, soma.points(), soma.diameters(), 2);
        out.push_str(")\n\n");
    }

    for root in morphology.root_sections() {
        let tag = asc_tag(root.section_type())?;
        let _ = write!(
            out,
            "( (Color {})\n  ({})\n",
            asc_color(root.section_type()),
            tag
        );
        write_section(&mut out, root, 2);
        out.push_str(")\n\n");
    }
    Ok(out)
}

//endregion
