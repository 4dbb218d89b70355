// Copyright 2025 Neuromorph Developers
// SPDX-License-Identifier: Apache-2.0

/*!
Traversal engine shared by the neurite and the mitochondrial forests.

Both forests are arenas of nodes addressed by `u32` ids. A forest exposes its
shape through [`TreeTopology`]; [`traverse`] turns a start point and an
[`IterType`] into a lazy [`Traversal`] that yields the forest's node handles.

## Orderings

- **Depth first**: pre-order, children left to right. A forest is walked one
  root at a time, each tree exhausted before the next begins.
- **Breadth first**: FIFO queue seeded with the start node, or with every
  root for a forest start, so roots share level 0 and levels interleave
  across trees.
- **Upstream**: the start node, then each ancestor up to and including the
  root. Only meaningful for a single node.

Each call creates an independent iterator; nothing is shared between two
traversals of the same forest.
*/

use std::collections::VecDeque;
use std::iter::FusedIterator;

use crate::error::{MorphResult, MorphologyError};

/// Traversal strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IterType {
    #[default]
    DepthFirst,
    BreadthFirst,
    Upstream,
}

/// Where a traversal begins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Start {
    /// A single node and everything below it (or above it, for upstream)
    Subtree(u32),
    /// Every root of the forest, in declared order
    Forest,
}

/// Read-only view of an arena forest
pub trait TreeTopology {
    /// Handle yielded for each visited node
    type Node<'a>
    where
        Self: 'a;

    /// Roots in declared order
    fn root_ids(&self) -> &[u32];

    /// Children of `id` in attachment order
    fn child_ids(&self, id: u32) -> &[u32];

    /// Parent of `id`, `None` for roots
    fn parent_id(&self, id: u32) -> Option<u32>;

    /// Number of nodes; valid ids are `0..len()`
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handle for `id`, which must be a valid id
    fn node(&self, id: u32) -> Self::Node<'_>;
}

/// Parent/children bookkeeping stored next to each arena node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Links {
    pub parent: Option<u32>,
    pub children: Vec<u32>,
    pub depth: u32,
}

impl Links {
    /// Register `id` as the last child of `parent_id` and return its own links
    pub(crate) fn child_of(parent: &mut Links, parent_id: u32, id: u32) -> Links {
        parent.children.push(id);
        Links {
            parent: Some(parent_id),
            children: Vec::new(),
            depth: parent.depth + 1,
        }
    }
}

enum Frontier {
    Stack(Vec<u32>),
    Queue(VecDeque<u32>),
    Chain(Option<u32>),
}

/// Lazy, finite sequence of nodes produced by [`traverse`]
pub struct Traversal<'a, T: TreeTopology + ?Sized> {
    tree: &'a T,
    frontier: Frontier,
}

impl<'a, T: TreeTopology + ?Sized> Traversal<'a, T> {
    /// Traversal of the subtree (or ancestor chain) of a known-valid id
    pub(crate) fn from_node(tree: &'a T, id: u32, iter_type: IterType) -> Self {
        let frontier = match iter_type {
            IterType::DepthFirst => Frontier::Stack(vec![id]),
            IterType::BreadthFirst => Frontier::Queue(VecDeque::from([id])),
            IterType::Upstream => Frontier::Chain(Some(id)),
        };
        Self { tree, frontier }
    }

    /// Depth-first walk over every tree of the forest
    pub(crate) fn forest_depth_first(tree: &'a T) -> Self {
        let stack = tree.root_ids().iter().rev().copied().collect();
        Self {
            tree,
            frontier: Frontier::Stack(stack),
        }
    }

    /// Interleaved level-order walk over every tree of the forest
    pub(crate) fn forest_breadth_first(tree: &'a T) -> Self {
        let queue = tree.root_ids().iter().copied().collect();
        Self {
            tree,
            frontier: Frontier::Queue(queue),
        }
    }
}

impl<'a, T: TreeTopology + ?Sized> Iterator for Traversal<'a, T> {
    type Item = T::Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        let id = match &mut self.frontier {
            Frontier::Stack(stack) => {
                let id = stack.pop()?;
                stack.extend(tree.child_ids(id).iter().rev());
                id
            }
            Frontier::Queue(queue) => {
                let id = queue.pop_front()?;
                queue.extend(tree.child_ids(id));
                id
            }
            Frontier::Chain(next) => {
                let id = (*next)?;
                *next = tree.parent_id(id);
                id
            }
        };
        Some(tree.node(id))
    }
}

impl<'a, T: TreeTopology + ?Sized> FusedIterator for Traversal<'a, T> {}

/// Build a traversal of `tree`
///
/// # Errors
///
/// - `UpstreamFromForest` when asking for an upstream walk of a whole forest
/// - `SectionNotFound` when a subtree start names an id outside the forest
pub fn traverse<T: TreeTopology + ?Sized>(
    tree: &T,
    start: Start,
    iter_type: IterType,
) -> MorphResult<Traversal<'_, T>> {
    match start {
        Start::Subtree(id) => {
            if id as usize >= tree.len() {
                return Err(MorphologyError::SectionNotFound(id));
            }
            Ok(Traversal::from_node(tree, id, iter_type))
        }
        Start::Forest => match iter_type {
            IterType::DepthFirst => Ok(Traversal::forest_depth_first(tree)),
            IterType::BreadthFirst => Ok(Traversal::forest_breadth_first(tree)),
            IterType::Upstream => Err(MorphologyError::UpstreamFromForest),
        },
    }
}
