//! Generation-bucketed diagram layout.
//!
//! # Responsibility
//! - Map a person collection to node positions, edges and canvas bounds.
//!
//! # Invariants
//! - Pure and deterministic: identical input yields identical output.
//! - Rows are keyed by stored `generation`, highest generation on top.
//! - All members of one generation share one `y`.
//! - Each row is centered against the widest row.
//! - Canvas size is derived from the laid-out extents, never fixed.

use crate::model::person::{Person, PersonId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Spacing and padding used by [`compute_layout`], in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal distance between the left edges of neighbouring nodes.
    pub node_spacing: f64,
    /// Vertical distance between neighbouring generation rows.
    pub generation_height: f64,
    pub padding_x: f64,
    /// Room above the top row for add-parent affordances.
    pub padding_top: f64,
    /// Room below the bottom row for add-child affordances.
    pub padding_bottom: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 80.0,
            node_spacing: 220.0,
            generation_height: 200.0,
            padding_x: 40.0,
            padding_top: 60.0,
            padding_bottom: 60.0,
        }
    }
}

/// Positioned person. `(x, y)` is the node's top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: PersonId,
    pub generation: i32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Parent,
    Marriage,
}

/// Connection between two laid-out persons.
///
/// `Parent` edges run from parent to child. `Marriage` edges are unordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayoutEdge {
    pub kind: EdgeKind,
    pub from: PersonId,
    pub to: PersonId,
}

/// Layout output consumed by the diagram surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeLayout {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub width: f64,
    pub height: f64,
}

impl TreeLayout {
    pub fn node(&self, id: &PersonId) -> Option<&LayoutNode> {
        self.nodes.iter().find(|node| &node.id == id)
    }
}

/// Computes positions for every person.
///
/// Empty input yields a canvas made only of padding.
pub fn compute_layout(people: &[Person], config: &LayoutConfig) -> TreeLayout {
    let mut rows: BTreeMap<i32, Vec<&Person>> = BTreeMap::new();
    for person in people {
        rows.entry(person.generation).or_default().push(person);
    }

    let row_span = |count: usize| -> f64 {
        if count == 0 {
            return 0.0;
        }
        (count - 1) as f64 * config.node_spacing + config.node_width
    };
    let widest = rows.values().map(|row| row_span(row.len())).fold(0.0, f64::max);

    let mut nodes = Vec::with_capacity(people.len());
    for (row_index, row) in rows.values().rev().enumerate() {
        let y = config.padding_top + row_index as f64 * config.generation_height;
        let offset = config.padding_x + (widest - row_span(row.len())) / 2.0;
        for (slot, person) in row.iter().enumerate() {
            nodes.push(LayoutNode {
                id: person.id.clone(),
                generation: person.generation,
                x: offset + slot as f64 * config.node_spacing,
                y,
            });
        }
    }

    let edges = collect_edges(people);

    let row_count = rows.len();
    let content_height = if row_count == 0 {
        0.0
    } else {
        (row_count - 1) as f64 * config.generation_height + config.node_height
    };

    TreeLayout {
        nodes,
        edges,
        width: widest + 2.0 * config.padding_x,
        height: config.padding_top + content_height + config.padding_bottom,
    }
}

fn collect_edges(people: &[Person]) -> Vec<LayoutEdge> {
    let generation_of: HashMap<&PersonId, i32> = people
        .iter()
        .map(|person| (&person.id, person.generation))
        .collect();

    let mut edges = Vec::new();
    for person in people {
        for parent_id in &person.parent_ids {
            if generation_of.contains_key(parent_id) {
                edges.push(LayoutEdge {
                    kind: EdgeKind::Parent,
                    from: parent_id.clone(),
                    to: person.id.clone(),
                });
            }
        }
    }

    let mut seen_couples: HashSet<(&PersonId, &PersonId)> = HashSet::new();
    for person in people {
        let partners = person
            .marriages
            .iter()
            .chain(person.divorces.iter())
            .filter_map(|event| event.partner_id.as_ref());
        for partner_id in partners {
            if generation_of.get(partner_id) != Some(&person.generation) {
                continue;
            }
            let key = if &person.id <= partner_id {
                (&person.id, partner_id)
            } else {
                (partner_id, &person.id)
            };
            if key.0 == key.1 || !seen_couples.insert(key) {
                continue;
            }
            edges.push(LayoutEdge {
                kind: EdgeKind::Marriage,
                from: key.0.clone(),
                to: key.1.clone(),
            });
        }
    }
    edges
}
