//! Deterministic auto-layout for the graph view.
//!
//! Nodes are grouped into depth levels from the start node, stacked
//! vertically inside each level with a single greedy downward pass, then
//! each level is re-centred on y = 0. Exit statuses get synthetic nodes in a
//! column to the right of everything else.
//!
//! Traversal uses an explicit stack over node indices, so cyclic trees and
//! very long chains are both fine.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, trace};

use crate::schema::choice::DialogueChoice;
use crate::schema::tree::{DialogueNode, DialogueTree};

#[derive(Debug, Error)]
pub enum LayoutConfigError {
    #[error("failed to read layout config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse layout config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Spacing and size-estimate constants. Every field has a default, so a RON
/// file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
    pub node_margin: f64,
    pub base_height: f64,
    pub chars_per_line: usize,
    pub line_height: f64,
    pub choice_height: f64,
    pub choices_padding: f64,
    pub exit_offset: f64,
    pub exit_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_spacing: 400.0,
            vertical_spacing: 200.0,
            node_margin: 50.0,
            base_height: 80.0,
            chars_per_line: 35,
            line_height: 20.0,
            choice_height: 30.0,
            choices_padding: 20.0,
            exit_offset: 400.0,
            exit_spacing: 150.0,
        }
    }
}

impl LayoutConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, LayoutConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Self, LayoutConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// Estimated rendered height of a node's card.
    pub fn node_height(&self, node: &DialogueNode) -> f64 {
        let chars = node.text.chars().count();
        let per_line = self.chars_per_line.max(1);
        let lines = chars.div_ceil(per_line);

        let choices = if node.choices.is_empty() {
            0.0
        } else {
            node.choices.len() as f64 * self.choice_height + self.choices_padding
        };

        self.base_height + lines as f64 * self.line_height + choices
    }
}

/// How depth levels are assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutMode {
    /// Depth is the level at which depth-first traversal first reaches a node.
    #[default]
    FirstDiscovery,
    /// Depth is the longest path from the start, ignoring back-edges.
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedNode {
    pub id: String,
    pub depth: usize,
    pub height: f64,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedExit {
    /// `exit_<status>`
    pub id: String,
    pub status: String,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Choice,
    Alternate,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
    /// The choice text.
    pub label: String,
    pub kind: EdgeKind,
    /// The choice carries non-empty prerequisites.
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub mode: LayoutMode,
    /// Reachable nodes, level by level, in discovery order within a level.
    pub nodes: Vec<PlacedNode>,
    pub exits: Vec<PlacedExit>,
    pub edges: Vec<LayoutEdge>,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&PlacedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn exit(&self, status: &str) -> Option<&PlacedExit> {
        self.exits.iter().find(|e| e.status == status)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Position of a placed node or exit node (by its `exit_<status>` id).
    /// A real node with the same id wins; `lint` reports the clash.
    pub fn position(&self, id: &str) -> Option<Position> {
        self.node(id)
            .map(|n| n.position)
            .or_else(|| self.exits.iter().find(|e| e.id == id).map(|e| e.position))
    }

    /// Node and exit positions keyed by id, in output order.
    pub fn position_map(&self) -> IndexMap<String, Position> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .chain(self.exits.iter().map(|e| (e.id.clone(), e.position)))
            .collect()
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}

pub fn exit_node_id(status: &str) -> String {
    format!("exit_{}", status)
}

/// Lay out `tree` with the default constants in first-discovery mode.
pub fn layout(tree: &DialogueTree) -> Layout {
    layout_with(tree, &LayoutConfig::default(), LayoutMode::FirstDiscovery)
}

pub fn layout_with(tree: &DialogueTree, config: &LayoutConfig, mode: LayoutMode) -> Layout {
    let graph = Graph::build(tree);
    let (order, depths) = match mode {
        LayoutMode::FirstDiscovery => graph.first_discovery(),
        LayoutMode::Compact => graph.longest_path(),
    };

    // Group by level, keeping discovery order inside each level
    let mut levels: Vec<Vec<usize>> = Vec::new();
    for &index in &order {
        let depth = depths[index];
        if levels.len() <= depth {
            levels.resize_with(depth + 1, Vec::new);
        }
        levels[depth].push(index);
    }

    let mut nodes = Vec::with_capacity(order.len());
    for (depth, level) in levels.iter().enumerate() {
        let heights: Vec<f64> = level.iter().map(|&i| config.node_height(graph.node(i))).collect();
        let ys = pack_level(&heights, config);
        let x = depth as f64 * config.horizontal_spacing;

        for ((&index, height), y) in level.iter().zip(heights).zip(ys) {
            trace!(node = %graph.id(index), depth, x, y, "placed");
            nodes.push(PlacedNode {
                id: graph.id(index).to_string(),
                depth,
                height,
                position: Position { x, y },
            });
        }
    }

    let exits = place_exits(tree, &nodes, config);
    let edges = collect_edges(tree, &nodes);
    debug!(
        tree = %tree.name,
        ?mode,
        nodes = nodes.len(),
        exits = exits.len(),
        edges = edges.len(),
        "layout computed"
    );

    Layout {
        mode,
        nodes,
        exits,
        edges,
    }
}

/// Ids reachable from the start node, in first-discovery order.
pub fn reachable_node_ids(tree: &DialogueTree) -> Vec<&str> {
    let graph = Graph::build(tree);
    let (order, _) = graph.first_discovery();
    order.into_iter().map(|i| graph.id(i)).collect()
}

/// Vertical positions for one level: seeded around zero, pushed down until
/// nothing overlaps, then centred.
fn pack_level(heights: &[f64], config: &LayoutConfig) -> Vec<f64> {
    let count = heights.len();
    let Some(&last_height) = heights.last() else {
        return Vec::new();
    };
    let middle = (count as f64 - 1.0) / 2.0;

    let mut ys: Vec<f64> = Vec::with_capacity(count);
    for i in 0..count {
        let mut y = (i as f64 - middle) * config.vertical_spacing;
        if i > 0 {
            let min_y = ys[i - 1] + heights[i - 1] + config.node_margin;
            if y < min_y {
                y = min_y;
            }
        }
        ys.push(y);
    }

    let top = ys[0];
    let bottom = ys[count - 1] + last_height;
    let offset = (top + bottom) / 2.0;
    ys.iter().map(|y| y - offset).collect()
}

fn place_exits(tree: &DialogueTree, nodes: &[PlacedNode], config: &LayoutConfig) -> Vec<PlacedExit> {
    let rightmost = nodes
        .iter()
        .map(|n| n.position.x)
        .fold(None, |acc: Option<f64>, x| Some(acc.map_or(x, |a| a.max(x))))
        .unwrap_or(0.0);
    let x = rightmost + config.exit_offset;

    let mut exits: Vec<PlacedExit> = Vec::new();
    for (_, choice) in tree.choices() {
        let Some(status) = choice.exit_status() else {
            continue;
        };
        if exits.iter().any(|e| e.status == status) {
            continue;
        }
        let y = exits.len() as f64 * config.exit_spacing;
        exits.push(PlacedExit {
            id: exit_node_id(status),
            status: status.to_string(),
            position: Position { x, y },
        });
    }
    exits
}

/// Edges out of placed nodes, in placement order. Choices with alternate
/// destinations draw one edge per alternate instead of their main edge;
/// targets that were not placed are left out.
fn collect_edges(tree: &DialogueTree, nodes: &[PlacedNode]) -> Vec<LayoutEdge> {
    let placed = |id: &str| nodes.iter().any(|n| n.id == id);
    let mut edges = Vec::new();

    for placed_node in nodes {
        let Some(node) = tree.node(&placed_node.id) else {
            continue;
        };
        for choice in &node.choices {
            let edge = |target: String, kind: EdgeKind| LayoutEdge {
                source: node.id.clone(),
                target,
                label: choice.text.clone(),
                kind,
                locked: is_gated(choice),
            };

            if let Some(status) = choice.exit_status() {
                edges.push(edge(exit_node_id(status), EdgeKind::Exit));
            } else if !choice.alternate_destinations().is_empty() {
                for alternate in choice.alternate_destinations() {
                    if placed(&alternate.next_node_id) {
                        edges.push(edge(alternate.next_node_id.clone(), EdgeKind::Alternate));
                    }
                }
            } else if placed(&choice.next_node_id) {
                edges.push(edge(choice.next_node_id.clone(), EdgeKind::Choice));
            }
        }
    }
    edges
}

fn is_gated(choice: &DialogueChoice) -> bool {
    choice.prerequisites.as_ref().is_some_and(|p| !p.is_empty())
}

/// Index-based view of the tree: node `i` is `tree.nodes[i]`, and
/// `children[i]` lists existing targets in traversal order (each choice's
/// `nextNodeId`, then its alternate destinations).
struct Graph<'a> {
    tree: &'a DialogueTree,
    start: Option<usize>,
    children: Vec<Vec<usize>>,
}

impl<'a> Graph<'a> {
    fn build(tree: &'a DialogueTree) -> Self {
        let index_of = |id: &str| {
            if id.is_empty() {
                None
            } else {
                tree.nodes.get_index_of(id)
            }
        };

        let children = tree
            .nodes
            .values()
            .map(|node| {
                node.choices
                    .iter()
                    .flat_map(|choice| {
                        std::iter::once(choice.next_node_id.as_str())
                            .chain(choice.alternate_destinations().iter().map(|a| a.next_node_id.as_str()))
                    })
                    .filter_map(index_of)
                    .collect()
            })
            .collect();

        Self {
            tree,
            start: index_of(&tree.start_node_id),
            children,
        }
    }

    fn id(&self, index: usize) -> &'a str {
        self.tree
            .nodes
            .get_index(index)
            .map(|(id, _)| id.as_str())
            .unwrap_or_default()
    }

    fn node(&self, index: usize) -> &'a DialogueNode {
        &self.tree.nodes[index]
    }

    /// Depth-first preorder from the start. A node's depth is the level at
    /// which it is first reached; later paths to it are ignored.
    fn first_discovery(&self) -> (Vec<usize>, Vec<usize>) {
        let count = self.children.len();
        let mut depths = vec![0; count];
        let mut visited = vec![false; count];
        let mut order = Vec::new();

        let Some(start) = self.start else {
            return (order, depths);
        };

        let mut stack = vec![(start, 0)];
        while let Some((index, depth)) = stack.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            depths[index] = depth;
            order.push(index);

            for &child in self.children[index].iter().rev() {
                if !visited[child] {
                    stack.push((child, depth + 1));
                }
            }
        }

        (order, depths)
    }

    /// Longest distance from the start over the graph with back-edges
    /// removed. Order is the depth-first preorder, as in `first_discovery`.
    fn longest_path(&self) -> (Vec<usize>, Vec<usize>) {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unseen,
            OnPath,
            Done,
        }

        let count = self.children.len();
        let mut depths = vec![0; count];
        let mut marks = vec![Mark::Unseen; count];
        let mut forward: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut preorder = Vec::new();
        let mut postorder = Vec::new();

        let Some(start) = self.start else {
            return (preorder, depths);
        };

        marks[start] = Mark::OnPath;
        preorder.push(start);
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(top) = stack.last_mut() {
            let (index, next) = *top;
            let Some(&child) = self.children[index].get(next) else {
                marks[index] = Mark::Done;
                postorder.push(index);
                stack.pop();
                continue;
            };
            top.1 += 1;

            match marks[child] {
                Mark::Unseen => {
                    marks[child] = Mark::OnPath;
                    preorder.push(child);
                    forward[index].push(child);
                    stack.push((child, 0));
                }
                // back-edge
                Mark::OnPath => {}
                Mark::Done => forward[index].push(child),
            }
        }

        // Reverse postorder is a topological order of the forward edges
        for &index in postorder.iter().rev() {
            for &child in &forward[index] {
                depths[child] = depths[child].max(depths[index] + 1);
            }
        }

        (preorder, depths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prerequisites::Prerequisites;

    fn node(id: &str, targets: &[&str]) -> DialogueNode {
        targets.iter().enumerate().fold(DialogueNode::new(id, "N", ""), |n, (i, t)| {
            n.with_choice(DialogueChoice::new(format!("{}_{}", id, i), "go", *t))
        })
    }

    fn tree(start: &str, nodes: Vec<DialogueNode>) -> DialogueTree {
        nodes
            .into_iter()
            .fold(DialogueTree::new("t", start), |t, n| t.with_node(n))
    }

    fn depth(layout: &Layout, id: &str) -> usize {
        layout.node(id).unwrap().depth
    }

    #[test]
    fn node_height_estimate() {
        let config = LayoutConfig::default();
        assert_eq!(config.node_height(&DialogueNode::new("a", "N", "")), 80.0);

        let text = "x".repeat(36);
        let n = DialogueNode::new("a", "N", text)
            .with_choice(DialogueChoice::new("c1", "", "b"))
            .with_choice(DialogueChoice::new("c2", "", "b"));
        // 2 lines, 2 choices
        assert_eq!(config.node_height(&n), 80.0 + 40.0 + 60.0 + 20.0);
    }

    #[test]
    fn height_counts_characters_not_bytes() {
        let config = LayoutConfig::default();
        let n = DialogueNode::new("a", "N", "é".repeat(35));
        assert_eq!(config.node_height(&n), 100.0);
    }

    #[test]
    fn single_node_is_centred() {
        let t = tree("a", vec![node("a", &[])]);
        let l = layout(&t);
        assert_eq!(l.nodes.len(), 1);
        assert_eq!(l.position("a"), Some(Position { x: 0.0, y: -40.0 }));
    }

    #[test]
    fn level_packing_pushes_down_and_recentres() {
        let config = LayoutConfig::default();
        // three 80-high cards: seeds -200, 0, 200 already clear the margin
        let ys = pack_level(&[80.0, 80.0, 80.0], &config);
        assert_eq!(ys, vec![-240.0, -40.0, 160.0]);

        // tall first card pushes the second one down
        let ys = pack_level(&[300.0, 80.0], &config);
        // seeds -100, 100 -> second pushed to 250; top -100, bottom 330
        assert_eq!(ys, vec![-215.0, 135.0]);
    }

    #[test]
    fn first_discovery_depth_follows_dfs() {
        // a -> b -> c, a -> c : c is first reached through b
        let t = tree("a", vec![node("a", &["b", "c"]), node("b", &["c"]), node("c", &[])]);
        let l = layout(&t);
        assert_eq!(depth(&l, "a"), 0);
        assert_eq!(depth(&l, "b"), 1);
        assert_eq!(depth(&l, "c"), 2);
        assert_eq!(l.position("c").unwrap().x, 800.0);
    }

    #[test]
    fn cycles_terminate_and_unreachable_nodes_are_dropped() {
        let t = tree(
            "a",
            vec![node("a", &["b"]), node("b", &["a", "b"]), node("island", &["a"])],
        );
        let l = layout(&t);
        assert_eq!(l.nodes.len(), 2);
        assert!(!l.contains("island"));
        assert_eq!(reachable_node_ids(&t), vec!["a", "b"]);
    }

    #[test]
    fn compact_uses_longest_path_ignoring_back_edges() {
        // a -> c directly, and a -> b -> c; c -> a is a back-edge
        let t = tree(
            "a",
            vec![node("a", &["c", "b"]), node("b", &["c"]), node("c", &["a"])],
        );
        let first = layout(&t);
        assert_eq!(depth(&first, "c"), 1);
        assert_eq!(depth(&first, "b"), 1);

        let compact = layout_with(&t, &LayoutConfig::default(), LayoutMode::Compact);
        assert_eq!(compact.mode, LayoutMode::Compact);
        assert_eq!(depth(&compact, "a"), 0);
        assert_eq!(depth(&compact, "b"), 1);
        assert_eq!(depth(&compact, "c"), 2);
    }

    #[test]
    fn alternate_destinations_are_traversed() {
        let t = tree(
            "a",
            vec![
                DialogueNode::new("a", "N", "").with_choice(
                    DialogueChoice::new("c", "go", "b")
                        .with_alternate_destination("vip", Prerequisites::default().require("vip")),
                ),
                node("b", &[]),
                node("vip", &[]),
            ],
        );
        let l = layout(&t);
        assert_eq!(depth(&l, "vip"), 1);

        let kinds: Vec<(&str, EdgeKind)> = l.edges.iter().map(|e| (e.target.as_str(), e.kind)).collect();
        assert_eq!(kinds, vec![("vip", EdgeKind::Alternate)]);
        assert!(!l.edges[0].locked);
    }

    #[test]
    fn exits_stack_to_the_right_in_first_seen_order() {
        let t = tree(
            "a",
            vec![
                DialogueNode::new("a", "N", "")
                    .with_choice(DialogueChoice::exit("x1", "Shop", "shop"))
                    .with_choice(DialogueChoice::new("c", "go", "b")),
                DialogueNode::new("b", "N", "")
                    .with_choice(DialogueChoice::exit("x2", "Leave", "leave"))
                    .with_choice(DialogueChoice::exit("x3", "Shop again", "shop")),
            ],
        );
        let l = layout(&t);
        assert_eq!(l.exits.len(), 2);
        assert_eq!(l.exits[0].id, "exit_shop");
        assert_eq!(l.exits[0].position, Position { x: 800.0, y: 0.0 });
        assert_eq!(l.exit("leave").unwrap().position, Position { x: 800.0, y: 150.0 });

        let exit_edges = l.edges.iter().filter(|e| e.kind == EdgeKind::Exit).count();
        assert_eq!(exit_edges, 3);
    }

    #[test]
    fn missing_start_gives_only_exits() {
        let t = tree("ghost", vec![DialogueNode::new("a", "N", "").with_choice(DialogueChoice::exit("x", "", "done"))]);
        let l = layout(&t);
        assert!(l.nodes.is_empty());
        assert!(l.edges.is_empty());
        assert_eq!(l.exits[0].position, Position { x: 400.0, y: 0.0 });
    }

    #[test]
    fn dangling_edges_are_omitted() {
        let t = tree("a", vec![node("a", &["nowhere", ""])]);
        let l = layout(&t);
        assert_eq!(l.nodes.len(), 1);
        assert!(l.edges.is_empty());
    }

    #[test]
    fn config_from_ron_keeps_defaults() {
        let config = LayoutConfig::parse_ron("(horizontal_spacing: 250.0, chars_per_line: 40)").unwrap();
        assert_eq!(config.horizontal_spacing, 250.0);
        assert_eq!(config.chars_per_line, 40);
        assert_eq!(config.vertical_spacing, 200.0);
        assert!(LayoutConfig::parse_ron("(horizontal_spacing: \"wide\")").is_err());
    }
}
