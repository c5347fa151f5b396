//! Top-down tree layout: every subtree gets a box as wide as its children's
//! boxes side by side, and each operator is centered over its row of
//! children.

use crate::config::LayoutConfig;
use crate::ir::{OperatorId, PlanTree};
use serde::Serialize;
use tracing::debug;

/// Placement of one operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NodeLayout {
    /// Top-left corner of the drawn node.
    pub x: f32,
    pub y: f32,
    /// Width of the box reserved for the operator's whole subtree.
    pub width: f32,
    /// Height of the drawn node.
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Geometry for a [`PlanTree`], indexed by [`OperatorId`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanLayout {
    pub nodes: Vec<NodeLayout>,
    pub node_width: f32,
    pub node_height: f32,
    /// Canvas size: content bounds plus padding on every side.
    pub width: f32,
    pub height: f32,
}

impl PlanLayout {
    pub fn node(&self, id: OperatorId) -> &NodeLayout {
        &self.nodes[id.index()]
    }

    /// Point where edges leave an operator towards its children.
    pub fn bottom_center(&self, id: OperatorId) -> (f32, f32) {
        let node = self.node(id);
        (node.x + self.node_width / 2.0, node.y + self.node_height)
    }

    /// Point where the edge from an operator's parent arrives.
    pub fn top_center(&self, id: OperatorId) -> (f32, f32) {
        let node = self.node(id);
        (node.x + self.node_width / 2.0, node.y)
    }
}

pub fn compute_layout(tree: &PlanTree, config: &LayoutConfig) -> PlanLayout {
    let mut nodes = vec![NodeLayout::default(); tree.len()];
    let root = tree.root_id();

    measure(tree, root, config, &mut nodes);
    place(tree, root, 0.0, 0.0, config, &mut nodes);

    let bounds = tree_bounds(tree, &nodes, config);
    let shift_x = config.padding - bounds.min_x;
    let shift_y = config.padding - bounds.min_y;
    for node in &mut nodes {
        node.x += shift_x;
        node.y += shift_y;
    }

    let layout = PlanLayout {
        nodes,
        node_width: config.node_width,
        node_height: config.node_height,
        width: bounds.width() + config.padding * 2.0,
        height: bounds.height() + config.padding * 2.0,
    };
    debug!(
        operators = tree.len(),
        width = layout.width,
        height = layout.height,
        "computed plan layout"
    );
    layout
}

/// Sizes each subtree bottom-up and returns the subtree's `(width, height)`.
fn measure(
    tree: &PlanTree,
    id: OperatorId,
    config: &LayoutConfig,
    nodes: &mut [NodeLayout],
) -> (f32, f32) {
    let children = &tree[id].children;
    if children.is_empty() {
        nodes[id.index()].width = config.node_width;
        nodes[id.index()].height = config.node_height;
        return (config.node_width, config.node_height);
    }

    let mut children_width = config.horizontal_gap * (children.len() - 1) as f32;
    let mut tallest_child: f32 = 0.0;
    for child in children {
        let (w, h) = measure(tree, *child, config, nodes);
        children_width += w;
        tallest_child = tallest_child.max(h);
    }

    nodes[id.index()].width = config.node_width.max(children_width);
    nodes[id.index()].height = config.node_height;
    (
        nodes[id.index()].width,
        config.node_height + config.vertical_gap + tallest_child,
    )
}

fn place(
    tree: &PlanTree,
    id: OperatorId,
    x: f32,
    y: f32,
    config: &LayoutConfig,
    nodes: &mut [NodeLayout],
) {
    let box_width = nodes[id.index()].width;
    nodes[id.index()].x = x + (box_width - config.node_width) / 2.0;
    nodes[id.index()].y = y;

    let children = &tree[id].children;
    if children.is_empty() {
        return;
    }

    let row_width: f32 = children
        .iter()
        .map(|child| nodes[child.index()].width)
        .sum::<f32>()
        + config.horizontal_gap * (children.len() - 1) as f32;
    let mut cursor = x + (box_width - row_width) / 2.0;
    let child_y = y + config.node_height + config.vertical_gap;
    for child in children {
        place(tree, *child, cursor, child_y, config, nodes);
        cursor += nodes[child.index()].width + config.horizontal_gap;
    }
}

/// Smallest rectangle enclosing every drawn node (not the subtree boxes).
pub fn tree_bounds(tree: &PlanTree, nodes: &[NodeLayout], config: &LayoutConfig) -> Bounds {
    subtree_bounds(tree, tree.root_id(), nodes, config)
}

fn subtree_bounds(
    tree: &PlanTree,
    id: OperatorId,
    nodes: &[NodeLayout],
    config: &LayoutConfig,
) -> Bounds {
    let node = &nodes[id.index()];
    let mut bounds = Bounds {
        min_x: node.x,
        min_y: node.y,
        max_x: node.x + config.node_width,
        max_y: node.y + config.node_height,
    };
    for child in &tree[id].children {
        let inner = subtree_bounds(tree, *child, nodes, config);
        bounds.min_x = bounds.min_x.min(inner.min_x);
        bounds.min_y = bounds.min_y.min(inner.min_y);
        bounds.max_x = bounds.max_x.max(inner.max_x);
        bounds.max_y = bounds.max_y.max(inner.max_y);
    }
    bounds
}
