use crate::ir::PlanTree;
use crate::layout::PlanLayout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub depth: usize,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub index: usize,
    pub node_id: i64,
    pub physical_op: String,
    pub object_name: String,
    pub rel_op_cost: f64,
    pub warnings: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub subtree_width: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: usize,
    pub to: usize,
    pub rows: f64,
    pub points: Vec<[f32; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &PlanLayout, tree: &PlanTree) -> Self {
        let nodes = tree
            .iter()
            .map(|op| {
                let node = layout.node(op.id);
                NodeDump {
                    index: op.id.index(),
                    node_id: op.node_id,
                    physical_op: op.physical_op.clone(),
                    object_name: op.object_name.clone(),
                    rel_op_cost: op.rel_op_cost,
                    warnings: op.warnings.clone(),
                    x: node.x,
                    y: node.y,
                    subtree_width: node.width,
                }
            })
            .collect();

        let edges = tree
            .edges()
            .into_iter()
            .map(|(parent, child)| {
                let (x1, y1) = layout.bottom_center(parent);
                let (x2, y2) = layout.top_center(child);
                EdgeDump {
                    from: parent.index(),
                    to: child.index(),
                    rows: tree[child].estimate_rows,
                    points: vec![[x1, y1], [x2, y2]],
                }
            })
            .collect();

        LayoutDump {
            width: layout.width,
            height: layout.height,
            node_width: layout.node_width,
            node_height: layout.node_height,
            depth: tree.depth(),
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &PlanLayout, tree: &PlanTree) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout, tree);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::compute_layout;
    use crate::parser::parse_plan;

    #[test]
    fn dumps_nodes_and_edges() {
        let tree = parse_plan(include_str!("../tests/fixtures/nested_loop.xml")).expect("plan");
        let layout = compute_layout(&tree, &LayoutConfig::default());
        let value = serde_json::to_value(LayoutDump::from_layout(&layout, &tree)).expect("json");

        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["edges"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["depth"], 2);
        assert_eq!(value["nodes"][1]["physical_op"], "Index Seek");
        assert_eq!(value["edges"][1]["from"], 0);
        assert_eq!(value["edges"][1]["to"], 2);
        assert_eq!(value["edges"][1]["rows"], 1.0);
        assert_eq!(value["edges"][0]["points"][1][1], 130.0);
    }
}
