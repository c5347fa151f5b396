use crate::error::PlanError;
use crate::ir::{OperatorId, PlanOperator, PlanTree};
use roxmltree::{Document, Node};
use std::collections::HashSet;
use tracing::{debug, trace};

const REL_OP: &str = "RelOp";
const QUERY_PLAN: &str = "QueryPlan";
const OBJECT: &str = "Object";
const WARNINGS: &str = "Warnings";

/// Deepest element nesting handed to the XML parser, which recurses once per
/// level. Real plans stay far below this (six statement levels, then two per
/// operator).
pub const MAX_ELEMENT_DEPTH: usize = 256;

/// Warning kinds with a fixed label, in the order they are reported.
const KNOWN_WARNINGS: [(&str, &str); 4] = [
    ("SpillToTempDb", "SpillToTempDb"),
    ("NoJoinPredicate", "No Join Predicate"),
    ("ColumnsWithNoStatistics", "Missing Statistics"),
    ("UnmatchedIndexes", "Unmatched Indexes"),
];

/// Parses a ShowPlan XML document, returning `None` when the text is not
/// well-formed XML or holds no operator to draw.
pub fn parse_plan(xml: &str) -> Option<PlanTree> {
    match try_parse_plan(xml) {
        Ok(tree) => Some(tree),
        Err(err) => {
            debug!(error = %err, "plan XML rejected");
            None
        }
    }
}

pub fn try_parse_plan(xml: &str) -> Result<PlanTree, PlanError> {
    if exceeds_depth(xml, MAX_ELEMENT_DEPTH) {
        return Err(PlanError::TooDeep {
            limit: MAX_ELEMENT_DEPTH,
        });
    }
    let doc = Document::parse(xml)?;
    let root = find_root_operator(&doc).ok_or(PlanError::NoOperator)?;

    let root_cost = parse_number(root.attribute("TotalSubtreeCost"), 0.0);
    let root_cost = if root_cost > 0.0 { root_cost } else { 1.0 };

    let mut builder = TreeBuilder {
        operators: Vec::new(),
        root_cost,
    };
    builder.visit(root, None, 0);
    debug!(
        operators = builder.operators.len(),
        root_cost, "parsed execution plan"
    );
    Ok(PlanTree::from_operators(builder.operators))
}

/// Single pass over the raw text counting open element tags. Markup that is
/// not an element (comments, CDATA, declarations) is skipped; anything
/// malformed is left for the XML parser to reject.
fn exceeds_depth(xml: &str, limit: usize) -> bool {
    let bytes = xml.as_bytes();
    let mut depth = 0usize;
    let mut pos = 0;

    while let Some(offset) = bytes[pos..].iter().position(|&b| b == b'<') {
        let start = pos + offset;
        let rest = &bytes[start..];
        let skip_to = |terminator: &[u8]| {
            rest.windows(terminator.len())
                .position(|window| window == terminator)
                .map_or(bytes.len(), |end| start + end + terminator.len())
        };

        if rest.starts_with(b"<!--") {
            pos = skip_to(b"-->");
        } else if rest.starts_with(b"<![CDATA[") {
            pos = skip_to(b"]]>");
        } else if rest.starts_with(b"<?") {
            pos = skip_to(b"?>");
        } else if rest.starts_with(b"<!") {
            pos = skip_to(b">");
        } else if rest.starts_with(b"</") {
            depth = depth.saturating_sub(1);
            pos = skip_to(b">");
        } else {
            let (end, self_closing) = open_tag_end(bytes, start + 1);
            if !self_closing {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            pos = end;
        }
        if pos >= bytes.len() {
            break;
        }
    }
    false
}

/// Position just past the `>` closing a start tag, honoring quoted attribute
/// values, and whether the tag closes itself.
fn open_tag_end(bytes: &[u8], from: usize) -> (usize, bool) {
    let mut quote = None;
    for (index, &byte) in bytes.iter().enumerate().skip(from) {
        match quote {
            Some(open) if byte == open => quote = None,
            Some(_) => {}
            None if byte == b'"' || byte == b'\'' => quote = Some(byte),
            None if byte == b'>' => return (index + 1, bytes[index - 1] == b'/'),
            None => {}
        }
    }
    (bytes.len(), false)
}

fn find_root_operator<'a, 'input>(doc: &'a Document<'input>) -> Option<Node<'a, 'input>> {
    let operators = || doc.descendants().filter(|node| is_named(node, REL_OP));

    operators()
        .find(|op| {
            parent_named(*op, QUERY_PLAN)
                .and_then(|plan| parent_named(plan, "StmtSimple"))
                .is_some()
        })
        .or_else(|| {
            operators().find(|op| {
                parent_named(*op, QUERY_PLAN).is_some()
                    && op.ancestors().any(|node| is_named(&node, "StmtCursor"))
            })
        })
        .or_else(|| operators().next())
}

struct TreeBuilder {
    operators: Vec<PlanOperator>,
    root_cost: f64,
}

impl TreeBuilder {
    fn visit(&mut self, element: Node<'_, '_>, parent: Option<OperatorId>, depth: usize) -> OperatorId {
        let id = OperatorId(self.operators.len());
        let total_subtree_cost = parse_number(element.attribute("TotalSubtreeCost"), 0.0);
        let physical_op = element.attribute("PhysicalOp").unwrap_or("Unknown");
        trace!(index = id.0, physical_op, depth, "operator");

        self.operators.push(PlanOperator {
            id,
            physical_op: physical_op.to_string(),
            logical_op: element.attribute("LogicalOp").unwrap_or_default().to_string(),
            object_name: object_name(element),
            estimate_rows: parse_number(element.attribute("EstimateRows"), 0.0),
            estimate_cpu: parse_number(element.attribute("EstimateCPU"), 0.0),
            estimate_io: parse_number(element.attribute("EstimateIO"), 0.0),
            estimate_rebinds: parse_number(element.attribute("EstimateRebinds"), 0.0),
            estimate_rewinds: parse_number(element.attribute("EstimateRewinds"), 0.0),
            estimate_executions: parse_number(element.attribute("EstimateExecutions"), 1.0),
            avg_row_size: parse_number(element.attribute("AvgRowSize"), 0.0),
            total_subtree_cost,
            rel_op_cost: total_subtree_cost / self.root_cost,
            parallel: parse_flag(element.attribute("Parallel")),
            node_id: element
                .attribute("NodeId")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(0),
            warnings: warnings(element),
            children: Vec::new(),
            parent,
            depth,
        });

        // Child operators sit one wrapper below this one (e.g. RelOp > Hash > RelOp).
        let mut seen = HashSet::new();
        let mut children = Vec::new();
        for wrapper in element.children().filter(|node| node.is_element()) {
            for candidate in wrapper.children().filter(|node| is_named(node, REL_OP)) {
                if seen.insert(candidate.id()) {
                    children.push(self.visit(candidate, Some(id), depth + 1));
                }
            }
        }
        self.operators[id.0].children = children;
        id
    }
}

fn object_name(element: Node<'_, '_>) -> String {
    let reference = element
        .children()
        .filter(|node| node.is_element())
        .flat_map(|wrapper| wrapper.children())
        .find(|node| is_named(node, OBJECT))
        .or_else(|| element.descendants().find(|node| is_named(node, OBJECT)));

    let Some(object) = reference else {
        return String::new();
    };

    let part = |name: &str| {
        object
            .attribute(name)
            .map(strip_brackets)
            .filter(|value| !value.is_empty())
    };
    let schema = part("Schema");
    let table = part("Table");
    let index = part("Index");

    match (table, index) {
        (Some(table), index) => schema
            .into_iter()
            .chain(Some(table))
            .chain(index)
            .collect::<Vec<_>>()
            .join("."),
        (None, Some(index)) => index.to_string(),
        (None, None) => String::new(),
    }
}

fn strip_brackets(value: &str) -> &str {
    let value = value.trim();
    let value = value.strip_prefix('[').unwrap_or(value);
    value.strip_suffix(']').unwrap_or(value)
}

fn warnings(element: Node<'_, '_>) -> Vec<String> {
    let container = element
        .children()
        .find(|node| is_named(node, WARNINGS))
        .or_else(|| {
            element
                .children()
                .filter(|node| node.is_element() && !is_named(node, REL_OP))
                .flat_map(|wrapper| wrapper.children())
                .find(|node| is_named(node, WARNINGS))
        });
    let Some(container) = container else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for (tag, label) in KNOWN_WARNINGS {
        let as_element = container.children().any(|node| is_named(&node, tag));
        let as_flag = parse_flag(container.attribute(tag));
        if as_element || as_flag {
            found.push(label.to_string());
        }
    }

    for other in container.children().filter(|node| node.is_element()) {
        let name = other.tag_name().name();
        if KNOWN_WARNINGS.iter().any(|(tag, _)| *tag == name) {
            continue;
        }
        if !found.iter().any(|existing| existing == name) {
            found.push(name.to_string());
        }
    }
    found
}

fn is_named(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn parent_named<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.parent_element()
        .filter(|parent| parent.tag_name().name() == name)
}

fn parse_number(value: Option<&str>, default: f64) -> f64 {
    value
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|number| number.is_finite())
        .unwrap_or(default)
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_SCAN: &str = include_str!("../tests/fixtures/simple_scan.xml");
    const NESTED_LOOP: &str = include_str!("../tests/fixtures/nested_loop.xml");
    const WARNINGS_PLAN: &str = include_str!("../tests/fixtures/warnings.xml");
    const PARALLEL: &str = include_str!("../tests/fixtures/parallel.xml");
    const NO_RELOP: &str = include_str!("../tests/fixtures/no_relop.xml");
    const CURSOR: &str = include_str!("../tests/fixtures/cursor.xml");
    const HASH_JOIN: &str = include_str!("../tests/fixtures/hash_join.xml");

    #[test]
    fn rejects_malformed_xml() {
        assert!(parse_plan("<not valid xml").is_none());
        assert!(parse_plan("").is_none());
        assert!(parse_plan("SELECT * FROM Users").is_none());
        assert!(matches!(try_parse_plan("<not valid xml"), Err(PlanError::Xml(_))));
    }

    #[test]
    fn rejects_documents_without_operators() {
        assert!(parse_plan(NO_RELOP).is_none());
        assert!(matches!(try_parse_plan(NO_RELOP), Err(PlanError::NoOperator)));
    }

    #[test]
    fn parses_single_operator() {
        let tree = parse_plan(SIMPLE_SCAN).expect("plan should parse");
        let root = tree.root();
        assert_eq!(tree.len(), 1);
        assert_eq!(root.physical_op, "Clustered Index Scan");
        assert_eq!(root.logical_op, "Clustered Index Scan");
        assert_eq!(root.estimate_rows, 1000.0);
        assert!((root.estimate_cpu - 0.01).abs() < 1e-9);
        assert!((root.estimate_io - 0.05).abs() < 1e-9);
        assert!((root.total_subtree_cost - 0.06).abs() < 1e-9);
        assert_eq!(root.avg_row_size, 100.0);
        assert_eq!(root.rel_op_cost, 1.0);
        assert!(root.children.is_empty());
        assert!(!root.parallel);
        assert_eq!(root.object_name, "dbo.Users.PK_Users");
    }

    #[test]
    fn child_costs_are_relative_to_root() {
        let tree = parse_plan(NESTED_LOOP).expect("plan should parse");
        assert_eq!(tree.root().rel_op_cost, 1.0);
        for child in tree.children(tree.root_id()) {
            assert!(child.rel_op_cost > 0.0 && child.rel_op_cost < 1.0);
        }
        let seek = &tree[tree.root().children[1]];
        assert!((seek.rel_op_cost - 0.113 / 0.15).abs() < 1e-9);
    }

    #[test]
    fn builds_children_in_document_order() {
        let tree = parse_plan(NESTED_LOOP).expect("plan should parse");
        let root = tree.root();
        assert_eq!(root.physical_op, "Nested Loops");
        let children: Vec<_> = tree.children(root.id).collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].physical_op, "Index Seek");
        assert_eq!(children[0].object_name, "dbo.Orders.IX_Orders_UserId");
        assert_eq!(children[1].physical_op, "Clustered Index Seek");
        assert_eq!(children[1].object_name, "dbo.Users.PK_Users");
        assert_eq!(children[1].estimate_rebinds, 499.0);
        assert_eq!(children[1].estimate_executions, 500.0);
        assert_eq!(children[1].parent, Some(root.id));
        assert_eq!(children[1].depth, 1);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn object_name_falls_back_to_nearest_descendant() {
        let tree = parse_plan(NESTED_LOOP).expect("plan should parse");
        assert_eq!(tree.root().object_name, "dbo.Orders.IX_Orders_UserId");
    }

    #[test]
    fn extracts_warnings_from_wrapper() {
        let tree = parse_plan(WARNINGS_PLAN).expect("plan should parse");
        assert_eq!(tree.root().warnings, vec!["SpillToTempDb", "No Join Predicate"]);
        assert!(tree[tree.root().children[0]].warnings.is_empty());
        assert_eq!(tree[tree.root().children[0]].object_name, "dbo.LargeTable");
    }

    #[test]
    fn extracts_attribute_and_unknown_warnings() {
        let tree = parse_plan(HASH_JOIN).expect("plan should parse");
        assert_eq!(
            tree.root().warnings,
            vec![
                "No Join Predicate",
                "Missing Statistics",
                "PlanAffectingConvert",
                "MemoryGrantWarning",
            ]
        );
    }

    #[test]
    fn detects_parallelism() {
        let tree = parse_plan(PARALLEL).expect("plan should parse");
        assert!(tree.root().parallel);
        assert!(tree[tree.root().children[0]].parallel);
        assert!(!parse_flag(Some("0")));
        assert!(parse_flag(Some("true")));
        assert!(!parse_flag(Some("yes")));
    }

    #[test]
    fn finds_cursor_plan_root() {
        let tree = parse_plan(CURSOR).expect("plan should parse");
        assert_eq!(tree.root().physical_op, "Sort");
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn falls_back_to_first_operator_anywhere() {
        let xml = r#"<Fragment><RelOp PhysicalOp="Top" TotalSubtreeCost="2"><Top><RelOp PhysicalOp="Table Scan" TotalSubtreeCost="1"/></Top></RelOp></Fragment>"#;
        let tree = parse_plan(xml).expect("plan should parse");
        assert_eq!(tree.root().physical_op, "Top");
        assert_eq!(tree[tree.root().children[0]].rel_op_cost, 0.5);
    }

    #[test]
    fn lenient_attribute_defaults() {
        let xml = r#"<RelOp EstimateRows="lots" EstimateExecutions="?" NodeId="x" TotalSubtreeCost="0"><Filter><RelOp PhysicalOp="Scan" TotalSubtreeCost="0.5"/></Filter></RelOp>"#;
        let tree = parse_plan(xml).expect("plan should parse");
        let root = tree.root();
        assert_eq!(root.physical_op, "Unknown");
        assert_eq!(root.logical_op, "");
        assert_eq!(root.estimate_rows, 0.0);
        assert_eq!(root.estimate_executions, 1.0);
        assert_eq!(root.node_id, 0);
        // Zero root cost falls back to a baseline of 1.
        assert_eq!(tree[root.children[0]].rel_op_cost, 0.5);
    }

    #[test]
    fn object_name_variants() {
        let xml = |attrs: &str| format!(r#"<RelOp><IndexScan><Object {attrs}/></IndexScan></RelOp>"#);
        let name = |attrs: &str| parse_plan(&xml(attrs)).expect("plan should parse").root().object_name.clone();
        assert_eq!(name(r#"Schema="[dbo]" Table="[T]""#), "dbo.T");
        assert_eq!(name(r#"Index="[IX_T]""#), "IX_T");
        assert_eq!(name(r#"Table="[T]" Index="[IX]""#), "T.IX");
        assert_eq!(name(r#"Database="[db]""#), "");
    }

    fn nested_chain(levels: usize) -> String {
        let mut xml = String::new();
        for id in 0..levels {
            xml.push_str(&format!(r#"<RelOp NodeId="{id}" PhysicalOp="Filter" TotalSubtreeCost="1"><Filter>"#));
        }
        for _ in 0..levels {
            xml.push_str("</Filter></RelOp>");
        }
        xml
    }

    #[test]
    fn rejects_pathologically_deep_documents() {
        let xml = nested_chain(5000);
        assert!(parse_plan(&xml).is_none());
        assert!(matches!(
            try_parse_plan(&xml),
            Err(PlanError::TooDeep { limit: MAX_ELEMENT_DEPTH })
        ));
    }

    #[test]
    fn accepts_deep_but_bounded_chains() {
        let tree = parse_plan(&nested_chain(MAX_ELEMENT_DEPTH / 2)).expect("plan should parse");
        assert_eq!(tree.len(), MAX_ELEMENT_DEPTH / 2);
        assert!(parse_plan(&nested_chain(MAX_ELEMENT_DEPTH / 2 + 1)).is_none());
    }

    #[test]
    fn depth_scan_skips_non_element_markup() {
        let xml = r#"<?xml version="1.0"?><!-- <a><b><c> --><A x="1 > 0" y='<'><![CDATA[<d><e>]]><B/></A>"#;
        assert!(!exceeds_depth(xml, 1));
        assert!(exceeds_depth("<A><B><C/></B></A>", 1));
        assert!(!exceeds_depth("<A><B/><C/></A>", 1));
    }

    #[test]
    fn ignores_operators_nested_deeper_than_one_wrapper() {
        let xml = r#"<RelOp PhysicalOp="A" TotalSubtreeCost="1"><Outer><Inner><RelOp PhysicalOp="B"/></Inner></Outer><W><RelOp PhysicalOp="C"/></W></RelOp>"#;
        let tree = parse_plan(xml).expect("plan should parse");
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[tree.root().children[0]].physical_op, "C");
    }
}
