use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use showplan_renderer::config::LayoutConfig;
use showplan_renderer::layout::compute_layout;
use showplan_renderer::parser::parse_plan;
use showplan_renderer::render::render_svg;
use showplan_renderer::theme::Theme;
use std::hint::black_box;

/// Balanced join tree: every internal operator joins two inputs.
fn join_tree_source(depth: usize) -> String {
    fn rel_op(out: &mut String, next_id: &mut usize, level: usize, depth: usize, cost: f64) {
        let id = *next_id;
        *next_id += 1;
        if level + 1 >= depth {
            out.push_str(&format!(
                "<RelOp NodeId=\"{id}\" PhysicalOp=\"Clustered Index Scan\" LogicalOp=\"Clustered Index Scan\" EstimateRows=\"{}\" AvgRowSize=\"64\" TotalSubtreeCost=\"{cost}\"><IndexScan><Object Schema=\"[dbo]\" Table=\"[T{id}]\" Index=\"[PK_T{id}]\"/></IndexScan></RelOp>",
                1000 * (id + 1)
            ));
            return;
        }
        out.push_str(&format!(
            "<RelOp NodeId=\"{id}\" PhysicalOp=\"Hash Match\" LogicalOp=\"Inner Join\" EstimateRows=\"{}\" AvgRowSize=\"128\" TotalSubtreeCost=\"{cost}\"><Hash>",
            500 * (id + 1)
        ));
        rel_op(out, next_id, level + 1, depth, cost * 0.45);
        rel_op(out, next_id, level + 1, depth, cost * 0.45);
        out.push_str("</Hash></RelOp>");
    }

    let mut out = String::from(
        "<ShowPlanXML xmlns=\"http://schemas.microsoft.com/sqlserver/2004/07/showplan\"><BatchSequence><Batch><Statements><StmtSimple><QueryPlan>",
    );
    let mut next_id = 0;
    rel_op(&mut out, &mut next_id, 0, depth, 100.0);
    out.push_str("</QueryPlan></StmtSimple></Statements></Batch></BatchSequence></ShowPlanXML>");
    out
}

/// Long single-input pipeline (filters and compute scalars over one scan).
fn pipeline_source(length: usize) -> String {
    let mut out = String::from("<ShowPlanXML><BatchSequence><Batch><Statements><StmtSimple><QueryPlan>");
    for id in 0..length {
        out.push_str(&format!(
            "<RelOp NodeId=\"{id}\" PhysicalOp=\"Compute Scalar\" LogicalOp=\"Compute Scalar\" EstimateRows=\"{}\" TotalSubtreeCost=\"{}\"><ComputeScalar>",
            10 * (length - id),
            (length - id) as f64
        ));
    }
    out.push_str("<RelOp PhysicalOp=\"Table Scan\" EstimateRows=\"1\" TotalSubtreeCost=\"0.5\"/>");
    for _ in 0..length {
        out.push_str("</ComputeScalar></RelOp>");
    }
    out.push_str("</QueryPlan></StmtSimple></Statements></Batch></BatchSequence></ShowPlanXML>");
    out
}

fn inputs() -> Vec<(&'static str, String)> {
    vec![
        (
            "simple_scan",
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/simple_scan.xml")).to_string(),
        ),
        (
            "hash_join",
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/hash_join.xml")).to_string(),
        ),
        ("join_tree_6", join_tree_source(6)),
        ("join_tree_10", join_tree_source(10)),
        ("pipeline_50", pipeline_source(50)),
        ("pipeline_200", pipeline_source(200)),
    ]
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, input) in inputs() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, data| {
            b.iter(|| {
                let tree = parse_plan(black_box(data)).expect("parse failed");
                black_box(tree.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for (name, input) in inputs() {
        let tree = parse_plan(&input).expect("parse failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &tree, |b, data| {
            b.iter(|| {
                let layout = compute_layout(black_box(data), &config);
                black_box(layout.width);
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let theme = Theme::vscode();
    let config = LayoutConfig::default();
    for (name, input) in inputs() {
        let tree = parse_plan(&input).expect("parse failed");
        let layout = compute_layout(&tree, &config);
        group.bench_with_input(BenchmarkId::from_parameter(name), &layout, |b, data| {
            b.iter(|| {
                let svg = render_svg(&tree, black_box(data), &theme, &config);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let theme = Theme::vscode();
    let config = LayoutConfig::default();
    for (name, input) in inputs() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, data| {
            b.iter(|| {
                let tree = parse_plan(black_box(data)).expect("parse failed");
                let layout = compute_layout(&tree, &config);
                let svg = render_svg(&tree, &layout, &theme, &config);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_parse, bench_layout, bench_render, bench_end_to_end
);
criterion_main!(benches);
