use std::path::{Path, PathBuf};

use toposvg::{LayoutConfig, Theme, build_graph, compute_layout, load_topology, render_svg};

fn fixture(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel)
}

fn render_fixture(rel: &str) -> String {
    let (topology, library) = load_topology(&fixture(rel)).expect("fixture load failed");
    let graph = build_graph(&topology, &library);
    let layout = compute_layout(&graph, &Theme::modern(), &LayoutConfig::default());
    render_svg(&layout, &Theme::modern(), &LayoutConfig::default())
}

fn assert_valid_svg(svg: &str, rel: &str) {
    assert!(svg.starts_with("<svg"), "{rel}: missing <svg tag");
    assert!(svg.ends_with("</svg>"), "{rel}: missing </svg tag");
}

#[test]
fn render_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "basic/pipeline.xml",
        "topdown/app.xml",
        "missing_port/app.xml",
        "nested/app.xml",
        "selfloop/loop.xml",
        "empty/empty.xml",
    ];

    for rel in candidates {
        assert!(fixture(rel).exists(), "fixture missing: {rel}");
        let svg = render_fixture(rel);
        assert_valid_svg(&svg, rel);
    }
}

#[test]
fn basic_pipeline_draws_every_instance_and_edge() {
    let svg = render_fixture("basic/pipeline.xml");
    for text in ["cam", "enc", "disk", "USB camera", "H.264 encoder", "frames", "packets"] {
        assert!(svg.contains(text), "expected `{text}` in svg");
    }
    // two connections, both directed
    assert_eq!(svg.matches("marker-end=\"url(#arrow)\"").count(), 2);
    assert!(svg.contains("1080p"));
}

#[test]
fn missing_port_skips_the_edge_but_renders_nodes() {
    let svg = render_fixture("missing_port/app.xml");
    assert!(svg.contains(">a<") || svg.contains("a</tspan>"));
    assert_eq!(
        svg.matches("marker-end=\"url(#arrow)\"").count(),
        0,
        "edge with a missing port must be skipped"
    );
}

#[test]
fn nested_imports_resolve_across_files() {
    let svg = render_fixture("nested/app.xml");
    assert!(svg.contains("screen"));
    assert!(svg.contains("pixels"));
    assert_eq!(svg.matches("marker-end=\"url(#arrow)\"").count(), 1);
}

#[test]
fn self_loop_is_rendered() {
    let svg = render_fixture("selfloop/loop.xml");
    assert_eq!(svg.matches("marker-end=\"url(#arrow)\"").count(), 1);
}

#[test]
fn empty_topology_renders_an_empty_canvas() {
    let svg = render_fixture("empty/empty.xml");
    assert_valid_svg(&svg, "empty/empty.xml");
    assert!(!svg.contains("<tspan"), "no text expected on an empty canvas");
}

#[test]
fn unreadable_input_is_a_load_error() {
    let err = load_topology(&fixture("does_not_exist.xml")).unwrap_err();
    assert!(matches!(err, toposvg::LoadError::Io { .. }));
}
