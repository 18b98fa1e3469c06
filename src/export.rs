use crate::model::LayoutGraph;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use svg::Document;
use svg::node::element::{Line, Rectangle, Text, Title};

const MARGIN: f64 = 20.0;
const NODE_FILL: &str = "#DEA584";
const EDGE_STROKE: &str = "lightblue";

/// Render the graph at its current node positions
pub fn render_layout_svg(graph: &LayoutGraph) -> Document {
    let nodes = graph.nodes();

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for node in nodes {
        min_x = min_x.min(node.x() - node.width() / 2.0);
        min_y = min_y.min(node.y() - node.height() / 2.0);
        max_x = max_x.max(node.x() + node.width() / 2.0);
        max_y = max_y.max(node.y() + node.height() / 2.0);
    }
    if nodes.is_empty() {
        (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
    }

    let width = max_x - min_x + 2.0 * MARGIN;
    let height = max_y - min_y + 2.0 * MARGIN;
    let mut document = Document::new()
        .set("width", width)
        .set("height", height)
        .set("viewBox", (min_x - MARGIN, min_y - MARGIN, width, height))
        .set("style", "background-color: white");

    // Add edges first (so they appear under nodes)
    for edge in graph.edges() {
        let (Some(source), Some(target)) = (nodes.get(edge.source()), nodes.get(edge.target()))
        else {
            continue;
        };
        let line = Line::new()
            .set("x1", source.x())
            .set("y1", source.y())
            .set("x2", target.x())
            .set("y2", target.y())
            .set("stroke", EDGE_STROKE)
            .set("stroke-width", 1);
        document = document.add(line);
    }

    for node in nodes {
        let rect = Rectangle::new()
            .set("x", node.x() - node.width() / 2.0)
            .set("y", node.y() - node.height() / 2.0)
            .set("width", node.width())
            .set("height", node.height())
            .set("fill", NODE_FILL)
            .set("stroke", "black")
            .set("stroke-width", 1)
            .add(Title::new(node.id()));
        document = document.add(rect);

        let label = Text::new(node.id())
            .set("x", node.x())
            .set("y", node.y())
            .set("text-anchor", "middle")
            .set("dominant-baseline", "middle")
            .set("font-family", "Arial")
            .set("font-size", 8)
            .set("fill", "black");
        document = document.add(label);
    }

    document
}

pub fn export_layout_as_svg(graph: &LayoutGraph, output_path: &Path) -> Result<(), String> {
    let document = render_layout_svg(graph);
    let mut file = File::create(output_path).map_err(|e| e.to_string())?;
    file.write_all(document.to_string().as_bytes())
        .map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;
    use tempfile::TempDir;

    fn laid_out_graph() -> LayoutGraph {
        let mut graph = LayoutGraph::new();
        graph.add_node(Node::with_geometry("alpha", 0.0, 0.0, 10.0, 10.0));
        graph.add_node(Node::with_geometry("beta", 50.0, 20.0, 10.0, 10.0));
        graph.add_edge(0, 1);
        graph.add_edge(0, 7);
        graph
    }

    #[test]
    fn test_render_contains_nodes_and_edges() {
        let svg = render_layout_svg(&laid_out_graph()).to_string();
        assert_eq!(svg.matches("<rect").count(), 2);
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(svg.contains("alpha"));
        assert!(svg.contains("beta"));
    }

    #[test]
    fn test_export_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("layout.svg");
        export_layout_as_svg(&laid_out_graph(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing/layout.svg");
        assert!(export_layout_as_svg(&laid_out_graph(), &path).is_err());
    }

    #[test]
    fn test_empty_graph_renders() {
        let svg = render_layout_svg(&LayoutGraph::new()).to_string();
        assert!(!svg.contains("<rect"));
    }
}
