use clap::Parser;
use fmmm_bridge::config::{LayoutConfig, load_graph, load_layout_config};
use fmmm_bridge::export::export_layout_as_svg;
use fmmm_bridge::model::LayoutGraph;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the graph JSON file to lay out
    graph_path: PathBuf,
    /// Output file; `.svg` renders the layout, anything else gets JSON.
    /// Prints JSON to stdout when omitted.
    output: Option<PathBuf>,
    /// JSON file with layout defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Quality level, 0 (fast) to 4 (maximum)
    #[arg(long)]
    quality: Option<i32>,
    /// Keep the zeroed initial placement instead of a random scatter.
    /// Positions in the graph file are ignored.
    #[arg(long)]
    linear: bool,
    #[arg(long)]
    aspect_ratio: Option<f64>,
    /// Minimum distance between disconnected components
    #[arg(long)]
    separation: Option<f64>,
    /// Fixed seed for reproducible layouts
    #[arg(long)]
    seed: Option<u64>,
}

fn resolve_config(cli: &Cli) -> Result<LayoutConfig, String> {
    let mut config = match &cli.config {
        Some(path) => load_layout_config(path)?,
        None => LayoutConfig::default(),
    };
    if let Some(quality) = cli.quality {
        config.quality = quality;
    }
    if cli.linear {
        config.linear = true;
    }
    if let Some(aspect_ratio) = cli.aspect_ratio {
        config.aspect_ratio = aspect_ratio;
    }
    if let Some(separation) = cli.separation {
        config.component_separation = separation;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    Ok(config)
}

fn write_output(graph: &LayoutGraph, output: Option<&Path>) -> Result<(), String> {
    match output {
        Some(path) if path.extension().is_some_and(|ext| ext == "svg") => {
            export_layout_as_svg(graph, path)
        }
        Some(path) => {
            let json = serde_json::to_string_pretty(graph).map_err(|e| e.to_string())?;
            std::fs::write(path, json).map_err(|e| e.to_string())
        }
        None => {
            let json = serde_json::to_string_pretty(graph).map_err(|e| e.to_string())?;
            println!("{json}");
            Ok(())
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    if !cli.graph_path.exists() {
        return Err(format!(
            "The path you specified does not exist: {:?}",
            cli.graph_path
        ));
    }

    let config = resolve_config(cli)?;
    let mut graph = load_graph(&cli.graph_path)?;
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        quality = config.quality,
        "laying out graph"
    );

    graph
        .layout_with_params(&config.to_params())
        .map_err(|e| e.to_string())?;

    write_output(&graph, cli.output.as_deref())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("fmmm-layout error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GRAPH: &str = r#"{
        "nodes": [{"id": "A"}, {"id": "B"}, {"id": "C"}],
        "edges": [{"source": 0, "target": 1}, {"source": 1, "target": 2}]
    }"#;

    fn cli_for(graph_path: PathBuf, output: Option<PathBuf>) -> Cli {
        Cli {
            graph_path,
            output,
            config: None,
            quality: Some(0),
            linear: false,
            aspect_ratio: None,
            separation: None,
            seed: Some(1),
        }
    }

    #[test]
    fn test_non_existent_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("non_existent_graph_12345.json");

        let result = run(&cli_for(missing, None));

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("does not exist"));
    }

    #[test]
    fn test_json_output() {
        let temp_dir = TempDir::new().unwrap();
        let graph_path = temp_dir.path().join("graph.json");
        let output = temp_dir.path().join("layout.json");
        fs::write(&graph_path, GRAPH).unwrap();

        run(&cli_for(graph_path, Some(output.clone()))).unwrap();

        let graph: LayoutGraph = serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert!(graph.nodes().iter().any(|n| n.x() != 0.0 || n.y() != 0.0));
    }

    #[test]
    fn test_svg_output() {
        let temp_dir = TempDir::new().unwrap();
        let graph_path = temp_dir.path().join("graph.json");
        let output = temp_dir.path().join("layout.svg");
        fs::write(&graph_path, GRAPH).unwrap();

        run(&cli_for(graph_path, Some(output.clone()))).unwrap();

        assert!(fs::read_to_string(output).unwrap().contains("<rect"));
    }

    #[test]
    fn test_flags_override_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("layout.json");
        fs::write(&config_path, r#"{"quality": 3, "aspect_ratio": 2.0}"#).unwrap();

        let mut cli = cli_for(temp_dir.path().join("graph.json"), None);
        cli.config = Some(config_path);
        cli.quality = None;
        cli.separation = Some(5.0);

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.quality, 3);
        assert_eq!(config.aspect_ratio, 2.0);
        assert_eq!(config.component_separation, 5.0);
        assert_eq!(config.seed, Some(1));
    }

    #[test]
    fn test_invalid_parameters_reported() {
        let temp_dir = TempDir::new().unwrap();
        let graph_path = temp_dir.path().join("graph.json");
        fs::write(&graph_path, GRAPH).unwrap();

        let mut cli = cli_for(graph_path, None);
        cli.aspect_ratio = Some(-1.0);
        let err = run(&cli).unwrap_err();
        assert!(err.contains("Can't layout graph"));
    }
}
