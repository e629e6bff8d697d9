use crate::config::load_config;
use crate::graph::build_graph;
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::loader::{load_topology, parse_topology_str};
use crate::model::{Library, Topology};
use crate::render::{render_svg, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "toposvg", version, about = "Render component topology XML as an SVG diagram")]
pub struct Args {
    /// Input topology file (.xml) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme and layout overrides)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Write the computed layout as JSON next to the diagram (debugging aid)
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let (topology, library) = read_input(args.input.as_deref())?;
    let graph = build_graph(&topology, &library);
    let layout = compute_layout(&graph, &config.theme, &config.layout);

    if let Some(path) = &args.dump_layout {
        write_layout_dump(path, &layout, &graph)?;
    }

    let svg = render_svg(&layout, &config.theme, &config.layout);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output)?;
            write_png(&svg, &output, &config)?;
        }
    }

    Ok(())
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &crate::config::Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &crate::config::Config) -> Result<()> {
    Err(anyhow::anyhow!(
        "PNG output requires building with the `png` feature"
    ))
}

fn read_input(path: Option<&Path>) -> Result<(Topology, Library)> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(load_topology(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    // Imports in piped input resolve against the working directory.
    Ok(parse_topology_str(&buf, Path::new("."))?)
}

fn ensure_output(output: &Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for png output"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn png_without_output_path_is_an_error() {
        assert!(ensure_output(&None).is_err());
        assert!(ensure_output(&Some(PathBuf::from("out.png"))).is_ok());
    }
}
