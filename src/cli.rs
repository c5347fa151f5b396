use crate::config::load_config;
use crate::layout::compute_layout;
use crate::layout_dump::write_layout_dump;
use crate::parser::try_parse_plan;
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "showplan", version, about = "SQL Server execution plan (ShowPlan XML) renderer")]
pub struct Args {
    /// Input file (.sqlplan / .xml) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, layout, labels, edges)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,

    /// Write the computed layout as JSON to this path
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;

    let input = read_input(args.input.as_deref())?;
    let tree = try_parse_plan(&input).context("could not parse query plan XML")?;
    tracing::info!(operators = tree.len(), depth = tree.depth(), "plan loaded");

    let layout = compute_layout(&tree, &config.layout);
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &layout, &tree)?;
    }
    let svg = render_svg(&tree, &layout, &config.theme, &config.layout);

    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    let mut bytes = Vec::new();
    match path {
        Some(path) if path != Path::new("-") => {
            bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
        }
        _ => {
            io::stdin().read_to_end(&mut bytes)?;
        }
    }
    decode_plan_bytes(&bytes)
}

/// Decodes plan text saved as UTF-8 or UTF-16. Saved `.sqlplan` files and
/// `nvarchar` exports are often UTF-16 with a byte order mark.
fn decode_plan_bytes(bytes: &[u8]) -> Result<String> {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => Ok(String::from_utf8(rest.to_vec())?),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        // `<` followed by a zero byte: little-endian UTF-16 without a BOM.
        [b'<', 0, ..] => decode_utf16(bytes, u16::from_le_bytes),
        [0, b'<', ..] => decode_utf16(bytes, u16::from_be_bytes),
        _ => Ok(String::from_utf8(bytes.to_vec())?),
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        anyhow::bail!("UTF-16 input has an odd number of bytes");
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();
    Ok(String::from_utf16(&units)?)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}
