use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use promptcad_ai::{Design, DesignConfig, Designer, GeminiClient};
use promptcad_core::{DEFAULT_RESOLUTION, Field, ShapeTag, Unit, to_millimeters};
use promptcad_mesh::{ExportFormat, export};
use promptcad_text::{
    ExtractOptions, Grammar, ShapeDefaults, classify, extract_partial, find_shape, suggest_shape,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

type DynError = Box<dyn Error>;

#[derive(Parser, Debug)]
#[command(name = "promptcad")]
#[command(about = "Turn plain-language shape descriptions into triangle meshes", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the shape class named in a prompt
    Classify {
        #[arg(short, long)]
        prompt: String,
    },
    /// Print the dimensions read from a prompt as JSON
    Extract {
        #[arg(short, long)]
        prompt: String,
        #[command(flatten)]
        reading: ReadingArgs,
    },
    /// Build a mesh from a prompt and write it to a file
    Build {
        #[command(flatten)]
        design: DesignArgs,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "binary-stl")]
        format: ExportFormat,
        /// Solid name written into STL headers
        #[arg(long, default_value = "design")]
        name: String,
    },
    /// Build a mesh from a prompt and print its measurements
    Metrics {
        #[command(flatten)]
        design: DesignArgs,
        /// Print the full design report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// How numbers are read out of the prompt.
#[derive(Args, Debug, Clone)]
struct ReadingArgs {
    /// Shape to use instead of classifying the prompt
    #[arg(long)]
    shape: Option<ShapeTag>,
    #[arg(long, default_value = "auto")]
    grammar: Grammar,
    /// Unit for numbers written without one
    #[arg(long)]
    unit: Option<Unit>,
    /// Explicit dimension, e.g. `--set height=20` or `--set radius=1in`
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_override)]
    overrides: Vec<(Field, f64)>,
    /// Fill missing dimensions with built-in defaults (reported in the output)
    #[arg(long)]
    defaults: bool,
}

#[derive(Args, Debug, Clone)]
struct DesignArgs {
    #[arg(short, long)]
    prompt: String,
    #[command(flatten)]
    reading: ReadingArgs,
    /// Angular segments for curved shapes
    #[arg(long, default_value_t = DEFAULT_RESOLUTION)]
    resolution: usize,
    /// Leave cylinder and cone ends open
    #[arg(long)]
    open_ends: bool,
    /// Let the Gemini model restate the prompt first (needs GOOGLE_API_KEY)
    #[arg(long)]
    interpret: bool,
}

fn main() -> Result<(), DynError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Classify { prompt } => run_classify(&prompt),
        Command::Extract { prompt, reading } => run_extract(&prompt, &reading),
        Command::Build {
            design,
            output,
            format,
            name,
        } => run_build(&design, &output, format, &name),
        Command::Metrics { design, json } => run_metrics(&design, json),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_classify(prompt: &str) -> Result<(), DynError> {
    match find_shape(prompt) {
        Some(found) => println!("{} ({} at {})", found.shape, found.keyword, found.offset),
        None => match suggest_shape(prompt) {
            Some(suggestion) => println!("unclassified (did you mean '{suggestion}'?)"),
            None => println!("unclassified"),
        },
    }
    Ok(())
}

fn run_extract(prompt: &str, reading: &ReadingArgs) -> Result<(), DynError> {
    let shape = match reading.shape {
        Some(shape) => shape,
        None => classify(prompt).ok_or("no supported shape found in the prompt")?,
    };
    let options = ExtractOptions {
        grammar: reading.grammar,
        unit_override: reading.unit,
    };
    let mut partial = extract_partial(prompt, shape, &options)?;
    for &(field, millimeters) in &reading.overrides {
        partial.set(field, millimeters)?;
    }
    if reading.defaults {
        partial = partial.with_defaults(&ShapeDefaults::default());
    }
    let extraction = partial.complete()?;
    println!("{}", serde_json::to_string_pretty(&extraction)?);
    Ok(())
}

fn run_build(
    args: &DesignArgs,
    output: &Path,
    format: ExportFormat,
    name: &str,
) -> Result<(), DynError> {
    let design = build_design(args)?;
    let bytes = export(&design.mesh, format, name);
    fs::write(output, bytes)?;
    info!(path = %output.display(), %format, "mesh written");
    println!(
        "wrote {}: {} with {} triangles",
        output.display(),
        design.shape,
        design.mesh.triangle_count()
    );
    Ok(())
}

fn run_metrics(args: &DesignArgs, json: bool) -> Result<(), DynError> {
    let design = build_design(args)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&design)?);
        return Ok(());
    }

    let report = &design.report.mesh;
    println!("shape {}", design.shape);
    println!("vertices {}", report.vertex_count);
    println!("triangles {}", report.triangle_count);
    println!("volume {:.6}", report.volume);
    println!("area {:.6}", report.surface_area);
    println!(
        "bounds {:.6} {:.6} {:.6}",
        report.extent(0),
        report.extent(1),
        report.extent(2)
    );
    println!("watertight {}", report.watertight);
    for applied in &design.defaults_applied {
        println!("default {} {}", applied.name, applied.value);
    }
    Ok(())
}

fn build_design(args: &DesignArgs) -> Result<Design, DynError> {
    let designer = Designer::new(design_config(args));
    let design = if args.interpret {
        let mut model = GeminiClient::from_env()?;
        designer.interpret_and_build(&mut model, &args.prompt)?
    } else {
        designer.build(&args.prompt)?
    };
    Ok(design)
}

fn design_config(args: &DesignArgs) -> DesignConfig {
    DesignConfig {
        resolution: args.resolution,
        grammar: args.reading.grammar,
        unit_override: args.reading.unit,
        shape_override: args.reading.shape,
        closed_ends: !args.open_ends,
        overrides: args.reading.overrides.iter().copied().collect::<BTreeMap<_, _>>(),
        defaults: args.reading.defaults.then(ShapeDefaults::default),
    }
}

/// Parses `field=value[unit]` into a field and millimeters.
fn parse_override(raw: &str) -> Result<(Field, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let field = name.parse::<Field>()?;

    let value = value.trim();
    let split = value
        .find(|c: char| c.is_alphabetic() || c == '"' || c == '\'')
        .unwrap_or(value.len());
    let number = value[..split]
        .trim()
        .parse::<f64>()
        .map_err(|err| format!("invalid number for {field}: {err}"))?;
    let unit = match value[split..].trim() {
        "" => Unit::Mm,
        token => token.parse::<Unit>().map_err(|err| err.to_string())?,
    };
    Ok((field, to_millimeters(number, unit)))
}
