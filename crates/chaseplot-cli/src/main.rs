use chaseplot::pipeline::run_plan;
use chaseplot::render::{ArtifactFormat, ChartError, ChartLayout, RenderOptions, layout_figure};
use chaseplot::{
    CacheBoundaries, FigurePlan, LoadOptions, Loaded, NameMode, ReferenceAlias, StyleContext,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Load(chaseplot::Error),
    Chart(ChartError),
    Json(serde_json::Error),
    FiguresFailed { failed: usize, total: usize },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Load(err) => write!(f, "{err}"),
            CliError::Chart(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::FiguresFailed { failed, total } => {
                write!(f, "{failed} of {total} figures failed")
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<chaseplot::Error> for CliError {
    fn from(value: chaseplot::Error) -> Self {
        Self::Load(value)
    }
}

impl From<ChartError> for CliError {
    fn from(value: ChartError) -> Self {
        Self::Chart(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Plot,
    Summary,
    Normalize,
    Classify,
    Layout,
}

#[derive(Debug)]
struct Args {
    command: Option<Command>,
    inputs: Vec<String>,
    plan: Option<String>,
    figure: Option<String>,
    out_dir: String,
    formats: Option<Vec<ArtifactFormat>>,
    scale: f32,
    background: Option<String>,
    reference: Option<String>,
    no_reference: bool,
    lenient: bool,
    summary: bool,
    pretty: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            command: None,
            inputs: Vec::new(),
            plan: None,
            figure: None,
            out_dir: "plots".to_string(),
            formats: None,
            scale: 1.0,
            background: None,
            reference: None,
            no_reference: false,
            lenient: false,
            summary: false,
            pretty: false,
        }
    }
}

fn usage() -> &'static str {
    "chaseplot-cli\n\
\n\
USAGE:\n\
  chaseplot-cli plot [--plan <file>] [--out-dir <dir>] [--format svg,png,jpg,pdf] [--scale <n>] [--background <color>] [--reference <name>|--no-reference] [--lenient] [--summary] <input.json>...\n\
  chaseplot-cli summary [--reference <name>|--no-reference] [--lenient] <input.json>...\n\
  chaseplot-cli normalize [--pretty] [--reference <name>|--no-reference] [--lenient] <input.json>...\n\
  chaseplot-cli classify <size>...\n\
  chaseplot-cli layout [--plan <file>] [--figure <name>] [--pretty] [--reference <name>|--no-reference] [--lenient] <input.json>...\n\
\n\
NOTES:\n\
  - An input of '-' reads records from stdin (only as the sole input).\n\
  - plot writes <out-dir>/<figure>.<ext> per figure; the default formats are svg,png.\n\
  - layout prints the computed chart layouts (axes, ticks, drawables) as JSON.\n\
  - Without --plan, plot and layout use the built-in latency and batch figures.\n\
  - --reference <name> aliases that series as `latency` (default: raw_pointer_chasing_padded_aligned).\n\
  - --lenient drops records with malformed batch suffixes instead of failing the load.\n\
  - Set RUST_LOG (e.g. RUST_LOG=chaseplot=debug) to adjust stderr logging.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "plot" if args.command.is_none() => args.command = Some(Command::Plot),
            "summary" if args.command.is_none() => args.command = Some(Command::Summary),
            "normalize" if args.command.is_none() => args.command = Some(Command::Normalize),
            "classify" if args.command.is_none() => args.command = Some(Command::Classify),
            "layout" if args.command.is_none() => args.command = Some(Command::Layout),
            "--pretty" => args.pretty = true,
            "--lenient" => args.lenient = true,
            "--summary" => args.summary = true,
            "--no-reference" => args.no_reference = true,
            "--plan" => {
                let Some(plan) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.plan = Some(plan.clone());
            }
            "--figure" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.figure = Some(name.clone());
            }
            "--out-dir" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out_dir = dir.clone();
            }
            "--format" => {
                let Some(list) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.formats =
                    Some(ArtifactFormat::parse_list(list).map_err(|_| CliError::Usage(usage()))?);
            }
            "--scale" => {
                let Some(scale) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.scale = scale.parse::<f32>().map_err(|_| CliError::Usage(usage()))?;
                if !(args.scale.is_finite() && args.scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--reference" => {
                let Some(name) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.reference = Some(name.clone());
            }
            "--" => args.inputs.extend(it.by_ref().cloned()),
            "-" => args.inputs.push("-".to_string()),
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            input => args.inputs.push(input.to_string()),
        }
    }

    if args.command.is_none() || args.inputs.is_empty() {
        return Err(CliError::Usage(usage()));
    }
    if args.reference.is_some() && args.no_reference {
        return Err(CliError::Usage(usage()));
    }
    if args.inputs.len() > 1 && args.inputs.iter().any(|i| i == "-") {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn load_options(args: &Args) -> LoadOptions {
    let reference = if args.no_reference {
        None
    } else {
        Some(match &args.reference {
            Some(source) => ReferenceAlias {
                source: source.clone(),
                ..ReferenceAlias::default()
            },
            None => ReferenceAlias::default(),
        })
    };
    LoadOptions {
        reference,
        names: if args.lenient {
            NameMode::Lenient
        } else {
            NameMode::Strict
        },
        ..LoadOptions::default()
    }
}

fn load(args: &Args) -> Result<Loaded, CliError> {
    let options = load_options(args);
    let loaded = match args.inputs.as_slice() {
        [only] if only == "-" => chaseplot::load_reader(std::io::stdin().lock(), &options)?,
        inputs => chaseplot::load_paths(inputs, &options)?,
    };
    for err in &loaded.rejected {
        tracing::warn!("skipped record: {err}");
    }
    Ok(loaded)
}

fn load_plan(args: &Args) -> Result<FigurePlan, CliError> {
    Ok(match &args.plan {
        Some(path) => FigurePlan::from_path(path)?,
        None => FigurePlan::default_plan(),
    })
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn render_options(args: &Args) -> RenderOptions {
    let mut options = RenderOptions::default();
    if let Some(formats) = &args.formats {
        options.formats = formats.clone();
    }
    options.raster.scale = args.scale;
    if let Some(bg) = &args.background {
        options.layout.background_color = bg.clone();
        options.raster.background = Some(bg.clone());
    }
    options
}

fn run(args: Args) -> Result<(), CliError> {
    let Some(command) = args.command else {
        return Err(CliError::Usage(usage()));
    };

    match command {
        Command::Classify => {
            for raw in &args.inputs {
                let size = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|s| s.is_finite() && *s >= 0.0)
                    .ok_or(CliError::Usage("classify expects non-negative byte sizes"))?;
                println!("{raw}\t{}", chaseplot::classify(size));
            }
            Ok(())
        }
        Command::Normalize => {
            let loaded = load(&args)?;
            write_json(&loaded.dataset, args.pretty)
        }
        Command::Summary => {
            let loaded = load(&args)?;
            let table = chaseplot::summarize(&loaded.dataset, &CacheBoundaries::DEFAULT)?;
            print!("{table}");
            Ok(())
        }
        Command::Layout => {
            let loaded = load(&args)?;
            let options = render_options(&args);
            let figures: Vec<_> = load_plan(&args)?
                .expand()
                .into_iter()
                .filter(|f| args.figure.as_ref().is_none_or(|name| &f.name == name))
                .collect();
            if figures.is_empty() {
                return Err(CliError::Usage("no figure in the plan has that name"));
            }
            let layouts = figures
                .iter()
                .map(|f| layout_figure(&loaded.dataset, f, &StyleContext::default(), &options))
                .collect::<Result<Vec<ChartLayout>, _>>()?;
            write_json(&layouts, args.pretty)
        }
        Command::Plot => {
            let loaded = load(&args)?;
            let plan = load_plan(&args)?;
            let options = render_options(&args);
            let out_dir = PathBuf::from(&args.out_dir);

            let report = run_plan(
                &loaded.dataset,
                &plan,
                &StyleContext::default(),
                &out_dir,
                &options,
            );
            for artifact in report.artifacts() {
                println!("{}", artifact.path.display());
            }

            if args.summary {
                let table = chaseplot::summarize(&loaded.dataset, &options.boundaries)?;
                print!("{table}");
            }

            let failed = report.failures().count();
            if failed > 0 {
                return Err(CliError::FiguresFailed {
                    failed,
                    total: report.outcomes.len(),
                });
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chaseplot=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing();

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
