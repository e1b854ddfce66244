use crate::config::{Config, load_config};
use crate::draft::{definition_to_draft, draft_to_definition, submit};
use crate::edit::apply_edits;
use crate::layout::layout_workflow_with_config;
use crate::layout_dump::write_layout_dump;
use crate::parser::{parse_definition, parse_draft, parse_edits};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "stepflow",
    version,
    about = "Convert, edit and lay out workflow step graphs"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Input file (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input", global = true)]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output", global = true)]
    pub output: Option<PathBuf>,

    /// Config file (JSON or JSON5) with `layout` and `output` sections
    #[arg(short = 'c', long = "configFile", global = true)]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Turn a workflow definition into an ordered, editable draft
    Draft {
        /// Workflow name carried into the draft
        #[arg(short = 'n', long = "name", default_value = "")]
        name: String,
    },
    /// Turn a draft back into a workflow definition
    Assemble {
        /// Reject drafts without a name, trigger or steps
        #[arg(long)]
        strict: bool,
    },
    /// Apply an edit script to a draft's step list
    Edit {
        /// Edit script: a JSON array of edits, or a single edit object
        #[arg(short = 'e', long = "edits")]
        edits: PathBuf,
    },
    /// Lay out a workflow definition as positioned nodes and edges
    Layout {
        /// Also write a debugging dump of the layout to this path
        #[arg(long)]
        dump: Option<PathBuf>,

        /// Horizontal gap between nodes in a layer
        #[arg(long = "nodeGap")]
        node_gap: Option<f32>,

        /// Vertical gap between layers
        #[arg(long = "rowGap")]
        row_gap: Option<f32>,

        /// Canvas margin
        #[arg(long = "margin")]
        margin: Option<f32>,
    },
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    config.output.pretty |= args.pretty;

    let input = read_input(args.input.as_deref())?;
    let output = execute(&args.command, &input, &config)?;
    write_output(&output, args.output.as_deref())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "stepflow=debug",
        _ => "stepflow=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

/// Runs one subcommand over already-read input and returns the JSON to emit.
pub fn execute(command: &Command, input: &str, config: &Config) -> Result<String> {
    let pretty = config.output.pretty;
    match command {
        Command::Draft { name } => {
            let definition = parse_definition(input)?;
            let draft = definition_to_draft(name, &definition);
            info!(steps = draft.steps.len(), "built draft");
            to_json(&draft, pretty)
        }
        Command::Assemble { strict } => {
            let draft = parse_draft(input)?;
            let definition = if *strict {
                submit(&draft).context("draft cannot be submitted")?
            } else {
                draft_to_definition(&draft)
            };
            to_json(&definition, pretty)
        }
        Command::Edit { edits } => {
            let draft = parse_draft(input)?;
            let script = std::fs::read_to_string(edits)
                .with_context(|| format!("failed to read edit script {}", edits.display()))?;
            let script = parse_edits(&script)
                .with_context(|| format!("failed to parse edit script {}", edits.display()))?;
            debug!(edits = script.len(), "applying edit script");
            let steps = apply_edits(&draft.steps, &script);
            to_json(&draft.with_steps(steps), pretty)
        }
        Command::Layout {
            dump,
            node_gap,
            row_gap,
            margin,
        } => {
            let definition = parse_definition(input)?;
            let mut layout_config = config.layout.clone();
            if let Some(value) = node_gap {
                layout_config.node_gap = *value;
            }
            if let Some(value) = row_gap {
                layout_config.row_gap = *value;
            }
            if let Some(value) = margin {
                layout_config.margin = *value;
            }
            let layout = layout_workflow_with_config(&definition, &layout_config);
            if let Some(path) = dump {
                write_layout_dump(path, &layout, &definition)
                    .with_context(|| format!("failed to write layout dump {}", path.display()))?;
            }
            to_json(&layout, pretty)
        }
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_output(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, format!("{text}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}")?;
            Ok(())
        }
    }
}
