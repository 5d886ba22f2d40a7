use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::anyhow;
use clap::Parser as ClapParser;
use clap::Subcommand;
use indexmap::IndexMap;
use rowlineage::config::LineageConfig;
use rowlineage::dialect::Dialect;
use rowlineage::instrument::{Instrumented, Instrumenter};
use rowlineage::manifest::Manifest;
use rowlineage::pipeline::{PipelineOutcome, generate_lineage_for_project};
use rowlineage::resolver::TokenResolver;
use rowlineage::rows::JsonlRowSource;
use rowlineage::sink::{export_file, sink_for};
use serde::Serialize;
use serde_json::Value;

#[derive(clap::Parser)]
#[command(name = "rowlineage")]
#[command(about = "Row-level lineage for SQL model projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite compiled SQL so it carries trace and parent-token columns.
    Instrument(InstrumentCommand),
    /// Build row mappings for every model edge of a project.
    Generate(GenerateCommand),
    /// Resolve parent tokens into the trace ids of one upstream model.
    Resolve(ResolveCommand),
}

#[derive(clap::Args)]
struct ConfigArgs {
    /// Path to a rowlineage.toml file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Project variable override, as key=value.
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<LineageConfig> {
        let mut vars = match &self.config {
            Some(path) => LineageConfig::from_toml_file(path)?.as_vars(),
            None => IndexMap::new(),
        };
        for var in &self.vars {
            let (key, value) = var
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid variable `{}`, expected key=value", var))?;
            vars.insert(key.trim().to_owned(), Value::String(value.trim().to_owned()));
        }
        LineageConfig::from_vars(&vars)
    }
}

#[derive(clap::Args)]
struct InstrumentCommand {
    /// SQL dialect, overriding the configured one.
    #[arg(short, long)]
    dialect: Option<String>,
    #[command(flatten)]
    config: ConfigArgs,
    /// Path to the compiled SQL file or directory containing SQL files.
    #[arg(value_name = "SQL_[FILE|DIR]")]
    sql: PathBuf,
    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args)]
struct GenerateCommand {
    /// Root of the project.
    #[arg(long, env = "DBT_PROJECT_ROOT", default_value = ".")]
    project_root: PathBuf,
    /// Manifest path, defaults to `<project-root>/target/manifest.json`.
    #[arg(long)]
    manifest_path: Option<PathBuf>,
    /// Directory holding one `<schema>.<table>.jsonl` dump per relation,
    /// defaults to `<project-root>/target/rowlineage/rows`.
    #[arg(long)]
    rows_dir: Option<PathBuf>,
    /// Directory the mappings are exported to. Takes precedence over the
    /// configured export path.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    #[command(flatten)]
    config: ConfigArgs,
    /// Pretty-print the summary.
    #[arg(long)]
    pretty: bool,
}

#[derive(clap::Args)]
struct ResolveCommand {
    /// Upstream model the trace ids belong to.
    #[arg(short, long)]
    model: String,
    /// Other aliases the upstream model is read under.
    #[arg(short, long = "alias")]
    aliases: Vec<String>,
    /// Parent tokens, as a JSON array or an array literal.
    #[arg(value_name = "TOKENS")]
    tokens: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OutInstrumented {
    Ok(Instrumented),
    ErrInstrumented { error: String },
}

fn output_instrumented(instrumenter: &Instrumenter, sql_file_path: &Path) -> OutInstrumented {
    match std::fs::read_to_string(sql_file_path) {
        Ok(sql) => {
            let instrumented = instrumenter.instrument(&sql);
            if let Instrumented::Rewritten { statements, .. } = &instrumented {
                for (i, outcome) in statements.iter().enumerate() {
                    log::info!(
                        "{} statement {}: {:?}",
                        sql_file_path.display(),
                        i + 1,
                        outcome
                    );
                }
            }
            OutInstrumented::Ok(instrumented)
        }
        Err(err) => OutInstrumented::ErrInstrumented {
            error: format!(
                "Failed to read sql file {} due to error: {}",
                sql_file_path.display(),
                err
            ),
        },
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

fn instrument(command: &InstrumentCommand) -> anyhow::Result<String> {
    let mut config = command.config.load()?;
    if let Some(dialect) = &command.dialect {
        config.dialect = Dialect::parse(dialect)?;
    }
    let instrumenter = Instrumenter::new(&config);

    if command.sql.is_dir() {
        let mut file_outputs: IndexMap<String, OutInstrumented> = IndexMap::new();
        let mut sql_in_dir: Vec<_> = std::fs::read_dir(&command.sql)?
            .filter_map(|res| res.ok())
            .map(|entry| entry.path())
            .filter(|file| file.extension().is_some_and(|ext| ext == "sql"))
            .collect();
        sql_in_dir.sort();

        for sql_file in sql_in_dir {
            let output = output_instrumented(&instrumenter, &sql_file);
            file_outputs.insert(
                std::path::absolute(sql_file)?.display().to_string(),
                output,
            );
        }
        to_json(&file_outputs, command.pretty)
    } else {
        match output_instrumented(&instrumenter, &command.sql) {
            OutInstrumented::Ok(instrumented) => Ok(instrumented.into_sql()),
            OutInstrumented::ErrInstrumented { error } => Err(anyhow!(error)),
        }
    }
}

#[derive(Serialize)]
struct GenerateSummary {
    manifest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    export_file: Option<String>,
    #[serde(flatten)]
    outcome: PipelineOutcomeSummary,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum PipelineOutcomeSummary {
    Disabled,
    Completed {
        edges: Vec<rowlineage::pipeline::EdgeSummary>,
        mappings: usize,
    },
}

fn generate(command: &GenerateCommand) -> anyhow::Result<String> {
    let config = command.config.load()?;
    let project_root = &command.project_root;
    let manifest_path = command
        .manifest_path
        .clone()
        .unwrap_or_else(|| project_root.join("target").join("manifest.json"));
    let rows_dir = command
        .rows_dir
        .clone()
        .unwrap_or_else(|| project_root.join("target").join("rowlineage").join("rows"));

    let output_dir = command.output_dir.clone();
    let config = LineageConfig {
        export_path: output_dir.or(config.export_path),
        ..config
    };
    let default_dir = project_root.join("output").join("lineage");

    let manifest = Manifest::load(&manifest_path)?;
    let rows = JsonlRowSource::new(rows_dir);
    let mut sink = sink_for(&config, &default_dir);
    let outcome = generate_lineage_for_project(&manifest, &rows, sink.as_mut(), &config)?;

    let summary = GenerateSummary {
        manifest: manifest_path.display().to_string(),
        export_file: match &outcome {
            PipelineOutcome::Disabled => None,
            PipelineOutcome::Completed { .. } => {
                Some(export_file(&config, &default_dir).display().to_string())
            }
        },
        outcome: match outcome {
            PipelineOutcome::Disabled => PipelineOutcomeSummary::Disabled,
            PipelineOutcome::Completed { edges, records } => PipelineOutcomeSummary::Completed {
                edges,
                mappings: records.len(),
            },
        },
    };
    to_json(&summary, command.pretty)
}

fn resolve(command: &ResolveCommand) -> anyhow::Result<String> {
    let value = serde_json::from_str::<Value>(&command.tokens)
        .unwrap_or_else(|_| Value::String(command.tokens.clone()));
    let resolver = TokenResolver::new(&command.model).with_aliases(&command.aliases);
    let ids = resolver.resolve_value(Some(&value))?;
    to_json(&ids, false)
}

fn main() -> anyhow::Result<()> {
    let now = Instant::now();

    env_logger::init();
    let cli = Cli::parse();

    let out_str = match &cli.command {
        Commands::Instrument(command) => instrument(command)?,
        Commands::Generate(command) => generate(command)?,
        Commands::Resolve(command) => resolve(command)?,
    };
    println!("{}", out_str);

    let elapsed = now.elapsed();
    log::info!("Elapsed: {:.2?}", elapsed);

    Ok(())
}
