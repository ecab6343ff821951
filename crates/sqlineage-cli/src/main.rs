//! sqlineage CLI - table-level lineage for SQL view definitions

mod args;
mod config;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use sqlineage_core::{
    ExportFormat, LineageDocument, LineageGraph, LoaderOptions, Pipeline, PipelineOptions,
    SqlDialect,
};

use crate::args::{Args, Command, Direction};
use crate::config::{Config, ExtractOverrides};
use crate::output::{print_entities, OutputFormatter};

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.quiet {
        tracing::Level::ERROR
    } else {
        match args.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(args) {
        Ok(has_warnings) => {
            if has_warnings {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the run should fail on warnings
fn run(args: Args) -> Result<bool> {
    let quiet = args.quiet;
    let mut formatter = OutputFormatter::new(args.diagnostics);

    match args.command {
        Command::Extract {
            input,
            output,
            format,
            dialect,
            top_level_only,
            extensions,
            deny_warnings,
            config: config_path,
        } => {
            let config = match config_path {
                Some(path) => Config::from_file(&path)?,
                None => Config::find_and_load()?.unwrap_or_default(),
            };

            let format_arg = format.map(|f| ExportFormat::from(f).to_string());
            let config = config.merge_with_args(&ExtractOverrides {
                input: input.as_deref(),
                output: output.as_deref(),
                format: format_arg.as_deref(),
                dialect: dialect.as_deref(),
                top_level_only,
                extensions: &extensions,
            });

            let Some(input) = config.input.as_deref().map(PathBuf::from) else {
                miette::bail!("No input directory specified. Pass INPUT_DIR or set `input` in sqlineage.toml");
            };
            let Some(output) = config.output.as_deref().map(PathBuf::from) else {
                miette::bail!("No output file specified. Pass OUTPUT_FILE or set `output` in sqlineage.toml");
            };

            let dialect: SqlDialect = match &config.dialect {
                Some(d) => d.parse().map_err(|e: String| miette::miette!(e))?,
                None => SqlDialect::default(),
            };
            let export_format: ExportFormat = match &config.format {
                Some(f) => f.parse().map_err(|e: String| miette::miette!(e))?,
                None => ExportFormat::from_path(&output),
            };

            let mut loader = LoaderOptions::default();
            if let Some(recursive) = config.recursive {
                loader.recursive = recursive;
            }
            if !config.extensions.is_empty() {
                loader.extensions = config.extensions.clone();
            }

            let pipeline = Pipeline::new(PipelineOptions { dialect, loader });
            let run = pipeline.run(&input)?;
            run.document().write(&output, export_format)?;

            formatter.print_diagnostics(&run.diagnostics);
            if !quiet {
                eprintln!(
                    "Wrote {} entities and {} edges from {} file(s) to {}{}",
                    run.graph.len(),
                    run.graph.edge_count(),
                    run.files.len(),
                    output.display(),
                    if run.has_warnings() {
                        format!(" ({} warning(s))", run.diagnostics.len())
                    } else {
                        String::new()
                    }
                );
            }

            Ok(deny_warnings && run.has_warnings())
        }

        Command::Impact {
            lineage,
            entity,
            direction,
        } => {
            let graph = load_graph(&lineage)?;
            if !graph.contains(&entity) {
                miette::bail!("Entity '{}' not found in {}", entity, lineage.display());
            }

            if matches!(direction, Direction::Upstream | Direction::Both) {
                print_entities("Upstream", &graph.transitive_upstream(&entity));
            }
            if matches!(direction, Direction::Downstream | Direction::Both) {
                print_entities("Downstream", &graph.transitive_downstream(&entity));
            }

            Ok(false)
        }

        Command::Describe { lineage, entity } => {
            let graph = load_graph(&lineage)?;
            match graph.describe(&entity) {
                Some(summary) => println!("{}", summary),
                None => miette::bail!("Entity '{}' not found in {}", entity, lineage.display()),
            }

            Ok(false)
        }
    }
}

fn load_graph(path: &std::path::Path) -> Result<LineageGraph> {
    let document = LineageDocument::read(path)?;
    Ok(LineageGraph::from_document(&document))
}
