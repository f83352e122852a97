//! Command implementations for the avy CLI.
//!
//! Both subcommands load tagged JSON records, map them through the schema
//! mappers, backfill and classify the problems, and reconcile them into
//! dangers. `reconcile` writes the result as CSV (and optionally JSON);
//! `summary` prints statistics.

use anyhow::Context;
use avy_data::reconcile::ReconcileOptions;
use avy_varsom::record::MapContext;
use clap::{Args, Subcommand};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};

pub mod export;
pub mod pipeline;
pub mod summary;

use pipeline::{load_codebook, load_records, load_resolver, run_pipeline, PipelineOptions, Reconciled};

/// Inputs shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// JSON files holding arrays of tagged raw records
    #[arg(short = 'i', long = "input", required = true)]
    pub inputs: Vec<String>,

    /// Directory of region polygon datasets (`<dataset>.csv`)
    #[arg(short = 'p', long)]
    pub polygons: Option<String>,

    /// Codebook CSV replacing the bundled one
    #[arg(long)]
    pub codebook: Option<String>,

    /// Only keep records from this season, e.g. 2016-17
    #[arg(short = 's', long)]
    pub season: Option<String>,

    /// Synthesize a "Not given" danger for problems without one
    #[arg(long)]
    pub allow_orphans: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile records and write danger and problem tables
    Reconcile {
        #[command(flatten)]
        input: InputArgs,

        /// Output path for the dangers CSV
        #[arg(short = 'd', long)]
        dangers_csv: String,

        /// Output path for the problems CSV
        #[arg(short = 'o', long)]
        problems_csv: Option<String>,

        /// Output path for the reconciled dangers as JSON
        #[arg(long)]
        json: Option<String>,
    },

    /// Reconcile records and print main-problem and danger level statistics
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn reconcile_input(input: &InputArgs) -> anyhow::Result<Reconciled> {
    let codebook = load_codebook(input.codebook.as_deref())?;
    let resolver = load_resolver(input.polygons.as_deref())?;
    let records = load_records(&input.inputs)?;
    let ctx = MapContext {
        codebook: &codebook,
        resolver: &resolver,
    };
    let options = PipelineOptions {
        season: input.season.clone(),
        reconcile: ReconcileOptions {
            allow_orphan_problems: input.allow_orphans,
        },
    };
    run_pipeline(&records, &ctx, &options)
}

fn create(path: &str) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
    Ok(BufWriter::new(file))
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Reconcile {
            input,
            dangers_csv,
            problems_csv,
            json,
        } => {
            let result = reconcile_input(&input)?;
            let dangers: Vec<_> = result
                .forecasts
                .iter()
                .chain(result.observations.iter())
                .cloned()
                .collect();

            export::write_csv(create(&dangers_csv)?, &export::danger_rows(&dangers))
                .with_context(|| format!("Failed to write {}", dangers_csv))?;
            info!("Wrote {} dangers to {}", dangers.len(), dangers_csv);

            if let Some(path) = problems_csv {
                let rows = export::problem_rows(&dangers);
                export::write_csv(create(&path)?, &rows)
                    .with_context(|| format!("Failed to write {}", path))?;
                info!("Wrote {} problems to {}", rows.len(), path);
            }
            if let Some(path) = json {
                let mut writer = create(&path)?;
                serde_json::to_writer_pretty(&mut writer, &dangers)
                    .with_context(|| format!("Failed to write {}", path))?;
                writer.flush()?;
                info!("Wrote reconciled dangers to {}", path);
            }
            Ok(())
        }
        Command::Summary { input } => {
            let result = reconcile_input(&input)?;
            print!("{}", summary::render_summary(&result));
            Ok(())
        }
    }
}
