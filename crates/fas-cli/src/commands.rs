use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use tracing::{info, info_span};

use fas_core::{PipelineRunner, RunSummary, RunnerConfig, STAGE_CATALOGUE, StagePlan};
use fas_ingest::NdjsonReader;
use fas_model::{FhirVersion, Resource};
use fas_transform::migrate;
use fas_validate::{StructuralValidator, Validator};

use crate::cli::{PrepArgs, TransformArgs};
use crate::summary::apply_table_style;

pub fn run_prep(args: &PrepArgs) -> Result<RunSummary> {
    let plan = StagePlan::parse(&args.transformers, args.seed.as_deref())?;
    let config = RunnerConfig {
        input_dir: args.input_dir.clone(),
        output_dir: args.output_dir.clone(),
        plan,
        seed: args.seed.clone(),
        fail_fast: !args.no_fail_on_validation_errors,
    };
    let start = Instant::now();
    let summary = PipelineRunner::new(config)
        .run()
        .with_context(|| format!("prepare {}", args.input_dir.display()))?;
    info!(
        study = %summary.research_study_id,
        duration_ms = start.elapsed().as_millis(),
        "pipeline complete"
    );
    Ok(summary)
}

pub fn run_transform(args: &TransformArgs) -> Result<()> {
    let span = info_span!("transform", file = %args.input_file.display());
    let _guard = span.enter();
    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let validator = StructuralValidator;
    let mut migrated_count = 0usize;
    let mut dropped_count = 0usize;
    let mut failures = Vec::new();
    for line in NdjsonReader::open(&args.input_file)? {
        let outcome = line.map_err(anyhow::Error::from).and_then(|resource| {
            let migrated = migrate(resource)?;
            if let Some(resource) = &migrated
                && args.validate
            {
                validator.validate(resource, FhirVersion::R4B)?;
            }
            Ok(migrated)
        });
        match outcome {
            Ok(Some(resource)) => {
                write_line(&mut writer, &resource)?;
                migrated_count += 1;
            }
            Ok(None) => dropped_count += 1,
            Err(error) if args.stop_on_first_error => return Err(error),
            Err(error) => failures.push(error.to_string()),
        }
    }
    writer.flush().context("flush output")?;
    info!(
        migrated = migrated_count,
        dropped = dropped_count,
        failed = failures.len(),
        "transform complete"
    );
    if !failures.is_empty() {
        eprintln!("Failures:");
        for failure in &failures {
            eprintln!("- {failure}");
        }
        bail!("{} lines failed to migrate", failures.len());
    }
    Ok(())
}

pub fn run_stages() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Stage", "Description"]);
    apply_table_style(&mut table);
    for (name, description) in STAGE_CATALOGUE {
        table.add_row(vec![(*name).to_string(), (*description).to_string()]);
    }
    println!("{table}");
    Ok(())
}

fn write_line(writer: &mut Box<dyn Write>, resource: &Resource) -> Result<()> {
    let line = resource.to_json_line()?;
    writeln!(writer, "{line}").context("write output")?;
    Ok(())
}
