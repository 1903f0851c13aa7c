use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use serde::Serialize;
use serde_json::to_string_pretty;

use crate::cli::{Cli, Command};
use crate::evaluate::{EvalOptions, load_bundle, print_aggregate, print_case, run_eval};
use crate::extractors::{RawDetection, convert_detections, extract_pattern_spans};
use crate::masking::mask;

mod cli;
mod evaluate;
mod extractors;
mod masking;
mod models;
mod scoring;

fn main() -> std::io::Result<()> {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Mask {
            input,
            output_file,
            spans,
        } => run_mask(&input, &output_file, spans.as_deref()),
        Command::Eval {
            tests_path,
            output_file,
            limit,
            show_masked,
        } => run_eval_command(&tests_path, output_file.as_deref(), limit, show_masked),
    }
}

fn run_mask(input: &str, output_file: &str, spans_file: Option<&str>) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(input)?;

    let mut candidates = extract_pattern_spans(&text);
    if let Some(path) = spans_file {
        let raw = fs::read_to_string(path)?;
        let detections: Vec<RawDetection> = serde_json::from_str(&raw)?;
        let (model_spans, rejects) = convert_detections(&text, detections);
        for reject in rejects {
            warn!("Dropping external detection: {}", reject);
        }
        candidates.extend(model_spans);
    }

    let output = mask(&text, candidates)?;
    println!(
        "Masked {} span(s) across {} distinct value(s)",
        output.spans.len(),
        output.mapping.len()
    );

    write_output(output_file, &output)?;
    println!("JSON output written to {}", output_file);
    Ok(())
}

fn run_eval_command(
    tests_path: &str,
    output_file: Option<&str>,
    limit: Option<usize>,
    show_masked: bool,
) -> Result<(), Box<dyn Error>> {
    let bundle = load_bundle(Path::new(tests_path))?;
    let total = limit
        .map(|l| l.min(bundle.tests.len()))
        .unwrap_or(bundle.tests.len());
    println!("Loaded {} fixture(s) from {}", total, tests_path);

    let progress_bar = create_progress_bar(total);
    let report = run_eval(
        &bundle,
        EvalOptions { limit, show_masked },
        Arc::clone(&progress_bar),
    );
    progress_bar.finish_and_clear();

    for case in &report.cases {
        print_case(case);
    }
    if let Some(aggregate) = &report.aggregate {
        print_aggregate(aggregate);
    }
    if report.header.cases_failed > 0 {
        println!("{} fixture(s) failed; see report for details", report.header.cases_failed);
    }

    if let Some(path) = output_file {
        write_output(path, &report)?;
        println!("JSON report written to {}", path);
    }
    Ok(())
}

fn create_progress_bar(total: usize) -> Arc<ProgressBar> {
    let progress_bar = ProgressBar::new(total as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} fixtures evaluated ({eta})")
            .expect("Failed to create progress bar style")
            .progress_chars("#>-"),
    );
    Arc::new(progress_bar)
}

fn write_output<T: Serialize>(output_file: &str, output: &T) -> std::io::Result<()> {
    let json_output = match to_string_pretty(output) {
        Ok(json) => json,
        Err(err) => return Err(std::io::Error::other(err)),
    };
    let mut file = File::create(output_file)?;
    file.write_all(json_output.as_bytes())?;
    Ok(())
}
