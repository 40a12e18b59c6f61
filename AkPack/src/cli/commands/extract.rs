//! CLI command for package extraction

use std::path::Path;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;

use crate::batch::{batch_extract, find_pck_files};
use crate::cli::progress::{
    GEAR, LOOKING_GLASS, PACKAGE, TRUCK, bar_style_with_percent, print_done, print_step,
    print_warning, simple_bar,
};
use crate::convert::{ConversionReport, ConversionTools};
use crate::extract::{
    ExtractOutcome, ExtractPhase, ExtractProgress, ExtractionOptions, ExtractionSummary,
    extract_container_with_progress, prepare_output_dir,
};

pub fn execute(
    source: &Path,
    destination: &Path,
    tools_dir: Option<&Path>,
    no_convert: bool,
    tool_timeout: u64,
    progress: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();

    let tools = if no_convert {
        None
    } else {
        discover_tools(tools_dir)?
    };

    let options = ExtractionOptions::new(destination)
        .with_convert(!no_convert)
        .with_tools(tools)
        .with_tool_timeout(Duration::from_secs(tool_timeout));

    prepare_output_dir(destination)?;

    if source.is_dir() {
        extract_directory(source, &options, progress)?;
    } else {
        extract_single(source, &options, progress)?;
    }

    print_done(started.elapsed());
    Ok(())
}

fn discover_tools(tools_dir: Option<&Path>) -> anyhow::Result<Option<ConversionTools>> {
    let dir = match tools_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let tools = ConversionTools::discover(&dir);
    if tools.is_none() {
        print_warning(&format!(
            "Conversion tools not found in {}, .wem files will not be converted",
            dir.display()
        ));
    }
    Ok(tools)
}

fn extract_single(source: &Path, options: &ExtractionOptions, progress: bool) -> anyhow::Result<()> {
    print_step(1, 2, LOOKING_GLASS, "Reading package index...");

    let pb = if progress {
        simple_bar(0, "Extracting")
    } else {
        ProgressBar::hidden()
    };

    let outcome = extract_container_with_progress(source, options, &|p| update_bar(&pb, p));
    pb.finish_and_clear();

    match outcome? {
        ExtractOutcome::NotAContainer => {
            print_warning(&format!("Not an AKPK package: {}", source.display()));
        }
        ExtractOutcome::Extracted(summary) => {
            print_step(2, 2, PACKAGE, &extracted_line(&summary));
            match &summary.conversion {
                Some(report) => print_conversion(report),
                None if options.tools.is_some() && summary.endianness.uses_alternate_codec() => {
                    println!("  Conversion skipped: package uses an unsupported codec");
                }
                None => {}
            }
        }
    }

    Ok(())
}

fn extract_directory(source: &Path, options: &ExtractionOptions, progress: bool) -> anyhow::Result<()> {
    let pcks = find_pck_files(source);

    if pcks.is_empty() {
        println!("No .pck files found in: {}", source.display());
        return Ok(());
    }

    print_step(1, 1, TRUCK, &format!("Found {} .pck files to extract", pcks.files.len()));

    let pb = if progress {
        let pb = ProgressBar::new(pcks.files.len() as u64);
        pb.set_style(bar_style_with_percent());
        pb
    } else {
        ProgressBar::hidden()
    };

    let result = batch_extract(&pcks, source, options, &|p| {
        // Batch-level updates carry a 1-based position; per-package ones start at 0
        if p.phase == ExtractPhase::ReadingIndex && p.current > 0 {
            pb.set_position((p.current - 1) as u64);
            if let Some(ref name) = p.current_file {
                pb.set_message(name.clone());
            }
        }
    });

    pb.finish_and_clear();

    println!();
    println!("Extraction complete:");
    println!("  Success: {}", result.success_count);
    println!("  Skipped: {}", result.skipped_count);
    println!("  Failed: {}", result.fail_count);

    let problems: Vec<&String> = result
        .results
        .iter()
        .filter(|m| m.starts_with("Failed") || m.contains("conversions failed"))
        .collect();
    if !problems.is_empty() {
        println!();
        println!("Problems:");
        for msg in problems {
            println!("  {msg}");
        }
    }

    Ok(())
}

fn update_bar(pb: &ProgressBar, progress: &ExtractProgress) {
    match progress.phase {
        ExtractPhase::WritingFiles => {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.current as u64);
        }
        ExtractPhase::Normalizing => {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.current as u64);
        }
        ExtractPhase::ReadingIndex | ExtractPhase::Decoding | ExtractPhase::Complete => {}
    }
    if let Some(ref name) = progress.current_file {
        pb.set_message(format!("{} {name}", progress.phase.as_str()));
    }
}

fn extracted_line(summary: &ExtractionSummary) -> String {
    format!(
        "Extracted {} banks and {} sound files ({})",
        summary.banks_extracted,
        summary.files_extracted,
        summary.endianness.as_str()
    )
}

fn print_conversion(report: &ConversionReport) {
    println!(
        "  {GEAR}Converted {} of {} files to .ogg",
        report.converted.len(),
        report.total_files()
    );
    for failure in &report.failures {
        print_warning(&format!("  {}: {}", failure.path.display(), failure.message));
    }
}
