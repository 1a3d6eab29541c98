//! cvdeck CLI - résumé deck re-templating tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use cvdeck::render::to_json;
use cvdeck::{
    extract_with_options, parse_file, BatchJob, Engine, ExtractOptions, JobOptions, JobReport,
    JsonFormat, MappingOverrides, RenderOptions, TemplateSpec,
};

#[derive(Parser)]
#[command(name = "cvdeck")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Re-render résumé decks into a corporate template", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by `extract` and `batch`.
#[derive(clap::Args)]
struct JobArgs {
    /// Template deck
    #[arg(short, long, value_name = "FILE")]
    template: PathBuf,

    /// JSON file mapping template roles to profile fields
    #[arg(long, value_name = "FILE")]
    mapping_overrides: Option<PathBuf>,

    /// Minimum classifier confidence (0-1)
    #[arg(long, value_name = "F", default_value = "0.5")]
    min_confidence: f32,

    /// Per-job deadline in seconds (0 disables it)
    #[arg(long, value_name = "SECS", default_value = "60")]
    timeout: u64,

    /// Keep the template's modification timestamp
    #[arg(long)]
    no_timestamp: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a résumé deck and render it into the template
    Extract {
        /// Source résumé deck
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output deck
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Write the job report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Render many résumé decks into the template
    Batch {
        /// Source résumé decks
        #[arg(value_name = "FILES", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Number of worker threads (0 = one per CPU)
        #[arg(short = 'j', long, default_value = "0")]
        workers: usize,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Show slides and placeholders of a deck
    Inspect {
        /// Deck to inspect
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the extracted profile as JSON
    Profile {
        /// Source résumé deck
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include the extraction report
        #[arg(long)]
        report: bool,

        /// Minimum classifier confidence (0-1)
        #[arg(long, value_name = "F", default_value = "0.5")]
        min_confidence: f32,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            report,
            job,
        } => cmd_extract(&input, &output, report.as_deref(), &job),
        Commands::Batch {
            inputs,
            output,
            workers,
            job,
        } => cmd_batch(inputs, &output, workers, &job),
        Commands::Inspect { input } => cmd_inspect(&input),
        Commands::Profile {
            input,
            output,
            report,
            min_confidence,
            compact,
        } => cmd_profile(&input, output.as_deref(), report, min_confidence, compact),
        Commands::Version => {
            cmd_version();
            Ok(0)
        }
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(e.exit_code());
        }
    }
}

fn build_engine(args: &JobArgs) -> cvdeck::Result<Engine> {
    let template = TemplateSpec::open(&args.template)?;
    log::info!(
        "template {} has {} placeholders",
        args.template.display(),
        template.placeholders().len()
    );

    let mut options = JobOptions::new().with_threshold(args.min_confidence);
    options = if args.timeout == 0 {
        options.without_timeout()
    } else {
        options.with_timeout(Duration::from_secs(args.timeout))
    };
    if !args.no_timestamp {
        options = options.with_render(RenderOptions::new().stamped_now());
    }

    let mut engine = Engine::new(template).with_options(options);
    if let Some(ref path) = args.mapping_overrides {
        engine = engine.with_overrides(MappingOverrides::from_file(path)?);
    }
    Ok(engine)
}

fn print_warnings(report: &JobReport) {
    for warning in report.warnings() {
        eprintln!("{}: {}", "warning".yellow().bold(), warning);
    }
}

fn cmd_extract(
    input: &Path,
    output: &Path,
    report_path: Option<&Path>,
    args: &JobArgs,
) -> cvdeck::Result<i32> {
    let engine = build_engine(args)?;
    let result = engine.process_file(input, output)?;
    print_warnings(&result.report);

    if let Some(path) = report_path {
        fs::write(path, to_json(&result.report, JsonFormat::Pretty)?)?;
    }

    let pages = result.report.continuation_pages;
    if pages > 0 {
        println!(
            "{} {} ({} continuation slide{})",
            "Saved to".green(),
            output.display(),
            pages,
            if pages == 1 { "" } else { "s" }
        );
    } else {
        println!("{} {}", "Saved to".green(), output.display());
    }
    Ok(0)
}

fn cmd_batch(
    inputs: Vec<PathBuf>,
    output_dir: &Path,
    workers: usize,
    args: &JobArgs,
) -> cvdeck::Result<i32> {
    let engine = build_engine(args)?;
    let engine = {
        let options = engine.options().clone().with_workers(workers);
        engine.with_options(options)
    };
    fs::create_dir_all(output_dir)?;

    let jobs: Vec<BatchJob> = inputs
        .into_iter()
        .map(|input| {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            let output = output_dir.join(format!("{}.pptx", stem));
            BatchJob::new(input, output)
        })
        .collect();

    let pb = ProgressBar::new(jobs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let results = engine.run_batch_with_progress(jobs, &|done| {
        pb.set_message(done.input.display().to_string());
        pb.inc(1);
    });
    pb.finish_and_clear();

    let mut exit_code = 0;
    let mut failed = 0;
    for result in &results {
        match &result.result {
            Ok(report) => {
                println!("{} {}", "✓".green(), result.output.display());
                print_warnings(report);
            }
            Err(e) => {
                failed += 1;
                exit_code = exit_code.max(e.exit_code());
                eprintln!("{} {}: {}", "✗".red(), result.input.display(), e);
            }
        }
    }

    println!(
        "\n{} {} of {} decks rendered",
        "Done!".green().bold(),
        results.len() - failed,
        results.len()
    );
    Ok(exit_code)
}

fn cmd_inspect(input: &Path) -> cvdeck::Result<i32> {
    let doc = parse_file(input)?;

    println!("{}", "Deck Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Format".bold(), doc.kind);
    println!("{}: {}", "Slides".bold(), doc.slide_count());
    println!("{}: {}", "Parts".bold(), doc.part_count());
    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref modified) = doc.metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Slides".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for slide in &doc.slides {
        let hidden = if slide.hidden { " (hidden)" } else { "" };
        println!(
            "{} {}: {} shapes{}",
            "Slide".bold(),
            slide.index + 1,
            slide.shapes.len(),
            hidden.dimmed()
        );
    }

    let template = match TemplateSpec::from_document(doc) {
        Ok(template) => template,
        Err(e) => {
            eprintln!("{}: {}", "warning".yellow().bold(), e);
            return Ok(e.exit_code());
        }
    };
    if template.placeholders().is_empty() {
        return Ok(0);
    }

    println!();
    println!("{}", "Placeholders".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for placeholder in template.placeholders() {
        let role = if placeholder.continuation {
            format!("{} (continuation)", placeholder.role.as_str())
        } else {
            placeholder.role.as_str().to_string()
        };
        let capacity = &placeholder.capacity;
        println!(
            "{} {} [{}] {}: {} lines × {} chars at {}pt",
            "├─".dimmed(),
            placeholder.slot,
            placeholder.name,
            role.bold(),
            capacity.lines,
            capacity.chars,
            capacity.font_size
        );
    }

    Ok(0)
}

fn cmd_profile(
    input: &Path,
    output: Option<&Path>,
    with_report: bool,
    min_confidence: f32,
    compact: bool,
) -> cvdeck::Result<i32> {
    let doc = parse_file(input)?;
    let options = ExtractOptions::new().with_threshold(min_confidence);
    let (profile, report) = extract_with_options(&doc, &options);

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = if with_report {
        let value = serde_json::json!({ "profile": profile, "report": report });
        to_json(&value, format)?
    } else {
        to_json(&profile, format)?
    };

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    let ambiguous = report.ambiguous_count();
    if ambiguous > 0 {
        eprintln!(
            "{}: {} span{} below the confidence threshold",
            "warning".yellow().bold(),
            ambiguous,
            if ambiguous == 1 { "" } else { "s" }
        );
    }

    Ok(0)
}

fn cmd_version() {
    println!("{} {}", "cvdeck".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Résumé deck re-templating tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/cvdeck".dimmed());
    println!("License: MIT");
}
