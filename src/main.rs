use clap::Parser;
use echotrace::{ImportOutcome, Importer};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "echotrace")]
#[command(author, version, about = "Extract and reconcile metadata from bat detector recordings")]
struct Args {
    /// File or directory to import
    path: PathBuf,

    /// Recurse into subdirectories when importing a directory
    #[arg(short, long)]
    recursive: bool,

    /// Write a JSON report of all reconciled records
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Show every reconciled field, not just the summary line
    #[arg(short, long)]
    verbose: bool,

    /// Only show the summary
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let files = collect_wav_files(&args.path, args.recursive);
    if files.is_empty() {
        eprintln!("No .wav files found under {}", args.path.display());
        std::process::exit(1);
    }

    if !args.quiet {
        eprintln!("\x1b[1mEchotrace - Recording Metadata Import\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} recording(s)\n", files.len());
    }

    let pb = if !args.quiet && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Each file is independent; decode them in parallel
    let importer = Importer::new();
    let outcomes: Vec<ImportOutcome> = files
        .par_iter()
        .map(|path| {
            let outcome = importer.process(path);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(outcome.file_name.clone());
            }
            outcome
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if !args.quiet {
        for o in &outcomes {
            print_outcome(o, args.verbose);
        }
    }

    let complete = outcomes.iter().filter(|o| o.record.complete).count();
    let partial = outcomes.len() - complete;
    let corrupt = outcomes
        .iter()
        .filter(|o| o.metadata_error.is_some())
        .count();

    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Complete:\x1b[0m {}", complete);
        eprintln!("  \x1b[33m? Partial:\x1b[0m  {}", partial);
        if corrupt > 0 {
            eprintln!("  \x1b[31mCorrupt metadata:\x1b[0m {}", corrupt);
        }
    }

    if let Some(ref output) = args.output {
        match serde_json::to_string_pretty(&outcomes) {
            Ok(json) => {
                if let Err(e) = std::fs::write(output, json) {
                    eprintln!("Failed to write report: {}", e);
                    std::process::exit(1);
                }
                if !args.quiet {
                    eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output.display());
                }
            }
            Err(e) => {
                eprintln!("Failed to serialize report: {}", e);
                std::process::exit(1);
            }
        }
    }

    if partial > 0 {
        std::process::exit(1);
    }
}

fn collect_wav_files(path: &PathBuf, recursive: bool) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.clone()];
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    WalkDir::new(path)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}

fn print_outcome(o: &ImportOutcome, verbose: bool) {
    let (color, tag) = if o.record.complete {
        ("\x1b[32m", "[COMPLETE]")
    } else {
        ("\x1b[33m", "[PARTIAL]")
    };
    let reset = "\x1b[0m";

    let identification = match (&o.record.genus, &o.record.species) {
        (Some(g), Some(s)) => format!("{}{}", g, s),
        _ => "-".to_string(),
    };
    let recorded = o.record.recorded_at_iso.as_deref().unwrap_or("-");

    println!(
        "{}{:<11}{} {:<8} {:<25} {}",
        color, tag, reset, identification, recorded, o.file_name
    );

    if verbose {
        if let (Some(lat), Some(lon)) = (o.record.latitude, o.record.longitude) {
            eprintln!("    Position: {:.5}, {:.5}", lat, lon);
        }
        if let Some(ref serial) = o.record.recorder_serial {
            eprintln!("    Recorder: {}", serial);
        }
        if let Some(duration) = o.record.duration_secs {
            eprintln!("    Duration: {:.2}s", duration);
        }
        if let Some(ref err) = o.metadata_error {
            eprintln!("    \x1b[31mMetadata error: {}\x1b[0m", err);
        }
    }
}
