use clap::{Parser, Subcommand};
use std::path::PathBuf;
use suite_aggregator::runner::{MergeArgs, ReportArgs, ReportSummary, run_merge, run_report};

#[derive(Parser, Clone)]
struct Args {
    /// Quiet mode - minimal output, only show summary
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Subcommand)]
enum Command {
    /// Build per-worker documents from a run record, then merge them
    Report {
        /// JSON run record written by the test host
        #[arg(short, long)]
        input: PathBuf,

        /// Directory for per-worker documents and the merged report
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Filename of the merged report (default: wdio-merged-report.json)
        #[arg(short, long)]
        report_filename: Option<String>,
    },
    /// Merge per-worker documents already present in a directory
    Merge {
        /// Directory holding the per-worker documents
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Filename of the merged report (default: wdio-merged-report.json)
        #[arg(short, long)]
        report_filename: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing based on quiet mode
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if args.quiet {
        EnvFilter::new("suite_aggregator=warn")
    } else {
        EnvFilter::new("suite_aggregator=info")
    };
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let summary = match args.command {
        Command::Report {
            input,
            output_dir,
            report_filename,
        } => {
            if !args.quiet {
                println!("Test Report Aggregator");
                println!("======================");
                println!("Input: {}", input.display());
                println!("Output: {}", output_dir.display());
                println!();
            }
            run_report(ReportArgs {
                input,
                output_dir,
                report_filename,
            })
            .await?
        }
        Command::Merge {
            output_dir,
            report_filename,
        } => {
            run_merge(MergeArgs {
                output_dir,
                report_filename,
            })
            .await?
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &ReportSummary) {
    println!();
    println!("Report Summary");
    println!("==============");
    if summary.documents_written > 0 {
        println!("Worker documents written: {}", summary.documents_written);
    }
    println!("Documents merged: {}", summary.documents_merged);
    println!("Suites: {}", summary.suites);
    println!(
        "Tests: {} ({} passed, {} failed, {} pending)",
        summary.tests, summary.passes, summary.failures, summary.pending
    );
    println!("Duration: {:.2}s", summary.duration_ms as f64 / 1000.0);
    println!("Report: {}", summary.report_path.display());
}
