use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

use fastq_qc::progress::StreamProgressSink;

#[derive(Parser)]
#[command(about = "Streaming FASTQ quality-control analyzer")]
struct Cli {
    /// FASTQ input file, plain or gzip-compressed (detected by a `.gz` suffix).
    #[clap(index = 1)]
    input: PathBuf,
}

pub fn initialise_logging(log_level: LevelFilter) {
    CombinedLogger::init(vec![TermLogger::new(
        if cfg!(debug_assertions) {
            LevelFilter::Trace
        } else {
            log_level
        },
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )])
    .unwrap();

    info!("Logging initialised successfully");
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    initialise_logging(LevelFilter::Info);

    let mut progress = StreamProgressSink::new(std::io::stdout());
    match fastq_qc::analyze(&cli.input, &mut progress) {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("failed to serialize report: {err}");
                print_error(&err.to_string());
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            error!("analysis failed: {err}");
            print_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Prints `{"error": "<message>"}` to stdout, going through `serde_json` so
/// a message containing quotes or backslashes still yields valid JSON.
fn print_error(message: &str) {
    let body = serde_json::json!({ "error": message });
    println!("{body}");
}
