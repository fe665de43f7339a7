//! BatchResize CLI - Parallel Batch JPEG Resizer
//!
//! Resizes every `*.JPG` below an input folder into a mirrored output folder
//! and records the run in `resizeLog.txt`.

use std::path::PathBuf;
use std::process;

use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::Parser;
use console::style;

use batchresize::batch::BatchRunRecord;
use batchresize::config::LOG_FILE_NAME;
use batchresize::{init, BatchConfig, BatchRunner, Interpolation, JobOutcome, TerminalConfirm};

const INTERPOLATION_HELP: &str = "Interpolation method for resizing.
0: Nearest - nearest neighbor interpolation
1: Linear - bilinear interpolation
2: Cubic - bicubic interpolation
3: Area - resampling using pixel area relation. It may be a preferred method for image decimation, \
as it gives moire-free results. But when the image is zoomed, it is similar to the Nearest method.
4: Lanczos4 - Lanczos interpolation
7: Max - no resampling, images keep their source size
Default: 3";

/// BatchResize - Parallel Batch JPEG Resizer
#[derive(Parser)]
#[command(
    name = "batchresize",
    version,
    about = "Resize a folder tree of JPEG photos in parallel",
    long_about = "Resizes every *.JPG below INPUT so its long side has the requested pixel count, \
                  writing the results into the same relative location below OUTPUT. Orientation \
                  metadata is reset to normal and a resizeLog.txt is written to OUTPUT."
)]
struct Cli {
    /// Input folder, i.e. originals folder.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output folder, where the resized images are stored.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Number of concurrent resize threads.
    #[arg(
        short,
        long,
        default_value_t = 8,
        value_name = "COUNT",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    threads: u16,

    /// Number of pixels along the long side. The short side will be resized
    /// accordingly with the same factor.
    #[arg(
        short,
        long,
        default_value_t = 4000,
        value_name = "PIXELS",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    longside: u32,

    /// JPEG image quality.
    #[arg(
        short,
        long,
        default_value_t = 90,
        value_name = "QUALITY",
        value_parser = clap::value_parser!(u8).range(0..=100)
    )]
    quality: u8,

    #[arg(
        short,
        long,
        default_value = "3",
        value_name = "CODE",
        help = INTERPOLATION_HELP,
        value_parser = PossibleValuesParser::new(["0", "1", "2", "3", "4", "7"]).try_map(parse_interpolation)
    )]
    interpolation: Interpolation,

    /// Overwrite existing output files instead of skipping them.
    #[arg(short, long)]
    restart: bool,
}

impl Cli {
    fn into_config(self) -> BatchConfig {
        BatchConfig::new(self.input, self.output)
            .threads(usize::from(self.threads))
            .longside(self.longside)
            .quality(self.quality)
            .interpolation(self.interpolation)
            .restart(self.restart)
    }
}

fn parse_interpolation(code: String) -> Result<Interpolation, String> {
    let code = code.parse::<u8>().map_err(|e| e.to_string())?;
    Interpolation::try_from(code)
}

fn main() {
    let cli = Cli::parse();

    init();

    let config = cli.into_config();
    let runner = BatchRunner::new(config).live_output(true);
    match runner.run(&mut TerminalConfirm) {
        Ok(record) => {
            println!("{}", record.time_line());
            print_summary(&record);
        }
        Err(e) => {
            eprintln!("{}: {}", style("Error").red().bold(), e);
            process::exit(e.exit_code());
        }
    }
}

/// Print processing summary
fn print_summary(record: &BatchRunRecord) {
    println!();
    println!("{}", style("Processing Summary:").bold());
    println!("  {}: {}", style("Files").bold(), record.results().len());

    for outcome in JobOutcome::ALL {
        let count = record.count(outcome);
        if count == 0 {
            continue;
        }

        let label = if outcome.is_failure() {
            style(outcome.label()).red()
        } else {
            style(outcome.label()).green()
        };
        println!("  {}: {}", label, count);
    }

    println!(
        "  {}: {}",
        style("Log").blue(),
        record.config().output.join(LOG_FILE_NAME).display()
    );
}
