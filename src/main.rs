extern crate esm_exchange;

use clap::{Parser, ValueEnum};
use esm_exchange::output::{FileOutput, StdoutOutput};
use esm_exchange::{run_conversion, ConversionFlags, Direction};
use std::ffi::OsStr;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DirectionArg {
    /// Convert a payload from the hosting interface into simulation input
    ToInternal,
    /// Convert simulation results into a payload for the hosting interface
    ToExchange,
}

impl From<DirectionArg> for Direction {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::ToInternal => Direction::ToInternal,
            DirectionArg::ToExchange => Direction::ToExchange,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct ExchangeArgs {
    #[arg(value_enum)]
    direction: DirectionArg,
    input_file: String,
    #[arg(
        long,
        short,
        help = "Directory to write results into; results go to standard output when omitted"
    )]
    output_dir: Option<PathBuf>,
    #[arg(
        long,
        short,
        default_value_t = false,
        help = "Log debug messages and the schema drift report"
    )]
    verbose: bool,
    #[arg(
        long,
        short,
        default_value_t = false,
        help = "Write the schema drift report next to the converted payload"
    )]
    report: bool,
}

fn main() -> anyhow::Result<()> {
    let args = ExchangeArgs::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let mut flags = ConversionFlags::empty();
    if args.verbose {
        flags.insert(ConversionFlags::VERBOSE);
    }
    if args.report {
        flags.insert(ConversionFlags::WRITE_REPORT);
    }

    let input_file = Path::new(args.input_file.as_str());
    let input = File::open(input_file)?;

    match args.output_dir {
        Some(output_dir) => {
            fs::create_dir_all(&output_dir)?;
            let input_file_stem = input_file
                .file_stem()
                .and_then(OsStr::to_str)
                .unwrap_or("payload");
            let file_output = FileOutput::new(
                output_dir.clone(),
                format!("{input_file_stem}__{{}}.json"),
            );
            run_conversion(input, &file_output, args.direction.into(), &flags)?;
            info!("Results written to {}", output_dir.display());
        }
        None => {
            if args.report {
                info!("The report is written to standard output after the converted payload");
            }
            run_conversion(input, StdoutOutput, args.direction.into(), &flags)?;
        }
    }

    Ok(())
}
