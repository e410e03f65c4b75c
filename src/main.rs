use acclang::compiler::CompilerConfig;
use acclang::vm::{self, StandardDevice};
use clap::{Parser, Subcommand};
use log::info;
use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::PathBuf,
};
use thiserror::Error;

#[derive(Error, Debug)]
enum Error {
    #[error(transparent)]
    Acclang(#[from] acclang::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a JSON syntax tree into a machine listing.
    Compile {
        /// What file should be compiled. If not set, input will be read from stdin.
        #[arg(short, long)]
        input_file: Option<PathBuf>,
        /// The output file for the listing. If not set, output will go to stdout.
        #[arg(short, long)]
        output_file: Option<PathBuf>,
        /// Annotate instructions with the variables and calls they belong to.
        #[arg(long)]
        debug: bool,
    },
    /// Run a listing on the reference machine, reading input from stdin.
    Run {
        listing: PathBuf,
        /// Give up after this many executed instructions.
        #[arg(long)]
        step_limit: Option<u64>,
    },
}

fn read_input(path: Option<PathBuf>) -> Result<String, Error> {
    let mut buf = String::new();

    match path {
        Some(path) => {
            File::open(path)?.read_to_string(&mut buf)?;
        }
        None => {
            std::io::stdin().lock().read_to_string(&mut buf)?;
        }
    }

    Ok(buf)
}

fn run_logic() -> Result<(), Error> {
    let args = Args::parse();

    match args.command {
        Command::Compile {
            input_file,
            output_file,
            debug,
        } => {
            let input = read_input(input_file)?;

            // no output file is created when compilation fails
            let instructions = acclang::compile_tree(&input, Some(CompilerConfig { debug }))?;

            let mut writer: BufWriter<Box<dyn Write>> = match output_file {
                Some(output_file) => BufWriter::new(Box::new(File::create(output_file)?)),
                None => BufWriter::new(Box::new(std::io::stdout())),
            };

            instructions
                .write(&mut writer)
                .map_err(acclang::Error::from)?;
        }
        Command::Run { listing, step_limit } => {
            let listing = read_input(Some(listing))?;
            let config = vm::Config { step_limit };
            let outcome = acclang::run(&listing, StandardDevice::default(), Some(config))?;

            info!("Halted after {} steps", outcome.steps);
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run_logic() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
