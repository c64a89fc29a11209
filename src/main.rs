use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plasmakit::{
    init_logging, Config, RestartEngine, RestartOutcome, RestartRequest, SourceProgram,
    BUILD_DATE, VERSION,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "plasmakit")]
#[command(version)]
#[command(about = "Run-from-line restart engine for plasma cutting programs", long_about = None)]
struct Cli {
    /// Config file (JSON or TOML); defaults to the platform config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the reconstructed modal state and safety verdict at a line
    Inspect {
        /// Program file
        program: PathBuf,

        /// 0-based line to inspect
        #[arg(short, long)]
        line: usize,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a program that restarts the cut at a line
    Restart {
        /// Program file
        program: PathBuf,

        /// 0-based line to restart from
        #[arg(short, long)]
        line: usize,

        /// Approach the resume point through a lead-in move
        #[arg(long)]
        lead_in: bool,

        /// Lead-in length in machine units
        #[arg(long, default_value = "4.0")]
        length: f64,

        /// Lead-in angle in degrees
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        angle: f64,

        /// Output file (defaults to the configured scratch file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the program to stdout instead of writing it
        #[arg(long)]
        print: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Config::load_or_default().context("loading default config"),
    }
}

fn main() -> Result<ExitCode> {
    init_logging()?;
    let cli = Cli::parse();
    tracing::debug!("plasmakit {} built {}", VERSION, BUILD_DATE);

    let engine = RestartEngine::new(load_config(cli.config.as_deref())?);

    match cli.command {
        Commands::Inspect {
            program,
            line,
            json,
        } => {
            let source = SourceProgram::load(&program)
                .with_context(|| format!("reading {}", program.display()))?;
            let inspection = engine.inspect(&source, line)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&inspection)?);
            } else {
                println!("{:#?}", inspection.state);
                println!("first move: {:?}", inspection.resume.motion);
                for warning in &inspection.warnings {
                    println!("warning: {}", warning);
                }
                match &inspection.verdict {
                    Ok(()) => println!("restart at line {} is safe", line),
                    Err(reason) => println!("restart at line {} refused: {}", line, reason),
                }
            }
            Ok(if inspection.verdict.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Commands::Restart {
            program,
            line,
            lead_in,
            length,
            angle,
            output,
            print,
        } => {
            let mut request = RestartRequest::at_line(line);
            if lead_in {
                request = request.with_lead_in(length, angle);
            }

            let outcome = if print {
                let source = SourceProgram::load(&program)
                    .with_context(|| format!("reading {}", program.display()))?;
                let outcome = engine.restart(&source, &request)?;
                if let Some(text) = outcome.program_text() {
                    print!("{}", text);
                }
                outcome
            } else {
                let staged = engine
                    .restart_file(&program, &request, output.as_deref())
                    .with_context(|| format!("restarting {}", program.display()))?;
                if let Some(path) = &staged.output_path {
                    eprintln!("restart program written to {}", path.display());
                }
                if let Some(previous) = &staged.previous_program {
                    eprintln!("original program: {}", previous.display());
                }
                staged.outcome
            };

            match outcome {
                RestartOutcome::Rejected { reason } => {
                    eprintln!("error: {}", reason);
                    Ok(ExitCode::from(2))
                }
                RestartOutcome::Synthesized { warnings, .. } => {
                    for warning in warnings {
                        eprintln!("warning: {}", warning);
                    }
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
    }
}
