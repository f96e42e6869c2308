use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};
use tine_lang::builtins;
use tine_lang::cli::{self, CheckOptions, CheckResult, CliError};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "tine")]
#[command(about = "tine - a jq-style filter language for querying and updating JSON")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a filter against JSON input
    Run {
        /// The filter to run
        filter: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Print each output on one line
        #[arg(short, long)]
        compact: bool,

        /// Print strings without JSON quoting
        #[arg(short, long)]
        raw_output: bool,
    },

    /// Validate a filter's syntax without running it
    Check {
        /// The filter to validate
        filter: String,
    },

    /// List builtin functions as name/arity
    Builtins,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            filter,
            input,
            compact,
            raw_output,
        } => read_input(input).and_then(|input| {
            run_check(CheckOptions {
                query: filter,
                input,
                compact,
                raw_output,
                syntax_only: false,
            })
        }),
        Commands::Check { filter } => run_check(CheckOptions {
            query: filter,
            syntax_only: true,
            ..CheckOptions::default()
        }),
        Commands::Builtins => {
            for name in builtins::names() {
                println!("{}", name);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(5);
    }
}

fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_check(options: CheckOptions) -> Result<(), CliError> {
    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
