//! quarry - compile JSON predicate documents into filter strings

mod commands;
mod config;
mod error;

use clap::{Parser as ClapParser, Subcommand};
use commands::{Input, OutputFormat};
use config::{parse_placeholder, Config};
use error::CliError;
use quarry_engine::Placeholder;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(ClapParser)]
#[command(name = "quarry")]
#[command(version, about = "Compile predicate documents into filter strings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a predicate document and print the filter with its arguments
    Compile {
        #[command(flatten)]
        input: InputArgs,

        /// Print the filter with arguments substituted
        #[arg(long)]
        inline: bool,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Validate a predicate document without printing the filter
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(clap::Args)]
struct InputArgs {
    /// Predicate document (reads stdin if not provided)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Schema file used to resolve property names [env: QUARRY_SCHEMA]
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Placeholder style: object or positional [env: QUARRY_PLACEHOLDER]
    #[arg(long, value_parser = parse_placeholder)]
    placeholder: Option<Placeholder>,
}

impl From<InputArgs> for Input {
    fn from(args: InputArgs) -> Self {
        Input {
            document: args.input,
            schema: args.schema,
            placeholder: args.placeholder,
        }
    }
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarry=info,quarry_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    let config = Config::from_env()?;

    match cli.command {
        Commands::Compile {
            input,
            inline,
            pretty,
        } => commands::compile(&input.into(), OutputFormat { inline, pretty }, &config),
        Commands::Check { input } => commands::check(&input.into(), &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_compile_flags() {
        let cli = Cli::try_parse_from([
            "quarry",
            "compile",
            "--input",
            "doc.json",
            "--placeholder",
            "positional",
            "--inline",
        ])
        .unwrap();
        match cli.command {
            Commands::Compile { input, inline, pretty } => {
                assert_eq!(input.input, Some(PathBuf::from("doc.json")));
                assert_eq!(input.placeholder, Some(Placeholder::Positional));
                assert!(inline);
                assert!(!pretty);
            }
            Commands::Check { .. } => panic!("expected compile"),
        }
    }

    #[test]
    fn rejects_unknown_placeholder() {
        let result = Cli::try_parse_from(["quarry", "check", "--placeholder", "dollar"]);
        assert!(result.is_err());
    }
}
