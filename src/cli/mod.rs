use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use skillport::{AgentId, ComponentType};

mod adapt;
mod convert;
mod detect;
mod diff;
mod mappings;
mod matrix;
mod parse;
mod validate;

#[derive(Parser)]
#[command(
    name = "skillport",
    version,
    about = "Convert AI agent skills, commands, and rules between dialects"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Show project information
    #[arg(long)]
    about: bool,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Format {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Pretty-printed JSON on stdout
    Json,
}

#[derive(Subcommand)]
#[command(next_display_order = None)]
enum Commands {
    /// Convert a component into another agent's dialect
    Convert {
        /// Source file
        file: PathBuf,
        /// Target agent
        #[arg(long)]
        to: AgentId,
        /// Source agent [default: detected]
        #[arg(long)]
        from: Option<AgentId>,
        /// Annotate the output with provenance comments
        #[arg(long)]
        comments: bool,
        /// Adapt the output to this version of the target dialect
        #[arg(long)]
        target_version: Option<String>,
        /// Validate the rendered output
        #[arg(long)]
        validate: bool,
        /// Write into this project root instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, env = "SKILLPORT_FORMAT", default_value_t = Format::Text)]
        format: Format,
    },
    /// Detect the source agent and dialect version of a file
    Detect {
        /// File to inspect
        file: PathBuf,
        /// Agent whose versions to consider [default: detected]
        #[arg(long)]
        agent: Option<AgentId>,
        /// Output format
        #[arg(long, value_enum, env = "SKILLPORT_FORMAT", default_value_t = Format::Text)]
        format: Format,
    },
    /// Validate a file against its agent's dialect rules
    Validate {
        /// File to validate
        file: PathBuf,
        /// Agent dialect [default: detected]
        #[arg(long)]
        agent: Option<AgentId>,
        /// Component type [default: inferred]
        #[arg(long = "type")]
        component_type: Option<ComponentType>,
        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,
        /// Check deprecated and removed constructs against this version
        #[arg(long)]
        version: Option<String>,
        /// Output format
        #[arg(long, value_enum, env = "SKILLPORT_FORMAT", default_value_t = Format::Text)]
        format: Format,
    },
    /// Compare two components semantically
    Diff {
        /// First file
        a: PathBuf,
        /// Second file
        b: PathBuf,
        /// Dialect of both files [default: detected per file]
        #[arg(long)]
        agent: Option<AgentId>,
        /// Also print a unified diff of the bodies
        #[arg(long)]
        patch: bool,
        /// Output format
        #[arg(long, value_enum, env = "SKILLPORT_FORMAT", default_value_t = Format::Text)]
        format: Format,
    },
    /// Print the agent-to-agent compatibility matrix
    Matrix {
        /// Output format
        #[arg(long, value_enum, env = "SKILLPORT_FORMAT", default_value_t = Format::Text)]
        format: Format,
    },
    /// List how each field maps from one agent to another
    Mappings {
        /// Source agent
        #[arg(long)]
        from: AgentId,
        /// Target agent
        #[arg(long)]
        to: AgentId,
        /// Output format
        #[arg(long, value_enum, env = "SKILLPORT_FORMAT", default_value_t = Format::Text)]
        format: Format,
    },
    /// Upgrade or downgrade a file between versions of one dialect
    Adapt {
        /// File to adapt
        file: PathBuf,
        /// Agent dialect
        #[arg(long)]
        agent: AgentId,
        /// Version the file is written for [default: detected]
        #[arg(long)]
        from: Option<String>,
        /// Version to adapt to
        #[arg(long)]
        to: String,
        /// Refuse downgrades that would delete fields
        #[arg(long)]
        strict: bool,
        /// Output format
        #[arg(long, value_enum, env = "SKILLPORT_FORMAT", default_value_t = Format::Text)]
        format: Format,
    },
    /// Parse a file and print the intermediate representation as JSON
    Parse {
        /// File to parse
        file: PathBuf,
        /// Agent dialect [default: detected]
        #[arg(long)]
        agent: Option<AgentId>,
    },
}

pub fn run(cli: Cli) {
    if cli.about {
        print_about();
        return;
    }

    match cli.command {
        Some(Commands::Convert {
            file,
            to,
            from,
            comments,
            target_version,
            validate,
            output,
            format,
        }) => convert::run(
            &file,
            convert::Args {
                to,
                from,
                comments,
                target_version,
                validate,
                output,
            },
            format,
        ),
        Some(Commands::Detect {
            file,
            agent,
            format,
        }) => detect::run(&file, agent, format),
        Some(Commands::Validate {
            file,
            agent,
            component_type,
            strict,
            version,
            format,
        }) => validate::run(&file, agent, component_type, strict, version, format),
        Some(Commands::Diff {
            a,
            b,
            agent,
            patch,
            format,
        }) => diff::run(&a, &b, agent, patch, format),
        Some(Commands::Matrix { format }) => matrix::run(format),
        Some(Commands::Mappings { from, to, format }) => mappings::run(from, to, format),
        Some(Commands::Adapt {
            file,
            agent,
            from,
            to,
            strict,
            format,
        }) => adapt::run(&file, agent, from, &to, strict, format),
        Some(Commands::Parse { file, agent }) => parse::run(&file, agent),
        None => {
            eprintln!("Usage: skillport <command> [args]");
            eprintln!("Run `skillport --help` for details.");
            std::process::exit(1);
        }
    }
}

fn print_about() {
    println!(
        "skillport: AI agent component converter\n\
         ├─ version:    {}\n\
         ├─ author:     {}\n\
         ├─ source:     {}\n\
         └─ licence:    {} https://www.apache.org/licenses/LICENSE-2.0",
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS"),
        env!("CARGO_PKG_REPOSITORY"),
        env!("CARGO_PKG_LICENSE"),
    );
}

/// Read `path`, exiting with a message prefixed by `command` on failure.
fn read_input(command: &str, path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => fail(command, format!("{}: {e}", path.display())),
    }
}

/// Path in the forward-slash form parsers match against.
fn path_hint(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Print `message` and exit with status 1.
fn fail(command: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("skillport {command}: {message}");
    std::process::exit(1);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fail("json", e),
    }
}
