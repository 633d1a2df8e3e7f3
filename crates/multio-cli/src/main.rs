mod cmd;
mod output;

use clap::{Parser, Subcommand};
use multio_plans::Format;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "multio-plans",
    about = "Validate, convert and export multio plan configurations",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a config for schema errors and incomplete plans
    Validate {
        /// Plan file (YAML, or JSON with a .json extension)
        #[arg(env = "MULTIO_PLANS_FILE")]
        file: PathBuf,

        /// Treat the file as a collection of named configs
        #[arg(long)]
        collection: bool,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,
    },

    /// List the plans of a config and their actions
    Show {
        #[arg(env = "MULTIO_PLANS_FILE")]
        file: PathBuf,

        #[arg(long)]
        collection: bool,
    },

    /// Re-emit a config in YAML or JSON
    Convert {
        #[arg(env = "MULTIO_PLANS_FILE")]
        file: PathBuf,

        /// Output format: yaml or json
        #[arg(long, default_value = "yaml")]
        to: Format,

        /// Write here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[arg(long)]
        collection: bool,

        /// Append an empty sink to plans that have none
        #[arg(long)]
        ensure_sink: bool,
    },

    /// Create a config file holding one plan with an empty sink
    Init {
        file: PathBuf,

        /// Name of the first plan
        #[arg(long, default_value = "default")]
        plan: String,

        /// Write a server config instead of a client config
        #[arg(long)]
        server: bool,

        /// Transport protocol (implies --server)
        #[arg(long)]
        transport: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Append an action, given as JSON, to a plan
    AddAction {
        file: PathBuf,

        /// Plan name
        #[arg(long)]
        plan: String,

        /// Action as JSON, e.g. '{"type": "print"}'
        #[arg(long)]
        action: String,

        /// Create the plan if it does not exist
        #[arg(long)]
        create: bool,
    },

    /// Add a sink, given as JSON, to the last sink action of a plan
    AddSink {
        file: PathBuf,

        #[arg(long)]
        plan: String,

        /// Sink as JSON, e.g. '{"type": "file", "append": false, "path": "out.grib"}'
        #[arg(long)]
        sink: String,
    },

    /// Print the environment assignment the engine reads its plans from
    Env {
        #[arg(env = "MULTIO_PLANS_FILE")]
        file: PathBuf,

        /// Variable name
        #[arg(long, default_value = multio_plans::export::PLANS_ENV)]
        var: String,
    },

    /// Run a command with the plans exported to its environment
    Run {
        file: PathBuf,

        /// Variable name for the inline JSON export
        #[arg(long, default_value = multio_plans::export::PLANS_ENV)]
        var: String,

        /// Write the plans to this file and export its path instead
        #[arg(long)]
        plans_file: Option<PathBuf>,

        /// Command and arguments
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate {
            file,
            collection,
            strict,
        } => cmd::validate::run(&file, collection, strict, cli.json),
        Commands::Show { file, collection } => cmd::show::run(&file, collection, cli.json),
        Commands::Convert {
            file,
            to,
            output,
            collection,
            ensure_sink,
        } => cmd::convert::run(&file, to, output.as_deref(), collection, ensure_sink),
        Commands::Init {
            file,
            plan,
            server,
            transport,
            force,
        } => cmd::edit::init(&file, &plan, server, transport, force),
        Commands::AddAction {
            file,
            plan,
            action,
            create,
        } => cmd::edit::add_action(&file, &plan, &action, create),
        Commands::AddSink { file, plan, sink } => cmd::edit::add_sink(&file, &plan, &sink),
        Commands::Env { file, var } => cmd::export::env(&file, &var, cli.json),
        Commands::Run {
            file,
            var,
            plans_file,
            command,
        } => cmd::export::run(&file, &var, plans_file.as_deref(), &command),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
