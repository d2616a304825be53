#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "esmdev")]
#[command(author, version, about = "On-demand ES module dev server", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory (project root)
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Start the dev server
    Dev {
        /// Port to listen on [default: 3000]
        #[arg(long, short = 'p', env = "ESMDEV_PORT")]
        port: Option<u16>,

        /// Host to bind to [default: 127.0.0.1]
        #[arg(long)]
        host: Option<String>,

        /// Dependency store directory [default: node_modules]
        #[arg(long, value_name = "PATH")]
        deps_dir: Option<PathBuf>,

        /// Entry HTML document served at `/` [default: index.html]
        #[arg(long, value_name = "FILE")]
        entry: Option<PathBuf>,

        /// Value exposed as `process.env.NODE_ENV` [default: development]
        #[arg(long, short = 'm')]
        mode: Option<String>,

        /// Path to config file (overrides esmdev.json discovery)
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(cli.json),
        Some(Commands::Dev {
            port,
            host,
            deps_dir,
            entry,
            mode,
            config,
        }) => {
            logging::init(cli.verbose, cli.json);
            let span = tracing::info_span!("dev", cmd = "dev", cwd = %cwd.display());
            let _guard = span.enter();

            commands::dev::run(commands::dev::DevAction {
                cwd,
                port,
                host,
                deps_dir,
                entry,
                mode,
                config,
            })
        }
    }
}
