use clap::{Parser, Subcommand};
use convex_cli::{
    commands::{
        config::{self, ConfigAction},
        generate::{self, GenerateCommand},
        manifest::{self, ManifestCommand},
        scan::{self, ScanCommand},
    },
    common::GlobalOpts,
    init_tracing,
};
use convex_logger as logger;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "convex")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Transformer discovery and registry generation",
    long_about = "Convex discovers #[auto_transformer] types, assembles their manifests and generates the transformer registry outside of cargo build scripts."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a discovery round over a source root and merge it into an artifact
    Scan(ScanCommand),
    /// Print the manifest assembled from one or more artifacts
    Manifest(ManifestCommand),
    /// Generate the registry unit for a crate
    Generate(GenerateCommand),
    /// Inspect or edit a crate's Convex.toml
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        /// Crate directory holding Convex.toml
        #[arg(long, global = true, default_value = ".")]
        dir: PathBuf,

        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    if let Err(e) = logger::init_console(cli.global.verbosity_level(), None) {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }

    let result = match cli.command {
        Commands::Scan(cmd) => scan::handle_scan(cmd, &cli.global),
        Commands::Manifest(cmd) => manifest::handle_manifest(cmd, &cli.global),
        Commands::Generate(cmd) => generate::handle_generate(cmd, &cli.global),
        Commands::Config { dir, action } => config::handle_config(action, &dir, &cli.global),
    };

    if let Err(e) = result {
        logger::error(&format!("{:#}", e));
        if cli.global.verbosity_level() > 0 {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}
