//! docforge - documentation-grounded code synthesis
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docforge dump [module]` | Print the scanned API surface as JSON |
//! | `docforge modules` | List registered modules |
//! | `docforge index [--rebuild]` | Build or refresh the persisted index |
//! | `docforge ask <query>` | Answer a single request |
//! | `docforge` / `docforge chat` | Interactive loop, `exit` to quit |

mod chat;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docforge_core::{AppContext, ApiSurfaceScanner, Config, ModuleCatalog};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docforge")]
#[command(about = "Generate code from a module's own documentation")]
#[command(version)]
struct Cli {
    /// Path to configuration file (default: ~/.docforge/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Module to document, overriding the configured one
    #[arg(short, long, global = true)]
    module: Option<String>,

    /// Index location, overriding the configured one
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Generator model, overriding the configured one
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Print the documented API surface of a module as JSON
    Dump { module: Option<String> },
    /// List modules that can be scanned
    Modules,
    /// Build the index, or load it if present
    Index {
        /// Discard any existing index and rebuild it
        #[arg(long)]
        rebuild: bool,
    },
    /// Answer one request and exit
    Ask {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Interactive question loop
    Chat,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(module) = &self.module {
            config.module = module.clone();
        }
        if let Some(index) = &self.index {
            config.index_path = index.clone();
        }
        if let Some(model) = &self.model {
            config.generator.model = model.clone();
        }
        Ok(config)
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docforge=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = cli.resolve_config()?;
    let catalog = ModuleCatalog::with_builtin();

    let command = cli.command.unwrap_or(Command::Chat);
    debug!("Running {:?} for module '{}'", command, config.module);

    match command {
        Command::Dump { module } => {
            let module = module.unwrap_or(config.module);
            let entries = ApiSurfaceScanner::new(&catalog).scan(&module)?;
            let json = serde_json::to_string_pretty(&entries)
                .context("Failed to serialize documentation")?;
            println!("{json}");
        }
        Command::Modules => {
            for name in catalog.names() {
                println!("{name}");
            }
        }
        Command::Index { rebuild } => {
            let context = AppContext::initialize(config, &catalog, None, rebuild).await?;
            let index = context.knowledge().index();
            println!(
                "{} documents indexed with {} at {}",
                index.len(),
                index.embedder_name(),
                context.config().index_path.display()
            );
        }
        Command::Ask { query } => {
            let sink = chat::stdout_sink(config.generator.stream);
            let context = AppContext::initialize(config, &catalog, sink, false).await?;
            chat::answer(&context, &query.join(" ")).await?;
        }
        Command::Chat => {
            let sink = chat::stdout_sink(config.generator.stream);
            let context = AppContext::initialize(config, &catalog, sink, false).await?;
            chat::run(&context).await?;
        }
    }

    Ok(())
}
