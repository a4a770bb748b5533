//! Marketd CLI - Marketplace listing backend server

use clap::{Parser, Subcommand};
use marketd::config;
use marketd::storage::ItemStore;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "marketd")]
#[command(version = "0.1.0")]
#[command(about = "Marketplace listing backend - items, categories, content-addressed images")]
#[command(long_about = r#"
Marketd serves a minimal marketplace API for a browser frontend:
  • POST /items        submit an item (name, category, image)
  • GET  /items        list all items
  • GET  /search       keyword search over item names
  • GET  /image/{name} fetch a stored image (falls back to default.jpg)

Example usage:
  marketd init
  marketd serve --port 9000
  marketd stats
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "9000")]
        port: u16,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory holding uploaded images
        #[arg(short, long)]
        images: Option<PathBuf>,

        /// Allowed CORS origin for the frontend
        #[arg(short, long)]
        origin: Option<String>,

        /// Path to the config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Create the config file, database schema, and images directory
    Init {
        /// Path to the config file to write
        #[arg(short, long, default_value = "marketd.toml")]
        config: PathBuf,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Directory holding uploaded images
        #[arg(short, long)]
        images: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show statistics about stored items and categories
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Path to the config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve { port, database, images, origin, config: config_path } => {
            let file_config = config::load_config(config_path.as_deref())?.unwrap_or_default();

            let database = config::resolve_setting(
                database,
                file_config.database.as_deref().map(PathBuf::from),
                config::default_database_path(),
            );
            let images = config::resolve_setting(
                images,
                file_config.images.as_deref().map(PathBuf::from),
                config::default_images_dir(),
            );
            let origin = config::resolve_setting(
                origin,
                file_config.origin.clone(),
                config::origin_from_env(),
            );

            config::ensure_db_dir(&database)?;
            marketd::server::start_server(port, database, images, &origin).await?;
        }

        Commands::Init { config: config_path, database, images, force } => {
            let database = database.unwrap_or_else(config::default_database_path);
            let images = images.unwrap_or_else(config::default_images_dir);

            let market_config = config::MarketConfig {
                database: Some(database.display().to_string()),
                images: Some(images.display().to_string()),
                origin: Some(config::origin_from_env()),
            };
            config::write_config(&config_path, &market_config, force)?;
            println!("📝 Config written to {:?}", config_path);

            config::ensure_db_dir(&database)?;
            ItemStore::open(&database)?;
            println!("🗄️  Database initialized at {:?}", database);

            let store = marketd::ImageStore::new(images.clone());
            store.ensure_dir()?;
            println!("📂 Images directory: {:?}", images);

            let default_image = images.join(marketd::images::DEFAULT_IMAGE);
            if !default_image.exists() {
                println!("⚠️  Place a fallback image at {:?} to serve for missing files", default_image);
            }

            println!("✅ Initialization complete!");
        }

        Commands::Stats { database, config: config_path } => {
            let file_config = config::load_config(config_path.as_deref())?.unwrap_or_default();
            let database = config::resolve_setting(
                database,
                file_config.database.as_deref().map(PathBuf::from),
                config::default_database_path(),
            );

            let store = ItemStore::open(&database)?;
            let stats = store.stats()?;

            println!("📊 Marketd Statistics ({:?})", database);
            println!("------------------------------------");
            println!("{}", stats);
        }
    }

    Ok(())
}
