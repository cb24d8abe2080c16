//! WhereIs command-line host: records and finds personal belongings.

mod config;
mod error;
mod store;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use whereis_core::{GpsLocation, ItemUpdate, NewItem};

use crate::config::{load_config, resolve_paths};
use crate::error::ToolError;
use crate::store::AppStore;

#[derive(Parser)]
#[command(name = "whereis")]
#[command(about = "Keep track of where your belongings are", long_about = None)]
struct Cli {
    /// Path to the item database
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Directory for backups, exports and images
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GpsArgs {
    /// Latitude of the item
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of the item
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
}

impl GpsArgs {
    fn location(&self) -> Option<GpsLocation> {
        Some(GpsLocation::new(self.lat?, self.lon?))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Record a new item
    Add {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Free-text location, e.g. "garage, top shelf"
        #[arg(long)]
        location: Option<String>,

        /// Photo to copy into the image store
        #[arg(long)]
        image: Option<String>,

        #[command(flatten)]
        gps: GpsArgs,
    },

    /// List all items in insertion order
    List,

    /// Show a single item
    Show { id: String },

    /// Edit an item; omitted fields keep their stored values
    Update {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, conflicts_with = "clear_location")]
        location: Option<String>,

        /// Remove the item's free-text location
        #[arg(long)]
        clear_location: bool,

        #[arg(long, conflicts_with = "clear_image")]
        image: Option<String>,

        /// Remove the item's photo
        #[arg(long)]
        clear_image: bool,

        #[command(flatten)]
        gps: GpsArgs,

        /// Remove the item's coordinates
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        clear_gps: bool,
    },

    /// Delete an item and its photo
    Delete { id: String },

    /// Find items by name, description or location
    Search { query: Option<String> },

    /// Write all items to the export file
    Export,

    /// Replace all items with the contents of an export file
    Import { path: PathBuf },

    /// Rewrite the database from the latest backup snapshot
    Restore,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("WHEREIS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ToolError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(store: AppStore, command: Command) -> Result<(), ToolError> {
    match command {
        Command::Add {
            name,
            description,
            location,
            image,
            gps,
        } => {
            let candidate = NewItem {
                name,
                description,
                location,
                image_uri: image,
                gps_location: gps.location(),
            };
            print_json(&store.save_item(candidate).await?)
        }
        Command::List => print_json(&store.get_all_items().await?),
        Command::Show { id } => {
            let item = store
                .get_item_by_id(&id)
                .await?
                .ok_or_else(|| ToolError::ItemNotFound(id.clone()))?;
            print_json(&item)
        }
        Command::Update {
            id,
            name,
            description,
            location,
            clear_location,
            image,
            clear_image,
            gps,
            clear_gps,
        } => {
            let existing = store
                .get_item_by_id(&id)
                .await?
                .ok_or_else(|| ToolError::ItemNotFound(id.clone()))?;

            let mut update = ItemUpdate::from(&existing);
            if let Some(name) = name {
                update.name = name;
            }
            if let Some(description) = description {
                update.description = description;
            }
            if clear_location {
                update.location = None;
            } else if location.is_some() {
                update.location = location;
            }
            if clear_image {
                update.image_uri = None;
            } else if image.is_some() {
                update.image_uri = image;
            }
            if clear_gps {
                update.gps_location = None;
            } else if let Some(gps) = gps.location() {
                update.gps_location = Some(gps);
            }

            print_json(&store.update_item(update).await?)
        }
        Command::Delete { id } => {
            store.delete_item(&id).await?;
            Ok(())
        }
        Command::Search { query } => print_json(&store.search_items(query.as_deref()).await?),
        Command::Export => {
            let path = store.export_data().await?;
            println!("{}", path.display());
            Ok(())
        }
        Command::Import { path } => print_json(&store.import_data(&path).await?),
        Command::Restore => print_json(&store.restore_from_backup().await?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let paths = resolve_paths(load_config()?, cli.store, cli.data_dir);
    let store = store::open(&paths)?;

    run(store, cli.command).await?;
    Ok(())
}
