use anyhow::Result;
use clap::{Parser, Subcommand};
use gis::Coordinate;
use std::path::PathBuf;

mod commands;

use commands::list::Layer;

/// OpenStreetMap PostGIS gateway CLI tool
#[derive(Parser)]
#[command(name = "gis")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(short, long, env = "GIS_DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(
        short,
        long,
        env = "GIS_MAX_CONNECTIONS",
        default_value = "5",
        global = true
    )]
    max_connections: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert points from a file (CSV or JSON array of {name, lat, lng})
    Ingest {
        /// Input file (CSV or JSON)
        input: PathBuf,

        /// Column name for the point name (CSV only)
        #[arg(long, default_value = "name")]
        name_col: String,

        /// Column name for latitude (CSV only)
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude (CSV only)
        #[arg(long, default_value = "lng")]
        lng_col: String,

        /// Submissions sent to the store per progress step
        #[arg(long, default_value = "500")]
        chunk_size: usize,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Compute the geodesic length of a path
    Distance {
        /// Path file (CSV with lon/lat columns, or GeoJSON LineString)
        #[arg(conflicts_with = "points")]
        input: Option<PathBuf>,

        /// Path position as "lon,lat" (repeatable, in order)
        #[arg(short, long = "point", value_parser = commands::distance::parse_point)]
        points: Vec<Coordinate>,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print a layer as JSON
    List {
        /// Layer to print
        #[arg(value_enum)]
        layer: Layer,
    },

    /// Delete a point by OSM identifier
    Delete {
        /// OSM identifier
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let opened = commands::connect(cli.database_url, cli.max_connections).await?;

    match cli.command {
        Commands::Ingest {
            input,
            name_col,
            lat_col,
            lng_col,
            chunk_size,
            json,
        } => {
            commands::ingest::run(
                opened,
                input,
                &commands::ingest::Columns {
                    name: name_col,
                    lat: lat_col,
                    lng: lng_col,
                },
                chunk_size,
                json,
            )
            .await
        }
        Commands::Distance {
            input,
            points,
            json,
        } => commands::distance::run(opened.store, input, points, json).await,
        Commands::List { layer } => commands::list::run(opened.store, layer).await,
        Commands::Delete { id } => commands::delete::run(opened.store, id).await,
    }
}
