use anyhow::{bail, Context, Result};
use gis::{Coordinate, DistanceChainCalculator, FeatureStore};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Parse a `"lon,lat"` command-line position.
pub fn parse_point(value: &str) -> std::result::Result<Coordinate, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [lon, lat] => {
            let lon: f64 = lon.parse().map_err(|_| format!("invalid longitude: {lon}"))?;
            let lat: f64 = lat.parse().map_err(|_| format!("invalid latitude: {lat}"))?;
            Ok(Coordinate::new(lon, lat))
        }
        _ => Err(format!("expected \"lon,lat\", got \"{value}\"")),
    }
}

pub async fn run(
    store: Arc<dyn FeatureStore>,
    input: Option<PathBuf>,
    points: Vec<Coordinate>,
    json: bool,
) -> Result<()> {
    let path = match input {
        Some(input) => read_path(&input)?,
        None => points,
    };

    let calculator = DistanceChainCalculator::new(store);
    let report = calculator
        .compute_path(&path)
        .await
        .context("Failed to compute path distance")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for (i, line) in report.lines.iter().enumerate() {
        println!(
            "{:>4}  [{:.6}, {:.6}] -> [{:.6}, {:.6}]  {:>12.2} m",
            i, line.from.lon, line.from.lat, line.to.lon, line.to.lat, line.distance
        );
    }
    println!("Total: {:.2} m", report.total_distance);

    Ok(())
}

fn read_path(input: &Path) -> Result<Vec<Coordinate>> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let file = File::open(input).context("Failed to open input file")?;
    let reader = BufReader::new(file);

    match extension.as_str() {
        "csv" => read_csv(reader),
        "geojson" | "json" => {
            let geojson: geojson::GeoJson =
                serde_json::from_reader(reader).context("Failed to parse GeoJSON")?;
            path_from_geojson(geojson)
        }
        _ => bail!(
            "Unsupported file format: {}. Use .csv or .geojson",
            extension
        ),
    }
}

fn read_csv<R: Read>(reader: R) -> Result<Vec<Coordinate>> {
    let mut reader = csv::Reader::from_reader(reader);

    let headers = reader.headers()?.clone();
    let lon_idx = headers
        .iter()
        .position(|h| h == "lon" || h == "lng")
        .context("Column 'lon' not found in CSV")?;
    let lat_idx = headers
        .iter()
        .position(|h| h == "lat")
        .context("Column 'lat' not found in CSV")?;

    reader
        .records()
        .enumerate()
        .map(|(row, record)| {
            let record = record?;
            let lon: f64 = record
                .get(lon_idx)
                .context("Missing longitude")?
                .trim()
                .parse()
                .with_context(|| format!("Invalid longitude on row {}", row + 1))?;
            let lat: f64 = record
                .get(lat_idx)
                .context("Missing latitude")?
                .trim()
                .parse()
                .with_context(|| format!("Invalid latitude on row {}", row + 1))?;
            Ok(Coordinate::new(lon, lat))
        })
        .collect()
}

fn path_from_geojson(geojson: geojson::GeoJson) -> Result<Vec<Coordinate>> {
    use geojson::Value;

    let geometry = match geojson {
        geojson::GeoJson::Geometry(geometry) => geometry,
        geojson::GeoJson::Feature(feature) => feature
            .geometry
            .context("GeoJSON feature has no geometry")?,
        geojson::GeoJson::FeatureCollection(_) => {
            bail!("Expected a single LineString geometry or feature, got a FeatureCollection")
        }
    };

    let positions = match geometry.value {
        Value::LineString(positions) | Value::MultiPoint(positions) => positions,
        _ => bail!("Path geometry must be a LineString or MultiPoint"),
    };

    positions
        .into_iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(Coordinate::new(*lon, *lat)),
            _ => bail!("Position has fewer than 2 values"),
        })
        .collect()
}
