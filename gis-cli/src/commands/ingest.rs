use anyhow::{bail, Context, Result};
use gis::{BatchIngestor, BatchResult, OpenedStore, PointSubmission};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// CSV column names for the submission fields.
pub struct Columns {
    pub name: String,
    pub lat: String,
    pub lng: String,
}

pub async fn run(
    opened: OpenedStore,
    input: std::path::PathBuf,
    columns: &Columns,
    chunk_size: usize,
    json: bool,
) -> Result<()> {
    let submissions = read_submissions(&input, columns)?;
    let total = submissions.len();

    let ingestor = BatchIngestor::new(opened.store, opened.ids);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    // Ingest chunk by chunk so progress is visible; rejection indices stay batch-wide
    let mut result = BatchResult::default();
    let mut offset = 0;
    let mut remaining = submissions.into_iter().peekable();
    while remaining.peek().is_some() {
        let chunk: Vec<PointSubmission> = remaining.by_ref().take(chunk_size.max(1)).collect();
        let len = chunk.len();

        let chunk_result = ingestor.ingest(chunk).await;
        result.accepted_count += chunk_result.accepted_count;
        result.accepted.extend(chunk_result.accepted);
        result
            .rejected
            .extend(chunk_result.rejected.into_iter().map(|mut rejection| {
                rejection.index += offset;
                rejection
            }));

        offset += len;
        pb.inc(len as u64);
    }
    pb.finish_with_message("done");

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Inserted {} of {} points", result.accepted_count, total);
        for rejection in &result.rejected {
            println!(
                "  skipped #{} ({}): {}",
                rejection.index,
                rejection.submission.name.as_deref().unwrap_or("unnamed"),
                serde_json::to_string(&rejection.reason)?
            );
        }
    }

    Ok(())
}

fn read_submissions(input: &Path, columns: &Columns) -> Result<Vec<PointSubmission>> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let file = File::open(input).context("Failed to open input file")?;
    let reader = BufReader::new(file);

    match extension.as_str() {
        "csv" => read_csv(reader, columns),
        "json" => serde_json::from_reader(reader).context("Failed to parse JSON point array"),
        _ => bail!("Unsupported file format: {}. Use .csv or .json", extension),
    }
}

fn read_csv<R: Read>(reader: R, columns: &Columns) -> Result<Vec<PointSubmission>> {
    let mut reader = csv::Reader::from_reader(reader);

    // Find column indices; the name column is optional
    let headers = reader.headers()?.clone();
    let position = |column: &str| headers.iter().position(|h| h == column);
    let name_idx = position(&columns.name);
    let lat_idx = position(&columns.lat)
        .with_context(|| format!("Column '{}' not found in CSV", columns.lat))?;
    let lng_idx = position(&columns.lng)
        .with_context(|| format!("Column '{}' not found in CSV", columns.lng))?;

    let mut submissions = Vec::new();
    for record in reader.records() {
        let record = record?;
        let number = |idx: usize| record.get(idx).and_then(|s| s.trim().parse::<f64>().ok());
        submissions.push(PointSubmission {
            name: name_idx
                .and_then(|idx| record.get(idx))
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            lat: number(lat_idx),
            lng: number(lng_idx),
        });
    }

    Ok(submissions)
}
