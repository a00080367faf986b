//! SteamETL CLI - normalize the Steam app extract into clean tables
//!
//! # Main Command
//!
//! ```bash
//! steametl transform                          # $DATASETS_FOLDER/raw -> $DATASETS_FOLDER/clean
//! steametl transform --input x.csv --output out/
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! steametl parse input.csv                    # Just parse CSV to JSON
//! steametl language "Spanish - Latin America" # Canonical language of a label
//! steametl tags "{'Indie': 10}"               # Repair and parse a tag mapping
//! ```

use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use steametl::{
    init_logging, logging::DEFAULT_FILTER, parse_csv_file_auto, parse_tag_weighted_list,
    transform_parsed, CsvDirSink, LanguageNormalizer, Settings, TableSink, TransformOptions,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "steametl")]
#[command(about = "Normalize the Steam app extract into relational tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full transform: raw extract -> normalized tables -> clean CSV directory
    Transform {
        /// Raw extract CSV (default: $DATASETS_FOLDER/raw/steam_app_data.csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (default: $DATASETS_FOLDER/clean)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Drop apps priced above this many USD
        #[arg(long, default_value_t = steametl::transform::DEFAULT_MAX_PRICE_USD)]
        max_price: f64,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the canonical language for each label (no labels: list them)
    Language {
        labels: Vec<String>,
    },

    /// Repair and parse a raw tag mapping
    Tags {
        raw: String,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let settings = Settings::from_env();
    let _guard = match init_logging(DEFAULT_FILTER, settings.logs_folder.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("⚠️  Logging disabled: {}", e);
            None
        }
    };

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform {
            input,
            output,
            max_price,
        } => cmd_transform(&settings, input, output, max_price),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Language { labels } => cmd_language(&labels),

        Commands::Tags { raw } => cmd_tags(&raw),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_transform(
    settings: &Settings,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    max_price: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = settings.resolve_input(input)?;
    let output = settings.resolve_output(output)?;
    let options = TransformOptions {
        max_price_usd: max_price,
    };

    let started = Instant::now();
    eprintln!("📄 Processing: {}", input.display());

    // Read
    let stage = Instant::now();
    let parse_result = parse_csv_file_auto(&input)?;
    eprintln!("   Encoding: {}", parse_result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(parse_result.delimiter));
    eprintln!("   Rows: {}", parse_result.records.len());
    info!(elapsed_ms = stage.elapsed().as_millis() as u64, "Read stage done");

    // Transform
    let stage = Instant::now();
    let result = transform_parsed(parse_result, options)?;
    info!(elapsed_ms = stage.elapsed().as_millis() as u64, "Transform stage done");

    let stats = &result.stats;
    eprintln!("\n⚙️  Transformed: {} apps kept", stats.rows_kept);
    eprintln!("   Missing name/developer/publisher: {}", stats.missing_required);
    eprintln!("   Price outliers: {}", stats.price_outliers);
    eprintln!("   Duplicates: {}", stats.duplicates);

    // Load
    let stage = Instant::now();
    let mut sink = CsvDirSink::new(&output);
    let report = sink.load(&result.tables)?;
    info!(elapsed_ms = stage.elapsed().as_millis() as u64, "Load stage done");

    eprintln!("\n📦 Tables:");
    for table in &report.tables {
        if table.rows == 0 {
            warn!(table = %table.name, "Empty table");
        }
        eprintln!("   {:<16} {:>8} rows", table.name, table.rows);
    }
    eprintln!("   💾 Saved to: {}", output.display());

    info!(
        run_id = %report.run_id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "ETL transform finished"
    );
    eprintln!("\n✨ Done in {:.2?}!", started.elapsed());
    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_language(labels: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let normalizer = LanguageNormalizer::default();

    if labels.is_empty() {
        for language in normalizer.canonical() {
            println!("{}", language);
        }
        return Ok(());
    }

    for label in labels {
        println!("{} -> {}", label, normalizer.normalize(label));
    }
    Ok(())
}

fn cmd_tags(raw: &str) -> Result<(), Box<dyn std::error::Error>> {
    let tags: Vec<_> = parse_tag_weighted_list(raw)?
        .into_iter()
        .map(|(tag, count)| json!({ "tag": tag, "count": count }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&tags)?);
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
