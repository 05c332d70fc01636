mod markdown;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use caas_core::time::now_unix_secs;
use caas_core::{
    ContextEngine, ContextRequest, ContextResponse, Document, EngineConfig, QueryTerms,
    TypeDetector, analyze_structure, weight_breakdown,
};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "caas", about = "Context weighting and assembly engine CLI")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected document type and per-type trigger hits
    Detect {
        /// Document file (.json or Markdown)
        doc: PathBuf,

        /// Engine config (TOML) with custom detection rules
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print each section's weight breakdown
    Weights {
        doc: PathBuf,

        /// Query text for the query boost
        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        config: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print a structure report as JSON
    Analyze {
        doc: PathBuf,

        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Assemble a budgeted context from documents and conversation turns
    Assemble {
        /// Document file(s) (.json or Markdown)
        #[arg(required = true)]
        docs: Vec<PathBuf>,

        /// Engine config (TOML)
        #[arg(long)]
        config: PathBuf,

        /// Token budget
        #[arg(long, allow_negative_numbers = true)]
        budget: i64,

        #[arg(long)]
        query: Option<String>,

        /// JSON array of {"text", "timestamp"} turns, oldest first
        #[arg(long)]
        turns: Option<PathBuf>,

        /// Reference time in Unix seconds (defaults to the current time)
        #[arg(long)]
        now: Option<u64>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Deserialize)]
struct TurnInput {
    text: String,
    #[serde(default)]
    timestamp: u64,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Detect { doc, config } => cmd_detect(doc, config.as_deref()),
        Commands::Weights {
            doc,
            query,
            config,
            json,
        } => cmd_weights(doc, query.as_deref(), config.as_deref(), *json),
        Commands::Analyze { doc, config } => cmd_analyze(doc, config.as_deref()),
        Commands::Assemble {
            docs,
            config,
            budget,
            query,
            turns,
            now,
            json,
        } => cmd_assemble(
            docs,
            config,
            *budget,
            query.as_deref(),
            turns.as_deref(),
            *now,
            *json,
        ),
    }
}

// ---------------------------------------------------------------------------
// Input loading
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_toml_str(&content)
        .with_context(|| format!("invalid config {}", path.display()))
}

fn load_detector(path: Option<&Path>) -> Result<TypeDetector> {
    match path {
        Some(path) => Ok(load_config(path)?.detector()?),
        None => Ok(TypeDetector::default()),
    }
}

fn modified_secs(path: &Path) -> Result<u64> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("failed to stat {}", path.display()))?;
    Ok(modified
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs())
}

/// JSON files use the `Document` shape; anything else is split as Markdown.
/// The id defaults to the file stem and `updated_at` to the file's mtime.
fn load_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed");
    let mtime = modified_secs(path)?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if !is_json {
        return Ok(markdown::parse_markdown(stem, &content).with_updated_at(mtime));
    }

    let mut value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    let Some(object) = value.as_object_mut() else {
        bail!("{} must contain a JSON object", path.display());
    };
    object
        .entry("id")
        .or_insert_with(|| serde_json::Value::String(stem.to_string()));
    object
        .entry("updated_at")
        .or_insert_with(|| serde_json::Value::from(mtime));
    let doc: Document = serde_json::from_value(value)
        .with_context(|| format!("{} is not a valid document", path.display()))?;
    check_positions(&doc)
        .with_context(|| format!("{} has bad section positions", path.display()))?;
    Ok(doc)
}

/// Section positions must be exactly `0..len`, in any order. They key
/// candidate ids, so a duplicate would merge two sections.
fn check_positions(doc: &Document) -> Result<()> {
    let count = doc.sections.len();
    let mut seen = vec![false; count];
    for section in &doc.sections {
        let position = section.position;
        if position >= count {
            bail!(
                "section {:?} has position {position} but the document has {count} sections",
                section.title
            );
        }
        if std::mem::replace(&mut seen[position], true) {
            bail!("more than one section has position {position}");
        }
    }
    Ok(())
}

fn load_turns(path: &Path) -> Result<Vec<TurnInput>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read turns {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid turns file {}", path.display()))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_detect(path: &Path, config: Option<&Path>) -> Result<()> {
    let detector = load_detector(config)?;
    let doc = load_document(path)?;
    let detection = detector.detect_with_scores(&doc);

    println!("{}", detection.document_type);
    for score in &detection.scores {
        println!("  {:<24} {}", score.document_type.as_str(), score.hits);
    }
    Ok(())
}

fn cmd_weights(path: &Path, query: Option<&str>, config: Option<&Path>, json: bool) -> Result<()> {
    let detector = load_detector(config)?;
    let doc = load_document(path)?;
    let document_type = doc
        .document_type
        .unwrap_or_else(|| detector.detect(&doc));
    let query = query.map(QueryTerms::new).filter(|q| !q.is_empty());

    let breakdowns: Vec<_> = doc
        .sections
        .iter()
        .map(|s| (s, weight_breakdown(s, doc.sections.len(), document_type, query.as_ref())))
        .collect();

    if json {
        let rows: Vec<serde_json::Value> = breakdowns
            .iter()
            .map(|(s, b)| {
                serde_json::json!({
                    "position": s.position,
                    "title": s.title,
                    "breakdown": b,
                })
            })
            .collect();
        let out = serde_json::json!({
            "document_id": doc.id,
            "document_type": document_type,
            "sections": rows,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{} ({document_type})", doc.id);
    for (section, b) in &breakdowns {
        let bonuses: Vec<String> = b
            .content_bonuses
            .iter()
            .map(|c| format!("{c:?}"))
            .collect();
        println!(
            "  [{}] {:<28} {:>8.4}  type x{:.2}  content [{}]  pos +{:.2}  query +{:.2}",
            section.position,
            section.title,
            b.weight,
            b.type_multiplier,
            bonuses.join(", "),
            b.position_bonus,
            b.query_bonus,
        );
    }
    Ok(())
}

fn cmd_analyze(path: &Path, config: Option<&Path>) -> Result<()> {
    let detector = load_detector(config)?;
    let doc = load_document(path)?;
    let report = analyze_structure(&doc, &detector);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_assemble(
    paths: &[PathBuf],
    config: &Path,
    budget: i64,
    query: Option<&str>,
    turns: Option<&Path>,
    now: Option<u64>,
    json: bool,
) -> Result<()> {
    let config = load_config(config)?;
    let engine = ContextEngine::new(&config)?;

    let documents = paths
        .iter()
        .map(|p| load_document(p))
        .collect::<Result<Vec<_>>>()?;

    let mut window = config.new_window()?;
    if let Some(path) = turns {
        for turn in load_turns(path)? {
            window.append(&turn.text, turn.timestamp);
        }
    }

    let now = now.unwrap_or_else(now_unix_secs);
    let mut request = ContextRequest::new(budget, now);
    request.query = query.map(str::to_string);

    let response = engine
        .build(&documents, &window.snapshot(), &request)
        .context("assembly failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_summary(&response, now);
    }
    Ok(())
}

/// RFC 3339 UTC; timestamps chrono cannot represent print as raw seconds.
fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map_or_else(
            || format!("{secs}s"),
            |t| t.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
}

fn print_summary(response: &ContextResponse, now: u64) {
    print!("{}", response.context);
    eprintln!(
        "-- {} used, {} excluded, {}/{} tokens, as of {}",
        response.used_ids.len(),
        response.excluded_count,
        response.total_tokens,
        response.token_budget,
        format_timestamp(now),
    );
    for conflict in &response.conflicts {
        eprintln!(
            "conflict: {} (trust {})",
            conflict.description,
            conflict.authoritative()
        );
    }
}
