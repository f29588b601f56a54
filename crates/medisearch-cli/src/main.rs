use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medisearch_core::{SearchFilters, SearchRequest, SourceType, YearRange};
use medisearch_runtime::{
    HttpEmbedder, InMemoryVectorStore, OpenAiCompatProvider, OutcomeKind, RuntimeConfig,
    SearchOutcome, SearchPipeline,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "medisearch",
    version,
    about = "Hybrid medical literature search with validated answers"
)]
struct Cli {
    /// YAML configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a medical query from the corpus
    Search {
        /// Corpus JSON file: records with id, text, metadata, embedding
        #[arg(long)]
        corpus: PathBuf,

        query: String,

        /// Number of evidence items (1-50), defaults to retrieval.default_top_k
        #[arg(long)]
        top_k: Option<usize>,

        /// Keep only these origins (pubmed, medline, clinical_trial, all)
        #[arg(long = "source")]
        sources: Vec<String>,

        /// Earliest publication year (YYYY or YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest publication year (YYYY or YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Keep documents tagged with any of these MeSH terms
        #[arg(long = "mesh")]
        mesh_terms: Vec<String>,

        /// Print the outcome as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Probe the vector store, embedding, and generation services
    Health {
        #[arg(long)]
        corpus: PathBuf,
    },
    /// Show lexical index statistics
    Stats {
        #[arg(long)]
        corpus: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Search {
            corpus,
            query,
            top_k,
            sources,
            from,
            to,
            mesh_terms,
            json,
        } => {
            let filters = build_filters(&sources, from.as_deref(), to.as_deref(), mesh_terms)?;
            let mut request =
                SearchRequest::new(query).with_top_k(top_k.unwrap_or(config.retrieval.default_top_k));
            if let Some(filters) = filters {
                request = request.with_filters(filters);
            }

            let pipeline = build_pipeline(&corpus, config).await?;
            let outcome = pipeline.search(&request).await?;
            debug!(
                outcome = ?outcome.decision,
                evidence = outcome.evidence.len(),
                elapsed_ms = outcome.processing_time_ms,
                "Search finished"
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
        }
        Commands::Health { corpus } => {
            let pipeline = build_pipeline(&corpus, config).await?;
            let report = pipeline.health().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Stats { corpus } => {
            let pipeline = build_pipeline(&corpus, config).await?;
            println!("{}", serde_json::to_string_pretty(&pipeline.stats())?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => {
            let config = RuntimeConfig::from_yaml_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            info!(path = %path.display(), model = %config.generation.model, "Loaded config");
            Ok(config)
        }
        None => {
            debug!("No config file given, using defaults");
            Ok(RuntimeConfig::default())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn build_pipeline(corpus: &Path, config: RuntimeConfig) -> Result<SearchPipeline> {
    let store = InMemoryVectorStore::from_json_file(corpus)?;
    let embedder = HttpEmbedder::from_config(&config.embedding, None)?;
    let provider = OpenAiCompatProvider::from_config(&config.generation, None)?;

    let pipeline = SearchPipeline::builder()
        .vector_store(Arc::new(store))
        .embedder(Arc::new(embedder))
        .provider(Arc::new(provider))
        .config(config)
        .build()
        .await?;
    Ok(pipeline)
}

/// Turn command-line filter flags into a filter bundle, `None` if no flag was given.
fn build_filters(
    sources: &[String],
    from: Option<&str>,
    to: Option<&str>,
    mesh_terms: Vec<String>,
) -> Result<Option<SearchFilters>> {
    let source_types = sources
        .iter()
        .map(|s| s.parse::<SourceType>())
        .collect::<Result<Vec<_>, _>>()?;

    let year_range = if from.is_some() || to.is_some() {
        Some(YearRange::from_dates(from, to)?)
    } else {
        None
    };

    if source_types.is_empty() && year_range.is_none() && mesh_terms.is_empty() {
        return Ok(None);
    }

    Ok(Some(SearchFilters {
        source_types,
        year_range,
        mesh_terms,
    }))
}

fn print_outcome(outcome: &SearchOutcome) {
    println!("{}\n", outcome.answer);

    if !outcome.evidence.is_empty() {
        println!("Sources:");
        for (idx, item) in outcome.evidence.iter().enumerate() {
            println!(
                "  [{}] {} ({}, relevance {:.2})",
                idx + 1,
                item.title,
                item.origin,
                item.relevance_score
            );
        }
        println!();
    }

    match (&outcome.validation, outcome.decision) {
        (Some(validation), _) => {
            println!(
                "Confidence: {:.2} (clinical {:.2}, statistical {:.2}, contradiction {:.2}, level {})",
                validation.overall_confidence,
                validation.clinical.score.confidence,
                validation.statistical.score.confidence,
                validation.contradiction.score.confidence,
                validation.contradiction.level
            );
            if !validation.clinical.safety_concerns.is_empty() {
                println!("Safety concerns: {}", validation.clinical.safety_concerns.join("; "));
            }
        }
        (None, OutcomeKind::WeakEvidence) => println!("Answer skipped: evidence below threshold"),
        (None, _) => {}
    }

    println!("Completed in {} ms", outcome.processing_time_ms);
}
