//! citesurf command line
//!
//! 1. Loads configuration and the CSV input tables
//! 2. Resolves the seed corpus through the configured lookup provider
//! 3. Runs the walk for the requested number of steps
//! 4. Writes the node/edge reports, the DOT graph and a metrics snapshot

mod inputs;

use anyhow::Context;
use citesurf_common::config::{AppConfig, ObservabilityConfig, Validate};
use citesurf_common::lookup::create_lookup;
use citesurf_common::metrics::{self, LOOKUP_BUCKETS};
use citesurf_common::VERSION;
use citesurf_walker::export::{write_dot, write_edges_csv, write_nodes_csv};
use citesurf_walker::{ColorTable, ImportantAuthors, KeywordTable, ScoringContext, WalkEngine};
use clap::Parser;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "citesurf", version)]
#[command(about = "Relevance-weighted random walks over citation networks")]
struct Cli {
    /// Configuration file (defaults to config/{default,APP_ENV,local})
    #[arg(short, long, env = "CITESURF_CONFIG")]
    config: Option<String>,

    /// Number of walk steps (overrides walk.iterations)
    #[arg(short = 'n', long)]
    iterations: Option<usize>,

    /// Random seed for a reproducible walk
    #[arg(long)]
    seed: Option<u64>,

    /// Initial back-to-start probability
    #[arg(long)]
    back_to_start: Option<f64>,

    /// Seed corpus CSV (overrides inputs.corpus_path)
    #[arg(long)]
    corpus: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(iterations) = cli.iterations {
        config.walk.iterations = iterations;
    }
    if let Some(seed) = cli.seed {
        config.walk.seed = Some(seed);
    }
    if let Some(weight) = cli.back_to_start {
        config.walk.back_to_start_weight = weight;
    }
    if let Some(corpus) = cli.corpus {
        config.inputs.corpus_path = corpus;
    }
    config.validate().context("Invalid configuration")?;

    init_tracing(&config.observability);
    info!("Starting citesurf v{}", VERSION);

    let metrics_handle = install_metrics()?;
    metrics::register_metrics();

    let context = load_context(&config)?;
    let identifiers = inputs::read_corpus(&config.inputs.corpus_path).with_context(|| {
        format!("Failed to read corpus {}", config.inputs.corpus_path.display())
    })?;
    info!(seeds = identifiers.len(), provider = %config.lookup.provider, "Importing seed corpus");

    let lookup = create_lookup(&config.lookup)?;
    let rng = match config.walk.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut engine =
        WalkEngine::from_identifiers(identifiers, context, lookup, &config.walk, rng).await?;
    let summary = engine.run(config.walk.iterations).await?;
    for (transition, count) in &summary.transitions {
        info!(transition = %transition, count, "Transition total");
    }

    let edges = engine.derive_edges().to_vec();
    let store = engine.store();

    let rows = write_to(&config.output.nodes_csv, |w| write_nodes_csv(store, w))?;
    info!(path = %config.output.nodes_csv.display(), rows, "Wrote node report");

    if let Some(path) = &config.output.edges_csv {
        let rows = write_to(path, |w| write_edges_csv(&edges, w))?;
        info!(path = %path.display(), rows, "Wrote edge report");
    }
    if let Some(path) = &config.output.dot {
        let statements = write_to(path, |w| write_dot(store, &edges, w))?;
        info!(path = %path.display(), statements, "Wrote DOT graph");
    }

    for node in store.top_cited(5) {
        info!(
            identifier = %node.identifier(),
            label = %node.label(),
            citations = store.citation_count(node.identifier()),
            "Most cited"
        );
    }
    for node in store.most_visited(5) {
        info!(
            identifier = %node.identifier(),
            label = %node.label(),
            times_seen = node.counter(),
            "Most visited"
        );
    }

    if let Some(path) = &config.observability.metrics_path {
        std::fs::write(path, metrics_handle.render())
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    info!(steps = summary.steps, nodes = summary.nodes, edges = edges.len(), "Done");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("lookup_duration_seconds".to_string()),
            LOOKUP_BUCKETS,
        )?
        .install_recorder()?;
    Ok(handle)
}

/// Build the scoring context from the optional input tables
fn load_context(config: &AppConfig) -> anyhow::Result<ScoringContext> {
    let inputs = &config.inputs;

    let keywords = match &inputs.keywords_path {
        Some(path) => inputs::read_keywords(path)
            .with_context(|| format!("Failed to read keywords {}", path.display()))?,
        None => {
            warn!("No keyword table configured, title scores will be zero");
            KeywordTable::default()
        }
    };
    let important_authors = match &inputs.authors_path {
        Some(path) => inputs::read_important_authors(path)
            .with_context(|| format!("Failed to read authors {}", path.display()))?,
        None => ImportantAuthors::default(),
    };
    let colors = match &inputs.colors_path {
        Some(path) => inputs::read_colors(path)
            .with_context(|| format!("Failed to read colors {}", path.display()))?,
        None => ColorTable::default(),
    };

    info!(
        keywords = keywords.len(),
        important_authors = important_authors.len(),
        colors = colors.len(),
        "Loaded scoring tables"
    );
    Ok(ScoringContext::new(keywords, important_authors, colors))
}

/// Create `path` and stream a report into it
fn write_to<F>(path: &Path, write: F) -> anyhow::Result<usize>
where
    F: FnOnce(&mut BufWriter<File>) -> citesurf_common::Result<usize>,
{
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    let count = write(&mut writer)?;
    writer.flush()?;
    Ok(count)
}
