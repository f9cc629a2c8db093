use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use wikisearch_core::builder::{build_index, traditional_posting_lists, BuildConfig};
use wikisearch_core::codec::DEFAULT_BASE;
use wikisearch_core::corpus::{read_articles, read_base_forms};
use wikisearch_core::terms::TermIdentifierMap;
use wikisearch_core::IndexFlavor;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build the inverted index from a corpus file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FlavorArg {
    Traditional,
    Positional,
    Mixed,
}

impl From<FlavorArg> for IndexFlavor {
    fn from(flavor: FlavorArg) -> Self {
        match flavor {
            FlavorArg::Traditional => IndexFlavor::Traditional,
            FlavorArg::Positional => IndexFlavor::Positional,
            FlavorArg::Mixed => IndexFlavor::Mixed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a corpus and a base-form dictionary
    Build {
        /// Corpus file: articles separated by a blank-line pair
        #[arg(long)]
        corpus: PathBuf,
        /// Base-form dictionary file: `base;word;...` lines
        #[arg(long)]
        base_forms: PathBuf,
        /// Output index directory
        #[arg(long)]
        index_dir: PathBuf,
        /// Which index structures to build
        #[arg(long, value_enum, default_value_t = FlavorArg::Traditional)]
        flavor: FlavorArg,
        /// Optional term-clustering table: `term cluster_id` lines
        #[arg(long)]
        clusters: Option<PathBuf>,
        /// Delete any existing index databases before building
        #[arg(long, default_value_t = false)]
        truncate: bool,
    },
    /// Report posting-list sizes at coding bases 128 and 16
    Analyze {
        #[arg(long)]
        corpus: PathBuf,
        #[arg(long)]
        base_forms: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            corpus,
            base_forms,
            index_dir,
            flavor,
            clusters,
            truncate,
        } => build(corpus, base_forms, index_dir, flavor.into(), clusters, truncate),
        Commands::Analyze { corpus, base_forms } => analyze(corpus, base_forms),
    }
}

fn build(
    corpus: PathBuf,
    base_forms: PathBuf,
    index_dir: PathBuf,
    flavor: IndexFlavor,
    clusters: Option<PathBuf>,
    truncate: bool,
) -> Result<()> {
    tracing::info!(corpus = %corpus.display(), "reading articles");
    let articles = read_articles(&corpus)?;
    tracing::info!(articles = articles.len(), "reading base forms");
    let dictionary = read_base_forms(&base_forms)?;
    let term_map = match clusters {
        Some(path) => {
            tracing::info!(clusters = %path.display(), "loading term clusters");
            TermIdentifierMap::from_clusters_file(&path)?
        }
        None => TermIdentifierMap::identity(),
    };

    build_index(
        &index_dir,
        BuildConfig {
            flavor,
            truncate_old: truncate,
        },
        &articles,
        &dictionary,
        &term_map,
    )?;
    tracing::info!(index_dir = %index_dir.display(), "index created successfully");
    Ok(())
}

fn analyze(corpus: PathBuf, base_forms: PathBuf) -> Result<()> {
    let articles = read_articles(&corpus)?;
    let dictionary = read_base_forms(&base_forms)?;
    let term_map = TermIdentifierMap::identity();

    tracing::info!("creating posting lists with base-128 coding");
    let lists_128 = traditional_posting_lists(&articles, &dictionary, &term_map, DEFAULT_BASE)?;
    tracing::info!("creating posting lists with base-16 coding");
    let lists_16 = traditional_posting_lists(&articles, &dictionary, &term_map, 16)?;

    let bytes_128: usize = lists_128.values().map(|list| list.encoded_len()).sum();
    let bytes_16: usize = lists_16.values().map(|list| list.encoded_len()).sum();
    let mut entries: usize = 0;
    for list in lists_128.values() {
        entries += list.decode()?.len();
    }

    tracing::info!(bytes = bytes_128, "base-128 coded posting lists");
    tracing::info!(bytes = bytes_16, "base-16 coded posting lists");
    tracing::info!(bytes = entries * 4, "uncompressed int32 baseline");
    Ok(())
}
