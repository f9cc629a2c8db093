//! Interactive query loop.
//!
//! Reads single-line queries from stdin and prints the ranked results with
//! matching tokens highlighted; only a five-token window around each match
//! is shown, with elided stretches separated by a line break.

use std::collections::HashSet;
use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use wikisearch_core::cache::CachingIndexStore;
use wikisearch_core::corpus::{base_forms_for_token, tokenize, Article};
use wikisearch_core::planner::QueryPlanner;
use wikisearch_core::storage::{IndexStore, SledIndexStore};
use wikisearch_core::terms::TermIdentifierMap;
use wikisearch_core::{IndexFlavor, TermId};

const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const RESET: &str = "\x1b[0m";

/// Tokens of context shown on each side of a matching token.
const CONTEXT_WINDOW: usize = 5;

#[derive(Clone, Copy, ValueEnum)]
enum FlavorArg {
    Traditional,
    Positional,
    Mixed,
}

#[derive(Parser)]
#[command(name = "searcher")]
#[command(about = "Interactive search over a built index", long_about = None)]
struct Args {
    /// Index directory produced by the indexer
    #[arg(long)]
    index_dir: PathBuf,
    /// Index flavor the queries run against
    #[arg(long, value_enum, default_value_t = FlavorArg::Traditional)]
    flavor: FlavorArg,
    /// Term-clustering table used at build time, if any
    #[arg(long)]
    clusters: Option<PathBuf>,
    /// Maximum number of results to display
    #[arg(long, default_value_t = 10)]
    max_results: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let term_map = match &args.clusters {
        Some(path) => TermIdentifierMap::from_clusters_file(path)?,
        None => TermIdentifierMap::identity(),
    };
    let planner = match args.flavor {
        FlavorArg::Traditional => QueryPlanner::traditional(
            SledIndexStore::open(&args.index_dir, IndexFlavor::Traditional, false)?,
            term_map,
        ),
        FlavorArg::Positional => QueryPlanner::positional(
            SledIndexStore::open(&args.index_dir, IndexFlavor::Positional, false)?,
            term_map,
        ),
        FlavorArg::Mixed => QueryPlanner::mixed(
            SledIndexStore::open(&args.index_dir, IndexFlavor::Traditional, false)?,
            SledIndexStore::open(&args.index_dir, IndexFlavor::Positional, false)?,
            term_map,
        ),
    };

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        println!("Type query:");
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        // A failed query aborts only itself; keep accepting further queries.
        if let Err(error) = run_query(&planner, line.trim(), args.max_results) {
            tracing::error!(%error, "query failed");
        }
    }
    Ok(())
}

fn run_query(
    planner: &QueryPlanner<SledIndexStore>,
    raw_query: &str,
    max_results: usize,
) -> Result<()> {
    let outcome = planner.search(raw_query)?;
    if outcome.results.is_empty() {
        println!("No results\n");
        return Ok(());
    }
    for hit in outcome.results.iter().take(max_results) {
        render_article(
            planner.docs_store(),
            planner.term_map(),
            &outcome.query_term_ids,
            &hit.article,
        )?;
    }
    Ok(())
}

fn render_article(
    store: &CachingIndexStore<SledIndexStore>,
    term_map: &TermIdentifierMap,
    query_term_ids: &HashSet<TermId>,
    article: &Article,
) -> Result<()> {
    println!("{GREEN}{}{RESET}", article.title);
    let words = tokenize(&article.content);
    let dictionary = store.base_forms(&words)?;

    let mut matched = vec![false; words.len()];
    let mut displayed = vec![false; words.len()];
    for (i, word) in words.iter().enumerate() {
        let hit = base_forms_for_token(&dictionary, word)
            .iter()
            .any(|base| query_term_ids.contains(&term_map.resolve(base)));
        if hit {
            matched[i] = true;
            let from = i.saturating_sub(CONTEXT_WINDOW);
            let to = (i + CONTEXT_WINDOW).min(words.len() - 1);
            for slot in &mut displayed[from..=to] {
                *slot = true;
            }
        }
    }

    for i in 0..words.len() {
        if matched[i] {
            print!("{BLUE}{}{RESET} ", words[i]);
        } else if displayed[i] {
            print!("{} ", words[i]);
        } else if i >= 1 && displayed[i - 1] {
            // End of a context window: break the line before the elision.
            println!();
        }
    }
    println!("\n");
    Ok(())
}
