/*
 * MIT License
 *
 * Copyright (c) 2022 Joseph Sacchini
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
use anyhow::{anyhow, Context};
use clap::Parser;
use connections_sim::connections::*;
use std::{fs, path::{Path, PathBuf}, sync::Arc};
use tracing_subscriber::filter::LevelFilter;

/// Scores a word grouping strategy against a batch of connections puzzles
#[derive(Parser, Debug)]
#[command(name = "simulator")]
struct Args {
    /// Log every mismatched attempt next to its answer
    #[arg(long)]
    debug: bool,

    /// Solve the puzzles in parallel
    #[arg(long)]
    parallel: bool,

    /// Number of puzzles to run the strategy against
    #[arg(short = 'n', default_value_t = DEFAULT_PUZZLE_COUNT)]
    n: usize,

    /// One of: mock, cosine_similarity, kmeans, wordnet, wordnet_average, wikipedia
    #[arg(long, default_value = "cosine_similarity")]
    model: StrategyKind,

    /// Puzzle CSV to load instead of the built in sample
    #[arg(long)]
    puzzles: Option<PathBuf>,

    /// Word embeddings, one "WORD f1 f2 ..." per line
    #[arg(long)]
    embeddings: Option<PathBuf>,

    /// Pairwise lexical similarities, one "WORD WORD score" per line
    #[arg(long)]
    lexical: Option<PathBuf>,

    /// Cached search results (JSON) to take category tags from
    #[arg(long)]
    categories: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to install logger: {}", err))?;

    let puzzles = match &args.puzzles {
        Some(path) => load_puzzles(path)
            .with_context(|| format!("loading puzzles from {}", path.display()))?,
        None => DATA.puzzles.clone(),
    };
    let input = &puzzles[..args.n.min(puzzles.len())];

    let strategy = args.model.build(&load_oracles(&args)?)?;
    let mode = if args.parallel { RunMode::Parallel } else { RunMode::Sequential };
    log::info!("Running simulator for {} puzzles with model {}", input.len(), args.model);

    let report = simulate(input, strategy.as_ref(), mode, &CancelToken::new())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}

fn load_oracles(args: &Args) -> anyhow::Result<Oracles> {
    let mut out = Oracles::default();
    if let Some(path) = &args.embeddings {
        let table = EmbeddingTable::parse(&read(path)?)?;
        log::info!("loaded {} embeddings from {}", table.len(), path.display());
        out.embedder = Some(Arc::new(CachedEmbedder::new(table)));
    }

    if let Some(path) = &args.lexical {
        let table = LexicalTable::parse(&read(path)?)?;
        out.lexical = Some(Arc::new(CachedLexical::new(table)));
    }

    if let Some(path) = &args.categories {
        let index = CategoryIndex::from_search_results_json(&read(path)?)?;
        out.categories = Some(Arc::new(CachedCategories::new(index)));
    }

    Ok(out)
}

fn read(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
