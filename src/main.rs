use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use commitlex_cache::OnceCache;
use commitlex_core::{
    AnnotatedCommit, CommitlexConfig, CompareParams, KwicQuery, NgramParams, OutputFormat,
    SearchType, SortType,
};
use commitlex_engine::annotate::{annotate_commits, RuleAnnotator};
use commitlex_engine::authors::aggregate_authors;
use commitlex_engine::compare::compare_corpora;
use commitlex_engine::kwic::search;
use commitlex_engine::ngram::extract_ngrams;
use commitlex_ingest::history::{read_history, HistoryOptions};

#[derive(Parser)]
#[command(
    name = "commitlex",
    version,
    about = "Linguistic fingerprinting for git commit messages",
    long_about = "commitlex surfaces linguistic patterns in commit-message corpora:\n\
                   keyword-in-context concordances, ranked n-gram tables, step-wise\n\
                   comparison of two corpora, and per-author stylistic statistics.\n\n\
                   Examples:\n  \
                     commitlex ngrams --repo . -n 2          Ranked bigram table\n  \
                     commitlex kwic bug --window-size 3      Concordance lines for 'bug'\n  \
                     commitlex compare --repo-q ../a --repo-k ../b\n  \
                     commitlex authors --repo .              Per-author style aggregates"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .commitlex.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

/// Ingestion flags shared by every corpus-reading subcommand.
#[derive(Args)]
struct IngestArgs {
    /// Maximum commits to read from history
    #[arg(long)]
    max_commits: Option<usize>,

    /// Only include commits from the last N days
    #[arg(long)]
    since: Option<u64>,

    /// Branch to walk (default: HEAD)
    #[arg(long)]
    branch: Option<String>,

    /// Include merge commits in the corpus
    #[arg(long)]
    include_merges: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Build a ranked n-gram frequency table for one repository
    #[command(long_about = "Build a ranked n-gram frequency table for one repository.\n\n\
        Slides a width-n window over each commit message's content tokens and\n\
        ranks the results by frequency with a deterministic tie-break.\n\n\
        Examples:\n  commitlex ngrams --repo . -n 2\n  commitlex ngrams -n 1 --min-frequency 3 --format json")]
    Ngrams {
        /// Repository path (default: current directory)
        #[arg(long = "repo", default_value = ".")]
        path: PathBuf,

        /// N-gram width, 1-3 (default: from config)
        #[arg(short, long)]
        n: Option<u32>,

        /// Drop n-grams occurring fewer times than this
        #[arg(long)]
        min_frequency: Option<u32>,

        /// Maximum rows to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: usize,

        #[command(flatten)]
        ingest: IngestArgs,
    },
    /// Search one repository for keyword-in-context concordance lines
    #[command(long_about = "Search one repository for keyword-in-context concordance lines.\n\n\
        Matches a token, POS tag, or entity tag and shows window-bounded context.\n\
        Frequency-based sorts reorder matches by what follows them.\n\n\
        Examples:\n  commitlex kwic bug --window-size 3\n  commitlex kwic VERB --search-type pos --sort next_token_frequency\n  commitlex kwic issue --search-type entity")]
    Kwic {
        /// Keyword, POS tag, or entity tag to search for
        keyword: String,

        /// Repository path (default: current directory)
        #[arg(long = "repo", default_value = ".")]
        path: PathBuf,

        /// What the keyword matches against: token, pos, entity
        #[arg(long, default_value = "token")]
        search_type: SearchType,

        /// Context tokens on each side (default: from config)
        #[arg(long)]
        window_size: Option<usize>,

        /// Match ordering: sequential or a next-*-frequency sort
        #[arg(long = "sort", default_value = "sequential")]
        sort_type: SortType,

        /// Maximum matches to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: usize,

        #[command(flatten)]
        ingest: IngestArgs,
    },
    /// Compare the ranked n-gram tables of two repositories
    #[command(long_about = "Compare the ranked n-gram tables of two repositories.\n\n\
        Partitions ranks [1, max-rank] into step-size buckets and reports the\n\
        shared n-grams per bucket, independently for every requested n.\n\n\
        Examples:\n  commitlex compare --repo-q ../api --repo-k ../web\n  commitlex compare --repo-q . --repo-k . --n 1,2 --step-size 5 --max-rank 25")]
    Compare {
        /// Q-side repository path
        #[arg(long)]
        repo_q: PathBuf,

        /// K-side repository path
        #[arg(long)]
        repo_k: PathBuf,

        /// N values to compare
        #[arg(long = "n", value_delimiter = ',', default_value = "1,2,3")]
        n_values: Vec<u32>,

        /// Width of each rank bucket (default: from config)
        #[arg(long)]
        step_size: Option<u32>,

        /// Highest rank considered (default: from config)
        #[arg(long)]
        max_rank: Option<u32>,

        /// Minimum n-gram frequency on the Q side
        #[arg(long)]
        min_frequency_q: Option<u32>,

        /// Minimum n-gram frequency on the K side
        #[arg(long)]
        min_frequency_k: Option<u32>,

        #[command(flatten)]
        ingest: IngestArgs,
    },
    /// Aggregate per-author stylistic statistics for one repository
    #[command(long_about = "Aggregate per-author stylistic statistics for one repository.\n\n\
        Groups commits by the exact (author, email) pair and reports commit\n\
        counts, message lengths, and each author's most frequent content words.\n\n\
        Example:\n  commitlex authors --repo .")]
    Authors {
        /// Repository path (default: current directory)
        #[arg(long = "repo", default_value = ".")]
        path: PathBuf,

        /// Maximum authors to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: usize,

        #[command(flatten)]
        ingest: IngestArgs,
    },
    /// Create a default .commitlex.toml configuration file
    #[command(long_about = "Create a default .commitlex.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .commitlex.toml already exists.")]
    Init,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mcommitlex\x1b[0m v{version} — linguistic fingerprinting for commit messages\n");
        println!("Quick start:");
        println!("  \x1b[36mcommitlex init\x1b[0m                Create a .commitlex.toml config file");
        println!("  \x1b[36mcommitlex ngrams --repo .\x1b[0m     Ranked n-gram frequency table");
        println!("  \x1b[36mcommitlex kwic bug\x1b[0m            Concordance lines for 'bug'\n");
        println!("All commands:");
        println!("  \x1b[32mngrams\x1b[0m    Ranked n-gram frequency table");
        println!("  \x1b[32mkwic\x1b[0m      Keyword-in-context concordance search");
        println!("  \x1b[32mcompare\x1b[0m   Step-wise comparison of two corpora");
        println!("  \x1b[32mauthors\x1b[0m   Per-author stylistic statistics");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("commitlex v{version} — linguistic fingerprinting for commit messages\n");
        println!("Quick start:");
        println!("  commitlex init                Create a .commitlex.toml config file");
        println!("  commitlex ngrams --repo .     Ranked n-gram frequency table");
        println!("  commitlex kwic bug            Concordance lines for 'bug'\n");
        println!("All commands:");
        println!("  ngrams    Ranked n-gram frequency table");
        println!("  kwic      Keyword-in-context concordance search");
        println!("  compare   Step-wise comparison of two corpora");
        println!("  authors   Per-author stylistic statistics");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'commitlex <command> --help' for details.");
}

fn history_options(config: &CommitlexConfig, args: &IngestArgs) -> HistoryOptions {
    HistoryOptions {
        max_commits: args.max_commits.unwrap_or(config.ingest.max_commits),
        since_days: args.since.or(config.ingest.since_days),
        include_merges: args.include_merges || config.ingest.include_merges,
        branch: args.branch.clone(),
    }
}

/// Read and annotate one corpus, with a pointed hint when the path is
/// not a git repository.
fn load_corpus(
    path: &Path,
    config: &CommitlexConfig,
    args: &IngestArgs,
) -> Result<Vec<AnnotatedCommit>> {
    if !path.join(".git").exists() && git2::Repository::discover(path).is_err() {
        miette::bail!(
            help = "Run commitlex from inside a git repository, or point --repo at one",
            "Not a git repository: {}",
            path.display()
        );
    }

    let commits = read_history(path, &history_options(config, args)).into_diagnostic()?;
    tracing::debug!(path = %path.display(), commits = commits.len(), "corpus loaded");
    if commits.is_empty() {
        eprintln!(
            "No commits found at {}; results below reflect an empty corpus, not zero matches.",
            path.display()
        );
    } else {
        eprintln!("Analyzed {} commits at {}.", commits.len(), path.display());
    }
    let corpus = annotate_commits(&RuleAnnotator::new(), &commits).into_diagnostic()?;
    Ok(corpus)
}

fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");

    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => CommitlexConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(".commitlex.toml");
            if default_path.exists() {
                CommitlexConfig::from_file(default_path).into_diagnostic()?
            } else {
                CommitlexConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => {
            print_welcome(use_color);
            Ok(())
        }
        Some(Command::Ngrams {
            ref path,
            n,
            min_frequency,
            limit,
            ref ingest,
        }) => {
            let corpus = load_corpus(path, &config, ingest)?;
            let params = NgramParams {
                n: n.unwrap_or(config.analysis.n),
                min_frequency: min_frequency.unwrap_or(config.analysis.min_frequency),
            };
            let table = extract_ngrams(&corpus, &params).into_diagnostic()?;
            print_ngrams(cli.format, &corpus, &params, &table, limit)
        }
        Some(Command::Kwic {
            ref keyword,
            ref path,
            search_type,
            window_size,
            sort_type,
            limit,
            ref ingest,
        }) => {
            let corpus = load_corpus(path, &config, ingest)?;
            let query = KwicQuery {
                value: keyword.clone(),
                search_type,
                window_size: window_size.unwrap_or(config.analysis.window_size),
                sort_type,
            };
            let matches = search(&corpus, &query).into_diagnostic()?;
            print_kwic(cli.format, &corpus, &query, &matches, limit)
        }
        Some(Command::Compare {
            ref repo_q,
            ref repo_k,
            ref n_values,
            step_size,
            max_rank,
            min_frequency_q,
            min_frequency_k,
            ref ingest,
        }) => {
            // One annotation pass per distinct repository, even when both
            // sides point at the same path.
            let cache: OnceCache<PathBuf, Vec<AnnotatedCommit>> = OnceCache::new();
            let load = |path: &PathBuf| -> Result<Arc<Vec<AnnotatedCommit>>> {
                let key = path.canonicalize().unwrap_or_else(|_| path.clone());
                cache.get_or_try_compute(key, || load_corpus(path, &config, ingest))
            };
            let corpus_q = load(repo_q)?;
            let corpus_k = load(repo_k)?;

            let params = CompareParams {
                n_values: n_values.clone(),
                step_size: step_size.unwrap_or(config.compare.step_size),
                max_rank: max_rank.unwrap_or(config.compare.max_rank),
                min_frequency_q: min_frequency_q.unwrap_or(config.analysis.min_frequency),
                min_frequency_k: min_frequency_k.unwrap_or(config.analysis.min_frequency),
            };
            let comparisons = compare_corpora(&corpus_q, &corpus_k, &params).into_diagnostic()?;
            print_compare(cli.format, &corpus_q, &corpus_k, &params, &comparisons)
        }
        Some(Command::Authors {
            ref path,
            limit,
            ref ingest,
        }) => {
            let corpus = load_corpus(path, &config, ingest)?;
            let stats = aggregate_authors(&corpus, config.analysis.common_words);
            print_authors(cli.format, &corpus, &stats, limit)
        }
        Some(Command::Init) => {
            let config_path = Path::new(".commitlex.toml");
            if config_path.exists() {
                miette::bail!(".commitlex.toml already exists, refusing to overwrite it");
            }
            std::fs::write(config_path, CommitlexConfig::default_template()).into_diagnostic()?;
            println!("Created .commitlex.toml");
            Ok(())
        }
    }
}

fn print_ngrams(
    format: OutputFormat,
    corpus: &[AnnotatedCommit],
    params: &NgramParams,
    table: &[commitlex_core::NgramRecord],
    limit: usize,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::Map::new();
            json.insert("commitsAnalyzed".into(), serde_json::Value::from(corpus.len()));
            json.insert("n".into(), serde_json::Value::from(params.n));
            json.insert(
                "minFrequency".into(),
                serde_json::Value::from(params.min_frequency),
            );
            json.insert("totalNgrams".into(), serde_json::Value::from(table.len()));
            let top: Vec<_> = table.iter().take(limit).collect();
            json.insert(
                "ngrams".into(),
                serde_json::to_value(&top).into_diagnostic()?,
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(json))
                    .into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("# N-gram Table\n");
            println!(
                "**Commits analyzed:** {} — n={}, min frequency {}\n",
                corpus.len(),
                params.n,
                params.min_frequency
            );
            if table.is_empty() {
                println!("No n-grams above the threshold.\n");
            } else {
                println!("| Rank | N-gram | Frequency |");
                println!("|------|--------|-----------|");
                for record in table.iter().take(limit) {
                    println!("| {} | `{}` | {} |", record.rank, record.ngram, record.frequency);
                }
                println!();
            }
        }
        OutputFormat::Text => {
            println!(
                "N-gram table (n={}, min frequency {}, top {limit}):",
                params.n, params.min_frequency
            );
            println!("{:-<56}", "");
            if table.is_empty() {
                println!("  No n-grams above the threshold.");
            } else {
                for record in table.iter().take(limit) {
                    println!("{:>4}. {:<40} {:>6}", record.rank, record.ngram, record.frequency);
                }
            }
        }
    }
    Ok(())
}

fn print_kwic(
    format: OutputFormat,
    corpus: &[AnnotatedCommit],
    query: &KwicQuery,
    matches: &[commitlex_core::KwicMatch],
    limit: usize,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::Map::new();
            json.insert("commitsAnalyzed".into(), serde_json::Value::from(corpus.len()));
            json.insert("keyword".into(), serde_json::Value::from(query.value.clone()));
            json.insert(
                "searchType".into(),
                serde_json::Value::from(query.search_type.to_string()),
            );
            json.insert(
                "sortType".into(),
                serde_json::Value::from(query.sort_type.to_string()),
            );
            json.insert("windowSize".into(), serde_json::Value::from(query.window_size));
            json.insert("totalMatches".into(), serde_json::Value::from(matches.len()));
            let top: Vec<_> = matches.iter().take(limit).collect();
            json.insert(
                "matches".into(),
                serde_json::to_value(&top).into_diagnostic()?,
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(json))
                    .into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("# KWIC Concordance\n");
            println!(
                "**{} matches** for `{}` ({}, window {}, sort {})\n",
                matches.len(),
                query.value,
                query.search_type,
                query.window_size,
                query.sort_type
            );
            if !matches.is_empty() {
                println!("| Left | Keyword | Right | Commit | Metric |");
                println!("|------|---------|-------|--------|--------|");
                for m in matches.iter().take(limit) {
                    let metric = m
                        .sort_metric
                        .as_ref()
                        .map(|s| s.value.to_string())
                        .unwrap_or_default();
                    println!(
                        "| {} | **{}** | {} | `{}` | {} |",
                        m.left_context.join(" "),
                        m.keyword,
                        m.right_context.join(" "),
                        short_hash(&m.commit_hash),
                        metric,
                    );
                }
                println!();
            }
        }
        OutputFormat::Text => {
            println!(
                "KWIC matches for '{}' ({}, window {}, sort {}):",
                query.value, query.search_type, query.window_size, query.sort_type
            );
            println!("{:-<72}", "");
            if matches.is_empty() {
                println!("  No matches.");
            } else {
                for m in matches.iter().take(limit) {
                    let metric = m
                        .sort_metric
                        .as_ref()
                        .map(|s| format!("  [{}={}]", s.label, s.value))
                        .unwrap_or_default();
                    println!(
                        "  {:>30} [{}] {:<30} {}{}",
                        m.left_context.join(" "),
                        m.keyword,
                        m.right_context.join(" "),
                        short_hash(&m.commit_hash),
                        metric,
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_compare(
    format: OutputFormat,
    corpus_q: &[AnnotatedCommit],
    corpus_k: &[AnnotatedCommit],
    params: &CompareParams,
    comparisons: &[commitlex_core::NgramComparison],
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::Map::new();
            json.insert(
                "commitsAnalyzedQ".into(),
                serde_json::Value::from(corpus_q.len()),
            );
            json.insert(
                "commitsAnalyzedK".into(),
                serde_json::Value::from(corpus_k.len()),
            );
            json.insert("stepSize".into(), serde_json::Value::from(params.step_size));
            json.insert("maxRank".into(), serde_json::Value::from(params.max_rank));
            json.insert(
                "comparisons".into(),
                serde_json::to_value(comparisons).into_diagnostic()?,
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(json))
                    .into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("# Corpus Comparison\n");
            println!(
                "**Q:** {} commits — **K:** {} commits — step {}, max rank {}\n",
                corpus_q.len(),
                corpus_k.len(),
                params.step_size,
                params.max_rank
            );
            for comparison in comparisons {
                println!("## n = {}\n", comparison.n);
                println!("| Ranks | Q | K | Common | Shared n-grams |");
                println!("|-------|---|---|--------|----------------|");
                for step in &comparison.steps {
                    println!(
                        "| {}–{} | {} | {} | {} | {} |",
                        step.rank_start,
                        step.rank_end,
                        step.q_ngrams,
                        step.k_ngrams,
                        step.common_count,
                        step.common_ngrams.join(", "),
                    );
                }
                println!();
            }
        }
        OutputFormat::Text => {
            println!(
                "Corpus comparison (step {}, max rank {}):",
                params.step_size, params.max_rank
            );
            println!("{:-<72}", "");
            for comparison in comparisons {
                println!("n = {}:", comparison.n);
                for step in &comparison.steps {
                    println!(
                        "  ranks {:>3}-{:<3}  q={:<4} k={:<4} common={}",
                        step.rank_start,
                        step.rank_end,
                        step.q_ngrams,
                        step.k_ngrams,
                        step.common_count,
                    );
                    if !step.common_ngrams.is_empty() {
                        println!("    shared: {}", step.common_ngrams.join(", "));
                    }
                }
                println!();
            }
        }
    }
    Ok(())
}

fn print_authors(
    format: OutputFormat,
    corpus: &[AnnotatedCommit],
    stats: &[commitlex_core::AuthorStat],
    limit: usize,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let mut json = serde_json::Map::new();
            json.insert("commitsAnalyzed".into(), serde_json::Value::from(corpus.len()));
            json.insert("totalAuthors".into(), serde_json::Value::from(stats.len()));
            let top: Vec<_> = stats.iter().take(limit).collect();
            json.insert(
                "authors".into(),
                serde_json::to_value(&top).into_diagnostic()?,
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(json))
                    .into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("# Author Statistics\n");
            println!(
                "**Commits analyzed:** {} — **authors:** {}\n",
                corpus.len(),
                stats.len()
            );
            if !stats.is_empty() {
                println!("| Author | Email | Commits | Avg length | Total chars | Common words |");
                println!("|--------|-------|---------|------------|-------------|--------------|");
                for s in stats.iter().take(limit) {
                    println!(
                        "| {} | {} | {} | {:.1} | {} | {} |",
                        s.author,
                        s.email,
                        s.commit_count,
                        s.avg_message_length,
                        s.total_chars,
                        s.common_words.join(", "),
                    );
                }
                println!();
            }
        }
        OutputFormat::Text => {
            println!("Author statistics (top {limit}):");
            println!("{:-<72}", "");
            if stats.is_empty() {
                println!("  No authors.");
            } else {
                for (i, s) in stats.iter().take(limit).enumerate() {
                    println!(
                        "{:>3}. {} <{}>  commits={}  avg_len={:.1}  total_chars={}",
                        i + 1,
                        s.author,
                        s.email,
                        s.commit_count,
                        s.avg_message_length,
                        s.total_chars,
                    );
                    if !s.common_words.is_empty() {
                        println!("     common: {}", s.common_words.join(", "));
                    }
                }
            }
        }
    }
    Ok(())
}
