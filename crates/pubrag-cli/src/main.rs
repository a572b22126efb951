//! `pubrag`: answer a biomedical question from PubMed plus the semantic cache.

use std::io::{IsTerminal, Read};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pubrag_core::VectorStore;
use pubrag_db::{Database, InMemoryVectorStore};
use pubrag_inference::OpenAIBackend;
use pubrag_literature::EutilsClient;
use pubrag_search::{PipelineConfig, RagPipeline};

#[derive(Parser, Debug)]
#[command(name = "pubrag")]
#[command(author, version, about = "Summarize recent PubMed literature for a question")]
struct Cli {
    /// Question in plain language; read from stdin when omitted
    query: Vec<String>,

    /// Print the full answer (query, articles, summary) as JSON
    #[arg(long)]
    json: bool,

    /// Live articles to fetch (overrides PUBRAG_RESULT_LIMIT)
    #[arg(short = 'n', long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Configure the global subscriber.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, daily rotation)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter
fn init_tracing() -> Option<WorkerGuard> {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json");
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "pubrag_cli=info,pubrag_search=info,pubrag_literature=info,pubrag_inference=info,pubrag_db=info"
            .into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);

    match log_file {
        Some(path) => {
            let path = std::path::Path::new(&path);
            let dir = path.parent().unwrap_or(std::path::Path::new("."));
            let name = path
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("pubrag.log");
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, name));

            if json {
                registry
                    .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                    .init();
            } else {
                // No ANSI in files unless asked for
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(log_ansi.unwrap_or(false));
                registry.with(layer).init();
            }
            Some(guard)
        }
        None => {
            if json {
                registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stderr),
                    )
                    .init();
            } else {
                let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
                if let Some(ansi) = log_ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).init();
            }
            None
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let query = read_query(&cli.query)?;

    let mut config = PipelineConfig::from_env()?;
    if let Some(limit) = cli.limit {
        config.result_limit = limit;
    }

    let inference = Arc::new(OpenAIBackend::from_env().context("inference backend")?);
    let literature = Arc::new(EutilsClient::from_env().context("literature client")?);
    let dimension = inference.config().embed_dimension;

    let database = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => {
            let db = Database::connect(&url, dimension)
                .await
                .context("connecting to DATABASE_URL")?;
            db.migrate().await.context("running migrations")?;
            Some(db)
        }
        _ => None,
    };
    let store: Arc<dyn VectorStore> = match &database {
        Some(db) => Arc::new(db.articles.clone()),
        None => {
            warn!(
                subsystem = "cli",
                "DATABASE_URL not set; semantic cache lasts for this run only"
            );
            Arc::new(InMemoryVectorStore::new(dimension))
        }
    };

    info!(
        subsystem = "cli",
        result_limit = config.result_limit,
        lookup_k = config.lookup_k,
        persistent_cache = database.is_some(),
        "Starting pipeline"
    );

    let pipeline = RagPipeline::new(inference.clone(), inference, literature, store, config);
    let outcome = pipeline.run(&query).await;

    if let Some(db) = &database {
        db.close().await;
    }

    let answer = outcome?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", answer.summary.trim_end());
    }
    Ok(())
}

/// Join positional words, or read the whole of stdin when there are none.
fn read_query(words: &[String]) -> anyhow::Result<String> {
    let query = if words.is_empty() {
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            bail!("no query given; pass it as arguments or pipe it on stdin");
        }
        let mut buf = String::new();
        stdin.read_to_string(&mut buf).context("reading query from stdin")?;
        buf
    } else {
        words.join(" ")
    };

    let query = query.trim().to_string();
    if query.is_empty() {
        bail!("query is empty");
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_query_words() {
        let cli = Cli::parse_from(["pubrag", "statins", "after", "stroke"]);
        assert_eq!(cli.query, vec!["statins", "after", "stroke"]);
        assert!(!cli.json);
        assert_eq!(cli.limit, None);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["pubrag", "--json", "-n", "8", "asthma"]);
        assert!(cli.json);
        assert_eq!(cli.limit, Some(8));
        assert_eq!(cli.query, vec!["asthma"]);
    }

    #[test]
    fn test_read_query_joins_words() {
        let words = vec!["  diabetes".to_string(), "treatment ".to_string()];
        assert_eq!(read_query(&words).unwrap(), "diabetes treatment");
    }

    #[test]
    fn test_read_query_rejects_blank_words() {
        let words = vec!["  ".to_string()];
        assert!(read_query(&words).is_err());
    }
}
