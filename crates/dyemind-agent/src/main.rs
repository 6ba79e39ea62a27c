//! DyeMind — AI-assisted fluorophore explorer.
//! Entry point for the CLI binary.
//!
//! Usage: dyemind <dye name> [--ask "<question>"]

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dyemind_aggregator::Aggregator;
use dyemind_common::sandbox::SandboxClient;
use dyemind_llm::backend::{HuggingFaceBackend, LlmBackend, OllamaBackend};
use dyemind_llm::summarizer::LlmSummarizer;
use dyemind_providers::pubchem::PubChemClient;
use dyemind_providers::pubmed::PubMedClient;
use dyemind_providers::wikipedia::WikipediaClient;

mod config;
mod report;

fn build_llm_backend(config: &config::Config) -> Arc<dyn LlmBackend> {
    if config.llm.mode == "ollama" {
        let ollama = &config.llm.ollama;
        info!(model = %ollama.model, "Using local Ollama backend");
        return Arc::new(OllamaBackend::new(&ollama.base_url, &ollama.model));
    }

    let hf = &config.llm.huggingface;
    let key = if hf.api_key.is_empty() {
        std::env::var("DYEMIND_HF_TOKEN").unwrap_or_default()
    } else {
        hf.api_key.clone()
    };

    if key.is_empty() {
        warn!(
            "Hugging Face configured but no API token found (set llm.huggingface.api_key \
             or DYEMIND_HF_TOKEN); falling back to local Ollama"
        );
        let ollama = &config.llm.ollama;
        return Arc::new(OllamaBackend::new(&ollama.base_url, &ollama.model));
    }

    info!(model = %hf.model, "Using Hugging Face Inference backend");
    Arc::new(HuggingFaceBackend::new(key, &hf.model))
}

struct CliArgs {
    query: String,
    question: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut query_words = Vec::new();
    let mut question = None;

    while let Some(arg) = args.next() {
        if arg == "--ask" {
            match args.next() {
                Some(q) => question = Some(q),
                None => return Err("--ask requires a question".to_string()),
            }
        } else {
            query_words.push(arg);
        }
    }

    if query_words.is_empty() {
        return Err("usage: dyemind <dye name> [--ask \"<question>\"]".to_string());
    }

    Ok(CliArgs { query: query_words.join(" "), question })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dyemind=debug,info")),
        )
        .init();

    info!("DyeMind starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    // Load configuration; every field has a workable default.
    let config = match config::Config::load() {
        Ok(c) => {
            info!(llm_mode = %c.llm.mode, "Configuration loaded");
            c
        }
        Err(e) => {
            warn!("Could not load dyemind.toml: {e}");
            warn!("Continuing with built-in defaults.");
            config::Config::default()
        }
    };

    let client = SandboxClient::new()?;
    let backend = build_llm_backend(&config);

    let aggregator = Aggregator::new(
        Arc::new(PubChemClient::new(client.clone())),
        Arc::new(PubMedClient::new(
            client.clone(),
            config.sources.pubmed_api_key.clone(),
        )),
        Arc::new(LlmSummarizer::new(backend)),
        Arc::new(WikipediaClient::new(client)),
    )
    .with_cache(
        config.aggregator.cache_capacity,
        std::time::Duration::from_secs(config.aggregator.cache_ttl_secs),
    );

    let options = config.fetch_options();
    let mut result = aggregator.fetch(&cli.query, &options).await?;

    if let Some(ref question) = cli.question {
        let context = report::answer_context(&result);
        let answer = aggregator.ask(question, &context).await?;
        result = result.record_answer(answer);
    }

    println!("{}", report::render(&result));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_joins_query_words() {
        let cli = parse_args(
            ["Rhodamine", "B"].into_iter().map(String::from),
        )
        .unwrap();
        assert_eq!(cli.query, "Rhodamine B");
        assert!(cli.question.is_none());
    }

    #[test]
    fn test_parse_args_with_question() {
        let cli = parse_args(
            ["Fura-2", "--ask", "Is it ratiometric?"]
                .into_iter()
                .map(String::from),
        )
        .unwrap();
        assert_eq!(cli.query, "Fura-2");
        assert_eq!(cli.question.as_deref(), Some("Is it ratiometric?"));
    }

    #[test]
    fn test_parse_args_rejects_empty() {
        assert!(parse_args(std::iter::empty()).is_err());
        assert!(parse_args(["probe", "--ask"].into_iter().map(String::from)).is_err());
    }
}
