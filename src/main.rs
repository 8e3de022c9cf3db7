//! Talent funnel command-line entrypoint.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use mimalloc::MiMalloc;
use tokio::signal;

use funnel::config::Config;
use funnel::embedding::{EmbeddingProvider, HttpEmbedder, StubEmbedder};
use funnel::index::SharedIndex;
use funnel::constants::SUMMARY_EXCERPT_CHARS;
use funnel::ingest::{CandidateSubmission, JobDescriptionParser, JobPosting, ProfileIndexer};
use funnel::pipeline::{CancellationFlag, MatchingPipeline};
use funnel::records::{JsonRecordStore, RecordStore};
use funnel::scoring::ChatCompletionScorer;
use funnel::scoring::summary::excerpt;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "usage: funnel <stats | evaluate <job_id> | index-candidate <file.json> | \
                     index-job [--raw] <file> | search-jobs <query> [k]>";

const DEFAULT_SEARCH_K: usize = 5;

const STATS_LIST_LIMIT: usize = usize::MAX;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let argv: Vec<String> = std::env::args().skip(1).collect();

    let index = SharedIndex::open(&config.index_dir, config.embedding_dim)?;
    let records = Arc::new(JsonRecordStore::new(config.records_dir.clone()));

    tracing::info!(
        index_dir = %config.index_dir.display(),
        records_dir = %config.records_dir.display(),
        entries = index.size(),
        "Funnel starting"
    );

    let args: Vec<&str> = argv.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["stats"] => stats(&index, &records).await,
        ["evaluate", job_id] => evaluate(&config, index, records, job_id).await,
        ["index-candidate", path] => {
            let submission: CandidateSubmission = read_json(Path::new(path))?;
            let indexer = ProfileIndexer::new(index, records, embedder(&config)?)?;
            let record = indexer.index_candidate(submission).await?;
            println!("{}", record.candidate_id);
            Ok(())
        }
        ["index-job", "--raw", path] => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path))?;
            let posting = job_parser(&config)?.parse(&raw).await?;
            let indexer = ProfileIndexer::new(index, records, embedder(&config)?)?;
            let record = indexer.index_job(posting).await?;
            println!("{}", record.job_id);
            Ok(())
        }
        ["index-job", path] => {
            let posting: JobPosting = read_json(Path::new(path))?;
            let indexer = ProfileIndexer::new(index, records, embedder(&config)?)?;
            let record = indexer.index_job(posting).await?;
            println!("{}", record.job_id);
            Ok(())
        }
        ["search-jobs", query, rest @ ..] if rest.len() <= 1 => {
            let k = match rest.first() {
                Some(k) => k.parse().with_context(|| format!("invalid result count {}", k))?,
                None => DEFAULT_SEARCH_K,
            };
            let indexer = ProfileIndexer::new(index, records, embedder(&config)?)?;
            search_jobs(&indexer, query, k).await
        }
        _ => bail!(USAGE),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

fn embedder(config: &Config) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match config.api_endpoint() {
        Some(endpoint) => Ok(Arc::new(HttpEmbedder::new(
            endpoint,
            config.embedding_model.clone(),
            config.embedding_dim,
        )?)),
        None => {
            tracing::warn!("No FUNNEL_API_KEY configured, embedding with the offline stub");
            Ok(Arc::new(StubEmbedder::new(config.embedding_dim)?))
        }
    }
}

fn job_parser(config: &Config) -> anyhow::Result<JobDescriptionParser> {
    match config.api_endpoint() {
        Some(endpoint) => Ok(JobDescriptionParser::with_llm(
            endpoint,
            config.scoring_model.clone(),
        )?),
        None => {
            tracing::warn!("No FUNNEL_API_KEY configured, parsing the job description with rules only");
            Ok(JobDescriptionParser::rules_only())
        }
    }
}

async fn search_jobs(
    indexer: &ProfileIndexer<JsonRecordStore>,
    query: &str,
    k: usize,
) -> anyhow::Result<()> {
    let matches = indexer.search_jobs(query, k).await?;
    let results: Vec<_> = matches
        .iter()
        .map(|m| {
            serde_json::json!({
                "job_id": m.job_id,
                "title": m.job.title,
                "company": m.job.company,
                "location": m.job.location,
                "description": excerpt(&m.job.description, SUMMARY_EXCERPT_CHARS),
                "score": m.similarity,
                "matched_section": m.matched_section,
                "matched_skills": m.job.required_skills,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

async fn stats(index: &SharedIndex, records: &JsonRecordStore) -> anyhow::Result<()> {
    let jobs = records.list_jobs(STATS_LIST_LIMIT).await?;
    let candidates = records.list_candidates(STATS_LIST_LIMIT).await?;

    let summary = serde_json::json!({
        "index_entries": index.size(),
        "embedding_dim": index.dimension(),
        "jobs": jobs.len(),
        "candidates": candidates.len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn evaluate(
    config: &Config,
    index: SharedIndex,
    records: Arc<JsonRecordStore>,
    job_id: &str,
) -> anyhow::Result<()> {
    let endpoint = config.require_api_endpoint()?;
    let scorer = Arc::new(ChatCompletionScorer::new(
        endpoint,
        config.scoring_model.clone(),
    )?);
    let pipeline = MatchingPipeline::new(index, records, scorer, config.pipeline_config())?;

    let cancel = CancellationFlag::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, finishing in-flight evaluations");
            trigger.cancel();
        }
    });

    let report = pipeline.process_job_with_cancel(job_id, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
