//! Match Score Demo
//!
//! Caches simulated job-to-candidate match scores behind `fetch_with_cache`.
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load cache configuration from environment variables
//! 3. Create the shared cache and start the sweep task
//! 4. Score every job/candidate pair twice; the second pass is served from cache
//! 5. Print cache statistics as JSON
//!
//! Run with `cargo run --example match_scores`.

use std::time::Duration;

use anyhow::Context;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use smart_cache::{build_key, spawn_sweep_task, CacheConfig, SharedCache};

#[derive(Debug, thiserror::Error)]
#[error("scoring service unavailable for job {0}")]
struct ScoringError(u64);

/// Stands in for the remote scoring call.
async fn compute_match_score(job_id: u64, candidate_id: &str) -> Result<u32, ScoringError> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if job_id == 0 {
        return Err(ScoringError(job_id));
    }
    let seed = candidate_id.bytes().map(u64::from).sum::<u64>() + job_id * 31;
    Ok((seed % 101) as u32)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smart_cache=info,match_scores=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    config.validate().context("invalid cache configuration")?;
    info!(
        ttl_ms = config.ttl_ms,
        max_size = config.max_size,
        sweep_interval_ms = config.sweep_interval_ms,
        "configuration loaded"
    );

    let cache: SharedCache<u32> = SharedCache::from_config(&config)?;
    let sweep_handle = spawn_sweep_task(cache.clone(), config.sweep_interval());

    let jobs = [1u64, 2, 3];
    let candidates = ["alice", "bob"];

    for pass in 1..=2 {
        for job_id in jobs {
            for candidate_id in candidates {
                let key = build_key(
                    "match_score",
                    &json!({ "job_id": job_id, "candidate_id": candidate_id }),
                );
                let score = cache
                    .fetch_with_cache(
                        &key,
                        || compute_match_score(job_id, candidate_id),
                        None,
                    )
                    .await?;
                info!(pass, job_id, candidate_id, score, "match score");
            }
        }
    }

    // Failures reach the caller and are not cached
    let key = build_key("match_score", &json!({ "job_id": 0, "candidate_id": "alice" }));
    if let Err(e) = cache
        .fetch_with_cache(&key, || compute_match_score(0, "alice"), None)
        .await
    {
        info!(error = %e, "scoring failed");
    }

    let stats = cache.stats().await;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    info!(hit_rate = stats.hit_rate(), "done");

    sweep_handle.abort();
    Ok(())
}
