//! Test Review Generator
//!
//! Generates synthetic reviews and submits them to a running server's JSON API.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

const MOVIES: &[&str] = &[
    "deadpool-and-wolverine",
    "gladiator-ii",
    "moana-2",
    "mufasa-the-lion-king",
];

const POSITIVE: &[&str] = &[
    "amazing", "brilliant", "thrilling", "beautiful", "hilarious", "moving", "fantastic",
    "gripping", "wonderful", "stunning",
];

const NEGATIVE: &[&str] = &[
    "boring", "awful", "predictable", "dull", "messy", "forgettable", "terrible", "tedious",
    "bland", "disappointing",
];

const SUBJECTS: &[&str] = &[
    "the plot", "the acting", "the soundtrack", "the visuals", "the ending", "the pacing",
    "the dialogue", "this movie",
];

/// Request body matching the server's review API
#[derive(Debug, Clone, Serialize)]
struct ReviewRequest {
    movie: String,
    review: String,
}

#[derive(Debug, Deserialize)]
struct ReviewResponse {
    status: String,
    rating: Option<u8>,
    reason: Option<String>,
}

/// Kind of synthetic review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ReviewKind {
    Positive,
    Negative,
    TooShort,
    Gibberish,
}

/// Review generator for load testing
struct ReviewGenerator {
    rng: rand::rngs::ThreadRng,
}

impl ReviewGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    fn generate(&mut self) -> (ReviewKind, ReviewRequest) {
        let kind = match self.rng.gen_range(0..10) {
            0..=3 => ReviewKind::Positive,
            4..=7 => ReviewKind::Negative,
            8 => ReviewKind::TooShort,
            _ => ReviewKind::Gibberish,
        };

        let review = match kind {
            ReviewKind::Positive => self.sentence(POSITIVE),
            ReviewKind::Negative => self.sentence(NEGATIVE),
            ReviewKind::TooShort => self.pick(POSITIVE).to_string(),
            ReviewKind::Gibberish => self.gibberish(),
        };

        let request = ReviewRequest {
            movie: self.pick(MOVIES).to_string(),
            review,
        };
        (kind, request)
    }

    fn sentence(&mut self, adjectives: &[&str]) -> String {
        let clauses = self.rng.gen_range(1..=3);
        (0..clauses)
            .map(|_| format!("{} was {}", self.pick(SUBJECTS), self.pick(adjectives)))
            .collect::<Vec<_>>()
            .join(" and ")
    }

    fn gibberish(&mut self) -> String {
        let words = self.rng.gen_range(3..8);
        (0..words)
            .map(|_| {
                let len = self.rng.gen_range(4..9);
                (0..len)
                    .map(|_| self.rng.gen_range(b'q'..=b'z') as char)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn pick<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices.choose(&mut self.rng).copied().unwrap_or_default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("review_generator=info".parse()?),
        )
        .init();

    info!("Starting Test Review Generator");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args.get(1).map(|s| s.as_str()).unwrap_or("http://127.0.0.1:8080");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let delay_ms: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(50);

    info!(base_url = %base_url, count = count, delay_ms = delay_ms, "Configuration loaded");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    if let Err(e) = client.get(format!("{base_url}/healthz")).send().await {
        warn!(error = %e, "Server not reachable. Running in dry-run mode.");
        return run_dry_mode(count, delay_ms).await;
    }

    let endpoint = format!("{base_url}/api/reviews");
    let mut generator = ReviewGenerator::new();
    let mut sent: HashMap<ReviewKind, u64> = HashMap::new();
    let mut outcomes: HashMap<String, u64> = HashMap::new();
    let mut ratings = [0u64; 10];

    for i in 0..count {
        let (kind, request) = generator.generate();
        *sent.entry(kind).or_insert(0) += 1;

        let outcome = match client.post(&endpoint).json(&request).send().await {
            Ok(response) => match response.json::<ReviewResponse>().await {
                Ok(body) => {
                    if let Some(rating) = body.rating.filter(|r| (1..=10).contains(r)) {
                        ratings[usize::from(rating - 1)] += 1;
                    }
                    body.reason.unwrap_or(body.status)
                }
                Err(e) => {
                    warn!(error = %e, "Unreadable response");
                    "unreadable".to_string()
                }
            },
            Err(e) => {
                warn!(error = %e, "Request failed");
                "request_failed".to_string()
            }
        };
        *outcomes.entry(outcome).or_insert(0) += 1;

        if (i + 1) % 10 == 0 {
            info!("Submitted {}/{} reviews, outcomes so far: {:?}", i + 1, count, outcomes);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!("Completed! Submitted {} reviews: {:?}", count, sent);
    info!("Outcomes: {:?}", outcomes);
    info!("Rating distribution (1..=10): {:?}", ratings);

    Ok(())
}

async fn run_dry_mode(count: u64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no server connection)");

    let mut generator = ReviewGenerator::new();

    for i in 0..count {
        let (kind, request) = generator.generate();
        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample {:?} review {}:\n{}", kind, i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
