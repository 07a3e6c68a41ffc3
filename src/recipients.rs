use std::fs;
use std::path::Path;

use clap::ValueEnum;
use rand::Rng;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::ledger::LedgerClient;

/// Hard cap on recipients per run, applied after the user-requested count.
pub const MAX_RECIPIENTS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RecipientMode {
    /// Draw a random subset from the candidate address file.
    File,
    /// Synthesize fresh destination-only addresses.
    Random,
}

/// File mode: read candidates, drop malformed addresses, shuffle uniformly,
/// keep the first `requested`.
pub fn from_file(
    path: &Path,
    requested: usize,
    client: &dyn LedgerClient,
) -> AppResult<Vec<String>> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!(
            "failed to read recipient file {}: {}",
            path.display(),
            e
        ))
    })?;

    let candidates = parse_candidates(&raw, client);
    info!("Loaded {} valid candidate addresses from {}", candidates.len(), path.display());

    select(candidates, requested, &mut rand::rng())
}

/// Generated mode: `requested` one-shot destination addresses with no usable
/// signing material behind them.
pub fn generated(requested: usize, client: &dyn LedgerClient) -> Vec<String> {
    let recipients = (0..requested)
        .map(|_| client.generate_fresh_address())
        .collect();
    apply_cap(recipients)
}

fn parse_candidates(raw: &str, client: &dyn LedgerClient) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            if client.is_valid_address(line) {
                true
            } else {
                warn!("Dropping malformed candidate address {}", line);
                false
            }
        })
        .map(str::to_string)
        .collect()
}

fn select<R: Rng>(
    mut candidates: Vec<String>,
    requested: usize,
    rng: &mut R,
) -> AppResult<Vec<String>> {
    if candidates.is_empty() {
        return Err(AppError::Config(
            "recipient file holds no valid addresses".to_string(),
        ));
    }
    if candidates.len() < requested {
        return Err(AppError::Config(format!(
            "recipient file holds {} valid addresses, fewer than the requested {}",
            candidates.len(),
            requested
        )));
    }

    // Which subset of a larger pool gets used must be unbiased, so shuffle
    // before truncating.
    shuffle(&mut candidates, rng);
    candidates.truncate(requested);
    Ok(apply_cap(candidates))
}

/// Uniform Fisher-Yates shuffle.
fn shuffle<T, R: Rng>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.random_range(0..=i);
        items.swap(i, j);
    }
}

fn apply_cap(mut recipients: Vec<String>) -> Vec<String> {
    if recipients.len() > MAX_RECIPIENTS {
        warn!(
            "Recipient list holds {} addresses; only the first {} will be processed",
            recipients.len(),
            MAX_RECIPIENTS
        );
        recipients.truncate(MAX_RECIPIENTS);
    }
    recipients
}
