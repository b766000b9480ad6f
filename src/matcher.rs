//! Companion resource selection.
//!
//! Each primary media file is paired with the best companion from a candidate
//! list using a deterministic score: a shared episode token, cleaned-name
//! similarity, and a bonus for the preferred naming convention. Ties keep the
//! earliest candidate so a given input sequence always selects the same file.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::util::has_extension;

/// Points for a candidate carrying the primary's episode token.
const EPISODE_BONUS: u32 = 50;
/// Ceiling for the cleaned-name similarity contribution.
const SIMILARITY_WEIGHT: f64 = 30.0;
/// Points for a candidate matching the preferred naming convention.
const PREFERRED_BONUS: u32 = 20;

fn episode_regex() -> &'static Regex {
    static EPISODE: OnceLock<Regex> = OnceLock::new();
    EPISODE.get_or_init(|| Regex::new(r"\[(\d{2})\]").expect("episode pattern should compile"))
}

fn bracket_regex() -> &'static Regex {
    static BRACKETS: OnceLock<Regex> = OnceLock::new();
    BRACKETS.get_or_init(|| Regex::new(r"\[.*?\]").expect("bracket pattern should compile"))
}

/// Matching conventions for one batch.
#[derive(Debug, Clone)]
pub struct MatchRules {
    /// Extension a candidate must carry to be considered (no leading dot).
    pub companion_ext: String,
    /// Name suffix marking the preferred companion variant.
    pub preferred_suffix: String,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            companion_ext: "ass".to_string(),
            preferred_suffix: ".scjp.ass".to_string(),
        }
    }
}

/// Extract the two-digit episode token from a file name's stem.
///
/// Returns the digits only: `"[07] show.mkv"` yields `"07"`. The extension is
/// stripped first so a bracketed token there never counts.
pub fn episode_token(name: &str) -> Option<String> {
    let stem = Path::new(name).file_stem()?.to_string_lossy().into_owned();
    episode_regex()
        .captures(&stem)
        .map(|caps| caps[1].to_string())
}

/// Strip bracketed tokens and normalize for similarity comparison.
fn normalized_key(name: &str) -> String {
    bracket_regex().replace_all(name, "").trim().to_lowercase()
}

fn score_candidate(
    primary_stem: &str,
    episode: Option<&str>,
    candidate: &str,
    rules: &MatchRules,
) -> u32 {
    let mut score = 0;
    if let Some(episode) = episode {
        if candidate.contains(&format!("[{episode}]")) {
            score += EPISODE_BONUS;
        }
    }
    let similarity =
        strsim::normalized_levenshtein(&normalized_key(primary_stem), &normalized_key(candidate));
    // Truncate, never round: scores stay integral and comparable across runs.
    score += (SIMILARITY_WEIGHT * similarity) as u32;
    if candidate.ends_with(&rules.preferred_suffix) {
        score += PREFERRED_BONUS;
    }
    score
}

/// Choose the best companion for `primary` from `candidates`.
///
/// Candidates without the companion extension are ignored; `None` only means
/// nothing was left to choose from. Among viable candidates the best guess
/// always comes back, even at score zero, and the first candidate reaching
/// the maximum score wins, so selection is stable for a given candidate
/// order.
pub fn select_best_match<'a>(
    primary: &str,
    candidates: &'a [String],
    rules: &MatchRules,
) -> Option<&'a str> {
    let stem = Path::new(primary).file_stem()?.to_string_lossy().into_owned();
    let episode = episode_token(primary);
    let mut best: Option<(&'a str, u32)> = None;
    for candidate in candidates {
        if !has_extension(candidate, &rules.companion_ext) {
            continue;
        }
        let score = score_candidate(&stem, episode.as_deref(), candidate, rules);
        tracing::debug!(candidate = %candidate, score, "scored companion candidate");
        let better = match best {
            Some((_, top)) => score > top,
            None => true,
        };
        if better {
            best = Some((candidate, score));
        }
    }
    if let Some((candidate, score)) = best {
        tracing::debug!(candidate = %candidate, score, "selected companion");
    }
    best.map(|(candidate, _)| candidate)
}
