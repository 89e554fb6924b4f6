//! Title comparison strategies
//!
//! The default `ContainmentMatcher` is deliberately loose: it tolerates
//! subtitles and leading articles but can accept a short title contained in an
//! unrelated longer one. The similarity matchers trade that for a threshold.

use frame_common::config::{MatchStrategy, MatchingConfig};

/// Decides whether a fetched title matches the expected one
pub trait TitleMatcher: Send + Sync {
    /// Strategy name for logs
    fn name(&self) -> &'static str;

    fn matches(&self, expected: &str, fetched: &str) -> bool;
}

/// Lowercase and trim before comparison
fn normalize(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Bidirectional case-insensitive substring containment
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentMatcher;

impl TitleMatcher for ContainmentMatcher {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn matches(&self, expected: &str, fetched: &str) -> bool {
        let expected = normalize(expected);
        let fetched = normalize(fetched);

        if expected.is_empty() || fetched.is_empty() {
            return false;
        }

        fetched.contains(&expected) || expected.contains(&fetched)
    }
}

/// Jaro-Winkler similarity above a threshold
#[derive(Debug, Clone, Copy)]
pub struct JaroWinklerMatcher {
    pub threshold: f64,
}

impl Default for JaroWinklerMatcher {
    fn default() -> Self {
        Self { threshold: 0.85 }
    }
}

impl TitleMatcher for JaroWinklerMatcher {
    fn name(&self) -> &'static str {
        "jaro-winkler"
    }

    fn matches(&self, expected: &str, fetched: &str) -> bool {
        strsim::jaro_winkler(&normalize(expected), &normalize(fetched)) >= self.threshold
    }
}

/// Normalized Levenshtein similarity above a threshold
#[derive(Debug, Clone, Copy)]
pub struct LevenshteinMatcher {
    pub threshold: f64,
}

impl Default for LevenshteinMatcher {
    fn default() -> Self {
        Self { threshold: 0.80 }
    }
}

impl TitleMatcher for LevenshteinMatcher {
    fn name(&self) -> &'static str {
        "levenshtein"
    }

    fn matches(&self, expected: &str, fetched: &str) -> bool {
        strsim::normalized_levenshtein(&normalize(expected), &normalize(fetched)) >= self.threshold
    }
}

/// Build the configured matcher; the threshold only applies to similarity strategies
pub fn build_matcher(config: &MatchingConfig) -> Box<dyn TitleMatcher> {
    match config.strategy {
        MatchStrategy::Containment => Box::new(ContainmentMatcher),
        MatchStrategy::JaroWinkler => Box::new(match config.threshold {
            Some(threshold) => JaroWinklerMatcher { threshold },
            None => JaroWinklerMatcher::default(),
        }),
        MatchStrategy::Levenshtein => Box::new(match config.threshold {
            Some(threshold) => LevenshteinMatcher { threshold },
            None => LevenshteinMatcher::default(),
        }),
    }
}
