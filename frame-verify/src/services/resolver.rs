//! Replacement identifier search
//!
//! The service's relevance order is trusted: the first hit wins. With
//! `check_year` enabled the first hit released in the listed year is preferred,
//! falling back to the first hit when none matches.

use super::tmdb_client::{MetadataSource, SearchHit};

/// Result of one resolution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(SearchHit),
    /// Search succeeded but returned nothing
    NoResults,
    /// Search call failed; treated as no result
    SearchFailed { error: String, transient: bool },
}

impl Resolution {
    pub fn hit(&self) -> Option<&SearchHit> {
        match self {
            Resolution::Found(hit) => Some(hit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    check_year: bool,
}

impl Resolver {
    pub fn new(check_year: bool) -> Self {
        Self { check_year }
    }

    pub async fn resolve(
        &self,
        source: &dyn MetadataSource,
        title: &str,
        year: Option<&str>,
    ) -> Resolution {
        let hits = match source.search(title, year).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(title = %title, year = ?year, error = %e, "Search failed");
                return Resolution::SearchFailed {
                    error: e.to_string(),
                    transient: e.is_transient(),
                };
            }
        };

        match self.pick(hits, year) {
            Some(hit) => {
                tracing::info!(
                    title = %title,
                    id = %hit.id,
                    found = %hit.title,
                    "Resolved replacement"
                );
                Resolution::Found(hit)
            }
            None => {
                tracing::info!(title = %title, year = ?year, "No search results");
                Resolution::NoResults
            }
        }
    }

    fn pick(&self, mut hits: Vec<SearchHit>, year: Option<&str>) -> Option<SearchHit> {
        if hits.is_empty() {
            return None;
        }

        let wanted_year = year.and_then(|y| y.parse::<i32>().ok());
        if self.check_year {
            if let Some(wanted) = wanted_year {
                if let Some(pos) = hits.iter().position(|h| h.release_year() == Some(wanted)) {
                    return Some(hits.swap_remove(pos));
                }
                tracing::warn!(
                    year = wanted,
                    first = %hits[0].title,
                    "No search hit released in listed year; using first result"
                );
            }
        }

        Some(hits.swap_remove(0))
    }
}
