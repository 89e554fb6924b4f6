//! Shared test fixtures for frame-verify integration tests
//!
//! - `StaticSource`: in-memory `MetadataSource` with scripted failures and a call log
//! - `SharedBuffer`: `Write` sink whose contents can be inspected after the run
//! - `RecordingThrottle`: `ThrottlePolicy` that logs every pause instead of sleeping

#![allow(dead_code)]

use async_trait::async_trait;
use frame_verify::services::{
    LookupError, MetadataSource, MovieDetails, RecordHealth, SearchHit, ThrottlePolicy,
};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct StaticSource {
    movies: HashMap<String, MovieDetails>,
    searches: HashMap<String, Vec<SearchHit>>,
    failing_ids: HashSet<String>,
    failing_searches: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movie(mut self, id: &str, title: &str, release_date: &str) -> Self {
        self.movies.insert(
            id.to_string(),
            MovieDetails {
                id: id.to_string(),
                title: title.to_string(),
                release_date: Some(release_date.to_string()),
            },
        );
        self
    }

    pub fn with_search(mut self, title: &str, hits: Vec<SearchHit>) -> Self {
        self.searches.insert(title.to_string(), hits);
        self
    }

    pub fn failing_id(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    pub fn failing_search(mut self, title: &str) -> Self {
        self.failing_searches.insert(title.to_string());
        self
    }

    /// Calls in order: `fetch:<id>` and `search:<title>:<year or ->`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn hit(id: &str, title: &str, release_date: &str) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        title: title.to_string(),
        release_date: Some(release_date.to_string()),
    }
}

#[async_trait]
impl MetadataSource for StaticSource {
    async fn fetch_by_id(&self, id: &str) -> Result<MovieDetails, LookupError> {
        self.calls.lock().unwrap().push(format!("fetch:{}", id));

        if self.failing_ids.contains(id) {
            return Err(LookupError::Network("connection reset".to_string()));
        }

        self.movies
            .get(id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(id.to_string()))
    }

    async fn search(
        &self,
        title: &str,
        year: Option<&str>,
    ) -> Result<Vec<SearchHit>, LookupError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("search:{}:{}", title, year.unwrap_or("-")));

        if self.failing_searches.contains(title) {
            return Err(LookupError::Api(500, "internal error".to_string()));
        }

        Ok(self.searches.get(title).cloned().unwrap_or_default())
    }
}

/// Cloneable in-memory writer
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Throttle that records the health passed to each pause
#[derive(Clone, Default)]
pub struct RecordingThrottle {
    pauses: Arc<Mutex<Vec<RecordHealth>>>,
}

impl RecordingThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<RecordHealth> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThrottlePolicy for RecordingThrottle {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn pause(&mut self, health: RecordHealth) {
        self.pauses.lock().unwrap().push(health);
    }
}
