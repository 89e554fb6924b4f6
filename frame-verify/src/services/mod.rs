//! Service modules for listing reconciliation

pub mod record_extractor;
pub mod resolver;
pub mod throttle;
pub mod title_matcher;
pub mod tmdb_client;
pub mod verifier;

pub use record_extractor::{extract_records, CandidateRecord};
pub use resolver::{Resolution, Resolver};
pub use throttle::{
    build_throttle, rate_limit_source, ExponentialBackoff, FixedDelay, PerRequestQuota,
    RateLimitedSource, RecordHealth, ThrottlePolicy, TokenBucket,
};
pub use title_matcher::{
    build_matcher, ContainmentMatcher, JaroWinklerMatcher, LevenshteinMatcher, TitleMatcher,
};
pub use tmdb_client::{LookupError, MetadataSource, MovieDetails, SearchHit, TmdbClient};
pub use verifier::{verify_record, Verification};
