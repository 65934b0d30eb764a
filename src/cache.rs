use chrono::{DateTime, Local};
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::trace;

use crate::sql::{Params, PlaceholderStyle, PARAM_PREFIX};
use crate::value::Record;

#[derive(Debug, Clone)]
pub struct CachedQuery {
    pub query_hash: String,
    pub query_text: String,
    pub timestamp: DateTime<Local>,
    pub rows: Vec<Record>,
}

/// Read results memoized by the canonical text of the statement
///
/// Entries live as long as the cache; nothing is evicted or expired.
pub struct QueryCache {
    style: PlaceholderStyle,
    placeholder: Regex,
    entries: HashMap<String, CachedQuery>,
}

impl QueryCache {
    pub fn new(style: PlaceholderStyle) -> Self {
        let placeholder = Regex::new(style.pattern()).expect("placeholder pattern is valid");
        Self {
            style,
            placeholder,
            entries: HashMap::new(),
        }
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Statement with every bound placeholder replaced by its value and the
    /// `param_` marker stripped, so prefixed and hand-named forms of the
    /// same read agree.
    pub fn canonical_statement(&self, sql: &str, params: &Params) -> String {
        let values: HashMap<String, String> = params
            .iter()
            .map(|(name, value)| (name.replace(PARAM_PREFIX, ""), value.to_string()))
            .collect();

        let stripped = sql.replace(PARAM_PREFIX, "");
        self.placeholder
            .replace_all(&stripped, |caps: &Captures| match values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Hex SHA-256 of the canonical statement
    pub fn query_hash(&self, sql: &str, params: &Params) -> String {
        let canonical = self.canonical_statement(sql, params);
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let query_hash = format!("{:x}", hasher.finalize());
        trace!(target: "cache", "{} -> {}", canonical, query_hash);
        query_hash
    }

    pub fn get(&self, query_hash: &str) -> Option<&CachedQuery> {
        self.entries.get(query_hash)
    }

    pub fn contains(&self, query_hash: &str) -> bool {
        self.entries.contains_key(query_hash)
    }

    pub fn store(&mut self, query_hash: String, query: &str, rows: Vec<Record>) -> &CachedQuery {
        let cached_query = CachedQuery {
            query_hash: query_hash.clone(),
            query_text: query.to_string(),
            timestamp: Local::now(),
            rows,
        };
        self.entries.entry(query_hash).or_insert(cached_query)
    }

    pub fn list_cached_queries(&self) -> impl Iterator<Item = &CachedQuery> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        CacheStats {
            total_queries: self.entries.len(),
            total_rows: self.entries.values().map(|q| q.rows.len()).sum(),
            oldest_entry: self.entries.values().map(|q| q.timestamp).min(),
            newest_entry: self.entries.values().map(|q| q.timestamp).max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub total_queries: usize,
    pub total_rows: usize,
    pub oldest_entry: Option<DateTime<Local>>,
    pub newest_entry: Option<DateTime<Local>>,
}
