//! TTL response cache over a JSON file per namespace.
//!
//! Keys look like `{service}.{endpoint}.{hash}` so a whole service or
//! endpoint can be invalidated by prefix. Entries are checked for expiry on
//! read and evicted lazily; nothing sweeps them proactively.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::CacheError;
use crate::observability::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};
use crate::storage::json_map_store::JsonMapStore;

/// Headers that never take part in key derivation, so rotating credentials
/// keeps existing entries reachable.
pub const SENSITIVE_HEADERS: [&str; 3] = ["authorization", "x-api-key", "cookie"];

const HASH_LEN: usize = 16;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub data: Value,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Time to live in seconds.
    pub ttl: u64,
}

impl CacheEntry {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        let ttl_ms = i64::try_from(self.ttl.saturating_mul(1000)).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) > ttl_ms
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheEntryInfo {
    pub key: String,
    pub entry: CacheEntry,
    pub expired: bool,
}

/// Source of "now" in epoch milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

pub struct CacheStorage {
    store: JsonMapStore<String, CacheEntry>,
    clock: Clock,
}

impl CacheStorage {
    /// Open the store for `namespace` inside `dir` (`{dir}/{namespace}.json`).
    pub async fn open<P: AsRef<Path>>(dir: P, namespace: &str) -> Result<Self, CacheError> {
        Self::open_file(dir.as_ref().join(format!("{namespace}.json"))).await
    }

    pub async fn open_file<P: Into<PathBuf>>(path: P) -> Result<Self, CacheError> {
        let store = JsonMapStore::new(path).await?;
        Ok(Self { store, clock: system_clock() })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Derive a deterministic key. Header names are case-folded, sensitive
    /// headers dropped, the rest sorted; the canonical JSON of the request
    /// identity is hashed with SHA-256 and cut to 16 hex characters.
    pub fn generate_key(service: &str, endpoint: &str, url: &str, headers: &BTreeMap<String, String>) -> String {
        Self::generate_request_key(service, endpoint, url, headers, None)
    }

    /// Like [`generate_key`](Self::generate_key), with the request body folded
    /// in. GraphQL calls share one URL, so their variables live only here.
    pub fn generate_request_key(
        service: &str,
        endpoint: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: Option<&Value>,
    ) -> String {
        let filtered: BTreeMap<String, &String> = headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .filter(|(k, _)| !SENSITIVE_HEADERS.contains(&k.as_str()))
            .collect();
        // serde_json objects serialize with sorted keys
        let mut identity = json!({
            "service": service,
            "endpoint": endpoint,
            "url": url,
            "headers": filtered,
        });
        if let Some(body) = body {
            identity["body"] = body.clone();
        }
        let canonical = identity.to_string();
        let digest = hex::encode(Sha256::digest(canonical.as_bytes()));
        format!("{service}.{endpoint}.{}", &digest[..HASH_LEN])
    }

    /// Cached data for `key`, or `None` on a miss. A stale entry is evicted.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let key = key.to_string();
        let Some(entry) = self.store.get(&key).await else {
            CACHE_MISSES_TOTAL.inc();
            debug!(%key, "cache miss");
            return Ok(None);
        };
        if entry.is_expired(self.now()) {
            CACHE_MISSES_TOTAL.inc();
            debug!(%key, "cache entry expired; evicting");
            self.store.remove(&key).await?;
            return Ok(None);
        }
        CACHE_HITS_TOTAL.inc();
        debug!(%key, "cache hit");
        Ok(Some(entry.data))
    }

    pub async fn set(&self, key: &str, data: Value, ttl: u64) -> Result<(), CacheError> {
        let entry = CacheEntry { data, timestamp: self.now(), ttl };
        self.store.insert(key.to_string(), entry).await?;
        debug!(%key, ttl, "cache entry stored");
        Ok(())
    }

    /// Remove one key; returns whether it existed.
    pub async fn invalidate(&self, key: &str) -> Result<bool, CacheError> {
        self.store.remove(&key.to_string()).await
    }

    /// Drop the whole namespace and start empty.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.store.reset().await
    }

    /// Remove every key starting with `prefix`; returns how many were removed.
    pub async fn clear_pattern(&self, prefix: &str) -> Result<usize, CacheError> {
        let removed = self.store.retain(|k, _| !k.starts_with(prefix)).await?;
        debug!(%prefix, removed, "cache entries cleared by prefix");
        Ok(removed)
    }

    pub async fn get_stats(&self) -> CacheStats {
        let now = self.now();
        let entries = self.store.list().await;
        let expired_entries = entries.iter().filter(|(_, e)| e.is_expired(now)).count();
        CacheStats {
            total_entries: entries.len(),
            valid_entries: entries.len() - expired_entries,
            expired_entries,
            file: self.store.file_path().to_path_buf(),
        }
    }

    /// All entries sorted by key, expired ones included and flagged.
    pub async fn get_all_entries(&self) -> Vec<CacheEntryInfo> {
        let now = self.now();
        let mut entries: Vec<CacheEntryInfo> = self
            .store
            .list()
            .await
            .into_iter()
            .map(|(key, entry)| CacheEntryInfo { expired: entry.is_expired(now), key, entry })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    const NOW: i64 = 1_700_000_000_000;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn fixed_clock(at: Arc<AtomicI64>) -> Clock {
        Arc::new(move || at.load(Ordering::SeqCst))
    }

    async fn temp_cache(now: Arc<AtomicI64>) -> Result<(CacheStorage, PathBuf), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("apishape_cache_{}", uuid::Uuid::new_v4()));
        let cache = CacheStorage::open(&dir, "test").await?.with_clock(fixed_clock(now));
        Ok((cache, dir))
    }

    #[test]
    fn key_has_service_endpoint_prefix() {
        let key = CacheStorage::generate_key("github", "listIssues", "https://api.github.com/issues", &headers(&[]));
        let (prefix, hash) = key.rsplit_once('.').unwrap();
        assert_eq!(prefix, "github.listIssues");
        assert_eq!(hash.len(), 16);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_ignores_header_case_and_credentials() {
        let url = "https://api.example.com/users/1";
        let a = CacheStorage::generate_key("s", "e", url, &headers(&[("Accept", "application/json"), ("Authorization", "Bearer a")]));
        let b = CacheStorage::generate_key("s", "e", url, &headers(&[("accept", "application/json"), ("authorization", "Bearer b")]));
        let c = CacheStorage::generate_key("s", "e", url, &headers(&[("ACCEPT", "application/json"), ("X-API-Key", "k"), ("Cookie", "c")]));
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn key_sensitive_to_url_and_other_headers() {
        let base = CacheStorage::generate_key("s", "e", "https://x/a", &headers(&[("Accept", "application/json")]));
        assert_ne!(base, CacheStorage::generate_key("s", "e", "https://x/b", &headers(&[("Accept", "application/json")])));
        assert_ne!(base, CacheStorage::generate_key("s", "e", "https://x/a", &headers(&[("Accept", "text/plain")])));
    }

    #[test]
    fn key_sensitive_to_request_body() {
        let url = "https://api.example.com/graphql";
        let h = headers(&[("Content-Type", "application/json")]);
        let query = "query($owner: String!) { repo(owner: $owner) { name } }";
        let alice = json!({"query": query, "variables": {"owner": "alice"}});
        let bob = json!({"query": query, "variables": {"owner": "bob"}});

        let a = CacheStorage::generate_request_key("gh", "repo", url, &h, Some(&alice));
        let b = CacheStorage::generate_request_key("gh", "repo", url, &h, Some(&bob));
        assert_ne!(a, b);
        assert_eq!(a, CacheStorage::generate_request_key("gh", "repo", url, &h, Some(&alice.clone())));
        assert!(b.starts_with("gh.repo."));
        // no body: same key as the four-part form
        assert_eq!(
            CacheStorage::generate_request_key("gh", "repo", url, &h, None),
            CacheStorage::generate_key("gh", "repo", url, &h)
        );
    }

    #[tokio::test]
    async fn ttl_boundary() -> Result<(), anyhow::Error> {
        let now = Arc::new(AtomicI64::new(NOW));
        let (cache, dir) = temp_cache(now.clone()).await?;
        let ttl = 60u64;

        // stored 1ms short of the TTL: still a hit
        now.store(NOW - 60_000 + 1, Ordering::SeqCst);
        cache.set("s.e.fresh", serde_json::json!({"v": 1}), ttl).await?;
        // stored 1ms past the TTL: a miss, and evicted
        now.store(NOW - 60_000 - 1, Ordering::SeqCst);
        cache.set("s.e.stale", serde_json::json!({"v": 2}), ttl).await?;

        now.store(NOW, Ordering::SeqCst);
        assert_eq!(cache.get("s.e.fresh").await?, Some(serde_json::json!({"v": 1})));
        assert_eq!(cache.get("s.e.stale").await?, None);
        assert_eq!(cache.get_stats().await.total_entries, 1);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn clear_pattern_and_clear() -> Result<(), anyhow::Error> {
        let now = Arc::new(AtomicI64::new(NOW));
        let (cache, dir) = temp_cache(now.clone()).await?;
        cache.set("github.listIssues.aaaa", Value::Null, 10).await?;
        cache.set("github.getIssue.bbbb", Value::Null, 10).await?;
        cache.set("gitlab.listIssues.cccc", Value::Null, 10).await?;

        assert_eq!(cache.clear_pattern("github.").await?, 2);
        let keys: Vec<String> = cache.get_all_entries().await.into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["gitlab.listIssues.cccc"]);

        // survives a reopen
        let reopened = CacheStorage::open(&dir, "test").await?;
        assert_eq!(reopened.get_stats().await.total_entries, 1);

        cache.clear().await?;
        assert_eq!(cache.get_stats().await.total_entries, 0);
        assert_eq!(CacheStorage::open(&dir, "test").await?.get_stats().await.total_entries, 0);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn stats_flag_expired_entries_without_evicting() -> Result<(), anyhow::Error> {
        let now = Arc::new(AtomicI64::new(NOW));
        let (cache, dir) = temp_cache(now.clone()).await?;
        cache.set("a.b.1", Value::Bool(true), 1).await?;
        cache.set("a.b.2", Value::Bool(false), 100).await?;

        now.store(NOW + 5_000, Ordering::SeqCst);
        let stats = cache.get_stats().await;
        assert_eq!((stats.total_entries, stats.valid_entries, stats.expired_entries), (2, 1, 1));
        let entries = cache.get_all_entries().await;
        assert!(entries[0].expired);
        assert!(!entries[1].expired);

        assert!(cache.invalidate("a.b.2").await?);
        assert!(!cache.invalidate("a.b.2").await?);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
