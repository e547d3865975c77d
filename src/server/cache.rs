//! Summary cache keyed by video id.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::core::config::ServerConfig;
use crate::summarizer::SummaryReport;

/// Cache entry with TTL.
#[derive(Clone)]
struct CacheEntry {
    report: SummaryReport,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(report: SummaryReport, ttl: Duration) -> Self {
        Self {
            report,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe cache of finished summaries.
pub struct SummaryCache {
    enabled: bool,
    ttl: Duration,
    max_entries: usize,
    entries: DashMap<String, CacheEntry>,
}

impl SummaryCache {
    /// Create a cache from the server settings.
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            enabled: config.cache_enabled,
            ttl: Duration::from_secs(config.cache_ttl_seconds),
            max_entries: config.cache_max_entries.max(1),
            entries: DashMap::new(),
        }
    }

    /// Get the cached report for a video.
    #[must_use]
    pub fn get(&self, video_id: &str) -> Option<SummaryReport> {
        if !self.enabled {
            return None;
        }

        self.entries.get(video_id).and_then(|entry| {
            if entry.is_expired() {
                drop(entry);
                self.entries.remove(video_id);
                None
            } else {
                Some(entry.report.clone())
            }
        })
    }

    /// Cache a report for a video.
    pub fn insert(&self, video_id: &str, report: &SummaryReport) {
        if !self.enabled {
            return;
        }

        self.enforce_max_entries();
        self.entries
            .insert(video_id.to_string(), CacheEntry::new(report.clone(), self.ttl));
    }

    /// Number of live and not yet collected entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove expired entries.
    pub fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    /// Make room for one insert, dropping expired entries first, then the soonest to expire.
    fn enforce_max_entries(&self) {
        if self.entries.len() < self.max_entries {
            return;
        }

        self.cleanup_expired();

        if self.entries.len() >= self.max_entries {
            let mut by_expiry: Vec<(String, Instant)> = self
                .entries
                .iter()
                .map(|entry| (entry.key().clone(), entry.expires_at))
                .collect();
            by_expiry.sort_by_key(|(_, expires_at)| *expires_at);

            let to_remove = self.entries.len() - self.max_entries + 1;
            for (key, _) in by_expiry.into_iter().take(to_remove) {
                self.entries.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn report(summary: &str) -> SummaryReport {
        SummaryReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            backend: "placeholder".to_string(),
            original_chars: 100,
            target_chars: 30,
            chunk_count: 1,
            chunk_summaries: Vec::new(),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn test_cache_roundtrip() {
        let cache = SummaryCache::new(&ServerConfig::default());
        cache.insert("dQw4w9WgXcQ", &report("short"));

        let cached = cache.get("dQw4w9WgXcQ");
        assert_eq!(cached.map(|r| r.summary), Some("short".to_string()));
        assert!(cache.get("other000000").is_none());
    }

    #[test]
    fn test_cache_disabled() {
        let config = ServerConfig {
            cache_enabled: false,
            ..ServerConfig::default()
        };
        let cache = SummaryCache::new(&config);
        cache.insert("dQw4w9WgXcQ", &report("short"));

        assert!(cache.get("dQw4w9WgXcQ").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_expires() {
        let config = ServerConfig {
            cache_ttl_seconds: 0,
            ..ServerConfig::default()
        };
        let cache = SummaryCache::new(&config);
        cache.insert("dQw4w9WgXcQ", &report("short"));
        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get("dQw4w9WgXcQ").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_respects_max_entries() {
        let config = ServerConfig {
            cache_max_entries: 2,
            ..ServerConfig::default()
        };
        let cache = SummaryCache::new(&config);
        cache.insert("first000000", &report("1"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("second00000", &report("2"));
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("third000000", &report("3"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("first000000").is_none());
        assert!(cache.get("third000000").is_some());
    }
}
