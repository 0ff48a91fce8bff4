//! Cache Statistics

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of cache activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Slot count
    pub capacity: usize,
    /// Occupied slots
    pub entries: usize,
    /// Lookups performed
    pub queries: u64,
    /// Lookups that found their block
    pub hits: u64,
    /// Insertions that overwrote a live entry
    pub evictions: u64,
    /// `hits / queries`, absent before the first lookup
    pub hit_rate: Option<f64>,
}

impl CacheStats {
    pub fn misses(&self) -> u64 {
        self.queries.saturating_sub(self.hits)
    }

    /// Fraction of slots in use (0.0 - 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.entries as f64 / self.capacity as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_values() {
        let stats = CacheStats {
            capacity: 4,
            entries: 2,
            queries: 10,
            hits: 7,
            evictions: 0,
            hit_rate: Some(0.7),
        };
        assert_eq!(stats.misses(), 3);
        assert!((stats.utilization() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_misses_never_underflow() {
        let stats: CacheStats = serde_json::from_str(
            r#"{"capacity":2,"entries":1,"queries":1,"hits":3,"evictions":0,"hit_rate":null}"#,
        )
        .unwrap();
        assert_eq!(stats.misses(), 0);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats {
            capacity: 2,
            entries: 0,
            queries: 0,
            hits: 0,
            evictions: 0,
            hit_rate: None,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["capacity"], 2);
        assert!(json["hit_rate"].is_null());
    }
}
