use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::models::Assignment;

const ASSIGNMENTS_CACHE: &str = "assignments";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(self.cache_path(name), contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        Ok(())
    }

    pub fn load_assignments(&self) -> Result<Option<CachedData<Vec<Assignment>>>> {
        self.load(ASSIGNMENTS_CACHE)
    }

    pub fn save_assignments(&self, assignments: &[Assignment]) -> Result<()> {
        self.save(ASSIGNMENTS_CACHE, &assignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn aged(minutes: i64) -> CachedData<()> {
        let mut cached = CachedData::new(());
        cached.cached_at = Utc::now() - Duration::minutes(minutes);
        cached
    }

    #[test]
    fn test_age_display() {
        assert_eq!(CachedData::new(vec![1]).age_display(), "just now");
        assert_eq!(aged(5).age_display(), "5m ago");
        assert_eq!(aged(60 + 10).age_display(), "1h ago");
        assert_eq!(aged(60 + 40).age_display(), "2h ago");
        assert_eq!(aged(3 * 1440 + 60).age_display(), "3d ago");
        assert_eq!(aged(1440 + 13 * 60).age_display(), "2d ago");
    }

    #[test]
    fn test_age_display_clock_skew() {
        assert_eq!(aged(-30).age_display(), "just now");
    }

    #[test]
    fn test_assignments_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(dir.path().join("cache")).unwrap();

        assert!(cache.load_assignments().unwrap().is_none());

        let list = vec![Assignment {
            course: "CS50".to_string(),
            title: "PSet 1".to_string(),
            due: "2024-01-10".to_string(),
        }];
        cache.save_assignments(&list).unwrap();

        let cached = cache.load_assignments().unwrap().unwrap();
        assert_eq!(cached.data, list);
        assert!(cached.age_minutes() <= 1);
    }
}
