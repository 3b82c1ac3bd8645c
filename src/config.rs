//! Target configuration.
//!
//! Targets come from a YAML or JSON file, or from the built-in presets when no
//! file is given. Each competitor is either a base URL, from which the usual
//! feed locations are derived, or an explicit list of feed and page endpoints.
//!
//! ```yaml
//! competitors:
//!   OpenAI: https://openai.com/blog
//!   Google AI:
//!     feeds: [https://blog.google/technology/ai/rss/]
//!     pages: [https://blog.google/technology/ai/]
//! settings:
//!   pace_ms: 2000
//! ```

use crate::error::ConfigError;
use crate::fetch::DEFAULT_USER_AGENT;
use crate::models::{SourceEndpoint, Target};
use crate::orchestrator::Timeouts;
use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Feed paths tried under a bare base URL, in priority order.
const DERIVED_FEED_PATHS: &[&str] = &["rss.xml", "rss", "feed", "feed.xml", "atom.xml"];

/// Runtime knobs, all optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minimum spacing between request starts, in milliseconds.
    pub pace_ms: u64,
    pub feed_timeout_secs: u64,
    pub page_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pace_ms: 2000,
            feed_timeout_secs: 10,
            page_timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Settings {
    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            feed: Duration::from_secs(self.feed_timeout_secs),
            page: Duration::from_secs(self.page_timeout_secs),
        }
    }
}

/// How one competitor's endpoints are declared.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TargetSpec {
    /// A site or blog root; endpoints are derived from it.
    Base(String),
    /// Explicit endpoint lists, each in priority order.
    Endpoints {
        #[serde(default)]
        feeds: Vec<String>,
        #[serde(default)]
        pages: Vec<String>,
    },
}

impl TargetSpec {
    fn endpoint_urls(&self) -> (Vec<String>, Vec<String>) {
        match self {
            TargetSpec::Base(base) => {
                let root = base.trim().trim_end_matches('/');
                let feeds = DERIVED_FEED_PATHS
                    .iter()
                    .map(|path| format!("{root}/{path}"))
                    .collect();
                (feeds, vec![base.trim().to_string()])
            }
            TargetSpec::Endpoints { feeds, pages } => (feeds.clone(), pages.clone()),
        }
    }

    /// Resolve into a [`Target`], validating every URL and dropping duplicates.
    pub fn to_target(&self, name: &str) -> Result<Target, ConfigError> {
        let (feeds, pages) = self.endpoint_urls();
        let feeds = validated(name, feeds)?;
        let pages = validated(name, pages)?;

        let endpoints: Vec<SourceEndpoint> = feeds
            .into_iter()
            .map(SourceEndpoint::feed)
            .chain(pages.into_iter().map(SourceEndpoint::page))
            .collect();
        Ok(Target::new(name, endpoints))
    }
}

fn validated(target: &str, urls: Vec<String>) -> Result<Vec<String>, ConfigError> {
    urls.into_iter()
        .map(|u| u.trim().to_string())
        .unique()
        .map(|u| match Url::parse(&u) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(u),
            _ => Err(ConfigError::InvalidUrl {
                target: target.to_string(),
                url: u,
            }),
        })
        .collect()
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub competitors: BTreeMap<String, TargetSpec>,
    #[serde(default)]
    pub settings: Settings,
}

fn endpoints(feeds: &[&str], pages: &[&str]) -> TargetSpec {
    TargetSpec::Endpoints {
        feeds: feeds.iter().map(|s| s.to_string()).collect(),
        pages: pages.iter().map(|s| s.to_string()).collect(),
    }
}

impl TrackerConfig {
    /// Presets used when no config file is given.
    pub fn builtin() -> Self {
        let mut competitors = BTreeMap::new();
        competitors.insert(
            "OpenAI".to_string(),
            endpoints(
                &[
                    "https://openai.com/blog/rss.xml",
                    "https://openai.com/rss",
                    "https://openai.com/feed",
                    "https://openai.com/blog/feed",
                ],
                &[
                    "https://openai.com/research",
                    "https://openai.com/blog/tags/research",
                    "https://openai.com/api/blog",
                ],
            ),
        );
        competitors.insert(
            "Google AI".to_string(),
            endpoints(
                &[
                    "https://blog.google/technology/ai/rss/",
                    "https://ai.googleblog.com/feeds/posts/default",
                    "https://blog.google/rss/",
                ],
                &[
                    "https://blog.google/technology/ai/",
                    "https://ai.googleblog.com/",
                    "https://research.google/blog/",
                ],
            ),
        );
        Self {
            competitors,
            settings: Settings::default(),
        }
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from disk. `.yaml` and `.yml` files are read as YAML, anything else as JSON.
    #[instrument(level = "info", skip_all, fields(%path))]
    pub async fn load(path: &str) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_string(),
                source,
            })?;

        let is_yaml = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let config = if is_yaml {
            Self::from_yaml_str(&text)?
        } else {
            Self::from_json_str(&text)?
        };
        info!(competitors = config.competitors.len(), "Loaded configuration");
        Ok(config)
    }

    /// Targets in name order, restricted to `only` (case-insensitive) when it is non-empty.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidUrl`] for a bad endpoint, [`ConfigError::NoTargets`]
    /// when nothing is left after filtering.
    pub fn targets(&self, only: &[String]) -> Result<Vec<Target>, ConfigError> {
        for wanted in only {
            if !self.competitors.keys().any(|k| k.eq_ignore_ascii_case(wanted)) {
                warn!(competitor = %wanted, "Requested target is not configured");
            }
        }

        let targets = self
            .competitors
            .iter()
            .filter(|(name, _)| {
                only.is_empty() || only.iter().any(|w| w.eq_ignore_ascii_case(name))
            })
            .map(|(name, spec)| spec.to_target(name))
            .collect::<Result<Vec<_>, _>>()?;

        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        debug!(
            targets = %targets.iter().map(|t| t.name.as_str()).join(", "),
            "Selected targets"
        );
        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EndpointKind;

    const YAML: &str = r#"
competitors:
  Acme: https://acme.test/blog/
  Lab:
    feeds:
      - https://lab.test/rss
      - https://lab.test/rss
    pages: [https://lab.test/news]
settings:
  pace_ms: 500
"#;

    fn urls(target: &Target, kind: EndpointKind) -> Vec<&str> {
        target
            .endpoints
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.url.as_str())
            .collect()
    }

    #[test]
    fn test_yaml_mixes_base_and_explicit_targets() {
        let config = TrackerConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.settings.pace_ms, 500);
        assert_eq!(config.settings.feed_timeout_secs, 10);
        assert_eq!(
            config.competitors["Acme"],
            TargetSpec::Base("https://acme.test/blog/".to_string())
        );
        assert!(matches!(config.competitors["Lab"], TargetSpec::Endpoints { .. }));
    }

    #[test]
    fn test_base_url_derives_feed_endpoints() {
        let config = TrackerConfig::from_yaml_str(YAML).unwrap();
        let targets = config.targets(&[]).unwrap();
        let acme = &targets[0];
        assert_eq!(acme.name, "Acme");
        assert_eq!(
            urls(acme, EndpointKind::Feed),
            vec![
                "https://acme.test/blog/rss.xml",
                "https://acme.test/blog/rss",
                "https://acme.test/blog/feed",
                "https://acme.test/blog/feed.xml",
                "https://acme.test/blog/atom.xml",
            ]
        );
        assert_eq!(urls(acme, EndpointKind::Page), vec!["https://acme.test/blog/"]);
    }

    #[test]
    fn test_duplicate_endpoints_removed() {
        let config = TrackerConfig::from_yaml_str(YAML).unwrap();
        let targets = config.targets(&["lab".to_string()]).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(urls(&targets[0], EndpointKind::Feed), vec!["https://lab.test/rss"]);
    }

    #[test]
    fn test_json_config() {
        let json = r#"{"competitors": {"Acme": {"pages": ["https://acme.test/"]}}}"#;
        let config = TrackerConfig::from_json_str(json).unwrap();
        assert_eq!(config.settings, Settings::default());
        let targets = config.targets(&[]).unwrap();
        assert_eq!(targets[0].feeds().count(), 0);
        assert_eq!(targets[0].pages().count(), 1);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = TrackerConfig::from_yaml_str("competitors:\n  Bad: not a url\n").unwrap();
        assert!(matches!(
            config.targets(&[]),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_unknown_filter_leaves_no_targets() {
        let config = TrackerConfig::builtin();
        assert!(matches!(
            config.targets(&["Nobody".to_string()]),
            Err(ConfigError::NoTargets)
        ));
    }

    #[test]
    fn test_builtin_targets_in_name_order() {
        let targets = TrackerConfig::builtin().targets(&[]).unwrap();
        let names: Vec<_> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Google AI", "OpenAI"]);
        let openai = &targets[1];
        assert_eq!(
            openai.feeds().next().map(|e| e.url.as_str()),
            Some("https://openai.com/blog/rss.xml")
        );
        assert_eq!(
            openai.pages().next().map(|e| e.url.as_str()),
            Some("https://openai.com/research")
        );
    }

    #[test]
    fn test_settings_conversions() {
        let settings = Settings::default();
        assert_eq!(settings.pace(), Duration::from_secs(2));
        assert_eq!(settings.timeouts(), Timeouts::default());
    }

    #[tokio::test]
    async fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("targets.yml");
        tokio::fs::write(&yaml_path, YAML).await.unwrap();
        let config = TrackerConfig::load(yaml_path.to_str().unwrap()).await.unwrap();
        assert_eq!(config.competitors.len(), 2);

        let json_path = dir.path().join("targets.json");
        tokio::fs::write(&json_path, YAML).await.unwrap();
        assert!(matches!(
            TrackerConfig::load(json_path.to_str().unwrap()).await,
            Err(ConfigError::Json(_))
        ));

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            TrackerConfig::load(missing.to_str().unwrap()).await,
            Err(ConfigError::Io { .. })
        ));
    }
}
