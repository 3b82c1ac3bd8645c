//! JSON output of the canonical record set.

use crate::models::CanonicalArticle;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the JSON file for `date` (`YYYY-MM-DD`).
pub fn articles_path(json_output_dir: &str, date: &str) -> String {
    format!(
        "{}/competitor-articles-{}.json",
        json_output_dir.trim_end_matches('/'),
        date
    )
}

/// Write all records of a run to `{json_output_dir}/competitor-articles-{date}.json`.
///
/// Records keep the order they were produced in: targets in run order, and
/// each target's records in extraction order.
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
#[instrument(level = "info", skip_all, fields(%json_output_dir, count = articles.len()))]
pub async fn write_articles(
    articles: &[CanonicalArticle],
    json_output_dir: &str,
    date: &str,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(articles)?;

    if let Err(e) = fs::create_dir_all(json_output_dir).await {
        error!(%json_output_dir, error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = articles_path(json_output_dir, date);
    fs::write(&path, json).await?;
    info!(%path, "Wrote JSON article file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(title: &str) -> CanonicalArticle {
        CanonicalArticle {
            title: title.to_string(),
            link: format!("https://lab.test/{title}"),
            description: None,
            date: Some("2025-05-06".to_string()),
            source: "Lab RSS (https://lab.test/rss)".to_string(),
            scraped_at: Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_articles_path() {
        assert_eq!(
            articles_path("reports/", "2025-05-06"),
            "reports/competitor-articles-2025-05-06.json"
        );
    }

    #[tokio::test]
    async fn test_write_articles_pretty_array() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("nested");
        let out_dir = out_dir.to_str().unwrap();

        let path = write_articles(&[article("one"), article("two")], out_dir, "2025-05-06")
            .await
            .unwrap();
        let text = tokio::fs::read_to_string(&path).await.unwrap();

        assert!(text.starts_with("[\n"));
        let parsed: Vec<CanonicalArticle> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].title, "one");
        assert!(text.contains("\"scraped_at\": \"2025-05-06T12:00:00Z\""));
    }

    #[tokio::test]
    async fn test_write_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_articles(&[], dir.path().to_str().unwrap(), "2025-05-06")
            .await
            .unwrap();
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "[]");
    }
}
