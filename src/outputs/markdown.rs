//! Markdown report generation.
//!
//! One `##` section per target in run order, one bullet per article. Targets
//! that came back empty keep their section so a missing competitor is visible
//! in the report.

use crate::models::{CanonicalArticle, TargetReport};
use chrono::{DateTime, Local};
use std::error::Error;
use std::fmt::{self, Write};
use tokio::fs;
use tracing::{info, instrument};

const DATE_NOT_FOUND: &str = "Date not found";
const NO_ARTICLES: &str = "_No articles found._";

/// Path of the Markdown report for `date` (`YYYY-MM-DD`).
pub fn report_path(markdown_output_dir: &str, date: &str) -> String {
    format!(
        "{}/competitor-report-{}.md",
        markdown_output_dir.trim_end_matches('/'),
        date
    )
}

fn write_article(md: &mut String, article: &CanonicalArticle) -> fmt::Result {
    writeln!(md, "- **{}**", article.title)?;
    writeln!(md, "  - Link: {}", article.link)?;
    writeln!(
        md,
        "  - Date: {}\n",
        article.date.as_deref().unwrap_or(DATE_NOT_FOUND)
    )
}

/// Render the full report.
pub fn render_report(
    reports: &[TargetReport],
    date: &str,
    generated_at: DateTime<Local>,
) -> Result<String, fmt::Error> {
    let total: usize = reports.iter().map(|r| r.articles.len()).sum();
    let mut md = String::new();

    writeln!(md, "# AI Competitor Intelligence Report - {date}\n")?;
    writeln!(md, "Generated on: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(md, "## Summary")?;
    writeln!(md, "Found {total} recent articles/updates across competitors.\n")?;

    for report in reports {
        writeln!(md, "## {}\n", report.target)?;
        if report.is_empty() {
            writeln!(md, "{NO_ARTICLES}\n")?;
            continue;
        }
        for article in &report.articles {
            write_article(&mut md, article)?;
        }
    }
    Ok(md)
}

/// Render and write the report to `{markdown_output_dir}/competitor-report-{date}.md`.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_report(
    reports: &[TargetReport],
    markdown_output_dir: &str,
    date: &str,
    generated_at: DateTime<Local>,
) -> Result<String, Box<dyn Error>> {
    let md = render_report(reports, date, generated_at)?;
    fs::create_dir_all(markdown_output_dir).await?;
    let path = report_path(markdown_output_dir, date);
    fs::write(&path, md).await?;
    info!(%path, "Wrote Markdown report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use chrono::{TimeZone, Utc};

    fn article(title: &str, date: Option<&str>) -> CanonicalArticle {
        CanonicalArticle {
            title: title.to_string(),
            link: format!("https://lab.test/{}", title.to_lowercase()),
            description: None,
            date: date.map(str::to_string),
            source: "Lab RSS (https://lab.test/rss)".to_string(),
            scraped_at: Utc::now(),
        }
    }

    fn reports() -> Vec<TargetReport> {
        vec![
            TargetReport {
                target: "Lab".to_string(),
                articles: vec![article("Alpha", Some("2025-05-01")), article("Beta", None)],
                resolved_by: None,
                diagnostics: Vec::new(),
            },
            TargetReport {
                target: "Quiet".to_string(),
                articles: Vec::new(),
                resolved_by: None,
                diagnostics: vec![ScrapeError::NoArticlesFound {
                    target: "Quiet".to_string(),
                }],
            },
        ]
    }

    fn generated_at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 5, 6, 9, 15, 0).unwrap()
    }

    #[test]
    fn test_render_report_layout() {
        let md = render_report(&reports(), "2025-05-06", generated_at()).unwrap();
        let expected = "# AI Competitor Intelligence Report - 2025-05-06\n\n\
                        Generated on: 2025-05-06 09:15:00\n\n\
                        ## Summary\n\
                        Found 2 recent articles/updates across competitors.\n\n\
                        ## Lab\n\n\
                        - **Alpha**\n  - Link: https://lab.test/alpha\n  - Date: 2025-05-01\n\n\
                        - **Beta**\n  - Link: https://lab.test/beta\n  - Date: Date not found\n\n\
                        ## Quiet\n\n\
                        _No articles found._\n\n";
        assert_eq!(md, expected);
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        let path = write_report(&reports(), out, "2025-05-06", generated_at())
            .await
            .unwrap();
        assert!(path.ends_with("competitor-report-2025-05-06.md"));
        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(text.contains("## Quiet"));
    }
}
