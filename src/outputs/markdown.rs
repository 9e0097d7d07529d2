//! Markdown rendering of dashboard reports and notices.
//!
//! # Layout
//!
//! ```text
//! # News dashboard: Business, Technology
//! ## Articles            (table: title, source, published, category, sentiment)
//! ## Top words
//! ## Top sources
//! ## Sentiment distribution
//! ## Entities            (one subsection per analyzed article)
//! ## Failed categories   (only when a fetch failed)
//! ```

use crate::models::{CategoryFailure, DashboardReport, ReportArticle};
use crate::outputs::report_slug;
use crate::pipeline::Notice;
use crate::utils::upcase;
use chrono::Local;
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Escape text for a table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn source_cell(row: &ReportArticle) -> String {
    let raw = &row.article.raw;
    match (&raw.source_name, raw.source_tag()) {
        (Some(name), _) => cell(name),
        (None, Some(tag)) => format!("<small>`{tag}`</small>"),
        (None, None) => String::new(),
    }
}

fn title_cell(row: &ReportArticle) -> String {
    let raw = &row.article.raw;
    let title = cell(raw.title.as_deref().unwrap_or("(untitled)"));
    match &raw.url {
        Some(url) if !url.is_empty() => format!("[{title}]({url})"),
        _ => title,
    }
}

/// Render a full report.
pub fn report_to_markdown(report: &DashboardReport) -> String {
    let mut md = String::new();
    let categories = report
        .request
        .categories
        .iter()
        .map(|c| upcase(c))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(md, "# News dashboard: {categories}\n");
    let _ = write!(
        md,
        "_Generated {}",
        report.generated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    if let Some(q) = &report.request.query {
        let _ = write!(md, " · query `{q}`");
    }
    if let Some(country) = &report.request.country {
        let _ = write!(md, " · country `{country}`");
    }
    let _ = writeln!(md, " · {} articles_\n", report.articles.len());

    let _ = writeln!(md, "## Articles\n");
    let _ = writeln!(md, "| Title | Source | Published | Category | Sentiment |");
    let _ = writeln!(md, "|---|---|---|---|---|");
    for row in &report.articles {
        let published = row
            .article
            .raw
            .published_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let sentiment = row.sentiment.map(|s| s.to_string()).unwrap_or_default();
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} |",
            title_cell(row),
            source_cell(row),
            published,
            cell(&row.article.raw.category),
            sentiment
        );
    }

    let _ = writeln!(md, "\n## Top words\n");
    if report.top_words.is_empty() {
        let _ = writeln!(md, "_No words left after cleaning._");
    } else {
        let _ = writeln!(md, "| Word | Count |\n|---|---|");
        for wc in &report.top_words {
            let _ = writeln!(md, "| {} | {} |", wc.word, wc.count);
        }
    }

    let _ = writeln!(md, "\n## Top sources\n");
    for sc in &report.top_sources {
        let _ = writeln!(md, "- **{}**: {}", cell(&sc.source), sc.count);
    }

    let _ = writeln!(md, "\n## Sentiment distribution\n");
    for sc in &report.sentiment_distribution {
        let _ = writeln!(md, "- {}: {}", sc.sentiment, sc.count);
    }

    let _ = writeln!(md, "\n## Entities\n");
    for item in &report.entities {
        let _ = writeln!(
            md,
            "### {}\n",
            item.title.as_deref().unwrap_or("(untitled)")
        );
        if item.entities.is_empty() {
            let _ = writeln!(md, "_None found._\n");
            continue;
        }
        for entity in &item.entities {
            let _ = writeln!(md, "- {} `{}`", entity.text, entity.label);
        }
        md.push('\n');
    }

    if !report.failures.is_empty() {
        let _ = writeln!(md, "## Failed categories\n");
        write_failures(&mut md, &report.failures);
    }
    md
}

fn write_failures(md: &mut String, failures: &[CategoryFailure]) {
    for failure in failures {
        let _ = writeln!(md, "- **{}**: {}", failure.category, failure.message);
    }
}

/// Render a notice shown instead of a report.
pub fn notice_to_markdown(notice: Notice, failures: &[CategoryFailure]) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "> **Warning:** {notice}");
    if !failures.is_empty() {
        let _ = writeln!(md, "\n## Failed categories\n");
        write_failures(&mut md, failures);
    }
    md
}

/// Write `report` to `{markdown_output_dir}/{date}_{slug}.md`.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_report(
    report: &DashboardReport,
    markdown_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let date = report.generated_at.with_timezone(&Local).date_naive();
    let path = Path::new(markdown_output_dir).join(format!(
        "{}_{}.md",
        date,
        report_slug(&report.request)
    ));
    fs::create_dir_all(markdown_output_dir).await?;
    fs::write(&path, report_to_markdown(report)).await?;
    info!(path = %path.display(), "Wrote Markdown report");
    Ok(path)
}
