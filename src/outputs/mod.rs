//! Report output: Markdown for reading, JSON for machines.

pub mod json;
pub mod markdown;

use crate::models::RequestSummary;
use crate::utils::slugify_title;

/// File-name slug for a report: the requested categories, then the query.
pub fn report_slug(request: &RequestSummary) -> String {
    let mut parts = request.categories.clone();
    if let Some(q) = request.query.as_deref().filter(|q| !q.trim().is_empty()) {
        parts.push(q.to_string());
    }
    let slug = slugify_title(&parts.join(" "));
    if slug.is_empty() {
        "dashboard".to_string()
    } else {
        slug
    }
}
