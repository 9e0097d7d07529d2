//! Plain-text extraction for API text fields.
//!
//! GNews descriptions occasionally carry inline HTML (`<b>`, `<a href>`,
//! entities like `&amp;`). Entity spans are reported as surface text, so the
//! markup is removed before tagging.

use scraper::Html;

/// Return the text content of `fragment` with tags removed and entities decoded.
///
/// Text without any `<` or `&` is returned as is.
pub fn strip_markup(fragment: &str) -> String {
    if !fragment.contains('<') && !fragment.contains('&') {
        return fragment.to_string();
    }
    let parsed = Html::parse_fragment(fragment);
    parsed.root_element().text().collect::<Vec<_>>().join("")
}
