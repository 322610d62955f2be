//! Learnosity JSON pre-processing
//!
//! Normalizes incoming Learnosity JSON before export: HTML entities that
//! XML does not define are rewritten to numeric references, and feature
//! spans embedded in content markup become QTI object elements.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FEATURE_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<span[^>]*class="[^"]*learnosity-feature[^"]*"[^>]*data-src="([^"]+)"[^>]*>\s*</span>"#,
    )
    .unwrap()
});

/// Rewrite every string value in place, recursively.
pub fn preprocess_item_json(value: &mut Value) {
    match value {
        Value::String(s) => *s = preprocess_markup(s),
        Value::Array(items) => items.iter_mut().for_each(preprocess_item_json),
        Value::Object(map) => map.values_mut().for_each(preprocess_item_json),
        _ => {}
    }
}

/// Normalize one markup string.
pub fn preprocess_markup(markup: &str) -> String {
    // &nbsp; is an HTML entity XML parsers reject; the numeric reference
    // survives both.
    let markup = markup.replace("&nbsp;", "&#160;");
    FEATURE_SPAN
        .replace_all(&markup, r#"<object type="audio/mpeg" data="$1"/>"#)
        .into_owned()
}
