//! Asset-size codes and URL cleanup for resolved assets.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static SIZE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([a-z0-9]+)\.jpg$").expect("size suffix regex is valid"));

/// Label used when the asset came from the explicit original-size link.
pub const ORIGINAL_LABEL: &str = "Original";

/// Human-readable label for a size code from an asset filename.
///
/// Unknown codes are returned upper-cased.
#[must_use]
pub fn tier_label(code: &str) -> String {
    let code = code.to_ascii_uppercase();
    let label = match code.as_str() {
        "O" => ORIGINAL_LABEL,
        "5K" => "X-Large 5K",
        "4K" => "X-Large 4K",
        "3K" => "X-Large 3K",
        "K" => "Large 2048",
        "H" => "Large 1600",
        "L" | "B" => "Large 1024",
        "C" => "Medium 800",
        "Z" => "Medium 640",
        _ => return code,
    };
    label.to_string()
}

/// Classifies an asset URL by its `_<code>.jpg` suffix.
///
/// Returns `None` when the URL carries no recognisable suffix.
#[must_use]
pub fn classify_asset_url(url: &str) -> Option<String> {
    SIZE_SUFFIX
        .captures(url)
        .map(|captures| tier_label(&captures[1]))
}

/// Repairs the URL shapes asset elements are known to report.
///
/// - `https:https://host/...` loses the duplicated scheme
/// - protocol-relative `//host/...` gets `https:`
/// - `http://` and `https://` URLs are kept
/// - anything else is treated as a bare host path and gets `https://`
#[must_use]
pub fn normalize_asset_url(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix("https:https://") {
        return format!("https://{rest}");
    }
    if raw.starts_with("//") {
        return format!("https:{raw}");
    }
    if raw.starts_with("https://") || raw.starts_with("http://") {
        return raw.to_string();
    }
    format!("https://{}", raw.trim_start_matches('/'))
}
