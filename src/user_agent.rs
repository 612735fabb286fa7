//! Shared User-Agent string for the browser session and the asset fetcher.
//!
//! Asset hosts and album pages see the same desktop-browser identity, so one
//! string feeds both clients.

/// Desktop Chrome User-Agent sent by the browser and by [`HttpClient`](crate::download::HttpClient).
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Chromium command-line flag that applies [`BROWSER_USER_AGENT`].
#[must_use]
pub(crate) fn browser_user_agent_arg() -> String {
    format!("--user-agent={BROWSER_USER_AGENT}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_user_agent_arg_embeds_agent() {
        let arg = browser_user_agent_arg();
        assert!(arg.starts_with("--user-agent=Mozilla/5.0"));
        assert!(arg.ends_with(BROWSER_USER_AGENT));
    }

    #[test]
    fn test_browser_user_agent_has_no_tool_marker() {
        assert!(!BROWSER_USER_AGENT.contains("Headless"));
        assert!(BROWSER_USER_AGENT.contains("Chrome/"));
    }
}
