use std::fmt;

use thiserror::Error;
use url::Url;

const WEB_CLIENT_JOIN_PREFIX: &str = "https://app.zoom.us/wc/join/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("calendar redirect link has no `q` target: {0}")]
    MissingRedirectTarget(String),
}

/// A meeting link reduced to the browser-client join URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingLink {
    join_url: String,
}

impl MeetingLink {
    /// Accepts links as pasted from a shell, an invite, or a calendar event.
    ///
    /// Backslashes inserted by shell escaping are dropped, a Google redirect
    /// is unwrapped to its `q` target, and whatever host and path prefix the
    /// link carries is replaced so it opens the web client directly instead
    /// of prompting for the desktop app.
    pub fn parse(raw: &str) -> Result<Self, LinkError> {
        let cleaned = raw.replace('\\', "");

        let target = match Url::parse(&cleaned) {
            Ok(parsed) if is_google_redirect(&parsed) => parsed
                .query_pairs()
                .find(|(key, _)| key == "q")
                .map(|(_, value)| value.into_owned())
                .ok_or_else(|| LinkError::MissingRedirectTarget(cleaned.clone()))?,
            _ => cleaned,
        };

        let last_segment = target.rsplit('/').next().unwrap_or_default();
        Ok(Self {
            join_url: format!("{WEB_CLIENT_JOIN_PREFIX}{last_segment}"),
        })
    }

    pub fn join_url(&self) -> &str {
        &self.join_url
    }

    /// Meeting number without the password query, for logs.
    pub fn meeting_id(&self) -> &str {
        let tail = &self.join_url[WEB_CLIENT_JOIN_PREFIX.len()..];
        tail.split('?').next().unwrap_or_default()
    }
}

fn is_google_redirect(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| host.contains("google.com"))
}

impl fmt::Display for MeetingLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join_url)
    }
}

#[cfg(test)]
#[path = "tests/link_tests.rs"]
mod tests;
