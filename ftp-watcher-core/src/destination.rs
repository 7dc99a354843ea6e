//! Remote URL decomposition.
//!
//! `ftp://host/a/b/c/` is split into scheme `ftp`, host `host` and segments
//! `["a", "b", "c"]`. The provisioner uses [`RemoteUrl::ancestor_chain`] to
//! create every directory from the host root downward; the FTP client uses
//! [`RemoteUrl::authority`] and [`RemoteUrl::path`] to address the server.

use std::sync::LazyLock;

use regex::Regex;

/// Scheme assumed when a URL has none.
pub const DEFAULT_SCHEME: &str = "ftp";

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://)?(?P<host>[^/:]+(?::\d+)?)(?P<rest>/.*)?$")
        .expect("URL pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub scheme: String,
    /// Host, including an explicit `:port` when present.
    pub host: String,
    /// Non-empty path segments, in order.
    pub segments: Vec<String>,
}

impl RemoteUrl {
    pub fn parse(url: &str) -> Option<Self> {
        let caps = URL_PATTERN.captures(url.trim())?;
        let scheme = caps
            .name("scheme")
            .map_or(DEFAULT_SCHEME, |m| m.as_str())
            .to_ascii_lowercase();
        let host = caps.name("host")?.as_str().to_owned();
        let segments = caps
            .name("rest")
            .map(|m| {
                m.as_str()
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            scheme,
            host,
            segments,
        })
    }

    /// `scheme://host/`
    pub fn root(&self) -> String {
        format!("{}://{}/", self.scheme, self.host)
    }

    /// Directory URLs from the first segment down to the last:
    /// `scheme://host/a/`, `scheme://host/a/b/`, ...
    pub fn ancestor_chain(&self) -> Vec<String> {
        let mut current = self.root();
        self.segments
            .iter()
            .map(|segment| {
                current.push_str(segment);
                current.push('/');
                current.clone()
            })
            .collect()
    }

    /// `host:port`, using `default_port` if the URL names none.
    pub fn authority(&self, default_port: u16) -> String {
        if self.host.contains(':') {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, default_port)
        }
    }

    /// Path relative to the login directory, without leading or trailing `/`.
    /// Empty for the server root.
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}
