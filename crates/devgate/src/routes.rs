//! Immutable prefix route table.
//!
//! Built once at startup from static configuration, validated, then shared
//! read-only across request handlers. Longest matching prefix wins; a
//! duplicate prefix is rejected at construction so no tie can exist at
//! request time.

use reqwest::Url;

use crate::config::RouteConfig;
use crate::error::ConfigError;

/// A validated route table entry.
#[derive(Debug, Clone)]
pub struct Route {
    pub prefix: String,
    pub target: Url,
    pub rewrite_origin: bool,
    pub verify_tls: bool,
    pub timeout_secs: u64,
}

/// Prefix-to-origin routing table. Immutable after construction.
#[derive(Debug)]
pub struct RouteTable {
    /// Sorted by descending prefix length so the first `starts_with` hit
    /// is the longest match.
    routes: Vec<Route>,
}

impl RouteTable {
    /// Validate and build the table from configuration entries.
    pub fn from_config(entries: &[RouteConfig]) -> Result<Self, ConfigError> {
        let mut routes = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.prefix.is_empty() {
                return Err(ConfigError::EmptyPrefix);
            }
            if routes.iter().any(|r: &Route| r.prefix == entry.prefix) {
                return Err(ConfigError::DuplicatePrefix(entry.prefix.clone()));
            }

            let target = Url::parse(&entry.target).map_err(|e| ConfigError::InvalidOrigin {
                prefix: entry.prefix.clone(),
                origin: entry.target.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(target.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidOrigin {
                    prefix: entry.prefix.clone(),
                    origin: entry.target.clone(),
                    reason: format!("unsupported scheme '{}'", target.scheme()),
                });
            }

            routes.push(Route {
                prefix: entry.prefix.clone(),
                target,
                rewrite_origin: entry.rewrite_origin,
                verify_tls: entry.verify_tls,
                timeout_secs: entry.timeout_secs,
            });
        }

        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Ok(Self { routes })
    }

    /// Find the route whose prefix matches the request path. Longest prefix
    /// wins; `None` means the request falls through to the static handler.
    /// The index lets callers look up per-route resources built in table
    /// order.
    pub fn match_path(&self, path: &str) -> Option<(usize, &Route)> {
        self.routes
            .iter()
            .enumerate()
            .find(|(_, r)| path.starts_with(&r.prefix))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(prefix: &str, target: &str) -> RouteConfig {
        RouteConfig {
            prefix: prefix.to_string(),
            target: target.to_string(),
            rewrite_origin: true,
            verify_tls: true,
            timeout_secs: 300,
        }
    }

    #[test]
    fn disjoint_prefixes_route_exclusively() {
        let table = RouteTable::from_config(&[
            entry("/chat", "http://localhost:8000"),
            entry("/static", "http://localhost:9000"),
        ])
        .unwrap();

        assert_eq!(
            table.match_path("/chat").unwrap().1.target.port(),
            Some(8000)
        );
        assert_eq!(
            table.match_path("/static/x.png").unwrap().1.target.port(),
            Some(9000)
        );
    }

    #[test]
    fn longest_prefix_wins() {
        let table = RouteTable::from_config(&[
            entry("/chat", "http://localhost:8000"),
            entry("/chat/completions", "http://localhost:9000"),
        ])
        .unwrap();

        assert_eq!(
            table
                .match_path("/chat/completions/stream")
                .unwrap()
                .1
                .target
                .port(),
            Some(9000)
        );
        assert_eq!(
            table.match_path("/chat/history").unwrap().1.target.port(),
            Some(8000)
        );
    }

    #[test]
    fn unmatched_path_falls_through() {
        let table = RouteTable::from_config(&[entry("/chat", "http://localhost:8000")]).unwrap();
        assert!(table.match_path("/index.html").is_none());
    }

    #[test]
    fn duplicate_prefix_is_fatal() {
        let err = RouteTable::from_config(&[
            entry("/chat", "http://localhost:8000"),
            entry("/chat", "http://localhost:9000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePrefix(p) if p == "/chat"));
    }

    #[test]
    fn empty_prefix_is_fatal() {
        let err = RouteTable::from_config(&[entry("", "http://localhost:8000")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPrefix));
    }

    #[test]
    fn bad_origin_is_fatal() {
        let err = RouteTable::from_config(&[entry("/chat", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin { .. }));

        let err = RouteTable::from_config(&[entry("/chat", "ftp://localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin { .. }));
    }
}
