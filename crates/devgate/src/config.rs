//! Configuration types and loading logic.

use devgate_tracing::TracingConfig;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

/// Top-level devgate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Prefix-to-origin route table, consulted for every incoming request.
    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Server listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Directory served for requests matching no route prefix.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// A single route table entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// Request path prefix, e.g. "/chat".
    pub prefix: String,

    /// Upstream origin, e.g. "http://localhost:8000".
    pub target: String,

    /// Rewrite the Host header to the target origin when forwarding.
    #[serde(default = "default_true")]
    pub rewrite_origin: bool,

    /// Verify the upstream TLS certificate. Disable only for local
    /// loopback targets with self-signed certificates.
    #[serde(default = "default_true")]
    pub verify_tls: bool,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Build output mapper configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Output directory, cleared before each build.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Entry point name to source path. The entry named "main" emits to
    /// the fixed filenames `assets/index.js` and `assets/index.css`.
    #[serde(default)]
    pub entries: std::collections::BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            entries: std::collections::BTreeMap::new(),
        }
    }
}

fn default_listen_address() -> String {
    "127.0.0.1:5173".to_string()
}

fn default_static_dir() -> String {
    "dist".to_string()
}

fn default_out_dir() -> String {
    "dist".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    300
}

/// The route table the original dev setup ships with: API and static asset
/// paths forwarded to the local backend.
fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            prefix: "/chat".to_string(),
            target: "http://localhost:8000".to_string(),
            rewrite_origin: true,
            verify_tls: true,
            timeout_secs: default_timeout(),
        },
        RouteConfig {
            prefix: "/static".to_string(),
            target: "http://localhost:8000".to_string(),
            rewrite_origin: true,
            verify_tls: true,
            timeout_secs: default_timeout(),
        },
    ]
}

impl GateConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DEVGATE_ prefix, __ for nesting)
    /// 2. TOML config file
    /// 3. Defaults
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        let config: GateConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("DEVGATE_").split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_the_dev_template() {
        let config: GateConfig = Figment::new().extract().unwrap();
        assert_eq!(config.server.listen_address, "127.0.0.1:5173");
        assert_eq!(config.routes.len(), 2);
        assert_eq!(config.routes[0].prefix, "/chat");
        assert_eq!(config.routes[0].target, "http://localhost:8000");
        assert!(config.routes[0].verify_tls);
    }

    #[test]
    fn toml_routes_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "devgate.toml",
                r#"
                [server]
                listen_address = "127.0.0.1:9000"

                [[routes]]
                prefix = "/api"
                target = "https://localhost:8443"
                verify_tls = false
            "#,
            )?;

            let config = GateConfig::load("devgate.toml").unwrap();
            assert_eq!(config.server.listen_address, "127.0.0.1:9000");
            assert_eq!(config.routes.len(), 1);
            assert_eq!(config.routes[0].prefix, "/api");
            assert!(!config.routes[0].verify_tls);
            assert!(config.routes[0].rewrite_origin);
            Ok(())
        });
    }
}
