use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Environment prefix for server settings, e.g. `QUICKMCQ_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "QUICKMCQ_SERVER";

/// HTTP server configuration.
///
/// Pipeline settings (index location, embedder, generation endpoint) live in
/// the YAML file named by `rag_config`, loaded with [`quickmcq::RagConfig::load`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds, generation included
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in KB
    #[serde(default = "default_max_body_size_kb")]
    pub max_body_size_kb: usize,

    /// Enable permissive CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Install the Prometheus recorder and serve `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Pipeline YAML; defaults plus `QUICKMCQ_*` overrides when unset
    #[serde(default)]
    pub rag_config: Option<PathBuf>,

    /// Upper bound on tokio's blocking pool. Every blocking thread that runs local
    /// ONNX inference keeps its own model session, so this also caps resident model copies.
    #[serde(default = "default_max_blocking_threads")]
    pub max_blocking_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_kb: default_max_body_size_kb(),
            enable_cors: default_true(),
            metrics_enabled: default_true(),
            rag_config: None,
            max_blocking_threads: default_max_blocking_threads(),
        }
    }
}

impl ServerConfig {
    /// Load from an optional `server.{toml,yaml,json}` in the working directory,
    /// then `QUICKMCQ_SERVER__*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.timeout_secs > 0, "timeout_secs must be greater than zero");
        anyhow::ensure!(
            self.max_body_size_kb > 0,
            "max_body_size_kb must be greater than zero"
        );
        anyhow::ensure!(
            self.max_blocking_threads > 0,
            "max_blocking_threads must be greater than zero"
        );
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size_kb * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_body_size_kb() -> usize {
    64
}

fn default_max_blocking_threads() -> usize {
    8
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn from_toml(text: &str) -> anyhow::Result<ServerConfig> {
        ServerConfig::from_builder(
            config::Config::builder().add_source(File::from_str(text, FileFormat::Toml)),
        )
    }

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout(), Duration::from_secs(120));
        assert_eq!(cfg.max_body_size(), 64 * 1024);
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
        assert!(cfg.rag_config.is_none());
        assert_eq!(cfg.max_blocking_threads, 8);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn file_values_override_defaults() {
        let cfg = from_toml(
            "port = 9000\nbind_addr = \"127.0.0.1\"\nrag_config = \"config/rag.yaml\"\n",
        )
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.socket_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.rag_config, Some(PathBuf::from("config/rag.yaml")));
        assert_eq!(cfg.timeout_secs, 120);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(from_toml("timeout_secs = 0\n").is_err());
    }

    #[test]
    fn blocking_pool_is_bounded() {
        assert_eq!(from_toml("max_blocking_threads = 2\n").unwrap().max_blocking_threads, 2);
        assert!(from_toml("max_blocking_threads = 0\n").is_err());
    }
}
