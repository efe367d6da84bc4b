//! Server configuration

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Include the raw run record as a `debug` field in analysis and chat
    /// responses
    pub analysis_debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            analysis_debug: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `HOST`, `PORT`, and `ANALYSIS_DEBUG`,
    /// keeping defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("HOST") {
            if !host.is_empty() {
                config.host = host;
            }
        }
        if let Ok(raw) = std::env::var("PORT") {
            if let Ok(port) = raw.parse() {
                config.port = port;
            }
        }
        if let Ok(raw) = std::env::var("ANALYSIS_DEBUG") {
            config.analysis_debug = raw.eq_ignore_ascii_case("true");
        }

        config
    }

    /// Override the bind port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the bind address
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert!(config.analysis_debug);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ServerConfig::default().with_host("127.0.0.1").with_port(9100);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9100);
    }
}
