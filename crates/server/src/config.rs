/// Bind address and session defaults for the inbound server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub session: wsio_core::SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            session: wsio_core::SessionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads `WSIO_BIND_ADDRESS` if present, falling back to the default, mirroring the
    /// `ApiConfig::from_env` convention of layering environment overrides on sane defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(address) = std::env::var("WSIO_BIND_ADDRESS") {
            config.bind_address = address;
        }
        config
    }
}
