// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, GalleryConfig, HttpConfig, LoggingConfig, PerformanceConfig, PrimitiveConfig,
    ServerConfig, StorageConfig,
};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("PRIMITIVE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("gallery.shape_counts")
                    .with_list_parse_key("primitive.extra_args")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("storage.image_dir", "./img")?
            .set_default("primitive.binary", "primitive")?
            .set_default("primitive.extra_args", Vec::<String>::new())?
            .set_default("gallery.default_shapes", 100)?
            .set_default("gallery.shape_counts", vec![10, 50, 100, 200, 500])?
            .set_default("http.server_name", "primitive-gallery")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.request_timeout", 0)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject gallery settings that would hand the tool a zero shape count
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let gallery = &self.gallery;
        if gallery.default_shapes == 0 {
            return Err(config::ConfigError::Message(
                "gallery.default_shapes must be at least 1".to_string(),
            ));
        }
        if gallery.shape_counts.is_empty() {
            return Err(config::ConfigError::Message(
                "gallery.shape_counts must not be empty".to_string(),
            ));
        }
        if gallery.shape_counts.contains(&0) {
            return Err(config::ConfigError::Message(
                "gallery.shape_counts entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Configuration with all defaults applied and no file or environment
    /// overrides, rooted at the given image directory
    #[cfg(test)]
    pub fn for_tests(image_dir: &std::path::Path) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            storage: StorageConfig {
                image_dir: image_dir.display().to_string(),
            },
            primitive: PrimitiveConfig {
                binary: "primitive".to_string(),
                extra_args: Vec::new(),
                scratch_dir: None,
            },
            gallery: GalleryConfig {
                default_shapes: 100,
                shape_counts: vec![10, 50, 100, 200, 500],
            },
            http: HttpConfig {
                server_name: "primitive-gallery".to_string(),
                max_body_size: 10_485_760,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "combined".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive: true,
                request_timeout: 0,
                max_connections: None,
            },
        }
    }
}
