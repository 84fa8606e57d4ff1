// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub primitive: PrimitiveConfig,
    pub gallery: GalleryConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Image directory shared by uploads and generated images
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub image_dir: String,
}

/// External `primitive` tool invocation
#[derive(Debug, Deserialize, Clone)]
pub struct PrimitiveConfig {
    /// Program name or path, resolved through `PATH` when bare
    pub binary: String,
    /// Appended after the built-in flags on every invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Directory for intermediate files, the system temp dir when unset
    pub scratch_dir: Option<String>,
}

/// Drill-down gallery choices
#[derive(Debug, Deserialize, Clone)]
pub struct GalleryConfig {
    /// Shape count used for the mode-choice thumbnails
    pub default_shapes: u32,
    /// Candidate shape counts offered once a mode is chosen
    pub shape_counts: Vec<u32>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Whole-connection timeout in seconds, 0 disables it
    pub request_timeout: u64,
    pub max_connections: Option<u64>,
}
