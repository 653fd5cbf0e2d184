// Adapters - External system implementations

pub mod headless_player;
pub mod http_upstream;
pub mod toml_config;

// Re-export adapters
pub use headless_player::HeadlessPlayer;
pub use http_upstream::{HttpUpstreamAdapter, UpstreamEndpoints};
pub use toml_config::{AppConfig, TomlConfigAdapter};
