//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use crate::adapters::{AppConfig, TomlConfigAdapter};
use crate::cli::{Cli, Commands};
use crate::error::{TrimmerError, TrimmerResult};

/// Environment variables and the config keys they override
pub const ENV_MAPPINGS: [(&str, &str); 10] = [
    ("TRIMMER_BIND_ADDR", "bind_addr"),
    ("TRIMMER_TRIM_URL", "trim_url"),
    ("TRIMMER_DOWNLOAD_URL", "download_url"),
    ("TRIMMER_MERGE_URL", "merge_url"),
    ("TRIMMER_FILE_CHECK_URL", "file_check_url"),
    ("TRIMMER_POLL_INTERVAL_MS", "poll_interval_ms"),
    ("TRIMMER_MAX_POLL_FAILURES", "max_poll_failures"),
    ("TRIMMER_REQUEST_TIMEOUT_SECS", "request_timeout_secs"),
    ("TRIMMER_LOG_LEVEL", "log_level"),
    ("TRIMMER_LOG_FORMAT", "log_format"),
];

/// Resolved configuration and where it came from.
///
/// Loading happens before logging is set up, so the caller reports these.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
    pub env_overrides: usize,
    pub cli_overrides: usize,
}

/// Initialize configuration hierarchy following precedence: CLI > Env > File > Defaults
pub fn initialize_configuration_hierarchy(cli: &Cli) -> TrimmerResult<LoadedConfig> {
    let base = std::env::current_dir()?;
    let (mut config, source) = load_config_file(cli.config.as_deref(), &base)?;
    let env_overrides = apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    let cli_overrides = apply_cli_overrides(&mut config, cli);
    config.validate()?;

    Ok(LoadedConfig {
        config,
        source,
        env_overrides,
        cli_overrides,
    })
}

/// Explicit path if given (it must exist), else the first default file under
/// `base`, else built-in defaults
pub fn load_config_file(
    explicit: Option<&Path>,
    base: &Path,
) -> TrimmerResult<(AppConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => TomlConfigAdapter::find_default(base),
    };

    match path {
        Some(path) => {
            let config = TomlConfigAdapter::load(&path).map_err(|e| TrimmerError::ConfigError {
                message: format!("{}: {}", path.display(), e),
            })?;
            Ok((config, Some(path)))
        }
        None => Ok((AppConfig::default(), None)),
    }
}

/// Apply every mapped variable `lookup` knows about; returns how many applied
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> TrimmerResult<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = 0;
    for (env_var, key) in ENV_MAPPINGS {
        if let Some(value) = lookup(env_var) {
            config.set(key, &value).map_err(|e| TrimmerError::ConfigError {
                message: format!("{}: {}", env_var, e),
            })?;
            applied += 1;
        }
    }
    Ok(applied)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut AppConfig, cli: &Cli) -> usize {
    let mut applied = 0;

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
        applied += 1;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
        applied += 1;
    }
    if let Commands::Serve(args) = &cli.command {
        if let Some(bind) = &args.bind {
            config.bind_addr = bind.clone();
            applied += 1;
        }
    }

    applied
}
