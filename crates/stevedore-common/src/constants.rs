//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for Stevedore data when running as root.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/stevedore";

/// Returns the data directory, preferring `$HOME/.stevedore`,
/// falling back to `/var/lib/stevedore`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        let user_dir = PathBuf::from(home).join(".stevedore");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(SYSTEM_DATA_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Returns the default configuration file path.
pub fn default_config_file() -> PathBuf {
    data_dir().join("config.json")
}

/// Returns the default build-container catalog path.
pub fn default_catalog_file() -> PathBuf {
    data_dir().join("containers").join("catalog.json")
}

/// User database, relative to a mounted root.
pub const PASSWD_FILE: &str = "etc/passwd";

/// Group database, relative to a mounted root.
pub const GROUP_FILE: &str = "etc/group";

/// Mode for directories created while ingesting.
pub const DIR_MODE: u32 = 0o755;

/// Mode applied to files saved from a URL.
pub const FETCHED_FILE_MODE: u32 = 0o600;

/// Application name used in CLI output and state files.
pub const APP_NAME: &str = "stevedore";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "stvd";
