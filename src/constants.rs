use std::{env, path::PathBuf};

use dirs;

/// Cache directory name under the user's home (or %APPDATA% on Windows)
pub const CACHE_DIR_NAME: &str = ".aws-sudo";

/// Cache file name inside the cache directory
pub const CACHE_FILE_NAME: &str = "config.json";

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// MFA token codes are always this many characters
pub const TOKEN_CODE_LENGTH: usize = 6;

/// Default session duration in seconds (12 hours)
pub const DEFAULT_SESSION_DURATION_SECS: u32 = 43200;

/// Minimum session duration accepted by STS GetSessionToken
pub const MIN_SESSION_DURATION_SECS: u32 = 900;

/// Maximum session duration accepted by STS GetSessionToken
pub const MAX_SESSION_DURATION_SECS: u32 = 129600;

/// Default AWS region for IAM/STS operations when no region is configured
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Suffix appended to the source profile name for cached session credentials
pub const SESSION_PROFILE_SUFFIX: &str = "-mfa";

/// Get the JSON cache file path
/// Respects AWS_SUDO_CONFIG_FILE environment variable if set
pub fn cache_file_path() -> Option<PathBuf> {
    // Check environment variable first
    if let Ok(path) = env::var("AWS_SUDO_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    // Windows keeps the cache under %APPDATA%, everything else under $HOME
    let base = if cfg!(windows) {
        env::var("APPDATA").ok().map(PathBuf::from)
    } else {
        dirs::home_dir()
    };

    base.map(|dir| dir.join(CACHE_DIR_NAME).join(CACHE_FILE_NAME))
}

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn aws_credentials_path() -> Option<PathBuf> {
    // Check environment variable first
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }

    // Use default AWS credentials location
    dirs::home_dir().map(|home| home.join(AWS_CONFIG_DIR_NAME).join("credentials"))
}

/// Section name the INI store caches session credentials under
pub fn session_profile_name(profile: &str) -> String {
    format!("{profile}{SESSION_PROFILE_SUFFIX}")
}
