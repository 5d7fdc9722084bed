use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub input: Option<String>,
    pub url: Option<String>,
    #[serde(alias = "page_size")]
    pub limit: Option<usize>,
    pub max_shown: Option<usize>,
    pub origin: Option<String>,
    pub timeout: Option<usize>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    if let Some(home) = ["HOME", "USERPROFILE"].into_iter().find_map(env::var_os) {
        return Some(PathBuf::from(home));
    }
    let mut home = PathBuf::from(env::var_os("HOMEDRIVE")?);
    home.push(env::var_os("HOMEPATH")?);
    Some(home)
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".prodlist").join("config.yml"))
}

/// Resolves a leading `~` against the home directory. Paths without one,
/// or with no known home, come back unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with(['/', '\\']) => &rest[1..],
        _ => return PathBuf::from(path),
    };
    match home_dir() {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Parses config YAML; a blank document is the default config.
pub fn parse_config(contents: &str) -> Result<ConfigFile, String> {
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(contents).map_err(|e| e.to_string())
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return if allow_missing {
                Ok(ConfigFile::default())
            } else {
                Err(format!("no config file at '{}'", path.display()))
            };
        }
        Err(e) => return Err(format!("failed to read config '{}': {e}", path.display())),
    };
    parse_config(&contents).map_err(|e| format!("invalid config '{}': {e}", path.display()))
}

fn default_config_yaml() -> String {
    r#"# prodlist config
#
# Location (default):
#   ~/.prodlist/config.yml

# Records source (choose one)
# input: ./db.json
# url: https://dummyjson.com/products?limit=100

# Listing
limit: 10
max_shown: 7

# Page the listing is shown on; used to resolve //host and /path image URLs
origin: https://localhost

# HTTP
timeout: 10

# Output (optional)
# output: ./page.json
# output_format: json

# Output styling
no_color: false
"#
    .to_string()
}

/// Writes the commented default config to `path` unless a file is already
/// there.
pub fn ensure_default_config_file(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            format!(
                "failed to create config directory '{}': {e}",
                parent.display()
            )
        })?;
    }
    fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))
}
