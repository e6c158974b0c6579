use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crmsync_core::{CoreError, NormalizationRule, Platform};
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "crmsync";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub timeout_secs: u64,
    pub destination: Option<DestinationConfig>,
    pub platforms: BTreeMap<Platform, BTreeMap<String, String>>,
    pub rules: Vec<NormalizationRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationConfig {
    pub public_key: String,
    pub secret_key: String,
    pub endpoint: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            destination: None,
            platforms: BTreeMap::new(),
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid timeout_secs value: {0}")]
    InvalidTimeout(u64),
    #[error("invalid platform table: {0}")]
    InvalidPlatformName(#[source] CoreError),
    #[error("invalid value for platforms.{platform}.{key}: expected string, integer or boolean")]
    InvalidPlatformParam { platform: Platform, key: String },
    #[error("rules and rules_file cannot both be set")]
    ConflictingRuleSources,
    #[error("invalid normalization rule: {0}")]
    InvalidRule(#[source] CoreError),
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse rules file {path}: {source}")]
    ParseRules {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    timeout_secs: Option<u64>,
    rules_file: Option<PathBuf>,
    destination: Option<DestinationConfig>,
    #[serde(default)]
    platforms: BTreeMap<String, BTreeMap<String, toml::Value>>,
    rules: Option<Vec<RuleEntry>>,
}

/// One rule as written in TOML or in the JSON rules file. Both `keyword` and
/// `keywords` are accepted.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleEntry {
    id: RuleId,
    #[serde(default)]
    keyword: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleId {
    Text(String),
    Number(i64),
}

impl RuleEntry {
    fn into_rule(self) -> Result<NormalizationRule> {
        let id = match self.id {
            RuleId::Text(id) => id,
            RuleId::Number(id) => id.to_string(),
        };
        let keywords = self.keyword.into_iter().chain(self.keywords);
        NormalizationRule::new(id, keywords).map_err(ConfigError::InvalidRule)
    }
}

pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let required = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir) if !required => return Ok(AppConfig::default()),
        Err(ConfigError::InvalidConfigPath(_)) if !required => return Ok(AppConfig::default()),
        Err(err) => return Err(err),
    };
    match load_at_path(&path, required)? {
        Some(config) => Ok(config),
        None => Ok(AppConfig::default()),
    }
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    match custom {
        Some(path) => {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidConfigPath(path));
            }
            Ok(path)
        }
        None => {
            let base = if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
                let path = PathBuf::from(dir);
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfigPath(path));
                }
                path
            } else {
                let home = dirs::home_dir().ok_or(ConfigError::MissingHomeDir)?;
                home.join(".config")
            };
            Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
        }
    }
}

pub fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    if !path.exists() {
        if required {
            return Err(ConfigError::MissingConfigFile(path.to_path_buf()));
        }
        return Ok(None);
    }

    ensure_permissions(path)?;
    let contents = read(path)?;
    let parsed: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(Some(merge_config(parsed, base_dir)?))
}

/// Reads a JSON rules file. Rule order follows the file.
pub fn load_rules_file(path: &Path) -> Result<Vec<NormalizationRule>> {
    let contents = read(path)?;
    let entries: Vec<RuleEntry> =
        serde_json::from_str(&contents).map_err(|source| ConfigError::ParseRules {
            path: path.to_path_buf(),
            source,
        })?;
    entries.into_iter().map(RuleEntry::into_rule).collect()
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn merge_config(parsed: ConfigFile, base_dir: &Path) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(timeout) = parsed.timeout_secs {
        if timeout == 0 || timeout > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout(timeout));
        }
        config.timeout_secs = timeout;
    }

    config.destination = parsed.destination;

    for (name, table) in parsed.platforms {
        let platform = Platform::parse(&name).map_err(ConfigError::InvalidPlatformName)?;
        let mut params = BTreeMap::new();
        for (key, value) in table {
            let value = match value {
                toml::Value::String(value) => value,
                toml::Value::Integer(value) => value.to_string(),
                toml::Value::Boolean(value) => value.to_string(),
                _ => return Err(ConfigError::InvalidPlatformParam { platform, key }),
            };
            params.insert(key, value);
        }
        config.platforms.insert(platform, params);
    }

    config.rules = match (parsed.rules, parsed.rules_file) {
        (Some(_), Some(_)) => return Err(ConfigError::ConflictingRuleSources),
        (Some(entries), None) => entries
            .into_iter()
            .map(RuleEntry::into_rule)
            .collect::<Result<_>>()?,
        (None, Some(file)) => load_rules_file(&base_dir.join(file))?,
        (None, None) => Vec::new(),
    };

    Ok(config)
}

#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(ConfigError::InsecurePermissions(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_at_path, load_rules_file, ConfigError, DEFAULT_TIMEOUT_SECS};
    use crmsync_core::Platform;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn restrict_permissions(path: &Path) {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path).expect("metadata").permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).expect("chmod");
        }
    }

    fn write_config(temp: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = temp.path().join("config.toml");
        fs::write(&path, contents).expect("write config");
        restrict_permissions(&path);
        path
    }

    #[test]
    fn load_at_path_requires_file_when_requested() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("config.toml");
        let err = load_at_path(&missing, true).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
        assert!(load_at_path(&missing, false).expect("optional").is_none());
    }

    #[test]
    fn load_at_path_parses_full_config() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(
            &temp,
            r#"
timeout_secs = 45

[destination]
public_key = "pub"
secret_key = "sec"

[platforms.tactilecrm]
url = "https://acme.tactilecrm.com"
token = "t0k"
secure = true

[platforms.solve360]
email = "ops@example.com"
token = 12345

[[rules]]
id = "1"
keywords = ["Name", "FirstName", "lastname"]

[[rules]]
id = 2
keyword = ["email"]
"#,
        );

        let config = load_at_path(&path, true).expect("load").expect("config");
        assert_eq!(config.timeout_secs, 45);
        let destination = config.destination.expect("destination");
        assert_eq!(destination.public_key, "pub");
        assert_eq!(destination.endpoint, None);

        let tactile = &config.platforms[&Platform::TactileCrm];
        assert_eq!(tactile["secure"], "true");
        assert_eq!(config.platforms[&Platform::Solve360]["token"], "12345");

        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].field_id(), "1");
        assert!(config.rules[0].matches("firstname"));
        assert_eq!(config.rules[1].field_id(), "2");
        assert!(config.rules[1].matches("email"));
    }

    #[test]
    fn defaults_apply_when_keys_are_absent() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(&temp, "");
        let config = load_at_path(&path, true).expect("load").expect("config");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.destination.is_none());
        assert!(config.platforms.is_empty());
        assert!(config.rules.is_empty());
    }

    #[test]
    fn rules_file_is_resolved_next_to_config() {
        let temp = TempDir::new().expect("tempdir");
        fs::write(
            temp.path().join("normalize.json"),
            r#"[{"id": 7, "keyword": ["Phone", "mobilephone"]}, {"id": "email", "keywords": ["email"]}]"#,
        )
        .expect("write rules");
        let path = write_config(&temp, "rules_file = \"normalize.json\"\n");

        let config = load_at_path(&path, true).expect("load").expect("config");
        let ids: Vec<&str> = config.rules.iter().map(|rule| rule.field_id()).collect();
        assert_eq!(ids, vec!["7", "email"]);
        assert!(config.rules[0].matches("phone"));
    }

    #[test]
    fn inline_rules_conflict_with_rules_file() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(
            &temp,
            "rules_file = \"normalize.json\"\n[[rules]]\nid = \"1\"\nkeywords = [\"name\"]\n",
        );
        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingRuleSources));
    }

    #[test]
    fn unknown_platform_table_is_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(&temp, "[platforms.hubspot]\napi_key = \"k\"\n");
        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPlatformName(_)));
        assert!(err.to_string().contains("hubspot"));
    }

    #[test]
    fn nested_platform_values_are_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(&temp, "[platforms.freshdesk]\ndomain = [\"a\", \"b\"]\n");
        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPlatformParam { platform: Platform::Freshdesk, ref key } if key == "domain"
        ));
    }

    #[test]
    fn timeout_bounds_are_enforced() {
        for value in ["0", "601"] {
            let temp = TempDir::new().expect("tempdir");
            let path = write_config(&temp, &format!("timeout_secs = {value}\n"));
            let err = load_at_path(&path, true).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidTimeout(_)));
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = write_config(&temp, "verbose = true\n");
        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn blank_rule_id_is_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let rules = temp.path().join("rules.json");
        fs::write(&rules, r#"[{"id": "  ", "keywords": ["name"]}]"#).expect("write rules");
        let err = load_rules_file(&rules).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule(_)));
    }

    #[cfg(unix)]
    #[test]
    fn world_readable_config_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "").expect("write config");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&path, perms).expect("chmod");

        let err = load_at_path(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::InsecurePermissions(_)));
    }
}
