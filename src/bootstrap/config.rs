//! # Configuration Loader / 配置加载器
//!
//! Reads the TOML file and maps it to the `AppConfig` DTO.
//! Pure data loading only: no validation, no default values.
//! 仅纯数据加载：不验证，不补默认值。

use anyhow::Context;
use std::path::{Path, PathBuf};
use qj_core::config::AppConfig;

const APP_DIR_NAME: &str = "qrjoin";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// Missing sections result in empty values; those are facts, not errors.
/// 缺失的部分导致空值（事实）。
///
/// # Errors / 错误
///
/// - File cannot be read (I/O error)
/// - Content is not valid TOML (parse error)
pub fn load_config(config_path: PathBuf) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

/// Default config location: `<config_dir>/qrjoin/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Loads `explicit` when given (it must exist), otherwise the default file if
/// present, otherwise an empty config.
/// 显式路径必须存在；默认路径不存在时返回空配置。
pub fn load_or_empty(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config(path.to_path_buf());
    }
    match default_config_path() {
        Some(path) if path.exists() => load_config(path),
        _ => Ok(AppConfig::empty()),
    }
}

/// Per-user data directory; the invite token file lives here.
pub fn data_dir() -> anyhow::Result<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .context("Failed to resolve the local data directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Test that valid TOML is parsed correctly
    /// 测试有效 TOML 被正确解析
    #[test]
    fn test_load_config_reads_valid_toml() {
        let toml_content = r#"
            [self]
            addr = "me@example.org"
            display_name = "Me"
            fingerprint = "0123456789ABCDEF0123456789ABCDEF01234567"

            [[contacts]]
            addr = "alice@example.com"
            name = "Alice"

            [secure_join]
            watchdog_timeout_secs = 30
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(temp_file.path().to_path_buf()).unwrap();

        assert_eq!(config.self_identity.addr, "me@example.org");
        assert_eq!(config.contacts.len(), 1);
        assert_eq!(config.contacts[0].name, "Alice");
        assert_eq!(config.secure_join.watchdog_timeout_secs, Some(30));
    }

    /// Test that missing values result in empty values
    /// 测试缺失的值导致空值
    #[test]
    fn test_load_config_returns_empty_values_when_missing() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[self]\n").unwrap();

        let config = load_config(temp_file.path().to_path_buf()).unwrap();

        assert_eq!(config.self_identity.addr, "");
        assert!(config.contacts.is_empty());
        assert_eq!(config.secure_join.watchdog_timeout_secs, None);
    }

    #[test]
    fn test_load_config_rejects_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[self\naddr = ").unwrap();

        let err = load_config(temp_file.path().to_path_buf()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config as TOML"));
    }

    #[test]
    fn test_load_config_returns_io_error_on_file_not_found() {
        let result = load_config(PathBuf::from("/this/path/does/not/exist/config.toml"));

        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("Failed to read config file"),
            "Expected IO error message, got: {}",
            err
        );
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        assert!(load_or_empty(Some(Path::new("/this/path/does/not/exist.toml"))).is_err());
    }
}
