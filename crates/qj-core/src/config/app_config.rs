use std::path::PathBuf;

use toml::Value;
use tracing::warn;

/// Application configuration DTO (pure data, no logic)
/// 应用配置 DTO（纯数据，无逻辑）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub self_identity: SelfConfig,
    pub contacts: Vec<ContactEntry>,
    pub secure_join: SecureJoinConfig,
    pub transcript: TranscriptConfig,
    pub logging: LoggingConfig,
}

/// `[self]`: the local account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfConfig {
    /// May be empty while the account is not configured.
    /// 可能为空（账号未配置），这是事实而不是错误。
    pub addr: String,
    pub display_name: String,
    pub fingerprint: String,
}

/// One `[[contacts]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactEntry {
    pub addr: String,
    pub name: String,
    pub fingerprint: Option<String>,
}

/// `[secure_join]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecureJoinConfig {
    /// Absent means no local timeout on top of the core's own.
    pub watchdog_timeout_secs: Option<u64>,
}

/// `[transcript]`: what the scripted core replays for a join.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptConfig {
    pub stages: Vec<u16>,
    pub peer_id: Option<u32>,
    pub chat_id: Option<u32>,
    pub error: Option<String>,
    pub transport_error: bool,
    pub step_delay_ms: u64,
}

/// `[logging]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Empty means "platform default".
    pub log_dir: PathBuf,
    pub file_logging: bool,
}

impl AppConfig {
    /// Create AppConfig from TOML value
    /// 从 TOML 值创建 AppConfig
    ///
    /// Must not validate or invent defaults; empty strings are valid facts.
    pub fn from_toml(toml_value: &Value) -> anyhow::Result<Self> {
        let section = |name: &str| toml_value.get(name);

        let self_identity = SelfConfig {
            addr: str_at(section("self"), "addr"),
            display_name: str_at(section("self"), "display_name"),
            fingerprint: str_at(section("self"), "fingerprint"),
        };

        let contacts = section("contacts")
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| ContactEntry {
                        addr: str_at(Some(entry), "addr"),
                        name: str_at(Some(entry), "name"),
                        fingerprint: opt_str_at(Some(entry), "fingerprint"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let secure_join = SecureJoinConfig {
            watchdog_timeout_secs: ranged_at(section("secure_join"), "watchdog_timeout_secs"),
        };

        let transcript_section = section("transcript");
        let transcript = TranscriptConfig {
            stages: transcript_section
                .and_then(|t| t.get("stages"))
                .and_then(|v| v.as_array())
                .map(|values| {
                    values
                        .iter()
                        .filter_map(|v| v.as_integer())
                        .filter_map(|v| in_range("stages", v))
                        .collect()
                })
                .unwrap_or_default(),
            peer_id: ranged_at(transcript_section, "peer_id"),
            chat_id: ranged_at(transcript_section, "chat_id"),
            error: opt_str_at(transcript_section, "error"),
            transport_error: transcript_section
                .and_then(|t| t.get("transport_error"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            step_delay_ms: ranged_at(transcript_section, "step_delay_ms").unwrap_or(0),
        };

        let logging = LoggingConfig {
            log_dir: PathBuf::from(str_at(section("logging"), "log_dir")),
            file_logging: section("logging")
                .and_then(|l| l.get("file_logging"))
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        };

        Ok(Self {
            self_identity,
            contacts,
            secure_join,
            transcript,
            logging,
        })
    }

    /// Create empty AppConfig (all empty/default values)
    /// 创建空的 AppConfig
    pub fn empty() -> Self {
        Self {
            self_identity: SelfConfig::default(),
            contacts: Vec::new(),
            secure_join: SecureJoinConfig::default(),
            transcript: TranscriptConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn str_at(table: Option<&Value>, key: &str) -> String {
    opt_str_at(table, key).unwrap_or_default()
}

fn opt_str_at(table: Option<&Value>, key: &str) -> Option<String> {
    table
        .and_then(|t| t.get(key))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn int_at(table: Option<&Value>, key: &str) -> Option<i64> {
    table.and_then(|t| t.get(key)).and_then(|v| v.as_integer())
}

/// Integer at `key` if it fits `T`; out-of-range values count as absent.
fn ranged_at<T: TryFrom<i64>>(table: Option<&Value>, key: &str) -> Option<T> {
    int_at(table, key).and_then(|v| in_range(key, v))
}

fn in_range<T: TryFrom<i64>>(key: &str, value: i64) -> Option<T> {
    match T::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            // 超出范围的值按缺省处理
            warn!(key, value, "config value out of range, ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_reads_all_sections() {
        let toml_str = r#"
            [self]
            addr = "me@example.org"
            display_name = "Me"
            fingerprint = "1234567890ABCDEF1234567890ABCDEF12345678"

            [[contacts]]
            addr = "alice@example.com"
            name = "Alice"
            fingerprint = "AAAA567890ABCDEF1234567890ABCDEF12345678"

            [[contacts]]
            addr = "bob@example.org"
            name = "Bob"

            [secure_join]
            watchdog_timeout_secs = 30

            [transcript]
            stages = [100, 400, 1000]
            peer_id = 42
            chat_id = 12
            step_delay_ms = 5

            [logging]
            file_logging = true
        "#;
        let value: Value = toml::from_str(toml_str).unwrap();

        let config = AppConfig::from_toml(&value).unwrap();

        assert_eq!(config.self_identity.addr, "me@example.org");
        assert_eq!(config.contacts.len(), 2);
        assert_eq!(config.contacts[1].fingerprint, None);
        assert_eq!(config.secure_join.watchdog_timeout_secs, Some(30));
        assert_eq!(config.transcript.stages, vec![100, 400, 1000]);
        assert_eq!(config.transcript.peer_id, Some(42));
        assert_eq!(config.transcript.chat_id, Some(12));
        assert!(!config.transcript.transport_error);
        assert!(config.logging.file_logging);
        assert_eq!(config.logging.log_dir, PathBuf::new());
    }

    #[test]
    fn test_from_toml_missing_sections_are_empty_facts() {
        let value: Value = toml::from_str("").unwrap();

        let config = AppConfig::from_toml(&value).unwrap();

        assert_eq!(config, AppConfig::empty());
        assert_eq!(config.self_identity.addr, "");
        assert_eq!(config.secure_join.watchdog_timeout_secs, None);
    }

    #[test]
    fn test_from_toml_does_not_validate_addresses() {
        let value: Value = toml::from_str(
            r#"
            [self]
            addr = "not an address"
        "#,
        )
        .unwrap();

        let config = AppConfig::from_toml(&value).unwrap();

        assert_eq!(config.self_identity.addr, "not an address");
    }

    #[test]
    fn test_from_toml_out_of_range_integers_are_absent() {
        let value: Value = toml::from_str(
            r#"
            [secure_join]
            watchdog_timeout_secs = -1

            [transcript]
            stages = [100, 65936, 1000]
            peer_id = 4294967338
            chat_id = -12
            step_delay_ms = -5
        "#,
        )
        .unwrap();

        let config = AppConfig::from_toml(&value).unwrap();

        assert_eq!(config.secure_join.watchdog_timeout_secs, None);
        // 65936 would wrap to 400 as u16
        assert_eq!(config.transcript.stages, vec![100, 1000]);
        assert_eq!(config.transcript.peer_id, None);
        assert_eq!(config.transcript.chat_id, None);
        assert_eq!(config.transcript.step_delay_ms, 0);
    }
}
