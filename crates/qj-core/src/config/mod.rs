//! # Pure Data Module / 纯数据模块
//!
//! Configuration DTOs mapped from TOML. No validation, no defaults policy:
//! a missing value is recorded as an empty string or `None` and the caller
//! decides what that means.
//!
//! 只做 TOML → DTO 映射，不做校验，不计算默认值。

pub mod app_config;

pub use app_config::{
    AppConfig, ContactEntry, LoggingConfig, SecureJoinConfig, SelfConfig, TranscriptConfig,
};
