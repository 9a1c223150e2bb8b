//! # Trajex Tools - 共享配置
//!
//! **依赖原则**: 只依赖 `trajex-protocol`，避免依赖 `trajex-client`
//!
//! ## 包含模块
//!
//! - `config` - 执行配置文件格式（TOML）
//!
//! ## 使用示例
//!
//! ```rust
//! use trajex_tools::ExecutionConfig;
//!
//! let config = ExecutionConfig::from_toml_str("[playback]\ndefault_speed = 40\n")?;
//! assert_eq!(config.playback.default_speed, 40);
//! assert_eq!(config.session.init_timeout_ms, 5000);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;

pub use config::{ExecutionConfig, PlaybackSettings, SessionSettings};
