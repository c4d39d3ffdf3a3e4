//! 配置管理
//!
//! 配置分层：内置默认值 → `config.toml` → `config.{APP_ENV}.toml` → `CLASSROOM_*` 环境变量 → 显式覆盖。

mod load;
mod structs;

pub use structs::*;
