//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod assignments;
pub mod chat_messages;
pub mod chat_sessions;
pub mod courses;
pub mod enrollments;
pub mod projects;
pub mod submissions;
pub mod tasks;
pub mod team_members;
pub mod teams;
pub mod users;

use chrono::{DateTime, Utc};

/// 将数据库中的 Unix 秒时间戳转换为 UTC 时间
pub(crate) fn ts_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}

/// JSON 文本列解析为字符串列表，解析失败视为空
pub(crate) fn parse_string_list(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}
