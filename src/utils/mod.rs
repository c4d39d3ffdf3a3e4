pub mod extractor;
pub mod jwt;
pub mod parameter_error_handler;
pub mod password;
pub mod sql;
pub mod validate;

pub use extractor::{
    SafeAssignmentIdI64, SafeCourseIdI64, SafeProjectIdI64, SafeSubmissionIdI64, SafeTaskIdI64,
    SafeTeamIdI64,
};
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::escape_like_pattern;

/// 区分"字段缺失"与"显式 null"
///
/// 缺失时由 `#[serde(default)]` 得到 `None`，显式 null 得到 `Some(None)`。
pub fn deserialize_double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    Option::<T>::deserialize(deserializer).map(Some)
}

/// 当前 Unix 秒时间戳
pub fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}
