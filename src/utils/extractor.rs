//! 路径参数安全提取器
//!
//! 将 `{xxx_id}` 解析为正整数，失败时返回 400 而不是 404。

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};

use crate::errors::ClassroomError;

/// 定义从路径参数中读取 i64 ID 的提取器
#[macro_export]
macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl $name {
            pub fn parse(raw: &str) -> Result<i64, $crate::errors::ClassroomError> {
                match raw.parse::<i64>() {
                    Ok(id) if id > 0 => Ok(id),
                    _ => Err($crate::errors::ClassroomError::validation(format!(
                        "Invalid {}: '{}'",
                        $param, raw
                    ))),
                }
            }
        }

        impl actix_web::FromRequest for $name {
            type Error = $crate::errors::ClassroomError;
            type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                _payload: &mut actix_web::dev::Payload,
            ) -> Self::Future {
                let result = match req.match_info().get($param) {
                    Some(raw) => Self::parse(raw).map($name),
                    None => Err($crate::errors::ClassroomError::validation(format!(
                        "Missing path parameter: {}",
                        $param
                    ))),
                };
                futures_util::future::ready(result)
            }
        }
    };
}

define_safe_i64_extractor!(SafeCourseIdI64, "course_id");
define_safe_i64_extractor!(SafeAssignmentIdI64, "assignment_id");
define_safe_i64_extractor!(SafeSubmissionIdI64, "submission_id");
define_safe_i64_extractor!(SafeTeamIdI64, "team_id");
define_safe_i64_extractor!(SafeProjectIdI64, "project_id");
define_safe_i64_extractor!(SafeTaskIdI64, "task_id");

/// 会话 key（UUID 字符串）
#[derive(Debug, Clone)]
pub struct SafeSessionKey(pub String);

impl FromRequest for SafeSessionKey {
    type Error = ClassroomError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = req
            .match_info()
            .get("session_key")
            .and_then(|raw| uuid::Uuid::parse_str(raw).ok())
            .map(|key| SafeSessionKey(key.to_string()))
            .ok_or_else(|| ClassroomError::validation("Invalid session key"));
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_non_positive() {
        assert_eq!(SafeCourseIdI64::parse("12"), Ok(12));
        assert!(SafeCourseIdI64::parse("0").is_err());
        assert!(SafeCourseIdI64::parse("-3").is_err());
        assert!(SafeCourseIdI64::parse("abc").is_err());
    }
}
