//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码、类型名称和 HTTP 状态码。
//! 业务错误在请求边界通过 [`actix_web::ResponseError`] 统一转换为 API 响应。

use std::fmt;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::models::{ApiResponse, ErrorCode};

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - http_status() 方法 - 返回对应的 HTTP 状态码
/// - api_code() 方法 - 返回响应体中的业务码
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_classroom_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $status:ident, $api_code:ident)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum ClassroomError {
            $($variant(String),)*
        }

        impl ClassroomError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(ClassroomError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(ClassroomError::$variant(_) => $type_name,)*
                }
            }

            /// 获取 HTTP 状态码
            pub fn http_status(&self) -> StatusCode {
                match self {
                    $(ClassroomError::$variant(_) => StatusCode::$status,)*
                }
            }

            /// 获取响应体业务码
            pub fn api_code(&self) -> ErrorCode {
                match self {
                    $(ClassroomError::$variant(_) => ErrorCode::$api_code,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(ClassroomError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl ClassroomError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        ClassroomError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_classroom_errors! {
    CacheConnection("E001", "Cache Connection Error", INTERNAL_SERVER_ERROR, InternalServerError),
    CachePluginNotFound("E002", "Cache Plugin Not Found", INTERNAL_SERVER_ERROR, InternalServerError),
    DatabaseConfig("E003", "Database Configuration Error", INTERNAL_SERVER_ERROR, InternalServerError),
    DatabaseConnection("E004", "Database Connection Error", INTERNAL_SERVER_ERROR, InternalServerError),
    DatabaseOperation("E005", "Database Operation Error", INTERNAL_SERVER_ERROR, InternalServerError),
    Serialization("E006", "Serialization Error", INTERNAL_SERVER_ERROR, InternalServerError),
    Validation("E007", "Validation Error", BAD_REQUEST, ValidationFailed),
    NotFound("E008", "Resource Not Found", NOT_FOUND, NotFound),
    DateParse("E009", "Date Parse Error", BAD_REQUEST, ValidationFailed),
    Authentication("E010", "Authentication Error", UNAUTHORIZED, Unauthorized),
    Authorization("E011", "Authorization Error", FORBIDDEN, Forbidden),
    InvalidOwner("E012", "Invalid Owner", FORBIDDEN, InvalidOwner),
    Conflict("E013", "Conflict", CONFLICT, Conflict),
    CapacityExceeded("E014", "Capacity Exceeded", CONFLICT, CapacityExceeded),
    InvalidState("E015", "Invalid State", CONFLICT, InvalidState),
    Token("E016", "Token Error", INTERNAL_SERVER_ERROR, InternalServerError),
}

impl ClassroomError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否为服务端内部错误（不向客户端暴露细节）
    pub fn is_internal(&self) -> bool {
        self.http_status().is_server_error()
    }
}

impl fmt::Display for ClassroomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ClassroomError {}

impl ResponseError for ClassroomError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_internal() {
            tracing::error!("Unhandled error [{}]: {}", self.code(), self.format_simple());
            return HttpResponse::build(self.http_status()).json(ApiResponse::error_empty(
                ErrorCode::InternalServerError,
                "Internal server error",
            ));
        }

        HttpResponse::build(self.http_status())
            .json(ApiResponse::error_empty(self.api_code(), self.message()))
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ClassroomError {
    fn from(err: sea_orm::DbErr) -> Self {
        ClassroomError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ClassroomError {
    fn from(err: serde_json::Error) -> Self {
        ClassroomError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for ClassroomError {
    fn from(err: chrono::ParseError) -> Self {
        ClassroomError::DateParse(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ClassroomError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ClassroomError::Token(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClassroomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ClassroomError::cache_connection("test").code(), "E001");
        assert_eq!(ClassroomError::database_config("test").code(), "E003");
        assert_eq!(ClassroomError::validation("test").code(), "E007");
        assert_eq!(ClassroomError::authentication("test").code(), "E010");
        assert_eq!(ClassroomError::capacity_exceeded("full").code(), "E014");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            ClassroomError::cache_connection("test").error_type(),
            "Cache Connection Error"
        );
        assert_eq!(
            ClassroomError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            ClassroomError::validation("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ClassroomError::authentication("x").http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ClassroomError::authorization("x").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ClassroomError::not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ClassroomError::conflict("x").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ClassroomError::database_operation("x").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_message() {
        let err = ClassroomError::validation("Invalid input");
        assert_eq!(err.message(), "Invalid input");
    }

    #[test]
    fn test_format_simple() {
        let err = ClassroomError::validation("Invalid URL");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid URL"));
    }

    #[actix_web::test]
    async fn test_internal_error_hides_detail() {
        let err = ClassroomError::database_operation("UNIQUE constraint failed: users.email");
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("UNIQUE"));
        assert!(text.contains("Internal server error"));
    }
}
