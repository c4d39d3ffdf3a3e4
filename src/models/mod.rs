//! 数据模型定义
//!
//! 业务实体、请求与响应结构，与 `entity` 中的数据库模型分离。

pub mod assignments;
pub mod auth;
pub mod chatbot;
pub mod common;
pub mod courses;
pub mod enrollments;
pub mod submissions;
pub mod teams;
pub mod users;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

/// 响应体中的业务码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1005,
    InvalidState = 1006,
    RateLimitExceeded = 1007,
    InternalServerError = 1008,

    // 认证
    AuthFailed = 2000,
    RegisterFailed = 2001,
    UserEmailAlreadyExists = 2002,
    UserDisabled = 2003,

    // 课程
    InvalidOwner = 3000,
    CapacityExceeded = 3001,
}
