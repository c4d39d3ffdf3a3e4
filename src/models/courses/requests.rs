use crate::models::common::PaginationQuery;
use crate::models::common::pagination::{deserialize_bool_flag, deserialize_optional_i64};
use serde::Deserialize;
use ts_rs::TS;

// 课程查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CourseQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub teacher_id: Option<i64>,
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_bool_flag")]
    pub mine: bool,
}

// 创建课程请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
    pub code: String,
    pub enrollment_limit: Option<i32>,
    pub is_active: Option<bool>,
}

// 更新课程请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub code: Option<String>,
    // 外层 None 表示不修改，Some(None) 表示取消人数限制
    #[serde(default, deserialize_with = "crate::utils::deserialize_double_option")]
    #[ts(type = "number | null")]
    pub enrollment_limit: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

// 课程列表作用域（由调用者身份解析得到）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseScope {
    // 仅活跃课程
    Public,
    // 活跃课程 + 指定教师自己的非活跃课程
    PublicAndOwnedBy(i64),
    // 指定教师的全部课程
    OwnedBy(i64),
    // 指定学生当前选修的课程
    EnrolledBy(i64),
}

// 课程列表查询参数（用于存储层）
#[derive(Debug, Clone)]
pub struct CourseListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub teacher_id: Option<i64>,
    pub search: Option<String>,
    pub scope: CourseScope,
}

// 存储层创建参数（已规范化）
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub teacher_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub code: String,
    pub enrollment_limit: Option<i32>,
    pub is_active: bool,
}
