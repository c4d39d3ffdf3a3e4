use super::entities::AssignmentStatus;
use crate::models::common::PaginationQuery;
use crate::models::common::pagination::deserialize_string_to_i64;
use serde::Deserialize;
use ts_rs::TS;

// 作业列表查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct AssignmentQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    #[serde(deserialize_with = "deserialize_string_to_i64")]
    pub course_id: i64,
    pub status: Option<AssignmentStatus>,
}

// 创建作业请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct CreateAssignmentRequest {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub total_points: i32,
    pub allow_late_submission: Option<bool>,
    pub late_penalty_per_day: Option<f64>,
}

// 更新作业请求
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct UpdateAssignmentRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    pub total_points: Option<i32>,
    pub allow_late_submission: Option<bool>,
    pub late_penalty_per_day: Option<f64>,
}

// 作业列表查询参数（用于存储层）
#[derive(Debug, Clone)]
pub struct AssignmentListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub course_id: i64,
    // 为空表示不限制
    pub statuses: Vec<AssignmentStatus>,
}
