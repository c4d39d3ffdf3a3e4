use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 提交作业请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmitRequest {
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    // 仅保存草稿
    #[serde(default)]
    pub draft: bool,
}

// 评分请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct GradeRequest {
    pub grade: f64,
    pub feedback: Option<String>,
}

// 提交列表查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
}

// 存储层写入参数（迟交信息由服务层计算）
#[derive(Debug, Clone)]
pub struct UpsertSubmission {
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: String,
    pub attachments: Vec<String>,
    pub draft: bool,
    pub is_late: bool,
    pub late_penalty: f64,
}

// 存储层评分参数
#[derive(Debug, Clone)]
pub struct GradeSubmission {
    pub assignment_id: i64,
    pub submission_id: i64,
    pub grade: f64,
    pub feedback: Option<String>,
    pub graded_by: i64,
}

// 提交列表查询参数（用于存储层）
#[derive(Debug, Clone)]
pub struct SubmissionListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub assignment_id: i64,
    pub student_id: Option<i64>,
}
