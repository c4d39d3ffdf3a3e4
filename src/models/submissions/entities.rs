use serde::{Deserialize, Serialize};
use ts_rs::TS;

crate::define_string_enum! {
    // pending 为草稿，不可评分
    #[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
    pub enum SubmissionStatus("submission status") {
        Pending => "pending",
        Submitted => "submitted",
        Graded => "graded",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: String,
    pub attachments: Vec<String>,
    pub status: SubmissionStatus,
    pub is_late: bool,
    // 迟交扣分百分比，最高 100
    pub late_penalty: f64,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
    pub graded_by: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
