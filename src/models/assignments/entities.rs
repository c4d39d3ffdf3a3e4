use serde::{Deserialize, Serialize};
use ts_rs::TS;

crate::define_string_enum! {
    // 作业状态：draft → published → closed
    #[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
    pub enum AssignmentStatus("assignment status") {
        Draft => "draft",
        Published => "published",
        Closed => "closed",
    }
}

impl AssignmentStatus {
    /// 合法的下一状态
    pub fn next(&self) -> Option<AssignmentStatus> {
        match self {
            AssignmentStatus::Draft => Some(AssignmentStatus::Published),
            AssignmentStatus::Published => Some(AssignmentStatus::Closed),
            AssignmentStatus::Closed => None,
        }
    }

    /// 学生可见的状态
    pub fn visible_to_students(&self) -> bool {
        match self {
            AssignmentStatus::Draft => false,
            AssignmentStatus::Published | AssignmentStatus::Closed => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/assignment.ts")]
pub struct Assignment {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub total_points: i32,
    pub status: AssignmentStatus,
    pub allow_late_submission: bool,
    // 每迟交一天扣除的百分比
    pub late_penalty_per_day: f64,
    pub submission_count: i32,
    pub graded_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
