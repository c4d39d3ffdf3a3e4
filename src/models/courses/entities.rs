use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    // 规范化后的大写课程代码
    pub code: String,
    pub teacher_id: i64,
    pub is_active: bool,
    pub enrollment_limit: Option<i32>,
    pub active_enrollment_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Course {
    pub fn is_full(&self) -> bool {
        self.enrollment_limit
            .is_some_and(|limit| self.active_enrollment_count >= limit)
    }
}
