use super::entities::Enrollment;
use crate::models::common::PaginationInfo;
use crate::models::users::entities::User;
use serde::Serialize;
use ts_rs::TS;

// 名单条目：选课记录 + 学生信息
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct EnrollmentWithStudent {
    #[serde(flatten)]
    #[ts(flatten)]
    pub enrollment: Enrollment,
    pub student: User,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/enrollment.ts")]
pub struct EnrollmentListResponse {
    pub items: Vec<EnrollmentWithStudent>,
    pub pagination: PaginationInfo,
}
