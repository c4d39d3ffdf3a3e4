use super::entities::{Project, Task, Team, TeamMember};
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    #[ts(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}

// 团队详情：成员、项目与任务
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct TeamDetail {
    #[serde(flatten)]
    #[ts(flatten)]
    pub team: Team,
    pub members: Vec<TeamMember>,
    pub projects: Vec<ProjectWithTasks>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct TeamListResponse {
    pub items: Vec<Team>,
    pub pagination: PaginationInfo,
}
