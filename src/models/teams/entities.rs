use serde::{Deserialize, Serialize};
use ts_rs::TS;

crate::define_string_enum! {
    #[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
    pub enum TeamRole("team role") {
        Leader => "leader",
        Member => "member",
    }
}

crate::define_string_enum! {
    #[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
    pub enum ProjectStatus("project status") {
        Open => "open",
        Completed => "completed",
    }
}

crate::define_string_enum! {
    #[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
    pub enum TaskStatus("task status") {
        Todo => "todo",
        InProgress => "in_progress",
        Completed => "completed",
    }
}

/// 新建团队时默认创建的频道
pub const DEFAULT_CHANNELS: &[&str] = &["general", "announcements"];

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub course_id: Option<i64>,
    pub creator_id: i64,
    pub is_public: bool,
    pub allow_self_join: bool,
    pub channels: Vec<String>,
    pub open_project_count: i32,
    pub completed_task_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Team {
    pub fn accepts_self_join(&self) -> bool {
        self.is_public || self.allow_self_join
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct TeamMember {
    pub id: i64,
    pub team_id: i64,
    pub user_id: i64,
    pub role: TeamRole,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct Project {
    pub id: i64,
    pub team_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub position: i32,
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/team.ts")]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub team_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee_id: Option<i64>,
    pub position: i32,
    pub created_by: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
