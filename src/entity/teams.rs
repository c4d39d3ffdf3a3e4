//! 团队实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub course_id: Option<i64>,
    pub creator_id: i64,
    pub is_public: bool,
    pub allow_self_join: bool,
    #[sea_orm(column_type = "Text")]
    pub channels: String, // JSON 数组
    pub open_project_count: i32,
    pub completed_task_count: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::team_members::Entity")]
    Members,
    #[sea_orm(has_many = "super::projects::Entity")]
    Projects,
}

impl Related<super::team_members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::projects::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_team(self) -> crate::models::teams::entities::Team {
        use super::{parse_string_list, ts_to_datetime};
        use crate::models::teams::entities::Team;

        Team {
            id: self.id,
            channels: parse_string_list(Some(&self.channels)),
            name: self.name,
            description: self.description,
            course_id: self.course_id,
            creator_id: self.creator_id,
            is_public: self.is_public,
            allow_self_join: self.allow_self_join,
            open_project_count: self.open_project_count,
            completed_task_count: self.completed_task_count,
            created_at: ts_to_datetime(self.created_at),
            updated_at: ts_to_datetime(self.updated_at),
        }
    }
}
