use super::{DbResultExt, SeaOrmStorage, is_unique_violation};
use crate::entity::projects::{
    ActiveModel as ProjectActiveModel, Column as ProjectColumn, Entity as Projects,
};
use crate::entity::tasks::{ActiveModel as TaskActiveModel, Column as TaskColumn, Entity as Tasks};
use crate::entity::team_members::{
    ActiveModel as MemberActiveModel, Column as MemberColumn, Entity as TeamMembers,
};
use crate::entity::teams::{ActiveModel, Column, Entity as Teams};
use crate::errors::{ClassroomError, Result};
use crate::models::{
    PaginationInfo,
    common::pagination::normalize_page,
    teams::{
        entities::{
            DEFAULT_CHANNELS, Project, ProjectStatus, Task, TaskStatus, Team, TeamMember, TeamRole,
        },
        requests::{NewTeam, TeamListQuery},
        responses::{ProjectWithTasks, TeamDetail, TeamListResponse},
    },
};
use crate::utils::now_ts;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Query},
};
use std::collections::HashMap;

/// 重新统计团队的开放项目数与已完成任务数
async fn recompute_team_stats<C: ConnectionTrait>(conn: &C, team_id: i64) -> Result<()> {
    let open_projects = Projects::find()
        .filter(ProjectColumn::TeamId.eq(team_id))
        .filter(ProjectColumn::Status.eq(ProjectStatus::Open.as_str()))
        .count(conn)
        .await
        .db_context("统计项目数失败")?;

    let completed_tasks = Tasks::find()
        .filter(TaskColumn::TeamId.eq(team_id))
        .filter(TaskColumn::Status.eq(TaskStatus::Completed.as_str()))
        .count(conn)
        .await
        .db_context("统计任务数失败")?;

    Teams::update_many()
        .col_expr(Column::OpenProjectCount, Expr::value(open_projects as i32))
        .col_expr(Column::CompletedTaskCount, Expr::value(completed_tasks as i32))
        .col_expr(Column::UpdatedAt, Expr::value(now_ts()))
        .filter(Column::Id.eq(team_id))
        .exec(conn)
        .await
        .db_context("更新团队统计失败")?;

    Ok(())
}

/// 项目下任务全部完成时标记为 completed，否则保持 open
async fn sync_project_status<C: ConnectionTrait>(conn: &C, project_id: i64) -> Result<()> {
    let total = Tasks::find()
        .filter(TaskColumn::ProjectId.eq(project_id))
        .count(conn)
        .await
        .db_context("统计任务数失败")?;

    let completed = Tasks::find()
        .filter(TaskColumn::ProjectId.eq(project_id))
        .filter(TaskColumn::Status.eq(TaskStatus::Completed.as_str()))
        .count(conn)
        .await
        .db_context("统计任务数失败")?;

    let status = if total > 0 && completed == total {
        ProjectStatus::Completed
    } else {
        ProjectStatus::Open
    };

    Projects::update_many()
        .col_expr(ProjectColumn::Status, Expr::value(status.as_str()))
        .col_expr(ProjectColumn::UpdatedAt, Expr::value(now_ts()))
        .filter(ProjectColumn::Id.eq(project_id))
        .filter(ProjectColumn::Status.ne(status.as_str()))
        .exec(conn)
        .await
        .db_context("更新项目状态失败")?;

    Ok(())
}

async fn count_leaders<C: ConnectionTrait>(conn: &C, team_id: i64) -> Result<u64> {
    TeamMembers::find()
        .filter(MemberColumn::TeamId.eq(team_id))
        .filter(MemberColumn::Role.eq(TeamRole::Leader.as_str()))
        .count(conn)
        .await
        .db_context("统计组长数失败")
}

impl SeaOrmStorage {
    /// 创建团队，创建者成为组长
    pub async fn create_team_impl(&self, team: NewTeam) -> Result<Team> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;
        let now = now_ts();

        let model = ActiveModel {
            name: Set(team.name),
            description: Set(team.description),
            course_id: Set(team.course_id),
            creator_id: Set(team.creator_id),
            is_public: Set(team.is_public),
            allow_self_join: Set(team.allow_self_join),
            channels: Set(serde_json::to_string(DEFAULT_CHANNELS)?),
            open_project_count: Set(0),
            completed_task_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model.insert(&txn).await.db_context("创建团队失败")?;

        MemberActiveModel {
            team_id: Set(created.id),
            user_id: Set(team.creator_id),
            role: Set(TeamRole::Leader.to_string()),
            joined_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .db_context("添加组长失败")?;

        txn.commit().await.db_context("提交团队事务失败")?;

        Ok(created.into_team())
    }

    /// 通过 ID 获取团队
    pub async fn get_team_by_id_impl(&self, team_id: i64) -> Result<Option<Team>> {
        let result = Teams::find_by_id(team_id)
            .one(&self.db)
            .await
            .db_context("查询团队失败")?;

        Ok(result.map(|m| m.into_team()))
    }

    /// 团队详情：成员、项目及任务
    pub async fn get_team_detail_impl(&self, team_id: i64) -> Result<Option<TeamDetail>> {
        let Some(team) = self.get_team_by_id_impl(team_id).await? else {
            return Ok(None);
        };

        let members = TeamMembers::find()
            .filter(MemberColumn::TeamId.eq(team_id))
            .order_by_asc(MemberColumn::JoinedAt)
            .order_by_asc(MemberColumn::Id)
            .all(&self.db)
            .await
            .db_context("查询团队成员失败")?;

        let projects = Projects::find()
            .filter(ProjectColumn::TeamId.eq(team_id))
            .order_by_asc(ProjectColumn::Position)
            .all(&self.db)
            .await
            .db_context("查询项目失败")?;

        let tasks = Tasks::find()
            .filter(TaskColumn::TeamId.eq(team_id))
            .order_by_asc(TaskColumn::Position)
            .all(&self.db)
            .await
            .db_context("查询任务失败")?;

        let mut tasks_by_project: HashMap<i64, Vec<Task>> = HashMap::new();
        for task in tasks {
            tasks_by_project
                .entry(task.project_id)
                .or_default()
                .push(task.into_task());
        }

        let projects = projects
            .into_iter()
            .map(|p| {
                let tasks = tasks_by_project.remove(&p.id).unwrap_or_default();
                ProjectWithTasks {
                    project: p.into_project(),
                    tasks,
                }
            })
            .collect();

        Ok(Some(TeamDetail {
            team,
            members: members.into_iter().map(|m| m.into_team_member()).collect(),
            projects,
        }))
    }

    /// 获取成员记录
    pub async fn get_team_member_impl(
        &self,
        team_id: i64,
        user_id: i64,
    ) -> Result<Option<TeamMember>> {
        let result = TeamMembers::find()
            .filter(MemberColumn::TeamId.eq(team_id))
            .filter(MemberColumn::UserId.eq(user_id))
            .one(&self.db)
            .await
            .db_context("查询团队成员失败")?;

        Ok(result.map(|m| m.into_team_member()))
    }

    /// 分页列出团队：公开团队与调用者所在的团队
    pub async fn list_teams_with_pagination_impl(
        &self,
        query: TeamListQuery,
    ) -> Result<TeamListResponse> {
        let (page, size) = normalize_page(query.page, query.size);

        let mut select = Teams::find().filter(
            Condition::any().add(Column::IsPublic.eq(true)).add(
                Column::Id.in_subquery(
                    Query::select()
                        .column(MemberColumn::TeamId)
                        .from(TeamMembers)
                        .and_where(MemberColumn::UserId.eq(query.viewer_id))
                        .to_owned(),
                ),
            ),
        );

        if let Some(course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.db_context("查询团队总数失败")?;
        let teams = paginator
            .fetch_page(page - 1)
            .await
            .db_context("查询团队列表失败")?;

        Ok(TeamListResponse {
            items: teams.into_iter().map(|m| m.into_team()).collect(),
            pagination: PaginationInfo::new(page as i64, size as i64, total as i64),
        })
    }

    /// 加入团队；团队没有组长时加入者成为组长
    pub async fn join_team_impl(&self, team_id: i64, user_id: i64) -> Result<TeamMember> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;

        let role = if count_leaders(&txn, team_id).await? == 0 {
            TeamRole::Leader
        } else {
            TeamRole::Member
        };

        let member = MemberActiveModel {
            team_id: Set(team_id),
            user_id: Set(user_id),
            role: Set(role.to_string()),
            joined_at: Set(now_ts()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ClassroomError::conflict("Already a member of this team")
            } else {
                ClassroomError::database_operation(format!("加入团队失败: {e}"))
            }
        })?;

        txn.commit().await.db_context("提交团队事务失败")?;

        Ok(member.into_team_member())
    }

    /// 退出团队；最后一名组长离开时提拔最早加入的成员
    pub async fn leave_team_impl(&self, team_id: i64, user_id: i64) -> Result<()> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;

        let member = TeamMembers::find()
            .filter(MemberColumn::TeamId.eq(team_id))
            .filter(MemberColumn::UserId.eq(user_id))
            .one(&txn)
            .await
            .db_context("查询团队成员失败")?
            .ok_or_else(|| ClassroomError::invalid_state("Not a member of this team"))?;

        TeamMembers::delete_by_id(member.id)
            .exec(&txn)
            .await
            .db_context("退出团队失败")?;

        if member.role == TeamRole::Leader.as_str() && count_leaders(&txn, team_id).await? == 0 {
            let successor = TeamMembers::find()
                .filter(MemberColumn::TeamId.eq(team_id))
                .order_by_asc(MemberColumn::JoinedAt)
                .order_by_asc(MemberColumn::Id)
                .one(&txn)
                .await
                .db_context("查询团队成员失败")?;

            if let Some(successor) = successor {
                TeamMembers::update_many()
                    .col_expr(MemberColumn::Role, Expr::value(TeamRole::Leader.as_str()))
                    .filter(MemberColumn::Id.eq(successor.id))
                    .exec(&txn)
                    .await
                    .db_context("提拔组长失败")?;
            }
        }

        txn.commit().await.db_context("提交团队事务失败")?;

        Ok(())
    }

    /// 创建项目，位置追加到末尾
    pub async fn create_project_impl(
        &self,
        team_id: i64,
        name: String,
        description: Option<String>,
        created_by: i64,
    ) -> Result<Project> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;
        let now = now_ts();

        let max_position: Option<Option<i32>> = Projects::find()
            .select_only()
            .column_as(ProjectColumn::Position.max(), "max_position")
            .filter(ProjectColumn::TeamId.eq(team_id))
            .into_tuple()
            .one(&txn)
            .await
            .db_context("查询项目位置失败")?;

        let project = ProjectActiveModel {
            team_id: Set(team_id),
            name: Set(name),
            description: Set(description),
            status: Set(ProjectStatus::Open.to_string()),
            position: Set(max_position.flatten().unwrap_or(0) + 1),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .db_context("创建项目失败")?;

        recompute_team_stats(&txn, team_id).await?;

        txn.commit().await.db_context("提交项目事务失败")?;

        Ok(project.into_project())
    }

    /// 通过 ID 获取项目
    pub async fn get_project_by_id_impl(&self, project_id: i64) -> Result<Option<Project>> {
        let result = Projects::find_by_id(project_id)
            .one(&self.db)
            .await
            .db_context("查询项目失败")?;

        Ok(result.map(|m| m.into_project()))
    }

    /// 创建任务，位置追加到项目末尾
    pub async fn create_task_impl(
        &self,
        project: &Project,
        title: String,
        description: Option<String>,
        assignee_id: Option<i64>,
        created_by: i64,
    ) -> Result<Task> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;
        let now = now_ts();

        let max_position: Option<Option<i32>> = Tasks::find()
            .select_only()
            .column_as(TaskColumn::Position.max(), "max_position")
            .filter(TaskColumn::ProjectId.eq(project.id))
            .into_tuple()
            .one(&txn)
            .await
            .db_context("查询任务位置失败")?;

        let task = TaskActiveModel {
            project_id: Set(project.id),
            team_id: Set(project.team_id),
            title: Set(title),
            description: Set(description),
            status: Set(TaskStatus::Todo.to_string()),
            assignee_id: Set(assignee_id),
            position: Set(max_position.flatten().unwrap_or(0) + 1),
            created_by: Set(created_by),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .db_context("创建任务失败")?;

        sync_project_status(&txn, project.id).await?;
        recompute_team_stats(&txn, project.team_id).await?;

        txn.commit().await.db_context("提交任务事务失败")?;

        Ok(task.into_task())
    }

    /// 通过 ID 获取任务
    pub async fn get_task_by_id_impl(&self, task_id: i64) -> Result<Option<Task>> {
        let result = Tasks::find_by_id(task_id)
            .one(&self.db)
            .await
            .db_context("查询任务失败")?;

        Ok(result.map(|m| m.into_task()))
    }

    /// 更新任务状态，并同步项目状态与团队统计
    pub async fn update_task_status_impl(&self, task_id: i64, status: TaskStatus) -> Result<Task> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;

        let task = Tasks::find_by_id(task_id)
            .one(&txn)
            .await
            .db_context("查询任务失败")?
            .ok_or_else(|| ClassroomError::not_found("Task not found"))?;

        Tasks::update_many()
            .col_expr(TaskColumn::Status, Expr::value(status.as_str()))
            .col_expr(TaskColumn::UpdatedAt, Expr::value(now_ts()))
            .filter(TaskColumn::Id.eq(task_id))
            .exec(&txn)
            .await
            .db_context("更新任务状态失败")?;

        sync_project_status(&txn, task.project_id).await?;
        recompute_team_stats(&txn, task.team_id).await?;

        let updated = Tasks::find_by_id(task_id)
            .one(&txn)
            .await
            .db_context("查询任务失败")?
            .ok_or_else(|| ClassroomError::database_operation("任务记录丢失"))?;

        txn.commit().await.db_context("提交任务事务失败")?;

        Ok(updated.into_task())
    }
}
