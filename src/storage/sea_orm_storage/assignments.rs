use super::{DbResultExt, SeaOrmStorage};
use crate::entity::assignments::{ActiveModel, Column, Entity as Assignments};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::{ClassroomError, Result};
use crate::models::{
    PaginationInfo,
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::{AssignmentListQuery, CreateAssignmentRequest, UpdateAssignmentRequest},
        responses::AssignmentListResponse,
    },
    common::pagination::normalize_page,
};
use crate::utils::now_ts;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, Value, sea_query::Expr,
};

impl SeaOrmStorage {
    /// 创建作业（草稿状态）
    pub async fn create_assignment_impl(&self, req: CreateAssignmentRequest) -> Result<Assignment> {
        let now = now_ts();

        let model = ActiveModel {
            course_id: Set(req.course_id),
            title: Set(req.title),
            description: Set(req.description),
            due_date: Set(req.due_date.timestamp()),
            total_points: Set(req.total_points),
            status: Set(AssignmentStatus::Draft.to_string()),
            allow_late_submission: Set(req.allow_late_submission.unwrap_or(true)),
            late_penalty_per_day: Set(req.late_penalty_per_day.unwrap_or(0.0)),
            submission_count: Set(0),
            graded_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .db_context("创建作业失败")?;

        Ok(result.into_assignment())
    }

    /// 通过 ID 获取作业
    pub async fn get_assignment_by_id_impl(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(assignment_id)
            .one(&self.db)
            .await
            .db_context("查询作业失败")?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 分页列出课程下的作业
    pub async fn list_assignments_with_pagination_impl(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse> {
        let (page, size) = normalize_page(query.page, query.size);

        let mut select = Assignments::find().filter(Column::CourseId.eq(query.course_id));

        if !query.statuses.is_empty() {
            select = select.filter(Column::Status.is_in(query.statuses.iter().map(|s| s.as_str())));
        }

        let paginator = select
            .order_by_asc(Column::DueDate)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.db_context("查询作业总数失败")?;
        let assignments = paginator
            .fetch_page(page - 1)
            .await
            .db_context("查询作业列表失败")?;

        Ok(AssignmentListResponse {
            items: assignments.into_iter().map(|m| m.into_assignment()).collect(),
            pagination: PaginationInfo::new(page as i64, size as i64, total as i64),
        })
    }

    /// 更新作业
    ///
    /// 已关闭的作业不可修改；总分不能低于已给出的最高分，两项条件都在同一条 UPDATE 中判断。
    pub async fn update_assignment_impl(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Assignment> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;

        let mut stmt = Assignments::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(now_ts()))
            .filter(Column::Id.eq(assignment_id))
            .filter(Column::Status.ne(AssignmentStatus::Closed.as_str()));

        if let Some(title) = update.title {
            stmt = stmt.col_expr(Column::Title, Expr::value(title));
        }
        if let Some(description) = update.description {
            stmt = stmt.col_expr(Column::Description, Expr::value(Some(description)));
        }
        if let Some(due_date) = update.due_date {
            stmt = stmt.col_expr(Column::DueDate, Expr::value(due_date.timestamp()));
        }
        if let Some(total_points) = update.total_points {
            // 与评分并发时也不能让已有成绩超过新总分
            stmt = stmt
                .col_expr(Column::TotalPoints, Expr::value(total_points))
                .filter(Expr::cust_with_values(
                    "NOT EXISTS (SELECT 1 FROM submissions WHERE assignment_id = ? AND grade > ?)",
                    [Value::from(assignment_id), Value::from(f64::from(total_points))],
                ));
        }
        if let Some(allow_late) = update.allow_late_submission {
            stmt = stmt.col_expr(Column::AllowLateSubmission, Expr::value(allow_late));
        }
        if let Some(rate) = update.late_penalty_per_day {
            stmt = stmt.col_expr(Column::LatePenaltyPerDay, Expr::value(rate));
        }

        let result = stmt.exec(&txn).await.db_context("更新作业失败")?;

        let current = Assignments::find_by_id(assignment_id)
            .one(&txn)
            .await
            .db_context("查询作业失败")?
            .ok_or_else(|| ClassroomError::not_found("Assignment not found"))?;

        if result.rows_affected == 0 {
            if current.status == AssignmentStatus::Closed.as_str() {
                return Err(ClassroomError::invalid_state(
                    "Closed assignments cannot be modified",
                ));
            }
            let max_grade: Option<Option<f64>> = Submissions::find()
                .select_only()
                .column_as(SubmissionColumn::Grade.max(), "max_grade")
                .filter(SubmissionColumn::AssignmentId.eq(assignment_id))
                .into_tuple()
                .one(&txn)
                .await
                .db_context("查询最高分失败")?;
            return Err(ClassroomError::validation(format!(
                "Total points cannot be lower than an existing grade of {}",
                max_grade.flatten().unwrap_or_default()
            )));
        }

        txn.commit().await.db_context("提交作业更新失败")?;

        Ok(current.into_assignment())
    }

    /// 状态迁移，仅当当前状态等于 `from` 时生效
    pub async fn transition_assignment_impl(
        &self,
        assignment_id: i64,
        from: AssignmentStatus,
        to: AssignmentStatus,
    ) -> Result<Option<Assignment>> {
        let result = Assignments::update_many()
            .col_expr(Column::Status, Expr::value(to.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(now_ts()))
            .filter(Column::Id.eq(assignment_id))
            .filter(Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .db_context("更新作业状态失败")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_assignment_by_id_impl(assignment_id).await
    }

    /// 删除草稿作业
    pub async fn delete_draft_assignment_impl(&self, assignment_id: i64) -> Result<bool> {
        let result = Assignments::delete_many()
            .filter(Column::Id.eq(assignment_id))
            .filter(Column::Status.eq(AssignmentStatus::Draft.as_str()))
            .exec(&self.db)
            .await
            .db_context("删除作业失败")?;

        Ok(result.rows_affected > 0)
    }
}
