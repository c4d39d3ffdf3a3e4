use super::{DbResultExt, SeaOrmStorage, is_unique_violation};
use crate::entity::assignments::{Column as AssignmentColumn, Entity as Assignments};
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions, Model};
use crate::errors::{ClassroomError, Result};
use crate::models::{
    PaginationInfo,
    common::pagination::normalize_page,
    submissions::{
        entities::{Submission, SubmissionStatus},
        requests::{GradeSubmission, SubmissionListQuery, UpsertSubmission},
        responses::SubmissionListResponse,
    },
};
use crate::utils::now_ts;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait, Value,
    sea_query::{Expr, OnConflict},
};

async fn find_pair<C: ConnectionTrait>(
    conn: &C,
    assignment_id: i64,
    student_id: i64,
) -> Result<Option<Model>> {
    Submissions::find()
        .filter(Column::AssignmentId.eq(assignment_id))
        .filter(Column::StudentId.eq(student_id))
        .one(conn)
        .await
        .db_context("查询提交记录失败")
}

/// 重新统计作业的提交数与已评分数
async fn recompute_assignment_counters<C: ConnectionTrait>(
    conn: &C,
    assignment_id: i64,
) -> Result<()> {
    let submitted = Submissions::find()
        .filter(Column::AssignmentId.eq(assignment_id))
        .filter(Column::Status.ne(SubmissionStatus::Pending.as_str()))
        .count(conn)
        .await
        .db_context("统计提交数失败")?;

    let graded = Submissions::find()
        .filter(Column::AssignmentId.eq(assignment_id))
        .filter(Column::Status.eq(SubmissionStatus::Graded.as_str()))
        .count(conn)
        .await
        .db_context("统计评分数失败")?;

    Assignments::update_many()
        .col_expr(AssignmentColumn::SubmissionCount, Expr::value(submitted as i32))
        .col_expr(AssignmentColumn::GradedCount, Expr::value(graded as i32))
        .filter(AssignmentColumn::Id.eq(assignment_id))
        .exec(conn)
        .await
        .db_context("更新作业统计失败")?;

    Ok(())
}

/// 保存草稿：先条件更新已有草稿，没有草稿时插入新记录
///
/// 已正式提交的记录既不满足更新条件，也会让插入撞上唯一索引，两种情况都报 `InvalidState`。
async fn save_draft<C: ConnectionTrait>(
    conn: &C,
    req: &UpsertSubmission,
    attachments: &str,
    now: i64,
) -> Result<()> {
    let updated = Submissions::update_many()
        .col_expr(Column::Content, Expr::value(req.content.clone()))
        .col_expr(Column::Attachments, Expr::value(Some(attachments.to_string())))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::AssignmentId.eq(req.assignment_id))
        .filter(Column::StudentId.eq(req.student_id))
        .filter(Column::Status.eq(SubmissionStatus::Pending.as_str()))
        .exec(conn)
        .await
        .db_context("保存草稿失败")?;

    if updated.rows_affected > 0 {
        return Ok(());
    }

    let model = ActiveModel {
        assignment_id: Set(req.assignment_id),
        student_id: Set(req.student_id),
        content: Set(req.content.clone()),
        attachments: Set(Some(attachments.to_string())),
        status: Set(SubmissionStatus::Pending.to_string()),
        is_late: Set(false),
        late_penalty: Set(0.0),
        grade: Set(None),
        feedback: Set(None),
        submitted_at: Set(None),
        graded_at: Set(None),
        graded_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    match Submissions::insert(model).exec_without_returning(conn).await {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => Err(ClassroomError::invalid_state(
            "A submitted answer cannot be replaced by a draft",
        )),
        Err(e) => Err(ClassroomError::database_operation(format!("保存草稿失败: {e}"))),
    }
}

impl SeaOrmStorage {
    /// 提交或保存草稿
    ///
    /// 正式提交依赖 (assignment_id, student_id) 唯一索引做 upsert，重复提交覆盖内容，保留已有评分。
    /// 草稿只覆盖仍处于草稿状态的记录。
    pub async fn upsert_submission_impl(&self, req: UpsertSubmission) -> Result<Submission> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;
        let now = now_ts();
        let attachments = serde_json::to_string(&req.attachments)?;

        if req.draft {
            save_draft(&txn, &req, &attachments, now).await?;
        } else {
            let model = ActiveModel {
                assignment_id: Set(req.assignment_id),
                student_id: Set(req.student_id),
                content: Set(req.content.clone()),
                attachments: Set(Some(attachments)),
                status: Set(SubmissionStatus::Submitted.to_string()),
                is_late: Set(req.is_late),
                late_penalty: Set(req.late_penalty),
                grade: Set(None),
                feedback: Set(None),
                submitted_at: Set(Some(now)),
                graded_at: Set(None),
                graded_by: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            Submissions::insert(model)
                .on_conflict(
                    OnConflict::columns([Column::AssignmentId, Column::StudentId])
                        .update_columns([
                            Column::Content,
                            Column::Attachments,
                            Column::Status,
                            Column::IsLate,
                            Column::LatePenalty,
                            Column::SubmittedAt,
                            Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .db_context("保存提交失败")?;
        }

        let submission = find_pair(&txn, req.assignment_id, req.student_id)
            .await?
            .ok_or_else(|| ClassroomError::database_operation("提交记录丢失"))?;

        recompute_assignment_counters(&txn, req.assignment_id).await?;

        txn.commit().await.db_context("提交事务失败")?;

        Ok(submission.into_submission())
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(&self, submission_id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .db_context("查询提交失败")?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 获取学生在某作业下的提交
    pub async fn get_student_submission_impl(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        Ok(find_pair(&self.db, assignment_id, student_id)
            .await?
            .map(|m| m.into_submission()))
    }

    /// 评分，重复评分直接覆盖
    pub async fn grade_submission_impl(&self, req: GradeSubmission) -> Result<Submission> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;
        let now = now_ts();

        let existing = Submissions::find_by_id(req.submission_id)
            .one(&txn)
            .await
            .db_context("查询提交失败")?
            .filter(|s| s.assignment_id == req.assignment_id)
            .ok_or_else(|| ClassroomError::not_found("Submission not found"))?;

        if existing.status == SubmissionStatus::Pending.as_str() {
            return Err(ClassroomError::invalid_state("Drafts cannot be graded"));
        }

        let result = Submissions::update_many()
            .col_expr(Column::Grade, Expr::value(Some(req.grade)))
            .col_expr(Column::Feedback, Expr::value(req.feedback))
            .col_expr(Column::Status, Expr::value(SubmissionStatus::Graded.as_str()))
            .col_expr(Column::GradedAt, Expr::value(Some(now)))
            .col_expr(Column::GradedBy, Expr::value(Some(req.graded_by)))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(req.submission_id))
            .filter(Column::Status.ne(SubmissionStatus::Pending.as_str()))
            // 总分可能被并发修改，上限在同一条语句里校验
            .filter(Expr::cust_with_values(
                "? <= (SELECT total_points FROM assignments WHERE id = ?)",
                [Value::from(req.grade), Value::from(req.assignment_id)],
            ))
            .exec(&txn)
            .await
            .db_context("评分失败")?;

        if result.rows_affected == 0 {
            return Err(ClassroomError::validation(
                "Grade exceeds the assignment's total points",
            ));
        }

        recompute_assignment_counters(&txn, req.assignment_id).await?;

        let graded = Submissions::find_by_id(req.submission_id)
            .one(&txn)
            .await
            .db_context("查询提交失败")?
            .ok_or_else(|| ClassroomError::database_operation("提交记录丢失"))?;

        txn.commit().await.db_context("提交评分事务失败")?;

        Ok(graded.into_submission())
    }

    /// 分页列出提交
    pub async fn list_submissions_with_pagination_impl(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let (page, size) = normalize_page(query.page, query.size);

        let mut select = Submissions::find().filter(Column::AssignmentId.eq(query.assignment_id));

        if let Some(student_id) = query.student_id {
            select = select.filter(Column::StudentId.eq(student_id));
        }

        let paginator = select
            .order_by_desc(Column::UpdatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.db_context("查询提交总数失败")?;
        let submissions = paginator
            .fetch_page(page - 1)
            .await
            .db_context("查询提交列表失败")?;

        Ok(SubmissionListResponse {
            items: submissions.into_iter().map(|m| m.into_submission()).collect(),
            pagination: PaginationInfo::new(page as i64, size as i64, total as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::ClassroomError;
    use crate::models::assignments::requests::UpdateAssignmentRequest;
    use crate::models::submissions::{
        entities::SubmissionStatus,
        requests::{GradeSubmission, UpsertSubmission},
    };
    use crate::models::users::entities::UserRole;
    use crate::test_support::TestContext;

    fn answer(assignment_id: i64, student_id: i64, content: &str, draft: bool) -> UpsertSubmission {
        UpsertSubmission {
            assignment_id,
            student_id,
            content: content.to_string(),
            attachments: Vec::new(),
            draft,
            is_late: false,
            late_penalty: 0.0,
        }
    }

    #[actix_web::test]
    async fn test_draft_cannot_replace_submitted_answer() {
        let ctx = TestContext::new().await;
        let (teacher, _) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
        let (student, _) = ctx.seed_user("s@example.com", UserRole::Student).await;
        let course = ctx.seed_course(teacher.id, "SUB-1", None).await;
        let assignment = ctx.seed_published_assignment(course.id, 100).await;

        let draft = ctx
            .storage
            .upsert_submission(answer(assignment.id, student.id, "wip", true))
            .await
            .unwrap();
        assert_eq!(draft.status, SubmissionStatus::Pending);
        assert!(draft.submitted_at.is_none());

        // 草稿可以反复覆盖草稿
        let draft_again = ctx
            .storage
            .upsert_submission(answer(assignment.id, student.id, "wip 2", true))
            .await
            .unwrap();
        assert_eq!(draft_again.id, draft.id);
        assert_eq!(draft_again.content, "wip 2");

        let submitted = ctx
            .storage
            .upsert_submission(answer(assignment.id, student.id, "final", false))
            .await
            .unwrap();
        assert_eq!(submitted.id, draft.id);
        assert_eq!(submitted.status, SubmissionStatus::Submitted);

        let err = ctx
            .storage
            .upsert_submission(answer(assignment.id, student.id, "overwrite", true))
            .await
            .unwrap_err();
        assert!(matches!(err, ClassroomError::InvalidState(_)));

        let stored = ctx
            .storage
            .get_student_submission(assignment.id, student.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Submitted);
        assert_eq!(stored.content, "final");
        assert!(stored.submitted_at.is_some());
    }

    #[actix_web::test]
    async fn test_first_draft_of_graded_student_is_rejected() {
        let ctx = TestContext::new().await;
        let (teacher, _) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
        let (student, _) = ctx.seed_user("s@example.com", UserRole::Student).await;
        let course = ctx.seed_course(teacher.id, "SUB-2", None).await;
        let assignment = ctx.seed_published_assignment(course.id, 10).await;

        let submitted = ctx
            .storage
            .upsert_submission(answer(assignment.id, student.id, "done", false))
            .await
            .unwrap();
        ctx.storage
            .grade_submission(GradeSubmission {
                assignment_id: assignment.id,
                submission_id: submitted.id,
                grade: 8.0,
                feedback: None,
                graded_by: teacher.id,
            })
            .await
            .unwrap();

        let err = ctx
            .storage
            .upsert_submission(answer(assignment.id, student.id, "redo", true))
            .await
            .unwrap_err();
        assert!(matches!(err, ClassroomError::InvalidState(_)));

        let stored = ctx
            .storage
            .get_submission_by_id(submitted.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Graded);
        assert_eq!(stored.grade, Some(8.0));
    }

    #[actix_web::test]
    async fn test_grade_bound_is_checked_by_the_update() {
        let ctx = TestContext::new().await;
        let (teacher, _) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
        let (student, _) = ctx.seed_user("s@example.com", UserRole::Student).await;
        let course = ctx.seed_course(teacher.id, "SUB-3", None).await;
        let assignment = ctx.seed_published_assignment(course.id, 50).await;

        let submitted = ctx
            .storage
            .upsert_submission(answer(assignment.id, student.id, "done", false))
            .await
            .unwrap();

        let grade = |value: f64| GradeSubmission {
            assignment_id: assignment.id,
            submission_id: submitted.id,
            grade: value,
            feedback: None,
            graded_by: teacher.id,
        };

        // 绕过服务层校验，直接交给存储层
        let err = ctx.storage.grade_submission(grade(60.0)).await.unwrap_err();
        assert!(matches!(err, ClassroomError::Validation(_)));
        let stored = ctx
            .storage
            .get_submission_by_id(submitted.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, SubmissionStatus::Submitted);
        assert_eq!(stored.grade, None);

        let graded = ctx.storage.grade_submission(grade(50.0)).await.unwrap();
        assert_eq!(graded.grade, Some(50.0));
    }

    #[actix_web::test]
    async fn test_total_points_cannot_drop_below_recorded_grade() {
        let ctx = TestContext::new().await;
        let (teacher, _) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
        let (student, _) = ctx.seed_user("s@example.com", UserRole::Student).await;
        let course = ctx.seed_course(teacher.id, "SUB-4", None).await;
        let assignment = ctx.seed_published_assignment(course.id, 100).await;

        let submitted = ctx
            .storage
            .upsert_submission(answer(assignment.id, student.id, "done", false))
            .await
            .unwrap();
        ctx.storage
            .grade_submission(GradeSubmission {
                assignment_id: assignment.id,
                submission_id: submitted.id,
                grade: 70.0,
                feedback: None,
                graded_by: teacher.id,
            })
            .await
            .unwrap();

        let lower = |points: i32| UpdateAssignmentRequest {
            total_points: Some(points),
            ..Default::default()
        };

        let err = ctx
            .storage
            .update_assignment(assignment.id, lower(60))
            .await
            .unwrap_err();
        assert!(matches!(err, ClassroomError::Validation(_)));
        let unchanged = ctx
            .storage
            .get_assignment_by_id(assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.total_points, 100);

        let updated = ctx
            .storage
            .update_assignment(assignment.id, lower(70))
            .await
            .unwrap();
        assert_eq!(updated.total_points, 70);
    }
}
