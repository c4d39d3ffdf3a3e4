use super::{DbResultExt, SeaOrmStorage, is_unique_violation};
use crate::entity::courses::{Column as CourseColumn, Entity as Courses};
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments, Model};
use crate::entity::users::Entity as Users;
use crate::errors::{ClassroomError, Result};
use crate::models::{
    PaginationInfo,
    common::pagination::normalize_page,
    enrollments::{
        entities::{Enrollment, EnrollmentStatus},
        responses::{EnrollmentListResponse, EnrollmentWithStudent},
    },
};
use crate::utils::now_ts;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, sea_query::Expr,
};

/// 查询某学生在某课程的选课记录（不区分状态）
async fn find_pair<C: ConnectionTrait>(
    conn: &C,
    course_id: i64,
    student_id: i64,
) -> Result<Option<Model>> {
    Enrollments::find()
        .filter(Column::CourseId.eq(course_id))
        .filter(Column::StudentId.eq(student_id))
        .one(conn)
        .await
        .db_context("查询选课记录失败")
}

impl SeaOrmStorage {
    /// 选课
    ///
    /// 先以条件更新占用名额（课程活跃且未满），再插入或重新激活选课记录。
    /// 任一步失败时事务回滚，名额随之释放。
    pub async fn enroll_impl(&self, course_id: i64, student_id: i64) -> Result<Enrollment> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;
        let now = now_ts();

        let reserved = Courses::update_many()
            .col_expr(
                CourseColumn::ActiveEnrollmentCount,
                Expr::cust("active_enrollment_count + 1"),
            )
            .col_expr(CourseColumn::UpdatedAt, Expr::value(now))
            .filter(CourseColumn::Id.eq(course_id))
            .filter(CourseColumn::IsActive.eq(true))
            .filter(Expr::cust(
                "(enrollment_limit IS NULL OR active_enrollment_count < enrollment_limit)",
            ))
            .exec(&txn)
            .await
            .db_context("占用选课名额失败")?;

        let existing = find_pair(&txn, course_id, student_id).await?;
        let already_active = existing
            .as_ref()
            .is_some_and(|row| row.status == EnrollmentStatus::Active.as_str());

        if reserved.rows_affected == 0 {
            // 未能占用名额，判断具体原因
            let course = Courses::find_by_id(course_id)
                .one(&txn)
                .await
                .db_context("查询课程失败")?;
            return match course {
                Some(course) if course.is_active => {
                    if already_active {
                        Err(ClassroomError::conflict("Already enrolled in this course"))
                    } else {
                        Err(ClassroomError::capacity_exceeded("Course is full"))
                    }
                }
                _ => Err(ClassroomError::not_found("Course not found")),
            };
        }

        if already_active {
            return Err(ClassroomError::conflict("Already enrolled in this course"));
        }

        let enrollment = match existing {
            Some(row) => {
                // 重新激活已退选的记录
                let result = Enrollments::update_many()
                    .col_expr(
                        Column::Status,
                        Expr::value(EnrollmentStatus::Active.as_str()),
                    )
                    .col_expr(Column::EnrolledAt, Expr::value(now))
                    .col_expr(Column::DroppedAt, Expr::value(Option::<i64>::None))
                    .col_expr(Column::UpdatedAt, Expr::value(now))
                    .filter(Column::Id.eq(row.id))
                    .filter(Column::Status.eq(EnrollmentStatus::Dropped.as_str()))
                    .exec(&txn)
                    .await
                    .db_context("重新激活选课失败")?;
                if result.rows_affected == 0 {
                    return Err(ClassroomError::conflict("Already enrolled in this course"));
                }
                Enrollments::find_by_id(row.id)
                    .one(&txn)
                    .await
                    .db_context("查询选课记录失败")?
                    .ok_or_else(|| ClassroomError::database_operation("选课记录丢失"))?
            }
            None => {
                let model = ActiveModel {
                    course_id: Set(course_id),
                    student_id: Set(student_id),
                    status: Set(EnrollmentStatus::Active.to_string()),
                    enrolled_at: Set(now),
                    dropped_at: Set(None),
                    updated_at: Set(now),
                    ..Default::default()
                };
                model.insert(&txn).await.map_err(|e| {
                    if is_unique_violation(&e) {
                        ClassroomError::conflict("Already enrolled in this course")
                    } else {
                        ClassroomError::database_operation(format!("创建选课记录失败: {e}"))
                    }
                })?
            }
        };

        txn.commit().await.db_context("提交选课事务失败")?;

        Ok(enrollment.into_enrollment())
    }

    /// 退选：记录置为 dropped 并释放名额
    pub async fn unenroll_impl(&self, course_id: i64, student_id: i64) -> Result<Enrollment> {
        let txn = self.db.begin().await.db_context("开启事务失败")?;
        let now = now_ts();

        let result = Enrollments::update_many()
            .col_expr(
                Column::Status,
                Expr::value(EnrollmentStatus::Dropped.as_str()),
            )
            .col_expr(Column::DroppedAt, Expr::value(Some(now)))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::Status.eq(EnrollmentStatus::Active.as_str()))
            .exec(&txn)
            .await
            .db_context("退选失败")?;

        if result.rows_affected == 0 {
            return Err(ClassroomError::not_found("No active enrollment for this course"));
        }

        Courses::update_many()
            .col_expr(
                CourseColumn::ActiveEnrollmentCount,
                Expr::cust("active_enrollment_count - 1"),
            )
            .col_expr(CourseColumn::UpdatedAt, Expr::value(now))
            .filter(CourseColumn::Id.eq(course_id))
            .filter(CourseColumn::ActiveEnrollmentCount.gt(0))
            .exec(&txn)
            .await
            .db_context("释放选课名额失败")?;

        let enrollment = find_pair(&txn, course_id, student_id)
            .await?
            .ok_or_else(|| ClassroomError::database_operation("选课记录丢失"))?;

        txn.commit().await.db_context("提交退选事务失败")?;

        Ok(enrollment.into_enrollment())
    }

    /// 获取选课记录
    pub async fn get_enrollment_impl(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>> {
        Ok(find_pair(&self.db, course_id, student_id)
            .await?
            .map(|m| m.into_enrollment()))
    }

    /// 分页列出课程名单
    pub async fn list_enrollments_with_pagination_impl(
        &self,
        course_id: i64,
        status: Option<EnrollmentStatus>,
        page: Option<i64>,
        size: Option<i64>,
    ) -> Result<EnrollmentListResponse> {
        let (page, size) = normalize_page(page, size);

        let mut select = Enrollments::find().filter(Column::CourseId.eq(course_id));

        if let Some(status) = status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }

        let paginator = select
            .order_by_asc(Column::EnrolledAt)
            .order_by_asc(Column::Id)
            .find_also_related(Users)
            .paginate(&self.db, size);

        let total = paginator.num_items().await.db_context("查询名单总数失败")?;
        let rows = paginator
            .fetch_page(page - 1)
            .await
            .db_context("查询课程名单失败")?;

        let items = rows
            .into_iter()
            .filter_map(|(enrollment, student)| {
                student.map(|student| EnrollmentWithStudent {
                    enrollment: enrollment.into_enrollment(),
                    student: student.into_user(),
                })
            })
            .collect();

        Ok(EnrollmentListResponse {
            items,
            pagination: PaginationInfo::new(page as i64, size as i64, total as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::ClassroomError;
    use crate::models::users::entities::UserRole;
    use crate::test_support::TestContext;

    #[actix_web::test]
    async fn test_concurrent_enrolls_never_exceed_limit() {
        // 多连接的文件库，两个事务真正并发执行
        let (ctx, _db) = TestContext::on_disk(4).await;
        let (teacher, _) = ctx.seed_user("t@example.com", UserRole::Teacher).await;

        for round in 0..5 {
            let course = ctx.seed_course(teacher.id, &format!("RACE-{round}"), Some(1)).await;
            let (s1, _) = ctx
                .seed_user(&format!("a{round}@example.com"), UserRole::Student)
                .await;
            let (s2, _) = ctx
                .seed_user(&format!("b{round}@example.com"), UserRole::Student)
                .await;

            let (r1, r2) = futures_util::future::join(
                ctx.storage.enroll(course.id, s1.id),
                ctx.storage.enroll(course.id, s2.id),
            )
            .await;

            let results = [r1, r2];
            assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(
                results
                    .iter()
                    .any(|r| matches!(r, Err(ClassroomError::CapacityExceeded(_))))
            );

            let stored = ctx.storage.get_course_by_id(course.id).await.unwrap().unwrap();
            assert_eq!(stored.active_enrollment_count, 1);
        }
    }
}
