use super::{DbResultExt, SeaOrmStorage, is_unique_violation};
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::errors::{ClassroomError, Result};
use crate::models::{
    PaginationInfo,
    common::pagination::normalize_page,
    courses::{
        entities::Course,
        requests::{CourseListQuery, CourseScope, NewCourse, UpdateCourseRequest},
        responses::CourseListResponse,
    },
    enrollments::entities::EnrollmentStatus,
};
use crate::utils::{now_ts, sql::contains_pattern};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
    sea_query::{Expr, Query},
};

impl SeaOrmStorage {
    /// 创建课程，课程代码重复时返回冲突
    pub async fn create_course_impl(&self, course: NewCourse) -> Result<Course> {
        let now = now_ts();
        let code = course.code.clone();

        let model = ActiveModel {
            teacher_id: Set(course.teacher_id),
            title: Set(course.title),
            description: Set(course.description),
            code: Set(course.code),
            is_active: Set(course.is_active),
            enrollment_limit: Set(course.enrollment_limit),
            active_enrollment_count: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ClassroomError::conflict(format!("Course code {code} is already in use"))
            } else {
                ClassroomError::database_operation(format!("创建课程失败: {e}"))
            }
        })?;

        Ok(result.into_course())
    }

    /// 通过 ID 获取课程
    pub async fn get_course_by_id_impl(&self, course_id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(course_id)
            .one(&self.db)
            .await
            .db_context("查询课程失败")?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 通过课程代码获取课程
    pub async fn get_course_by_code_impl(&self, code: &str) -> Result<Option<Course>> {
        let result = Courses::find()
            .filter(Column::Code.eq(code))
            .one(&self.db)
            .await
            .db_context("查询课程失败")?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 分页列出课程
    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let (page, size) = normalize_page(query.page, query.size);

        let mut select = Courses::find();

        // 可见范围
        select = match query.scope {
            CourseScope::Public => select.filter(Column::IsActive.eq(true)),
            CourseScope::PublicAndOwnedBy(teacher_id) => select.filter(
                Condition::any()
                    .add(Column::IsActive.eq(true))
                    .add(Column::TeacherId.eq(teacher_id)),
            ),
            CourseScope::OwnedBy(teacher_id) => select.filter(Column::TeacherId.eq(teacher_id)),
            CourseScope::EnrolledBy(student_id) => select.filter(
                Column::Id.in_subquery(
                    Query::select()
                        .column(EnrollmentColumn::CourseId)
                        .from(Enrollments)
                        .and_where(EnrollmentColumn::StudentId.eq(student_id))
                        .and_where(EnrollmentColumn::Status.eq(EnrollmentStatus::Active.as_str()))
                        .to_owned(),
                ),
            ),
        };

        // 教师筛选
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }

        // 搜索标题、描述或课程代码
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let term = search.trim();
            select = select.filter(
                Condition::any()
                    .add(Column::Title.like(contains_pattern(term)))
                    .add(Column::Description.like(contains_pattern(term)))
                    .add(Column::Code.like(contains_pattern(&term.to_uppercase()))),
            );
        }

        select = select.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator.num_items().await.db_context("查询课程总数失败")?;
        let courses = paginator
            .fetch_page(page - 1)
            .await
            .db_context("查询课程列表失败")?;

        Ok(CourseListResponse {
            items: courses.into_iter().map(|m| m.into_course()).collect(),
            pagination: PaginationInfo::new(page as i64, size as i64, total as i64),
        })
    }

    /// 更新课程
    ///
    /// 新的人数上限不能低于当前活跃选课人数，比较与写入在同一条语句内完成。
    pub async fn update_course_impl(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        let mut stmt = Courses::update_many()
            .col_expr(Column::UpdatedAt, Expr::value(now_ts()))
            .filter(Column::Id.eq(course_id));

        if let Some(title) = update.title {
            stmt = stmt.col_expr(Column::Title, Expr::value(title));
        }
        if let Some(description) = update.description {
            stmt = stmt.col_expr(Column::Description, Expr::value(Some(description)));
        }
        if let Some(code) = update.code {
            stmt = stmt.col_expr(Column::Code, Expr::value(code));
        }
        if let Some(is_active) = update.is_active {
            stmt = stmt.col_expr(Column::IsActive, Expr::value(is_active));
        }
        if let Some(limit) = update.enrollment_limit {
            stmt = stmt.col_expr(Column::EnrollmentLimit, Expr::value(limit));
            if let Some(limit) = limit {
                stmt = stmt.filter(Column::ActiveEnrollmentCount.lte(limit));
            }
        }

        let result = stmt.exec(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                ClassroomError::conflict("Course code is already in use")
            } else {
                ClassroomError::database_operation(format!("更新课程失败: {e}"))
            }
        })?;

        if result.rows_affected == 0 {
            // 区分课程不存在与人数上限过低
            return match self.get_course_by_id_impl(course_id).await? {
                Some(course) => Err(ClassroomError::validation(format!(
                    "Enrollment limit cannot be below the current {} active enrollments",
                    course.active_enrollment_count
                ))),
                None => Ok(None),
            };
        }

        self.get_course_by_id_impl(course_id).await
    }

    /// 删除课程，仅在没有活跃选课时允许
    pub async fn delete_course_impl(&self, course_id: i64) -> Result<()> {
        let result = Courses::delete_many()
            .filter(Column::Id.eq(course_id))
            .filter(Column::ActiveEnrollmentCount.eq(0))
            .exec(&self.db)
            .await
            .db_context("删除课程失败")?;

        if result.rows_affected > 0 {
            return Ok(());
        }

        match self.get_course_by_id_impl(course_id).await? {
            Some(_) => Err(ClassroomError::conflict(
                "Course still has active enrollments",
            )),
            None => Err(ClassroomError::not_found("Course not found")),
        }
    }
}
