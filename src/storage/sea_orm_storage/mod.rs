//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。
//! 多步写入均在同一事务内完成，事务内的所有查询都必须使用事务连接。

mod assignments;
mod chatbot;
mod courses;
mod enrollments;
mod submissions;
mod teams;
mod users;

use crate::config::AppConfig;
use crate::errors::{ClassroomError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

/// 为数据库错误附加上下文
pub(crate) trait DbResultExt<T> {
    fn db_context(self, what: &str) -> Result<T>;
}

impl<T> DbResultExt<T> for std::result::Result<T, DbErr> {
    fn db_context(self, what: &str) -> Result<T> {
        self.map_err(|e| ClassroomError::database_operation(format!("{what}: {e}")))
    }
}

/// 是否为唯一约束冲突
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

impl SeaOrmStorage {
    /// 使用全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let storage = Self::connect(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout,
        )
        .await?;
        info!("SeaORM storage initialized, database: {}", config.database.url);
        Ok(storage)
    }

    /// 连接数据库并运行迁移
    pub async fn connect(url: &str, pool_size: u32, timeout: u64) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, timeout).await?
        } else {
            Self::connect_generic(&db_url, pool_size, timeout).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| ClassroomError::database_operation(format!("Migration failed: {e}")))?;

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    ///
    /// 内存数据库只保留一个永不回收的连接，否则数据会随连接关闭而丢失。
    async fn connect_sqlite(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| ClassroomError::database_config(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        if !in_memory {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("cache_size", "-64000")
                .pragma("temp_store", "memory")
                .pragma("mmap_size", "536870912")
                .pragma("wal_autocheckpoint", "1000");
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(pool_size.max(1))
                .min_connections(1)
                .test_before_acquire(true)
                .idle_timeout(Duration::from_secs(300))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(timeout))
            .connect_with(opt)
            .await
            .map_err(|e| {
                ClassroomError::database_connection(format!("SQLite connection failed: {e}"))
            })?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, pool_size: u32, timeout: u64) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(pool_size.min(5))
            .connect_timeout(Duration::from_secs(timeout))
            .acquire_timeout(Duration::from_secs(timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt).await.map_err(|e| {
            ClassroomError::database_connection(format!("Unable to connect to database: {e}"))
        })
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(ClassroomError::database_config(format!(
                "Cannot infer database type from URL: {url}. Supported: sqlite:, postgres://, mysql://, or a .db/.sqlite path"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::{AssignmentListQuery, CreateAssignmentRequest, UpdateAssignmentRequest},
        responses::AssignmentListResponse,
    },
    chatbot::entities::{ChatExchange, ChatMessage, ChatSession},
    courses::{
        entities::Course,
        requests::{CourseListQuery, NewCourse, UpdateCourseRequest},
        responses::CourseListResponse,
    },
    enrollments::{
        entities::{Enrollment, EnrollmentStatus},
        responses::EnrollmentListResponse,
    },
    submissions::{
        entities::Submission,
        requests::{GradeSubmission, SubmissionListQuery, UpsertSubmission},
        responses::SubmissionListResponse,
    },
    teams::{
        entities::{Project, Task, TaskStatus, Team, TeamMember},
        requests::{NewTeam, TeamListQuery},
        responses::{TeamDetail, TeamListResponse},
    },
    users::{
        entities::{User, UserRole},
        requests::{CreateUserRequest, UpdateUserRequest},
    },
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool> {
        self.update_password_impl(id, password_hash).await
    }

    async fn deactivate_user(&self, id: i64) -> Result<bool> {
        self.deactivate_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    // 课程模块
    async fn create_course(&self, course: NewCourse) -> Result<Course> {
        self.create_course_impl(course).await
    }

    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(course_id).await
    }

    async fn get_course_by_code(&self, code: &str) -> Result<Option<Course>> {
        self.get_course_by_code_impl(code).await
    }

    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        self.list_courses_with_pagination_impl(query).await
    }

    async fn update_course(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        self.update_course_impl(course_id, update).await
    }

    async fn delete_course(&self, course_id: i64) -> Result<()> {
        self.delete_course_impl(course_id).await
    }

    // 选课模块
    async fn enroll(&self, course_id: i64, student_id: i64) -> Result<Enrollment> {
        self.enroll_impl(course_id, student_id).await
    }

    async fn unenroll(&self, course_id: i64, student_id: i64) -> Result<Enrollment> {
        self.unenroll_impl(course_id, student_id).await
    }

    async fn get_enrollment(
        &self,
        course_id: i64,
        student_id: i64,
    ) -> Result<Option<Enrollment>> {
        self.get_enrollment_impl(course_id, student_id).await
    }

    async fn list_enrollments_with_pagination(
        &self,
        course_id: i64,
        status: Option<EnrollmentStatus>,
        page: Option<i64>,
        size: Option<i64>,
    ) -> Result<EnrollmentListResponse> {
        self.list_enrollments_with_pagination_impl(course_id, status, page, size)
            .await
    }

    // 作业模块
    async fn create_assignment(&self, assignment: CreateAssignmentRequest) -> Result<Assignment> {
        self.create_assignment_impl(assignment).await
    }

    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(assignment_id).await
    }

    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse> {
        self.list_assignments_with_pagination_impl(query).await
    }

    async fn update_assignment(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Assignment> {
        self.update_assignment_impl(assignment_id, update).await
    }

    async fn transition_assignment(
        &self,
        assignment_id: i64,
        from: AssignmentStatus,
        to: AssignmentStatus,
    ) -> Result<Option<Assignment>> {
        self.transition_assignment_impl(assignment_id, from, to)
            .await
    }

    async fn delete_draft_assignment(&self, assignment_id: i64) -> Result<bool> {
        self.delete_draft_assignment_impl(assignment_id).await
    }

    // 提交模块
    async fn upsert_submission(&self, submission: UpsertSubmission) -> Result<Submission> {
        self.upsert_submission_impl(submission).await
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    async fn get_student_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        self.get_student_submission_impl(assignment_id, student_id)
            .await
    }

    async fn grade_submission(&self, grade: GradeSubmission) -> Result<Submission> {
        self.grade_submission_impl(grade).await
    }

    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        self.list_submissions_with_pagination_impl(query).await
    }

    // 团队模块
    async fn create_team(&self, team: NewTeam) -> Result<Team> {
        self.create_team_impl(team).await
    }

    async fn get_team_by_id(&self, team_id: i64) -> Result<Option<Team>> {
        self.get_team_by_id_impl(team_id).await
    }

    async fn get_team_detail(&self, team_id: i64) -> Result<Option<TeamDetail>> {
        self.get_team_detail_impl(team_id).await
    }

    async fn get_team_member(&self, team_id: i64, user_id: i64) -> Result<Option<TeamMember>> {
        self.get_team_member_impl(team_id, user_id).await
    }

    async fn list_teams_with_pagination(&self, query: TeamListQuery) -> Result<TeamListResponse> {
        self.list_teams_with_pagination_impl(query).await
    }

    async fn join_team(&self, team_id: i64, user_id: i64) -> Result<TeamMember> {
        self.join_team_impl(team_id, user_id).await
    }

    async fn leave_team(&self, team_id: i64, user_id: i64) -> Result<()> {
        self.leave_team_impl(team_id, user_id).await
    }

    async fn create_project(
        &self,
        team_id: i64,
        name: String,
        description: Option<String>,
        created_by: i64,
    ) -> Result<Project> {
        self.create_project_impl(team_id, name, description, created_by)
            .await
    }

    async fn get_project_by_id(&self, project_id: i64) -> Result<Option<Project>> {
        self.get_project_by_id_impl(project_id).await
    }

    async fn create_task(
        &self,
        project: &Project,
        title: String,
        description: Option<String>,
        assignee_id: Option<i64>,
        created_by: i64,
    ) -> Result<Task> {
        self.create_task_impl(project, title, description, assignee_id, created_by)
            .await
    }

    async fn get_task_by_id(&self, task_id: i64) -> Result<Option<Task>> {
        self.get_task_by_id_impl(task_id).await
    }

    async fn update_task_status(&self, task_id: i64, status: TaskStatus) -> Result<Task> {
        self.update_task_status_impl(task_id, status).await
    }

    // 聊天机器人模块
    async fn create_chat_session(&self, user_id: i64, role: UserRole) -> Result<ChatSession> {
        self.create_chat_session_impl(user_id, role).await
    }

    async fn get_chat_session(&self, session_key: &str) -> Result<Option<ChatSession>> {
        self.get_chat_session_impl(session_key).await
    }

    async fn append_chat_exchange(
        &self,
        exchange: ChatExchange,
    ) -> Result<(ChatMessage, ChatMessage, ChatSession)> {
        self.append_chat_exchange_impl(exchange).await
    }

    async fn list_chat_messages(&self, session_id: i64) -> Result<Vec<ChatMessage>> {
        self.list_chat_messages_impl(session_id).await
    }
}
