use std::sync::Arc;

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

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户，邮箱重复返回 Conflict
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过邮箱获取用户信息（邮箱已规范化为小写）
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 更新用户资料
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 更新密码哈希
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<bool>;
    // 停用账号
    async fn deactivate_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;

    /// 课程管理方法
    // 创建课程，课程代码重复返回 Conflict
    async fn create_course(&self, course: NewCourse) -> Result<Course>;
    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>>;
    async fn get_course_by_code(&self, code: &str) -> Result<Option<Course>>;
    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse>;
    // 更新课程；人数上限低于当前人数时返回 Validation
    async fn update_course(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>>;
    // 删除课程；仍有在读学生时返回 Conflict
    async fn delete_course(&self, course_id: i64) -> Result<()>;

    /// 选课方法
    // 原子地占用名额并写入选课记录
    async fn enroll(&self, course_id: i64, student_id: i64) -> Result<Enrollment>;
    // 退课：标记为 dropped 并释放名额
    async fn unenroll(&self, course_id: i64, student_id: i64) -> Result<Enrollment>;
    async fn get_enrollment(&self, course_id: i64, student_id: i64)
    -> Result<Option<Enrollment>>;
    async fn list_enrollments_with_pagination(
        &self,
        course_id: i64,
        status: Option<EnrollmentStatus>,
        page: Option<i64>,
        size: Option<i64>,
    ) -> Result<EnrollmentListResponse>;

    /// 作业管理方法
    async fn create_assignment(&self, assignment: CreateAssignmentRequest) -> Result<Assignment>;
    async fn get_assignment_by_id(&self, assignment_id: i64) -> Result<Option<Assignment>>;
    async fn list_assignments_with_pagination(
        &self,
        query: AssignmentListQuery,
    ) -> Result<AssignmentListResponse>;
    // 仅允许更新未关闭的作业
    async fn update_assignment(
        &self,
        assignment_id: i64,
        update: UpdateAssignmentRequest,
    ) -> Result<Assignment>;
    // 条件状态迁移，源状态不匹配时返回 None
    async fn transition_assignment(
        &self,
        assignment_id: i64,
        from: AssignmentStatus,
        to: AssignmentStatus,
    ) -> Result<Option<Assignment>>;
    // 仅删除草稿状态的作业
    async fn delete_draft_assignment(&self, assignment_id: i64) -> Result<bool>;

    /// 提交管理方法
    // 按 (assignment_id, student_id) 唯一约束写入或覆盖
    async fn upsert_submission(&self, submission: UpsertSubmission) -> Result<Submission>;
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>>;
    async fn get_student_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>>;
    async fn grade_submission(&self, grade: GradeSubmission) -> Result<Submission>;
    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse>;

    /// 团队管理方法
    async fn create_team(&self, team: NewTeam) -> Result<Team>;
    async fn get_team_by_id(&self, team_id: i64) -> Result<Option<Team>>;
    async fn get_team_detail(&self, team_id: i64) -> Result<Option<TeamDetail>>;
    async fn get_team_member(&self, team_id: i64, user_id: i64) -> Result<Option<TeamMember>>;
    async fn list_teams_with_pagination(&self, query: TeamListQuery) -> Result<TeamListResponse>;
    async fn join_team(&self, team_id: i64, user_id: i64) -> Result<TeamMember>;
    async fn leave_team(&self, team_id: i64, user_id: i64) -> Result<()>;
    async fn create_project(
        &self,
        team_id: i64,
        name: String,
        description: Option<String>,
        created_by: i64,
    ) -> Result<Project>;
    async fn get_project_by_id(&self, project_id: i64) -> Result<Option<Project>>;
    async fn create_task(
        &self,
        project: &Project,
        title: String,
        description: Option<String>,
        assignee_id: Option<i64>,
        created_by: i64,
    ) -> Result<Task>;
    async fn get_task_by_id(&self, task_id: i64) -> Result<Option<Task>>;
    async fn update_task_status(&self, task_id: i64, status: TaskStatus) -> Result<Task>;

    /// 聊天机器人会话方法
    async fn create_chat_session(&self, user_id: i64, role: UserRole) -> Result<ChatSession>;
    async fn get_chat_session(&self, session_key: &str) -> Result<Option<ChatSession>>;
    // 追加用户消息与机器人回复并更新计数
    async fn append_chat_exchange(
        &self,
        exchange: ChatExchange,
    ) -> Result<(ChatMessage, ChatMessage, ChatSession)>;
    async fn list_chat_messages(&self, session_id: i64) -> Result<Vec<ChatMessage>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
