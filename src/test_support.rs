//! 测试辅助：内存 SQLite 存储、独立的缓存与限流计数

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{ObjectCache, object_cache::moka::MokaCacheWrapper};
use crate::middlewares::rate_limit::{MokaRateLimitStore, RateLimitStore};
use crate::models::{
    assignments::{
        entities::{Assignment, AssignmentStatus},
        requests::CreateAssignmentRequest,
    },
    courses::{entities::Course, requests::NewCourse},
    users::{
        entities::{User, UserRole},
        requests::CreateUserRequest,
    },
};
use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};
use crate::utils::jwt::JwtUtils;

pub(crate) struct TestContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub rate_limit_store: Arc<dyn RateLimitStore>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::connect("sqlite::memory:", 1).await
    }

    /// 文件数据库，连接池可以有多个连接，事务之间能真正并发
    pub async fn on_disk(pool_size: u32) -> (Self, TempDatabase) {
        let db = TempDatabase::new();
        let ctx = Self::connect(&db.url(), pool_size).await;
        (ctx, db)
    }

    async fn connect(url: &str, pool_size: u32) -> Self {
        let storage = SeaOrmStorage::connect(url, pool_size, 5)
            .await
            .expect("test storage");
        Self {
            storage: Arc::new(storage),
            cache: Arc::new(MokaCacheWrapper::with_limits(1_000, 60)),
            rate_limit_store: Arc::new(MokaRateLimitStore::new(1_000, 3600)),
        }
    }

    /// 直接写入用户并签发 access token，跳过密码哈希
    pub async fn seed_user(&self, email: &str, role: UserRole) -> (User, String) {
        let user = self
            .storage
            .create_user(CreateUserRequest {
                email: email.to_string(),
                password_hash: "not-a-real-hash".to_string(),
                role,
                display_name: None,
            })
            .await
            .expect("seed user");
        let token = JwtUtils::generate_access_token(user.id, user.role.as_str()).expect("token");
        (user, token)
    }

    /// 直接写入课程
    pub async fn seed_course(&self, teacher_id: i64, code: &str, limit: Option<i32>) -> Course {
        self.storage
            .create_course(NewCourse {
                teacher_id,
                title: format!("Course {code}"),
                description: None,
                code: code.to_string(),
                enrollment_limit: limit,
                is_active: true,
            })
            .await
            .expect("seed course")
    }

    /// 直接写入一份已发布的作业，三天后截止
    pub async fn seed_published_assignment(&self, course_id: i64, total_points: i32) -> Assignment {
        let draft = self
            .storage
            .create_assignment(CreateAssignmentRequest {
                course_id,
                title: "Lab".to_string(),
                description: None,
                due_date: chrono::Utc::now() + chrono::Duration::days(3),
                total_points,
                allow_late_submission: None,
                late_penalty_per_day: None,
            })
            .await
            .expect("seed assignment");
        self.storage
            .transition_assignment(draft.id, AssignmentStatus::Draft, AssignmentStatus::Published)
            .await
            .expect("publish assignment")
            .expect("assignment was a draft")
    }
}

/// 测试用的临时 SQLite 文件，离开作用域时连同 WAL 文件一起删除
pub(crate) struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("classroom-test-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub(crate) fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// 构造挂载全部 API 路由的测试服务
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(
                    actix_web::web::QueryConfig::default()
                        .error_handler($crate::utils::query_error_handler),
                )
                .app_data(
                    actix_web::web::JsonConfig::default()
                        .error_handler($crate::utils::json_error_handler),
                )
                .app_data(actix_web::web::Data::new($ctx.storage.clone()))
                .app_data(actix_web::web::Data::new($ctx.cache.clone()))
                .app_data(actix_web::web::Data::new($ctx.rate_limit_store.clone()))
                .configure($crate::routes::configure_api),
        )
        .await
    };
}

pub(crate) use test_app;
