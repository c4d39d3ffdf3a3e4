//! 端到端流程测试：内存 SQLite + 完整路由

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use serde_json::{Value, json};

use crate::models::ErrorCode;
use crate::models::users::entities::UserRole;
use crate::test_support::{TestContext, bearer, test_app};

/// 发送请求并解析响应体
macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

fn id_of(body: &Value) -> i64 {
    body["data"]["id"].as_i64().expect("response carries an id")
}

fn create_course_req(token: &str, code: &str, limit: Option<i32>) -> TestRequest {
    TestRequest::post()
        .uri("/api/v1/courses")
        .insert_header(bearer(token))
        .set_json(json!({
            "title": "Operating Systems",
            "code": code,
            "enrollment_limit": limit,
        }))
}

fn enroll_req(token: &str, course_id: i64) -> TestRequest {
    TestRequest::post()
        .uri(&format!("/api/v1/courses/{course_id}/enroll"))
        .insert_header(bearer(token))
}

#[actix_web::test]
async fn test_register_login_and_profile() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);

    let register = json!({
        "email": "Alice@Example.com",
        "password": "SecurePass123",
        "role": "student",
        "display_name": "Alice"
    });
    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(&register)
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"].get("password_hash").is_none());

    // 邮箱大小写不敏感
    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(&register)
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": "alice@example.com", "password": "WrongPass123"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": "alice@example.com", "password": "SecurePass123"}))
    );
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["access_token"].as_str().unwrap().to_string();

    let (status, body) = call!(
        app,
        TestRequest::get()
            .uri("/api/v1/auth/profile")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["role"], "student");

    let (status, _) = call!(app, TestRequest::get().uri("/api/v1/auth/profile"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_deactivated_user_is_rejected() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, token) = ctx.seed_user("gone@example.com", UserRole::Student).await;

    // 先访问一次，让用户进入缓存
    let (status, _) = call!(
        app,
        TestRequest::get()
            .uri("/api/v1/auth/profile")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri("/api/v1/auth/profile")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call!(
        app,
        TestRequest::get()
            .uri("/api/v1/auth/profile")
            .insert_header(bearer(&token))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_login_is_rate_limited() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let max = crate::config::AppConfig::get().rate_limit.login.max_requests;

    let attempt = || {
        TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({"email": "nobody@example.com", "password": "Whatever123"}))
    };

    for _ in 0..max {
        let (status, _) = call!(app, attempt());
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = call!(app, attempt());
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], ErrorCode::RateLimitExceeded as i32);
}

#[actix_web::test]
async fn test_duplicate_course_code_conflicts() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, t1) = ctx.seed_user("t1@example.com", UserRole::Teacher).await;
    let (_, t2) = ctx.seed_user("t2@example.com", UserRole::Teacher).await;

    let (status, body) = call!(app, create_course_req(&t1, "cs-101", None));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["code"], "CS-101");

    let (status, body) = call!(app, create_course_req(&t2, " CS-101 ", None));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::Conflict as i32);
}

#[actix_web::test]
async fn test_student_cannot_create_course() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, student) = ctx.seed_user("s@example.com", UserRole::Student).await;

    let (status, _) = call!(app, create_course_req(&student, "CS-200", None));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/courses")
            .set_json(json!({"title": "x", "code": "CS-201"}))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_last_seat_goes_to_exactly_one_student() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, teacher) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
    let (_, s1) = ctx.seed_user("s1@example.com", UserRole::Student).await;
    let (_, s2) = ctx.seed_user("s2@example.com", UserRole::Student).await;

    let (_, body) = call!(app, create_course_req(&teacher, "OS-1", Some(1)));
    let course_id = id_of(&body);

    let (r1, r2) = futures_util::future::join(
        test::call_service(&app, enroll_req(&s1, course_id).to_request()),
        test::call_service(&app, enroll_req(&s2, course_id).to_request()),
    )
    .await;

    let mut statuses = vec![r1.status(), r2.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let course = ctx
        .storage
        .get_course_by_id(course_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(course.active_enrollment_count, 1);
}

#[actix_web::test]
async fn test_full_course_reports_capacity_exceeded() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, teacher) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
    let (_, s1) = ctx.seed_user("s1@example.com", UserRole::Student).await;
    let (_, s2) = ctx.seed_user("s2@example.com", UserRole::Student).await;

    let (_, body) = call!(app, create_course_req(&teacher, "DB-1", Some(1)));
    let course_id = id_of(&body);

    let (status, _) = call!(app, enroll_req(&s1, course_id));
    assert_eq!(status, StatusCode::CREATED);

    // 重复选课
    let (status, body) = call!(app, enroll_req(&s1, course_id));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::Conflict as i32);

    let (status, body) = call!(app, enroll_req(&s2, course_id));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::CapacityExceeded as i32);

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/courses/{course_id}"))
            .insert_header(bearer(&s2))
    );
    assert_eq!(body["data"]["is_full"], true);
    assert_eq!(body["data"]["is_enrolled"], false);
}

#[actix_web::test]
async fn test_reenroll_reuses_row_and_delete_requires_empty_course() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, teacher) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
    let (_, student) = ctx.seed_user("s@example.com", UserRole::Student).await;

    let (_, body) = call!(app, create_course_req(&teacher, "NET-1", None));
    let course_id = id_of(&body);

    let (_, body) = call!(app, enroll_req(&student, course_id));
    let first_id = id_of(&body);

    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/v1/courses/{course_id}"))
            .insert_header(bearer(&teacher))
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/v1/courses/{course_id}/enroll"))
            .insert_header(bearer(&student))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "dropped");

    // 再次退课
    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/v1/courses/{course_id}/enroll"))
            .insert_header(bearer(&student))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call!(app, enroll_req(&student, course_id));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(id_of(&body), first_id);
    assert_eq!(body["data"]["status"], "active");

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/courses/{course_id}/enrollments"))
            .insert_header(bearer(&teacher))
    );
    assert_eq!(body["data"]["pagination"]["total"], 1);

    call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/v1/courses/{course_id}/enroll"))
            .insert_header(bearer(&student))
    );
    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/v1/courses/{course_id}"))
            .insert_header(bearer(&teacher))
    );
    assert_eq!(status, StatusCode::OK);
    assert!(ctx.storage.get_course_by_id(course_id).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_only_owner_can_modify_course() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, owner) = ctx.seed_user("owner@example.com", UserRole::Teacher).await;
    let (_, other) = ctx.seed_user("other@example.com", UserRole::Teacher).await;

    let (_, body) = call!(app, create_course_req(&owner, "AI-1", Some(5)));
    let course_id = id_of(&body);

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/v1/courses/{course_id}"))
            .insert_header(bearer(&other))
            .set_json(json!({"title": "Hijacked"}))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], ErrorCode::Forbidden as i32);

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/v1/courses/{course_id}"))
            .insert_header(bearer(&owner))
            .set_json(json!({"title": "Machine Learning", "enrollment_limit": null}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Machine Learning");
    assert!(body["data"]["enrollment_limit"].is_null());
}

#[actix_web::test]
async fn test_optional_auth_and_inactive_visibility() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, teacher) = ctx.seed_user("t@example.com", UserRole::Teacher).await;

    call!(app, create_course_req(&teacher, "PUB-1", None));
    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/courses")
            .insert_header(bearer(&teacher))
            .set_json(json!({"title": "Hidden", "code": "HID-1", "is_active": false}))
    );
    let hidden_id = id_of(&body);

    // 无效 token 在公开接口上被忽略
    let (status, body) = call!(
        app,
        TestRequest::get()
            .uri("/api/v1/courses")
            .insert_header(bearer("garbage"))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (status, _) = call!(
        app,
        TestRequest::get().uri(&format!("/api/v1/courses/{hidden_id}"))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/courses/{hidden_id}"))
            .insert_header(bearer(&teacher))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_owner"], true);

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri("/api/v1/courses?mine=true")
            .insert_header(bearer(&teacher))
    );
    assert_eq!(body["data"]["pagination"]["total"], 2);
}

/// 创建课程、选课并发布一份作业，返回 (course_id, assignment_id)
macro_rules! published_assignment {
    ($app:expr, $teacher:expr, $student:expr, $total_points:expr) => {{
        let (status, body) = call!($app, create_course_req($teacher, "SE-1", None));
        assert_eq!(status, StatusCode::CREATED);
        let course_id = id_of(&body);

        let (status, _) = call!($app, enroll_req($student, course_id));
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call!(
            $app,
            TestRequest::post()
                .uri("/api/v1/assignments")
                .insert_header(bearer($teacher))
                .set_json(json!({
                    "course_id": course_id,
                    "title": "Lab 1",
                    "due_date": (chrono::Utc::now() + chrono::Duration::days(3)).to_rfc3339(),
                    "total_points": $total_points,
                }))
        );
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "draft");
        let assignment_id = id_of(&body);

        let (status, _) = call!(
            $app,
            TestRequest::post()
                .uri(&format!("/api/v1/assignments/{assignment_id}/publish"))
                .insert_header(bearer($teacher))
        );
        assert_eq!(status, StatusCode::OK);

        (course_id, assignment_id)
    }};
}

#[actix_web::test]
async fn test_assignment_lifecycle_is_forward_only() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, teacher) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
    let (_, student) = ctx.seed_user("s@example.com", UserRole::Student).await;

    let (course_id, assignment_id) = published_assignment!(app, &teacher, &student, 100);

    // 草稿对学生不可见
    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/assignments")
            .insert_header(bearer(&teacher))
            .set_json(json!({
                "course_id": course_id,
                "title": "Lab 2",
                "due_date": "2030-01-01T00:00:00Z",
                "total_points": 50,
            }))
    );
    let draft_id = id_of(&body);

    let (status, _) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/assignments/{draft_id}"))
            .insert_header(bearer(&student))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/assignments?course_id={course_id}"))
            .insert_header(bearer(&student))
    );
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/assignments?course_id={course_id}"))
            .insert_header(bearer(&teacher))
    );
    assert_eq!(body["data"]["pagination"]["total"], 2);

    let close = || {
        TestRequest::post()
            .uri(&format!("/api/v1/assignments/{assignment_id}/close"))
            .insert_header(bearer(&teacher))
    };
    let (status, body) = call!(app, close());
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "closed");

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/assignments/{assignment_id}/publish"))
            .insert_header(bearer(&teacher))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::InvalidState as i32);

    // 只能删除草稿
    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/v1/assignments/{assignment_id}"))
            .insert_header(bearer(&teacher))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = call!(
        app,
        TestRequest::delete()
            .uri(&format!("/api/v1/assignments/{draft_id}"))
            .insert_header(bearer(&teacher))
    );
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn test_submission_upsert_and_grading() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (teacher_user, teacher) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
    let (_, student) = ctx.seed_user("s@example.com", UserRole::Student).await;
    let (_, outsider) = ctx.seed_user("o@example.com", UserRole::Student).await;

    let (_, assignment_id) = published_assignment!(app, &teacher, &student, 100);

    let submit = |token: &str, content: &str| {
        TestRequest::post()
            .uri(&format!("/api/v1/assignments/{assignment_id}/submit"))
            .insert_header(bearer(token))
            .set_json(json!({"content": content}))
    };

    let (status, _) = call!(app, submit(&outsider, "sneaky"));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call!(app, submit(&student, "first"));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "submitted");
    assert_eq!(body["data"]["is_late"], false);
    let submission_id = id_of(&body);

    let (_, body) = call!(app, submit(&student, "second"));
    assert_eq!(id_of(&body), submission_id);
    assert_eq!(body["data"]["content"], "second");

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/assignments/{assignment_id}/submissions"))
            .insert_header(bearer(&teacher))
    );
    assert_eq!(body["data"]["pagination"]["total"], 1);

    let grade = |value: f64| {
        TestRequest::put()
            .uri(&format!(
                "/api/v1/assignments/{assignment_id}/submissions/{submission_id}/grade"
            ))
            .insert_header(bearer(&teacher))
            .set_json(json!({"grade": value, "feedback": "Nice work"}))
    };

    let (status, body) = call!(app, grade(150.0));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], ErrorCode::ValidationFailed as i32);

    let (status, body) = call!(app, grade(90.0));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "graded");
    assert_eq!(body["data"]["grade"], 90.0);
    assert_eq!(body["data"]["graded_by"], teacher_user.id);

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/assignments/{assignment_id}/submissions/my"))
            .insert_header(bearer(&student))
    );
    assert_eq!(body["data"]["feedback"], "Nice work");

    let assignment = ctx
        .storage
        .get_assignment_by_id(assignment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.submission_count, 1);
    assert_eq!(assignment.graded_count, 1);

    // 已有成绩 90，总分不能降到 80
    let (status, _) = call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/v1/assignments/{assignment_id}"))
            .insert_header(bearer(&teacher))
            .set_json(json!({"total_points": 80}))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_draft_submission_cannot_be_graded() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, teacher) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
    let (_, student) = ctx.seed_user("s@example.com", UserRole::Student).await;

    let (_, assignment_id) = published_assignment!(app, &teacher, &student, 10);

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/assignments/{assignment_id}/submit"))
            .insert_header(bearer(&student))
            .set_json(json!({"content": "wip", "draft": true}))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    let submission_id = id_of(&body);

    let (status, body) = call!(
        app,
        TestRequest::put()
            .uri(&format!(
                "/api/v1/assignments/{assignment_id}/submissions/{submission_id}/grade"
            ))
            .insert_header(bearer(&teacher))
            .set_json(json!({"grade": 5}))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::InvalidState as i32);
}

#[actix_web::test]
async fn test_team_membership_and_task_progress() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, alice) = ctx.seed_user("alice@example.com", UserRole::Student).await;
    let (_, bob) = ctx.seed_user("bob@example.com", UserRole::Student).await;

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/teams")
            .insert_header(bearer(&alice))
            .set_json(json!({"name": "Closed crew"}))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["channels"], json!(["general", "announcements"]));
    let closed_id = id_of(&body);

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/teams/{closed_id}/join"))
            .insert_header(bearer(&bob))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::InvalidState as i32);

    // 私有团队对非成员不可见
    let (status, _) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/teams/{closed_id}"))
            .insert_header(bearer(&bob))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/teams")
            .insert_header(bearer(&alice))
            .set_json(json!({"name": "Open crew", "is_public": true, "allow_self_join": true}))
    );
    let team_id = id_of(&body);

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/teams/{team_id}/join"))
            .insert_header(bearer(&bob))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "member");

    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/teams/{team_id}/projects"))
            .insert_header(bearer(&bob))
            .set_json(json!({"name": "Website"}))
    );
    let project_id = id_of(&body);

    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/teams/{team_id}/projects/{project_id}/tasks"))
            .insert_header(bearer(&alice))
            .set_json(json!({"title": "Landing page"}))
    );
    assert_eq!(body["data"]["position"], 1);
    let task_id = id_of(&body);

    let (status, _) = call!(
        app,
        TestRequest::put()
            .uri(&format!("/api/v1/teams/{team_id}/tasks/{task_id}/status"))
            .insert_header(bearer(&bob))
            .set_json(json!({"status": "completed"}))
    );
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/teams/{team_id}"))
            .insert_header(bearer(&alice))
    );
    assert_eq!(body["data"]["completed_task_count"], 1);
    assert_eq!(body["data"]["open_project_count"], 0);
    assert_eq!(body["data"]["projects"][0]["status"], "completed");

    // 负责人离开后，剩余成员被提升
    let (status, _) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/teams/{team_id}/leave"))
            .insert_header(bearer(&alice))
    );
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/teams/{team_id}"))
            .insert_header(bearer(&bob))
    );
    assert_eq!(body["data"]["members"][0]["role"], "leader");
}

#[actix_web::test]
async fn test_chatbot_session_counts_matches_and_fallbacks() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, student) = ctx.seed_user("s@example.com", UserRole::Student).await;
    let (_, other) = ctx.seed_user("o@example.com", UserRole::Student).await;

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/chatbot/sessions")
            .insert_header(bearer(&student))
    );
    assert_eq!(status, StatusCode::CREATED);
    let key = body["data"]["session_key"].as_str().unwrap().to_string();

    let send = |text: &str| {
        TestRequest::post()
            .uri(&format!("/api/v1/chatbot/sessions/{key}/messages"))
            .insert_header(bearer(&student))
            .set_json(json!({"text": text}))
    };

    let (_, body) = call!(app, send("How do I ENROLL in a course?"));
    assert_eq!(body["data"]["bot_message"]["matched_rule"], "enroll");

    let (_, body) = call!(app, send("tell me a joke"));
    assert!(body["data"]["bot_message"]["matched_rule"].is_null());

    let (status, _) = call!(app, send("   "));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/chatbot/sessions/{key}"))
            .insert_header(bearer(&student))
    );
    assert_eq!(body["data"]["session"]["message_count"], 4);
    assert_eq!(body["data"]["session"]["matched_count"], 1);
    assert_eq!(body["data"]["session"]["fallback_count"], 1);
    assert_eq!(body["data"]["messages"][0]["sender"], "user");
    assert_eq!(body["data"]["messages"][1]["sender"], "bot");

    let (status, _) = call!(
        app,
        TestRequest::get()
            .uri(&format!("/api/v1/chatbot/sessions/{key}"))
            .insert_header(bearer(&other))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_non_owner_teacher_cannot_touch_course_content() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, owner) = ctx.seed_user("owner@example.com", UserRole::Teacher).await;
    let (_, other) = ctx.seed_user("other@example.com", UserRole::Teacher).await;
    let (_, student) = ctx.seed_user("s@example.com", UserRole::Student).await;

    let (course_id, assignment_id) = published_assignment!(app, &owner, &student, 100);

    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/assignments/{assignment_id}/submit"))
            .insert_header(bearer(&student))
            .set_json(json!({"content": "answer"}))
    );
    let submission_id = id_of(&body);

    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/assignments")
            .insert_header(bearer(&owner))
            .set_json(json!({
                "course_id": course_id,
                "title": "Lab 2",
                "due_date": "2030-01-01T00:00:00Z",
                "total_points": 10,
            }))
    );
    let draft_id = id_of(&body);

    let attempts = [
        TestRequest::put()
            .uri(&format!(
                "/api/v1/assignments/{assignment_id}/submissions/{submission_id}/grade"
            ))
            .set_json(json!({"grade": 50})),
        TestRequest::post().uri(&format!("/api/v1/assignments/{draft_id}/publish")),
        TestRequest::post().uri(&format!("/api/v1/assignments/{assignment_id}/close")),
        TestRequest::put()
            .uri(&format!("/api/v1/assignments/{assignment_id}"))
            .set_json(json!({"title": "Taken over"})),
        TestRequest::delete().uri(&format!("/api/v1/assignments/{draft_id}")),
        TestRequest::post()
            .uri("/api/v1/assignments")
            .set_json(json!({
                "course_id": course_id,
                "title": "Intruder",
                "due_date": "2030-01-01T00:00:00Z",
                "total_points": 10,
            })),
        TestRequest::delete().uri(&format!("/api/v1/courses/{course_id}")),
        TestRequest::get().uri(&format!("/api/v1/courses/{course_id}/enrollments")),
    ];

    for attempt in attempts {
        let (status, body) = call!(app, attempt.insert_header(bearer(&other)));
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], ErrorCode::Forbidden as i32);
    }

    // 以上操作均未生效
    let submission = ctx
        .storage
        .get_submission_by_id(submission_id)
        .await
        .unwrap()
        .unwrap();
    assert!(submission.grade.is_none());
    let assignment = ctx
        .storage
        .get_assignment_by_id(assignment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.title, "Lab 1");
    assert!(ctx.storage.get_course_by_id(course_id).await.unwrap().is_some());
    assert!(ctx.storage.get_assignment_by_id(draft_id).await.unwrap().is_some());
}

#[actix_web::test]
async fn test_submitting_to_draft_assignment_is_invalid_state() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, teacher) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
    let (_, student) = ctx.seed_user("s@example.com", UserRole::Student).await;

    let (_, body) = call!(app, create_course_req(&teacher, "DRF-1", None));
    let course_id = id_of(&body);
    call!(app, enroll_req(&student, course_id));

    let (_, body) = call!(
        app,
        TestRequest::post()
            .uri("/api/v1/assignments")
            .insert_header(bearer(&teacher))
            .set_json(json!({
                "course_id": course_id,
                "title": "Not yet",
                "due_date": "2030-01-01T00:00:00Z",
                "total_points": 10,
            }))
    );
    let assignment_id = id_of(&body);

    let (status, body) = call!(
        app,
        TestRequest::post()
            .uri(&format!("/api/v1/assignments/{assignment_id}/submit"))
            .insert_header(bearer(&student))
            .set_json(json!({"content": "too early"}))
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::InvalidState as i32);

    let stored = ctx
        .storage
        .get_assignment_by_id(assignment_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.submission_count, 0);
}

#[actix_web::test]
async fn test_late_submission_penalty_and_rejection() {
    let ctx = TestContext::new().await;
    let app = test_app!(ctx);
    let (_, teacher) = ctx.seed_user("t@example.com", UserRole::Teacher).await;
    let (_, student) = ctx.seed_user("s@example.com", UserRole::Student).await;

    let (_, body) = call!(app, create_course_req(&teacher, "LATE-1", None));
    let course_id = id_of(&body);
    call!(app, enroll_req(&student, course_id));

    // 截止时间已过两天多，按三天计
    let overdue = (chrono::Utc::now() - chrono::Duration::hours(49)).to_rfc3339();

    let mut ids = Vec::new();
    for allow_late in [true, false] {
        let (status, body) = call!(
            app,
            TestRequest::post()
                .uri("/api/v1/assignments")
                .insert_header(bearer(&teacher))
                .set_json(json!({
                    "course_id": course_id,
                    "title": format!("Overdue {allow_late}"),
                    "due_date": overdue,
                    "total_points": 100,
                    "allow_late_submission": allow_late,
                    "late_penalty_per_day": 10.0,
                }))
        );
        assert_eq!(status, StatusCode::CREATED);
        let id = id_of(&body);
        let (status, _) = call!(
            app,
            TestRequest::post()
                .uri(&format!("/api/v1/assignments/{id}/publish"))
                .insert_header(bearer(&teacher))
        );
        assert_eq!(status, StatusCode::OK);
        ids.push(id);
    }

    let submit = |id: i64| {
        TestRequest::post()
            .uri(&format!("/api/v1/assignments/{id}/submit"))
            .insert_header(bearer(&student))
            .set_json(json!({"content": "sorry it's late"}))
    };

    let (status, body) = call!(app, submit(ids[0]));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_late"], true);
    assert_eq!(body["data"]["late_penalty"], 30.0);

    let stored = ctx
        .storage
        .get_submission_by_id(id_of(&body))
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_late);
    assert_eq!(stored.late_penalty, 30.0);

    let (status, body) = call!(app, submit(ids[1]));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], ErrorCode::InvalidState as i32);
}
