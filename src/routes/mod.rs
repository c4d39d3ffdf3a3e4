pub mod assignments;

pub mod auth;

pub mod chatbot;

pub mod courses;

pub mod teams;

use actix_web::web;

pub use assignments::configure_assignments_routes;
pub use auth::configure_auth_routes;
pub use chatbot::configure_chatbot_routes;
pub use courses::configure_courses_routes;
pub use teams::configure_teams_routes;

/// 注册全部 `/api/v1` 路由
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_auth_routes)
        .configure(configure_courses_routes)
        .configure(configure_assignments_routes)
        .configure(configure_teams_routes)
        .configure(configure_chatbot_routes);
}
