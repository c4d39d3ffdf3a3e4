pub mod create;
pub mod delete;
pub mod enroll;
pub mod enrollments;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::courses::requests::{
    CourseQueryParams, CreateCourseRequest, UpdateCourseRequest,
};
use crate::models::enrollments::requests::EnrollmentQueryParams;

crate::services::define_service!(CourseService);

impl CourseService {
    // 课程列表（可选登录）
    pub async fn list_courses(
        &self,
        request: &HttpRequest,
        query: CourseQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_list_courses(self, request, query).await
    }

    pub async fn create_course(
        &self,
        request: &HttpRequest,
        course_data: CreateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        create::handle_create_course(self, request, course_data).await
    }

    // 课程详情（可选登录）
    pub async fn get_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::handle_get_course(self, request, course_id).await
    }

    pub async fn update_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
        update_data: UpdateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        update::handle_update_course(self, request, course_id, update_data).await
    }

    pub async fn delete_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::handle_delete_course(self, request, course_id).await
    }

    // 选课
    pub async fn enroll(&self, request: &HttpRequest, course_id: i64) -> ActixResult<HttpResponse> {
        enroll::handle_enroll(self, request, course_id).await
    }

    // 退课
    pub async fn unenroll(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        enroll::handle_unenroll(self, request, course_id).await
    }

    // 课程名单（仅课程拥有者）
    pub async fn list_enrollments(
        &self,
        request: &HttpRequest,
        course_id: i64,
        query: EnrollmentQueryParams,
    ) -> ActixResult<HttpResponse> {
        enrollments::handle_list_enrollments(self, request, course_id, query).await
    }
}
