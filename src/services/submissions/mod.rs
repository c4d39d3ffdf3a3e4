pub mod grade;
pub mod list;
pub mod submit;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::submissions::requests::{GradeRequest, SubmissionQueryParams, SubmitRequest};

crate::services::define_service!(SubmissionService);

impl SubmissionService {
    // 提交或覆盖作业
    pub async fn submit(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        submit_data: SubmitRequest,
    ) -> ActixResult<HttpResponse> {
        submit::handle_submit(self, request, assignment_id, submit_data).await
    }

    // 评分
    pub async fn grade(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        submission_id: i64,
        grade_data: GradeRequest,
    ) -> ActixResult<HttpResponse> {
        grade::handle_grade(self, request, assignment_id, submission_id, grade_data).await
    }

    pub async fn list_submissions(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
        query: SubmissionQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::handle_list_submissions(self, request, assignment_id, query).await
    }

    // 当前学生自己的提交
    pub async fn my_submission(
        &self,
        request: &HttpRequest,
        assignment_id: i64,
    ) -> ActixResult<HttpResponse> {
        list::handle_my_submission(self, request, assignment_id).await
    }
}
