//! 所有权与状态规则
//!
//! 纯函数，不访问存储；服务层先加载实体，再在这里做判定。

use chrono::{DateTime, Utc};

use crate::errors::{ClassroomError, Result};
use crate::models::{
    assignments::entities::{Assignment, AssignmentStatus},
    courses::entities::Course,
    users::entities::User,
};

const SECONDS_PER_DAY: i64 = 86_400;
const MAX_PENALTY: f64 = 100.0;

/// 只有教师可以创建课程
pub fn ensure_teacher(user: &User) -> Result<()> {
    if user.is_teacher() {
        Ok(())
    } else {
        Err(ClassroomError::invalid_owner(
            "Only teachers can own courses",
        ))
    }
}

pub fn ensure_student(user: &User) -> Result<()> {
    if user.is_student() {
        Ok(())
    } else {
        Err(ClassroomError::authorization(
            "Only students can perform this action",
        ))
    }
}

pub fn owns_course(user: &User, course: &Course) -> bool {
    user.is_teacher() && course.teacher_id == user.id
}

pub fn ensure_course_owner(user: &User, course: &Course) -> Result<()> {
    if owns_course(user, course) {
        Ok(())
    } else {
        Err(ClassroomError::authorization(
            "Only the course owner can perform this action",
        ))
    }
}

/// 非活跃课程仅对拥有者可见
pub fn can_view_course(user: Option<&User>, course: &Course) -> bool {
    course.is_active || user.is_some_and(|u| owns_course(u, course))
}

/// 作业可见性：拥有者可见全部，已选课学生仅可见已发布或已关闭的作业
pub fn ensure_can_view_assignment(
    user: &User,
    course: &Course,
    assignment: &Assignment,
    actively_enrolled: bool,
) -> Result<()> {
    if owns_course(user, course) {
        return Ok(());
    }
    if !(user.is_student() && actively_enrolled) {
        return Err(ClassroomError::authorization(
            "Not allowed to view this assignment",
        ));
    }
    if assignment.status.visible_to_students() {
        Ok(())
    } else {
        Err(ClassroomError::not_found("Assignment not found"))
    }
}

/// 学生可见的作业状态
pub fn student_visible_statuses() -> Vec<AssignmentStatus> {
    AssignmentStatus::ALL
        .iter()
        .copied()
        .filter(AssignmentStatus::visible_to_students)
        .collect()
}

/// 只允许 draft → published → closed
pub fn ensure_transition(from: AssignmentStatus, to: AssignmentStatus) -> Result<()> {
    if from.next() == Some(to) {
        Ok(())
    } else {
        Err(ClassroomError::invalid_state(format!(
            "Cannot move assignment from {from} to {to}"
        )))
    }
}

/// 迟交信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lateness {
    pub is_late: bool,
    pub penalty: f64,
}

/// 按迟交天数（不足一天按一天计）计算扣分百分比，最高 100
pub fn late_penalty(due_date: DateTime<Utc>, now: DateTime<Utc>, rate_per_day: f64) -> Lateness {
    let overdue = (now - due_date).num_seconds();
    if overdue <= 0 {
        return Lateness {
            is_late: false,
            penalty: 0.0,
        };
    }
    let days = (overdue + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    Lateness {
        is_late: true,
        penalty: (days as f64 * rate_per_day).min(MAX_PENALTY),
    }
}

/// 提交前检查：作业必须已发布；迟交时需允许迟交
pub fn ensure_can_submit(assignment: &Assignment, now: DateTime<Utc>) -> Result<Lateness> {
    if assignment.status != AssignmentStatus::Published {
        return Err(ClassroomError::invalid_state(
            "Assignment is not open for submissions",
        ));
    }
    let lateness = late_penalty(assignment.due_date, now, assignment.late_penalty_per_day);
    if lateness.is_late && !assignment.allow_late_submission {
        return Err(ClassroomError::invalid_state(
            "The due date has passed and late submissions are not accepted",
        ));
    }
    Ok(lateness)
}

pub fn validate_grade(grade: f64, total_points: i32) -> Result<()> {
    if grade.is_finite() && (0.0..=f64::from(total_points)).contains(&grade) {
        Ok(())
    } else {
        Err(ClassroomError::validation(format!(
            "Grade must be between 0 and {total_points}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ClassroomError;
    use crate::models::users::entities::UserRole;
    use chrono::Duration;

    fn user(id: i64, role: UserRole) -> User {
        let now = Utc::now();
        User {
            id,
            email: format!("u{id}@example.com"),
            password_hash: String::new(),
            role,
            active: true,
            display_name: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn course(teacher_id: i64, is_active: bool) -> Course {
        let now = Utc::now();
        Course {
            id: 1,
            title: "Systems".to_string(),
            description: None,
            code: "CS-101".to_string(),
            teacher_id,
            is_active,
            enrollment_limit: None,
            active_enrollment_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn assignment(status: AssignmentStatus, due_in: Duration, allow_late: bool) -> Assignment {
        let now = Utc::now();
        Assignment {
            id: 1,
            course_id: 1,
            title: "Lab 1".to_string(),
            description: None,
            due_date: now + due_in,
            total_points: 100,
            status,
            allow_late_submission: allow_late,
            late_penalty_per_day: 10.0,
            submission_count: 0,
            graded_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_course_ownership() {
        let owner = user(1, UserRole::Teacher);
        let other = user(2, UserRole::Teacher);
        let c = course(1, true);
        assert!(ensure_course_owner(&owner, &c).is_ok());
        assert!(matches!(
            ensure_course_owner(&other, &c),
            Err(ClassroomError::Authorization(_))
        ));
    }

    #[test]
    fn test_student_cannot_own_course() {
        assert!(matches!(
            ensure_teacher(&user(3, UserRole::Student)),
            Err(ClassroomError::InvalidOwner(_))
        ));
    }

    #[test]
    fn test_inactive_course_visible_only_to_owner() {
        let c = course(1, false);
        assert!(can_view_course(Some(&user(1, UserRole::Teacher)), &c));
        assert!(!can_view_course(Some(&user(2, UserRole::Student)), &c));
        assert!(!can_view_course(None, &c));
        assert!(can_view_course(None, &course(1, true)));
    }

    #[test]
    fn test_transitions_are_forward_only() {
        use AssignmentStatus::*;
        assert!(ensure_transition(Draft, Published).is_ok());
        assert!(ensure_transition(Published, Closed).is_ok());
        assert!(matches!(
            ensure_transition(Closed, Published),
            Err(ClassroomError::InvalidState(_))
        ));
        assert!(ensure_transition(Draft, Closed).is_err());
    }

    #[test]
    fn test_late_penalty_rounds_up_and_caps() {
        let due = Utc::now();
        let on_time = late_penalty(due, due - Duration::minutes(1), 10.0);
        assert!(!on_time.is_late);
        assert_eq!(on_time.penalty, 0.0);

        let one_hour = late_penalty(due, due + Duration::hours(1), 10.0);
        assert!(one_hour.is_late);
        assert_eq!(one_hour.penalty, 10.0);

        let three_days = late_penalty(due, due + Duration::hours(49), 10.0);
        assert_eq!(three_days.penalty, 30.0);

        let capped = late_penalty(due, due + Duration::days(30), 10.0);
        assert_eq!(capped.penalty, 100.0);
    }

    #[test]
    fn test_submit_rules() {
        let now = Utc::now();
        let draft = assignment(AssignmentStatus::Draft, Duration::days(1), true);
        assert!(matches!(
            ensure_can_submit(&draft, now),
            Err(ClassroomError::InvalidState(_))
        ));

        let overdue_strict = assignment(AssignmentStatus::Published, Duration::days(-1), false);
        assert!(ensure_can_submit(&overdue_strict, now).is_err());

        let overdue_lenient = assignment(AssignmentStatus::Published, Duration::days(-1), true);
        let lateness = ensure_can_submit(&overdue_lenient, now).unwrap();
        assert!(lateness.is_late);
        assert_eq!(lateness.penalty, 10.0);
    }

    #[test]
    fn test_grade_range() {
        assert!(validate_grade(90.0, 100).is_ok());
        assert!(validate_grade(0.0, 100).is_ok());
        assert!(validate_grade(100.0, 100).is_ok());
        assert!(matches!(
            validate_grade(150.0, 100),
            Err(ClassroomError::Validation(_))
        ));
        assert!(validate_grade(-1.0, 100).is_err());
        assert!(validate_grade(f64::NAN, 100).is_err());
    }

    #[test]
    fn test_assignment_visibility() {
        let owner = user(1, UserRole::Teacher);
        let student = user(5, UserRole::Student);
        let c = course(1, true);
        let draft = assignment(AssignmentStatus::Draft, Duration::days(1), true);
        let published = assignment(AssignmentStatus::Published, Duration::days(1), true);

        assert!(ensure_can_view_assignment(&owner, &c, &draft, false).is_ok());
        assert!(ensure_can_view_assignment(&student, &c, &published, true).is_ok());
        assert!(matches!(
            ensure_can_view_assignment(&student, &c, &draft, true),
            Err(ClassroomError::NotFound(_))
        ));
        assert!(matches!(
            ensure_can_view_assignment(&student, &c, &published, false),
            Err(ClassroomError::Authorization(_))
        ));
    }

    #[test]
    fn test_student_visible_statuses() {
        let statuses = student_visible_statuses();
        assert_eq!(
            statuses,
            vec![AssignmentStatus::Published, AssignmentStatus::Closed]
        );
    }
}
