use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static COURSE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9-]{2,20}$").expect("Invalid course code regex"));

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_TOTAL_POINTS: i32 = 1000;
pub const MAX_MESSAGE_LEN: usize = 2000;

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > 254 || !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 邮箱统一小写存储
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// 课程代码：去除首尾空白并转为大写
pub fn normalize_course_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn validate_course_code(code: &str) -> Result<(), &'static str> {
    if !COURSE_CODE_RE.is_match(code) {
        return Err("Course code must be 2-20 characters of A-Z, 0-9 or '-'");
    }
    Ok(())
}

/// 标题类字段：去除空白后 1..=200 个字符
pub fn validate_title(title: &str) -> Result<(), &'static str> {
    let len = title.trim().chars().count();
    if len == 0 {
        return Err("Title must not be empty");
    }
    if len > MAX_TITLE_LEN {
        return Err("Title must be at most 200 characters");
    }
    Ok(())
}

pub fn validate_enrollment_limit(limit: Option<i32>) -> Result<(), &'static str> {
    match limit {
        Some(l) if l < 1 => Err("Enrollment limit must be at least 1"),
        _ => Ok(()),
    }
}

pub fn validate_total_points(points: i32) -> Result<(), &'static str> {
    if !(1..=MAX_TOTAL_POINTS).contains(&points) {
        return Err("Total points must be between 1 and 1000");
    }
    Ok(())
}

pub fn validate_penalty_rate(rate: f64) -> Result<(), &'static str> {
    if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
        return Err("Late penalty per day must be between 0 and 100");
    }
    Ok(())
}

/// 密码策略验证结果
#[derive(Debug, Clone)]
pub struct PasswordValidationResult {
    pub is_valid: bool,
    pub errors: Vec<&'static str>,
}

impl PasswordValidationResult {
    pub fn error_message(&self) -> String {
        self.errors.join("; ")
    }
}

/// 验证密码是否符合安全策略
///
/// 策略要求：
/// - 最小长度：8 字符
/// - 必须包含：大写字母 + 小写字母 + 数字
pub fn validate_password(password: &str) -> PasswordValidationResult {
    let mut errors = Vec::new();

    // 1. 长度检查：至少 8 个字符
    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long");
    }

    // 2. 大写字母检查
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter");
    }

    // 3. 小写字母检查
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter");
    }

    // 4. 数字检查
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit");
    }

    // 5. 常见弱密码检查
    let weak_passwords = [
        "password",
        "12345678",
        "123456789",
        "qwerty123",
        "password1",
        "Abcd1234",
    ];
    if weak_passwords
        .iter()
        .any(|&weak| password.eq_ignore_ascii_case(weak))
    {
        errors.push("Password is too common, please choose a stronger password");
    }

    PasswordValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// 简化的密码验证（返回 Result）
pub fn validate_password_simple(password: &str) -> Result<(), String> {
    let result = validate_password(password);
    if result.is_valid {
        Ok(())
    } else {
        Err(result.error_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_password() {
        assert!(validate_password("SecureP@ss1").is_valid);
        assert!(validate_password("SecurePass123").is_valid);
    }

    #[test]
    fn test_short_password() {
        let result = validate_password("Ab1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password must be at least 8 characters long")
        );
    }

    #[test]
    fn test_common_password() {
        let result = validate_password("Password1");
        assert!(!result.is_valid);
        assert!(
            result
                .errors
                .contains(&"Password is too common, please choose a stronger password")
        );
    }

    #[test]
    fn test_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("not an email").is_err());
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn test_course_code_normalized_before_validation() {
        let code = normalize_course_code("  cs-101 ");
        assert_eq!(code, "CS-101");
        assert!(validate_course_code(&code).is_ok());
        assert!(validate_course_code("C").is_err());
        assert!(validate_course_code("CS 101").is_err());
        assert!(validate_course_code(&"X".repeat(21)).is_err());
    }

    #[test]
    fn test_title_bounds() {
        assert!(validate_title("   ").is_err());
        assert!(validate_title("Intro").is_ok());
        assert!(validate_title(&"t".repeat(200)).is_ok());
        assert!(validate_title(&"t".repeat(201)).is_err());
    }

    #[test]
    fn test_numeric_bounds() {
        assert!(validate_total_points(0).is_err());
        assert!(validate_total_points(1).is_ok());
        assert!(validate_total_points(1000).is_ok());
        assert!(validate_total_points(1001).is_err());
        assert!(validate_penalty_rate(-1.0).is_err());
        assert!(validate_penalty_rate(f64::NAN).is_err());
        assert!(validate_penalty_rate(12.5).is_ok());
        assert!(validate_enrollment_limit(Some(0)).is_err());
        assert!(validate_enrollment_limit(None).is_ok());
    }
}
