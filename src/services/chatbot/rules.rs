//! 关键词回复表
//!
//! 按顺序匹配，命中第一条即返回；都不命中时使用兜底回复。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::users::entities::UserRole;

pub struct ChatRule {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
    // 教师专用回复，为空时使用通用回复
    pub teacher_reply: Option<&'static str>,
}

pub const FALLBACK_REPLY: &str = "Sorry, I didn't catch that. Try asking about courses, \
enrollment, assignments, grades, deadlines or teams.";

pub static RULES: &[ChatRule] = &[
    ChatRule {
        name: "greeting",
        keywords: &["hello", "hi", "hey", "good morning", "good afternoon"],
        reply: "Hello! I can help you find courses, assignments and teams.",
        teacher_reply: None,
    },
    ChatRule {
        name: "enroll",
        keywords: &["enroll", "enrolled", "enrollment", "join course", "sign up for", "register for"],
        reply: "Open a course page and press Enroll. A full course cannot take new students \
until someone drops.",
        teacher_reply: Some(
            "Students enroll from the course page. You can cap seats with the enrollment limit \
and review the roster under Enrollments.",
        ),
    },
    ChatRule {
        name: "drop",
        keywords: &["drop", "unenroll", "leave course", "withdraw"],
        reply: "Use Unenroll on the course page. You can enroll again later while seats remain.",
        teacher_reply: None,
    },
    ChatRule {
        name: "deadline",
        keywords: &["deadline", "deadlines", "due date", "due", "late"],
        reply: "Each assignment shows its due date. Late work may be accepted with a penalty \
for every day past the deadline.",
        teacher_reply: Some(
            "Set the due date, whether late work is allowed and the daily penalty when you \
create or edit an assignment.",
        ),
    },
    ChatRule {
        name: "grade",
        keywords: &["grade", "grades", "graded", "score", "mark", "marks", "feedback"],
        reply: "Grades and feedback appear on your submission once your teacher has graded it.",
        teacher_reply: Some(
            "Open an assignment's submissions and grade each one between 0 and the total points.",
        ),
    },
    ChatRule {
        name: "submit",
        keywords: &["submit", "submitted", "submission", "hand in", "upload"],
        reply: "Open a published assignment and submit your work. Saving a draft keeps it \
private until you submit.",
        teacher_reply: None,
    },
    ChatRule {
        name: "assignment",
        keywords: &["assignment", "assignments", "homework", "publish"],
        reply: "Assignments of your courses are listed on each course page once published.",
        teacher_reply: Some(
            "Create an assignment as a draft, publish it for students, and close it when \
submissions should stop.",
        ),
    },
    ChatRule {
        name: "team",
        keywords: &["team", "teams", "group", "project", "projects", "task", "tasks"],
        reply: "Create or join a team to track projects and tasks together.",
        teacher_reply: None,
    },
    ChatRule {
        name: "course",
        keywords: &["course", "courses", "class", "classes", "syllabus"],
        reply: "Browse active courses from the course list, or search by title or code.",
        teacher_reply: Some(
            "Create a course with a unique code. Inactive courses stay hidden from students.",
        ),
    },
    ChatRule {
        name: "thanks",
        keywords: &["thank", "thanks", "bye"],
        reply: "You're welcome. Good luck with your studies!",
        teacher_reply: Some("You're welcome. Happy teaching!"),
    },
];

/// 匹配结果：命中的规则名与回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    pub matched_rule: Option<&'static str>,
    pub text: &'static str,
}

/// 每条规则的关键词编译为一个按整词匹配的正则，多词短语之间允许任意空白
static RULE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|rule| {
            let alternatives: Vec<String> = rule
                .keywords
                .iter()
                .map(|kw| {
                    kw.split_whitespace()
                        .map(regex::escape)
                        .collect::<Vec<_>>()
                        .join(r"\s+")
                })
                .collect();
            Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
                .expect("Invalid chat rule pattern")
        })
        .collect()
});

pub fn match_message(text: &str, role: UserRole) -> BotReply {
    let normalized = text.to_lowercase();

    RULES
        .iter()
        .zip(RULE_PATTERNS.iter())
        .find(|(_, pattern)| pattern.is_match(&normalized))
        .map(|(rule, _)| BotReply {
            matched_rule: Some(rule.name),
            text: match role {
                UserRole::Teacher => rule.teacher_reply.unwrap_or(rule.reply),
                UserRole::Student => rule.reply,
            },
        })
        .unwrap_or(BotReply {
            matched_rule: None,
            text: FALLBACK_REPLY,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_match() {
        let reply = match_message("How do I ENROLL?", UserRole::Student);
        assert_eq!(reply.matched_rule, Some("enroll"));
    }

    #[test]
    fn test_first_rule_wins() {
        // 同时包含 enroll 与 course，按表中顺序取 enroll
        let reply = match_message("enroll in a course", UserRole::Student);
        assert_eq!(reply.matched_rule, Some("enroll"));
    }

    #[test]
    fn test_fallback() {
        let reply = match_message("what's the weather like", UserRole::Student);
        assert_eq!(reply.matched_rule, None);
        assert_eq!(reply.text, FALLBACK_REPLY);
    }

    #[test]
    fn test_teacher_reply_variant() {
        let student = match_message("when is the deadline", UserRole::Student);
        let teacher = match_message("when is the deadline", UserRole::Teacher);
        assert_eq!(student.matched_rule, teacher.matched_rule);
        assert_ne!(student.text, teacher.text);

        // 没有教师回复时使用通用回复
        let team = match_message("team", UserRole::Teacher);
        assert_eq!(team.text, match_message("team", UserRole::Student).text);
    }

    #[test]
    fn test_keywords_match_whole_words() {
        assert_eq!(
            match_message("hi", UserRole::Student).matched_rule,
            Some("greeting")
        );
        assert_eq!(
            match_message("this", UserRole::Student).matched_rule,
            None
        );
        // "they" 中的 "hey" 不算问候
        assert_eq!(
            match_message("Can they enroll in two courses?", UserRole::Student).matched_rule,
            Some("enroll")
        );
        // "bookmark" 中的 "mark" 不算成绩
        assert_eq!(
            match_message("where is my bookmark", UserRole::Student).matched_rule,
            None
        );
    }

    #[test]
    fn test_phrase_and_punctuation() {
        assert_eq!(
            match_message("What's the due   date?", UserRole::Student).matched_rule,
            Some("deadline")
        );
        assert_eq!(
            match_message("Hey!", UserRole::Student).matched_rule,
            Some("greeting")
        );
        assert_eq!(
            match_message("I want to leave course CS-101", UserRole::Student).matched_rule,
            Some("drop")
        );
    }

    #[test]
    fn test_every_rule_has_a_pattern() {
        assert_eq!(RULE_PATTERNS.len(), RULES.len());
    }

    #[test]
    fn test_rule_names_unique() {
        let mut names: Vec<_> = RULES.iter().map(|r| r.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }
}
