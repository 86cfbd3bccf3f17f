use log::debug;
use serde::{Deserialize, Serialize};

use crate::domain::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Informational,
    NeedsApproval,
    NeedsResponse,
}

pub const APPROVAL_KEYWORDS: &[&str] = &[
    "批准", "审批", "确认", "同意", "授权", "approve", "approval", "authorize", "confirm", "核准",
    "签核",
];

pub const RESPONSE_KEYWORDS: &[&str] = &[
    "回复", "回应", "反馈", "意见", "建议", "reply", "response", "feedback", "urgent", "紧急",
    "请回复", "请回覆",
];

/// One category and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

impl KeywordRule {
    pub fn new<S: AsRef<str>>(category: Category, keywords: &[S]) -> Self {
        Self {
            category,
            keywords: keywords
                .iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    fn matches(&self, subject: &str, body: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| subject.contains(k.as_str()) || body.contains(k.as_str()))
    }
}

/// Ordered rules; the first matching rule wins, anything unmatched is
/// informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRules {
    rules: Vec<KeywordRule>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self::new(vec![
            KeywordRule::new(Category::NeedsApproval, APPROVAL_KEYWORDS),
            KeywordRule::new(Category::NeedsResponse, RESPONSE_KEYWORDS),
        ])
    }
}

impl KeywordRules {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// Subject and body are compared lower-cased; an unreadable body counts
    /// as empty and an unreadable subject falls back to informational.
    pub fn classify(&self, msg: &Message) -> Category {
        let subject = match &msg.subject {
            Ok(s) => s.to_lowercase(),
            Err(e) => {
                debug!("classification fell back to informational: {e}");
                return Category::Informational;
            }
        };
        let body = msg
            .body
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default();

        self.rules
            .iter()
            .find(|rule| rule.matches(&subject, &body))
            .map(|rule| rule.category)
            .unwrap_or(Category::Informational)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub informational: usize,
    pub needs_approval: usize,
    pub needs_response: usize,
}

impl CategoryCounts {
    pub fn total(&self) -> usize {
        self.informational + self.needs_approval + self.needs_response
    }
}

pub fn classify_all(rules: &KeywordRules, messages: &[Message]) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for msg in messages {
        match rules.classify(msg) {
            Category::Informational => counts.informational += 1,
            Category::NeedsApproval => counts.needs_approval += 1,
            Category::NeedsResponse => counts.needs_response += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(subject: &str, body: &str) -> Message {
        Message::default().with_subject(subject).with_body(body)
    }

    #[test]
    fn approval_wins_over_response() {
        let rules = KeywordRules::default();
        assert_eq!(
            rules.classify(&msg("URGENT: please confirm", "")),
            Category::NeedsApproval
        );
    }

    #[test]
    fn body_keywords_count() {
        let rules = KeywordRules::default();
        assert_eq!(
            rules.classify(&msg("Q3 plan", "Please send FEEDBACK by Friday")),
            Category::NeedsResponse
        );
        assert_eq!(rules.classify(&msg("合同", "请审批")), Category::NeedsApproval);
    }

    #[test]
    fn nothing_matching_is_informational() {
        let rules = KeywordRules::default();
        assert_eq!(
            rules.classify(&msg("Weekly newsletter", "hello")),
            Category::Informational
        );
    }

    #[test]
    fn unreadable_body_uses_subject_only() {
        let rules = KeywordRules::default();
        let m = Message::default().with_subject("紧急 update");
        assert_eq!(rules.classify(&m), Category::NeedsResponse);
    }

    #[test]
    fn unreadable_subject_is_informational() {
        let rules = KeywordRules::default();
        let mut m = msg("", "please approve");
        m.subject = Err(crate::domain::FieldError::NotFetched("subject"));
        assert_eq!(rules.classify(&m), Category::Informational);
    }

    #[test]
    fn counts_sum_to_input_length() {
        let rules = KeywordRules::default();
        let batch = vec![
            msg("approve budget", ""),
            msg("reply needed", ""),
            msg("fyi", ""),
            Message::default(),
        ];
        let counts = classify_all(&rules, &batch);
        assert_eq!(counts.total(), batch.len());
        assert_eq!(
            counts,
            CategoryCounts {
                informational: 2,
                needs_approval: 1,
                needs_response: 1
            }
        );
    }

    #[test]
    fn custom_rules_are_lowercased() {
        let rules = KeywordRules::new(vec![KeywordRule::new(
            Category::NeedsResponse,
            &["  Sign-Off ", ""],
        )]);
        assert_eq!(rules.rules()[0].keywords, vec!["sign-off".to_string()]);
        assert_eq!(
            rules.classify(&msg("Need SIGN-OFF", "")),
            Category::NeedsResponse
        );
        assert_eq!(
            rules.classify(&msg("please approve", "")),
            Category::Informational
        );
    }
}
