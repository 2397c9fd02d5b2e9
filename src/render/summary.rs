use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)(Issue|Reason|Conclusion)>").unwrap());

/// Inline markup tags found in annotated summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighlightTag {
    Issue,
    Reason,
    Conclusion,
}

impl HighlightTag {
    pub const ALL: [HighlightTag; 3] = [Self::Issue, Self::Reason, Self::Conclusion];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Issue => "Issue",
            Self::Reason => "Reason",
            Self::Conclusion => "Conclusion",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Issue => "#ffcccc",
            Self::Reason => "#ccffcc",
            Self::Conclusion => "#ccccff",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Issue => "Key issue in the case",
            Self::Reason => "Supporting reasons or arguments",
            Self::Conclusion => "Final decision or claim",
        }
    }

    pub fn style(&self) -> String {
        format!("background-color: {}; font-weight: bold;", self.color())
    }

    fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name().eq(s))
    }
}

/// Collapses line breaks and whitespace runs to single spaces and escapes `$`
/// so the page does not read it as a math delimiter.
pub fn normalize_summary(text: &str) -> String {
    let escaped = text.replace('$', r"\$");
    WHITESPACE_REGEX
        .replace_all(escaped.trim(), " ")
        .into_owned()
}

/// Replaces `<Issue>`, `<Reason>` and `<Conclusion>` tags (and their end tags)
/// with highlighting spans. Other tags are left alone.
pub fn highlight_tags(text: &str) -> Cow<'_, str> {
    TAG_REGEX.replace_all(text, |caps: &Captures| {
        if !caps[1].is_empty() {
            return String::from("</span>");
        }
        match HighlightTag::from_name(&caps[2]) {
            Some(tag) => format!(r#"<span style="{}">"#, tag.style()),
            None => String::from(&caps[0]),
        }
    })
}

pub fn render_summary(raw: &str) -> String {
    highlight_tags(&normalize_summary(raw)).into_owned()
}
