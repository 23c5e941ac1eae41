//! Built-in publication checks, in their default pipeline order.

use progression_types::PublicationConfig;

use crate::check::{CheckVerdict, PublicationCheck};
use crate::draft::ContentDraft;

/// Title and body must both have visible content.
pub struct EmptyFieldCheck;

impl PublicationCheck for EmptyFieldCheck {
    fn name(&self) -> &str {
        "empty field check"
    }

    fn evaluate(&self, draft: &ContentDraft) -> CheckVerdict {
        if draft.title.trim().is_empty() {
            return CheckVerdict::fail("title is empty");
        }
        if draft.body.trim().is_empty() {
            return CheckVerdict::fail("body is empty");
        }
        CheckVerdict::Pass
    }
}

/// Bounded title, minimum body length. Lengths count characters.
pub struct LengthCheck {
    pub max_title_chars: usize,
    pub min_body_chars: usize,
}

impl LengthCheck {
    pub fn from_config(config: &PublicationConfig) -> Self {
        Self {
            max_title_chars: config.max_title_chars,
            min_body_chars: config.min_body_chars,
        }
    }
}

impl PublicationCheck for LengthCheck {
    fn name(&self) -> &str {
        "length check"
    }

    fn evaluate(&self, draft: &ContentDraft) -> CheckVerdict {
        let title_chars = draft.title.trim().chars().count();
        if title_chars > self.max_title_chars {
            return CheckVerdict::fail(format!(
                "title has {title_chars} characters, at most {} allowed",
                self.max_title_chars
            ));
        }
        let body_chars = draft.body.trim().chars().count();
        if body_chars < self.min_body_chars {
            return CheckVerdict::fail(format!(
                "body has {body_chars} characters, at least {} required",
                self.min_body_chars
            ));
        }
        CheckVerdict::Pass
    }
}

pub struct TagLimitCheck {
    pub max_tags: usize,
}

impl PublicationCheck for TagLimitCheck {
    fn name(&self) -> &str {
        "tag limit check"
    }

    fn evaluate(&self, draft: &ContentDraft) -> CheckVerdict {
        if draft.tags.len() > self.max_tags {
            return CheckVerdict::fail(format!(
                "{} tags, at most {} allowed",
                draft.tags.len(),
                self.max_tags
            ));
        }
        if draft.tags.iter().any(|t| t.trim().is_empty()) {
            return CheckVerdict::fail("blank tag");
        }
        CheckVerdict::Pass
    }
}

/// Banned phrases, link stuffing and long runs of one character.
pub struct SpamCheck {
    banned_phrases: Vec<String>,
    max_links: usize,
    max_repeated_run: usize,
}

impl SpamCheck {
    pub fn new(banned_phrases: &[String], max_links: usize, max_repeated_run: usize) -> Self {
        Self {
            banned_phrases: banned_phrases.iter().map(|p| p.to_lowercase()).collect(),
            max_links,
            max_repeated_run,
        }
    }

    pub fn from_config(config: &PublicationConfig) -> Self {
        Self::new(
            &config.banned_phrases,
            config.max_links,
            config.max_repeated_run,
        )
    }
}

impl PublicationCheck for SpamCheck {
    fn name(&self) -> &str {
        "spam check"
    }

    fn evaluate(&self, draft: &ContentDraft) -> CheckVerdict {
        let text = format!("{}\n{}", draft.title, draft.body).to_lowercase();

        if let Some(phrase) = self.banned_phrases.iter().find(|p| text.contains(p.as_str())) {
            return CheckVerdict::fail(format!("contains banned phrase \"{phrase}\""));
        }

        let links = text.matches("http://").count() + text.matches("https://").count();
        if links > self.max_links {
            return CheckVerdict::fail(format!(
                "{links} links, at most {} allowed",
                self.max_links
            ));
        }

        let run = longest_run(&text);
        if run > self.max_repeated_run {
            return CheckVerdict::fail(format!("a character repeats {run} times in a row"));
        }

        CheckVerdict::Pass
    }
}

/// Longest run of one repeated non-whitespace character.
fn longest_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous = None;
    for c in text.chars() {
        if c.is_whitespace() {
            previous = None;
            current = 0;
            continue;
        }
        current = if previous == Some(c) { current + 1 } else { 1 };
        previous = Some(c);
        longest = longest.max(current);
    }
    longest
}
