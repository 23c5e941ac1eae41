use crate::draft::ContentDraft;

/// Result of a single publication check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckVerdict {
    Pass,
    Fail { detail: String },
}

impl CheckVerdict {
    /// Failing verdict with a detail message.
    pub fn fail(detail: impl Into<String>) -> Self {
        CheckVerdict::Fail {
            detail: detail.into(),
        }
    }

    /// True for [`CheckVerdict::Pass`].
    pub fn is_pass(&self) -> bool {
        matches!(self, CheckVerdict::Pass)
    }
}

/// A named predicate over a draft.
///
/// Checks hold no shared mutable state; each sees only the draft.
pub trait PublicationCheck: Send + Sync {
    /// Reported as the failing check's name.
    fn name(&self) -> &str;

    fn evaluate(&self, draft: &ContentDraft) -> CheckVerdict;
}

/// A check built from a name and a plain `Fn(&ContentDraft) -> bool`.
pub struct FnCheck<F> {
    name: String,
    predicate: F,
}

/// Wrap a closure as a named [`PublicationCheck`].
pub fn check_fn<F>(name: impl Into<String>, predicate: F) -> FnCheck<F>
where
    F: Fn(&ContentDraft) -> bool + Send + Sync,
{
    FnCheck {
        name: name.into(),
        predicate,
    }
}

impl<F> PublicationCheck for FnCheck<F>
where
    F: Fn(&ContentDraft) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, draft: &ContentDraft) -> CheckVerdict {
        if (self.predicate)(draft) {
            CheckVerdict::Pass
        } else {
            CheckVerdict::fail(format!("{} rejected the draft", self.name))
        }
    }
}
