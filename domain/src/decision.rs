//! Classification of free-text human replies into a fixed decision set.
//!
//! The gate accepts an unconstrained reply and must resolve it to exactly
//! one of `Approve` or `Revise`. Classification is pure string inspection:
//! replies that clearly agree with no caveats approve; questions,
//! conditionals, and change requests revise; everything else falls back to
//! a caller-supplied default so the policy stays explicit and loggable.

use serde::{Deserialize, Serialize};

/// Marker pair delimiting a model's reasoning annotation inside a reply.
/// Anything between the markers is stripped before classification.
pub const REASONING_START: &str = "<reasoning>";
pub const REASONING_END: &str = "</reasoning>";

/// The gate's decision set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Revise,
}

impl Decision {
    pub fn as_str(&self) -> &str {
        match self {
            Decision::Approve => "approve",
            Decision::Revise => "revise",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of classifying a reply.
///
/// `ambiguous` is set when neither an agreement nor a revision signal was
/// found and the caller's default was used. Callers log that case as a
/// policy decision rather than a confident classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub decision: Decision,
    pub ambiguous: bool,
}

/// Remove every paired reasoning annotation from a reply.
///
/// Unpaired markers are left as-is; only complete `<reasoning>...</reasoning>`
/// spans are removed.
pub fn strip_reasoning(reply: &str) -> String {
    let mut out = String::with_capacity(reply.len());
    let mut rest = reply;

    while let Some(start) = rest.find(REASONING_START) {
        match rest[start..].find(REASONING_END) {
            Some(rel_end) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + rel_end + REASONING_END.len()..];
            }
            None => break, // unpaired start marker, keep remainder verbatim
        }
    }
    out.push_str(rest);
    out
}

/// Phrases that signal a caveat, condition, or change request.
///
/// Checked before agreement phrases so "looks good, but..." revises.
const REVISE_SIGNALS: &[&str] = &[
    "but",
    "however",
    "though",
    "unless",
    "only if",
    "instead",
    "rather than",
    "what about",
    "what if",
    "can we",
    "could we",
    "should we",
    "would prefer",
    "prefer",
    "not sure",
    "concern",
    "wait",
    "hold on",
    "except",
    "change",
    "revise",
    "rework",
    "redo",
    "different",
    "modify",
];

/// Phrases that signal unqualified agreement.
const APPROVE_SIGNALS: &[&str] = &[
    "approve",
    "approved",
    "lgtm",
    "looks good",
    "looks great",
    "looks right",
    "go ahead",
    "go for it",
    "ship it",
    "proceed",
    "sounds good",
    "sounds great",
    "perfect",
    "let's implement",
    "let's do it",
    "do it",
    "implement it",
    "works for me",
    "yes",
    "yep",
    "yeah",
    "okay",
];

/// Check whether any signal phrase occurs in `text` on word boundaries,
/// so "yes" does not match inside "yesterday".
fn has_signal(text: &str, signals: &[&str]) -> bool {
    signals.iter().any(|signal| {
        let mut from = 0;
        while let Some(pos) = text[from..].find(signal) {
            let start = from + pos;
            let end = start + signal.len();
            let before_ok = start == 0
                || !text[..start]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_alphanumeric());
            let after_ok = end == text.len()
                || !text[end..].chars().next().is_some_and(|c| c.is_alphanumeric());
            if before_ok && after_ok {
                return true;
            }
            from = end;
        }
        false
    })
}

/// Classify a free-text reply into `Approve` or `Revise`.
///
/// Rules, in order:
/// 1. Reasoning annotations are stripped.
/// 2. Any question mark revises.
/// 3. Any caveat/conditional/change-request phrase revises.
/// 4. Any agreement phrase (with no caveat found above) approves.
/// 5. Otherwise the reply is ambiguous and `default` is returned.
///
/// Classification is deterministic: the same literal reply always yields
/// the same decision for a given default.
pub fn classify_reply(reply: &str, default: Decision) -> Classification {
    let stripped = strip_reasoning(reply);
    let text = stripped.trim().to_lowercase();

    if text.is_empty() {
        return Classification {
            decision: default,
            ambiguous: true,
        };
    }

    if text.contains('?') {
        return Classification {
            decision: Decision::Revise,
            ambiguous: false,
        };
    }

    if has_signal(&text, REVISE_SIGNALS) {
        return Classification {
            decision: Decision::Revise,
            ambiguous: false,
        };
    }

    if has_signal(&text, APPROVE_SIGNALS) {
        return Classification {
            decision: Decision::Approve,
            ambiguous: false,
        };
    }

    Classification {
        decision: default,
        ambiguous: true,
    }
}
