//! Naming conflict resolution between incoming and installed mod/DLC folders

use super::ContentKind;
use std::collections::BTreeSet;

/// Answer to an overwrite prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    Yes,
    YesToAll,
    No,
    NoToAll,
}

/// What to do with a classified folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictAction {
    Copy,
    Skip,
}

/// Asks the user whether an already installed folder should be overwritten
#[cfg_attr(test, mockall::automock)]
pub trait ConflictPrompt {
    fn ask(&mut self, name: &str, kind: ContentKind) -> ConflictDecision;
}

/// Prompt that always gives the same answer (batch mode)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub ConflictDecision);

impl ConflictPrompt for FixedAnswer {
    fn ask(&mut self, _name: &str, _kind: ContentKind) -> ConflictDecision {
        self.0
    }
}

/// Run-scoped "ask again?" state
///
/// A `YesToAll`/`NoToAll` answer turns `ask` off and is reused for every
/// later conflict of the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AskPolicy {
    pub ask: bool,
    remembered: Option<ConflictDecision>,
}

impl Default for AskPolicy {
    fn default() -> Self {
        Self {
            ask: true,
            remembered: None,
        }
    }
}

impl AskPolicy {
    /// The ToAll verdict reused while `ask` is off
    pub fn remembered(&self) -> Option<ConflictDecision> {
        self.remembered
    }
}

/// Decide whether a folder gets copied
pub fn resolve_conflict(
    name: &str,
    kind: ContentKind,
    installed: &BTreeSet<String>,
    policy: &mut AskPolicy,
    prompt: &mut dyn ConflictPrompt,
) -> ConflictAction {
    if !installed.contains(name) {
        return ConflictAction::Copy;
    }

    let decision = if policy.ask {
        let decision = prompt.ask(name, kind);
        if matches!(decision, ConflictDecision::YesToAll | ConflictDecision::NoToAll) {
            policy.ask = false;
            policy.remembered = Some(decision);
        }
        Some(decision)
    } else {
        policy.remembered
    };

    tracing::debug!("Conflict on {} '{}': {:?}", kind.label(), name, decision);

    match decision {
        Some(ConflictDecision::Yes) | Some(ConflictDecision::YesToAll) => ConflictAction::Copy,
        _ => ConflictAction::Skip,
    }
}
