//! Inline editor for the displayed result.
//!
//! The widget is controlled: the owner holds the authoritative text, pushes it in
//! with [`EditableResult::sync_upstream`], and learns about commits through
//! [`EditOutcome::Committed`]. Nothing typed into the draft is visible to the owner
//! until a commit.
//!
//! # State transitions
//!
//! ```text
//! Viewing ──activate (per EditTrigger)──▶ Editing
//! Editing ──commit / blur──▶ Viewing   emits Committed(trimmed draft)
//! Editing ──cancel──▶ Viewing          committed text restored, no event
//! ```

use devlens_types::{EditTrigger, ui::DraftInput};

/// Which surface the reviewer activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryTarget {
    /// The separate `[ Edit ]` control.
    Button,
    /// The displayed result text.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Viewing,
    Editing,
}

/// What a widget operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum EditOutcome {
    /// Nothing happened.
    Ignored,
    /// Entered `Editing`; the owner should focus the editor.
    Began,
    /// Left `Editing` by commit. Carries the new text for the owner.
    Committed(String),
    /// Left `Editing` without a change.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EditState {
    Viewing { committed: String },
    Editing { committed: String, draft: DraftInput },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableResult {
    state: EditState,
    trigger: EditTrigger,
}

impl EditableResult {
    #[must_use]
    pub fn new(committed: impl Into<String>, trigger: EditTrigger) -> Self {
        Self {
            state: EditState::Viewing {
                committed: committed.into(),
            },
            trigger,
        }
    }

    #[must_use]
    pub fn trigger(&self) -> EditTrigger {
        self.trigger
    }

    #[must_use]
    pub fn mode(&self) -> EditMode {
        match self.state {
            EditState::Viewing { .. } => EditMode::Viewing,
            EditState::Editing { .. } => EditMode::Editing,
        }
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.mode() == EditMode::Editing
    }

    /// The last committed (or upstream-provided) text.
    #[must_use]
    pub fn committed(&self) -> &str {
        match &self.state {
            EditState::Viewing { committed } | EditState::Editing { committed, .. } => committed,
        }
    }

    #[must_use]
    pub fn draft(&self) -> Option<&DraftInput> {
        match &self.state {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Viewing { .. } => None,
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut DraftInput> {
        match &mut self.state {
            EditState::Editing { draft, .. } => Some(draft),
            EditState::Viewing { .. } => None,
        }
    }

    /// Activation through one of the entry surfaces.
    ///
    /// Only the surface matching the configured [`EditTrigger`] starts an edit.
    pub fn activate(&mut self, target: EntryTarget) -> EditOutcome {
        let accepted = matches!(
            (self.trigger, target),
            (EditTrigger::Button, EntryTarget::Button) | (EditTrigger::Direct, EntryTarget::Text)
        );
        if accepted {
            self.begin_edit()
        } else {
            EditOutcome::Ignored
        }
    }

    /// Enter `Editing` with the draft seeded from the committed text.
    pub fn begin_edit(&mut self) -> EditOutcome {
        match &mut self.state {
            EditState::Editing { .. } => EditOutcome::Ignored,
            EditState::Viewing { committed } => {
                let committed = std::mem::take(committed);
                let draft = DraftInput::with_text(committed.clone());
                self.state = EditState::Editing { committed, draft };
                tracing::debug!("Result editing started");
                EditOutcome::Began
            }
        }
    }

    /// Accept the draft. Surrounding whitespace is trimmed.
    pub fn commit(&mut self) -> EditOutcome {
        match &mut self.state {
            EditState::Viewing { .. } => EditOutcome::Ignored,
            EditState::Editing { draft, .. } => {
                let text = draft.text().trim().to_string();
                self.state = EditState::Viewing {
                    committed: text.clone(),
                };
                tracing::debug!(chars = text.chars().count(), "Result edit committed");
                EditOutcome::Committed(text)
            }
        }
    }

    /// Focus left the editor. Same as [`Self::commit`].
    pub fn blur(&mut self) -> EditOutcome {
        self.commit()
    }

    /// Drop the draft and keep the committed text.
    pub fn cancel(&mut self) -> EditOutcome {
        match &mut self.state {
            EditState::Viewing { .. } => EditOutcome::Ignored,
            EditState::Editing { committed, .. } => {
                let committed = std::mem::take(committed);
                self.state = EditState::Viewing { committed };
                tracing::debug!("Result edit cancelled");
                EditOutcome::Cancelled
            }
        }
    }

    /// The owner's text changed.
    ///
    /// Replaces the committed text. An in-progress draft is discarded without an
    /// event since it was based on text that no longer exists.
    pub fn sync_upstream(&mut self, text: &str) {
        if let EditState::Editing { .. } = self.state {
            tracing::debug!("Discarding result draft after upstream change");
        }
        self.state = EditState::Viewing {
            committed: text.to_string(),
        };
    }
}
