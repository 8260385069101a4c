//! # Selection Cursor
//!
//! Tracks the single module or lesson focused in the split-pane editor.
//!
//! The cursor stores ids only. Lookups resolve them against the current tree,
//! so a deleted target simply reads back as `None`. The delete confirmation
//! flow is the one place that retargets the cursor explicitly:
//!
//! ```text
//!            open_delete_modal(target)
//!   Idle ─────────────────────────────→ ConfirmPending(target)
//!    ↑                                          │
//!    └──── close_delete_modal / confirm ────────┘
//! ```

use crate::content::{Lesson, Module};
use crate::document::ContentTree;
use crate::ids::EntityId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectMode {
    #[default]
    None,
    Module,
    Lesson,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionCursor {
    mode: SelectMode,
    module_id: Option<EntityId>,
    lesson_id: Option<EntityId>,
}

impl SelectionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    pub fn module_id(&self) -> Option<&EntityId> {
        self.module_id.as_ref()
    }

    pub fn lesson_id(&self) -> Option<&EntityId> {
        self.lesson_id.as_ref()
    }

    /// Set the mode, dropping whichever selection the mode no longer covers
    pub fn set_select_mode(&mut self, mode: SelectMode) {
        self.mode = mode;
        if mode != SelectMode::Module {
            self.module_id = None;
        }
        if mode != SelectMode::Lesson {
            self.lesson_id = None;
        }
    }

    pub fn set_selected_module(&mut self, module_id: EntityId) {
        self.mode = SelectMode::Module;
        self.module_id = Some(module_id);
        self.lesson_id = None;
    }

    /// Select a lesson. The module selection must already be its parent.
    pub fn set_selected_lesson(&mut self, lesson_id: EntityId) {
        self.mode = SelectMode::Lesson;
        self.lesson_id = Some(lesson_id);
    }

    pub fn get_selected_module(&self, tree: &ContentTree) -> Option<Module> {
        tree.module(self.module_id.as_ref()?)
    }

    pub fn get_selected_lesson(&self, tree: &ContentTree) -> Option<Lesson> {
        tree.lesson(self.module_id.as_ref()?, self.lesson_id.as_ref()?)
    }

    /// Focus falls back to nothing after the selected module is deleted
    pub(crate) fn module_deleted(&mut self) {
        self.mode = SelectMode::None;
        self.module_id = None;
        self.lesson_id = None;
    }

    /// Swap an id after the backend issued a permanent one
    pub(crate) fn rename_id(&mut self, from: &EntityId, to: &EntityId) {
        for slot in [&mut self.module_id, &mut self.lesson_id] {
            if slot.as_ref() == Some(from) {
                *slot = Some(to.clone());
            }
        }
    }
}

/// What a pending delete confirmation will remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Module {
        module_id: EntityId,
    },
    Lesson {
        module_id: EntityId,
        lesson_id: EntityId,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeleteFlow {
    #[default]
    Idle,
    ConfirmPending(DeleteTarget),
}

impl DeleteFlow {
    pub fn open(&mut self, target: DeleteTarget) {
        *self = DeleteFlow::ConfirmPending(target);
    }

    pub fn close(&mut self) {
        *self = DeleteFlow::Idle;
    }

    /// Leave confirm-pending, handing back the stored target
    pub fn take(&mut self) -> Option<DeleteTarget> {
        match std::mem::take(self) {
            DeleteFlow::ConfirmPending(target) => Some(target),
            DeleteFlow::Idle => None,
        }
    }

    pub fn target(&self) -> Option<&DeleteTarget> {
        match self {
            DeleteFlow::ConfirmPending(target) => Some(target),
            DeleteFlow::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, DeleteFlow::ConfirmPending(_))
    }
}
