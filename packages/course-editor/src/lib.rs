//! # Course Editor
//!
//! Edit-state engine for a course's content tree.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ EditSession (facade the editing UI calls)   │
//! └─────────────────────────────────────────────┘
//!        ↓                ↓                ↓
//! ┌──────────────┐ ┌──────────────┐ ┌──────────────┐
//! │ ContentTree  │ │ ChangeLedger │ │ Selection    │
//! │ arena store  │ │ add/edit/del │ │ cursor +     │
//! │ + mutations  │ │ records      │ │ delete flow  │
//! └──────────────┘ └──────────────┘ └──────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────┐
//! │ ChangeSubmitter: batch → backend            │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Optimistic local edits**: the tree changes immediately, the backend
//!    hears about it on submission
//! 2. **Append-only ledger**: every applied mutation leaves its own record
//! 3. **Typed ids**: local and server ids cannot be mixed up
//! 4. **Single writer**: one session, one tree, no locking
//!
//! ## Usage
//!
//! ```rust,ignore
//! use course_editor::{EditSession, EditorConfig, ModuleDraft, LessonDraft, LessonType};
//!
//! let mut session = EditSession::new(EditorConfig::default());
//!
//! let module_id = session
//!     .add_module(ModuleDraft::new("Getting started", 1))
//!     .created_id()
//!     .cloned()
//!     .unwrap();
//! session.add_lesson(&module_id, LessonDraft::new("Welcome", LessonType::Markdown));
//!
//! // Later, hand the batch to the backend
//! session.submit_pending_changes(&submitter).await?;
//! ```

mod config;
mod content;
mod document;
mod errors;
mod ids;
mod ledger;
mod mutations;
mod selection;
mod session;
mod submission;

pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use content::{
    Answer, AnswerDraft, AnswerPatch, CourseContent, Lesson, LessonDraft, LessonPatch, LessonType,
    Module, ModuleDraft, ModulePatch, Question, QuestionDraft, QuestionPatch, QuestionType, Quiz,
    QuizDraft, QuizPatch,
};
pub use document::ContentTree;
pub use errors::{EditorError, SubmitError};
pub use ids::{EntityId, LocalIdGenerator, LOCAL_ID_PREFIX};
pub use ledger::{
    Addition, Change, ChangeLedger, ChangeSet, Deletion, Edit, EntityPatch, EntityPayload,
    EntityType, ParentChain,
};
pub use mutations::{Mutation, MutationError};
pub use selection::{DeleteFlow, DeleteTarget, SelectMode, SelectionCursor};
pub use session::{EditSession, MutationOutcome};
pub use submission::{ChangeSubmitter, SavingFlag, SubmitReceipt};

// Implementors of `ChangeSubmitter` need the same macro
pub use async_trait::async_trait;
