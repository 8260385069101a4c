//! # Edit Session
//!
//! Facade the editing UI talks to. It composes the content tree, the
//! pending change ledger and the selection cursor, and owns only what ties
//! them together: the snapshot the session started from, the local id
//! generator and the configuration.
//!
//! Every mutation entry point follows the same path:
//!
//! ```text
//! UI call → Mutation → ContentTree::apply ─ok→ ledger.record(changes)
//!                                         └not found→ warn, nothing recorded
//! ```

use crate::config::EditorConfig;
use crate::content::{
    AnswerDraft, AnswerPatch, CourseContent, Lesson, LessonDraft, LessonPatch, Module, ModuleDraft,
    ModulePatch, QuestionDraft, QuestionPatch, QuizDraft, QuizPatch,
};
use crate::document::ContentTree;
use crate::errors::EditorError;
use crate::ids::{EntityId, LocalIdGenerator};
use crate::ledger::{ChangeLedger, ChangeSet};
use crate::mutations::{Mutation, MutationError};
use crate::selection::{DeleteFlow, DeleteTarget, SelectMode, SelectionCursor};
use crate::submission::{ChangeSubmitter, SavingFlag, SubmitReceipt};
use std::collections::HashMap;

/// What a mutation entry point did
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// Applied and recorded
    Applied,

    /// Applied and recorded; the new entity got this id
    Created(EntityId),

    /// Target did not resolve, or an added id was already taken.
    /// Tree and ledger are unchanged.
    NotFound(MutationError),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, MutationOutcome::NotFound(_))
    }

    pub fn created_id(&self) -> Option<&EntityId> {
        match self {
            MutationOutcome::Created(id) => Some(id),
            _ => None,
        }
    }
}

/// One editing session over one course
pub struct EditSession {
    tree: ContentTree,

    /// Snapshot restored by `discard_changes`
    original: CourseContent,

    ledger: ChangeLedger,
    selection: SelectionCursor,
    delete_flow: DeleteFlow,
    ids: LocalIdGenerator,
    config: EditorConfig,
    saving: SavingFlag,
}

impl EditSession {
    /// Start from an empty skeleton course
    pub fn new(config: EditorConfig) -> Self {
        Self::from_content(CourseContent::default(), config)
    }

    /// Start from freshly fetched course content
    pub fn from_content(content: CourseContent, config: EditorConfig) -> Self {
        let ids = match &config.id_seed {
            Some(seed) => LocalIdGenerator::new(seed.clone()),
            None => LocalIdGenerator::from_clock(),
        };

        tracing::debug!(modules = content.modules.len(), seed = ids.seed(), "edit session started");

        Self {
            tree: ContentTree::from_content(content.clone()),
            original: content,
            ledger: ChangeLedger::new(),
            selection: SelectionCursor::new(),
            delete_flow: DeleteFlow::Idle,
            ids,
            config,
            saving: SavingFlag::default(),
        }
    }

    /// Start from course content serialized as JSON
    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self, EditorError> {
        let content: CourseContent = serde_json::from_str(json)?;
        Ok(Self::from_content(content, config))
    }

    /// Current nested view of the course
    pub fn tree(&self) -> CourseContent {
        self.tree.tree()
    }

    pub fn content_tree(&self) -> &ContentTree {
        &self.tree
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Apply any mutation and record its changes if it resolved
    pub fn apply(&mut self, mutation: Mutation) -> MutationOutcome {
        self.commit(mutation, None)
    }

    fn commit(&mut self, mutation: Mutation, created: Option<EntityId>) -> MutationOutcome {
        match self.tree.apply(&mutation, &self.config) {
            Ok(changes) => {
                tracing::debug!(
                    mutation = mutation.name(),
                    changes = changes.len(),
                    version = self.tree.version(),
                    "mutation applied"
                );
                for change in changes {
                    self.ledger.record(change);
                }
                match created {
                    Some(id) => MutationOutcome::Created(id),
                    None => MutationOutcome::Applied,
                }
            }
            Err(e) => {
                tracing::warn!(mutation = mutation.name(), error = %e, "mutation rejected");
                MutationOutcome::NotFound(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Modules
    // -----------------------------------------------------------------------

    pub fn add_module(&mut self, draft: ModuleDraft) -> MutationOutcome {
        let module = draft.into_module(&mut self.ids);
        let id = module.id.clone();
        self.commit(Mutation::AddModule { module }, Some(id))
    }

    pub fn update_module(&mut self, module_id: &EntityId, patch: ModulePatch) -> MutationOutcome {
        self.apply(Mutation::UpdateModule {
            module_id: module_id.clone(),
            patch,
        })
    }

    pub fn delete_module(&mut self, module_id: &EntityId) -> MutationOutcome {
        self.apply(Mutation::DeleteModule {
            module_id: module_id.clone(),
        })
    }

    pub fn reorder_modules(&mut self, ordered_ids: Vec<EntityId>) -> MutationOutcome {
        self.apply(Mutation::ReorderModules { ordered_ids })
    }

    // -----------------------------------------------------------------------
    // Lessons
    // -----------------------------------------------------------------------

    pub fn add_lesson(&mut self, module_id: &EntityId, draft: LessonDraft) -> MutationOutcome {
        let lesson = draft.into_lesson(&mut self.ids);
        let id = lesson.id.clone();
        self.commit(
            Mutation::AddLesson {
                module_id: module_id.clone(),
                lesson,
            },
            Some(id),
        )
    }

    pub fn update_lesson(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        patch: LessonPatch,
    ) -> MutationOutcome {
        self.apply(Mutation::UpdateLesson {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
            patch,
        })
    }

    pub fn delete_lesson(&mut self, module_id: &EntityId, lesson_id: &EntityId) -> MutationOutcome {
        self.apply(Mutation::DeleteLesson {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
        })
    }

    pub fn reorder_lessons(
        &mut self,
        module_id: &EntityId,
        ordered_ids: Vec<EntityId>,
    ) -> MutationOutcome {
        self.apply(Mutation::ReorderLessons {
            module_id: module_id.clone(),
            ordered_ids,
        })
    }

    // -----------------------------------------------------------------------
    // Quiz
    // -----------------------------------------------------------------------

    pub fn add_quiz(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        draft: QuizDraft,
    ) -> MutationOutcome {
        let quiz = draft.into_quiz(&mut self.ids);
        self.apply(Mutation::AddQuiz {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
            quiz,
        })
    }

    pub fn update_quiz(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        patch: QuizPatch,
    ) -> MutationOutcome {
        self.apply(Mutation::UpdateQuiz {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
            patch,
        })
    }

    pub fn delete_quiz(&mut self, module_id: &EntityId, lesson_id: &EntityId) -> MutationOutcome {
        self.apply(Mutation::DeleteQuiz {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
        })
    }

    pub fn add_quiz_question(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        draft: QuestionDraft,
    ) -> MutationOutcome {
        let question = draft.into_question(&mut self.ids);
        let id = question.id.clone();
        self.commit(
            Mutation::AddQuestion {
                module_id: module_id.clone(),
                lesson_id: lesson_id.clone(),
                question,
            },
            Some(id),
        )
    }

    pub fn update_quiz_question(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
        patch: QuestionPatch,
    ) -> MutationOutcome {
        self.apply(Mutation::UpdateQuestion {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
            question_id: question_id.clone(),
            patch,
        })
    }

    pub fn delete_quiz_question(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
    ) -> MutationOutcome {
        self.apply(Mutation::DeleteQuestion {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
            question_id: question_id.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Answers
    // -----------------------------------------------------------------------

    pub fn add_answer(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
        draft: AnswerDraft,
    ) -> MutationOutcome {
        let answer = draft.into_answer(&mut self.ids);
        let id = answer.id.clone();
        self.commit(
            Mutation::AddAnswer {
                module_id: module_id.clone(),
                lesson_id: lesson_id.clone(),
                question_id: question_id.clone(),
                answer,
            },
            Some(id),
        )
    }

    pub fn update_answer(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
        answer_id: &EntityId,
        patch: AnswerPatch,
    ) -> MutationOutcome {
        self.apply(Mutation::UpdateAnswer {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
            question_id: question_id.clone(),
            answer_id: answer_id.clone(),
            patch,
        })
    }

    pub fn delete_answer(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
        answer_id: &EntityId,
    ) -> MutationOutcome {
        self.apply(Mutation::DeleteAnswer {
            module_id: module_id.clone(),
            lesson_id: lesson_id.clone(),
            question_id: question_id.clone(),
            answer_id: answer_id.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Ledger
    // -----------------------------------------------------------------------

    pub fn ledger(&self) -> &ChangeLedger {
        &self.ledger
    }

    pub fn drain_for_submission(&self) -> ChangeSet {
        self.ledger.drain_for_submission()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.ledger.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.ledger.len()
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn selection(&self) -> &SelectionCursor {
        &self.selection
    }

    pub fn set_select_mode(&mut self, mode: SelectMode) {
        self.selection.set_select_mode(mode);
    }

    pub fn set_selected_module(&mut self, module_id: EntityId) {
        self.selection.set_selected_module(module_id);
    }

    pub fn set_selected_lesson(&mut self, lesson_id: EntityId) {
        self.selection.set_selected_lesson(lesson_id);
    }

    pub fn get_selected_module(&self) -> Option<Module> {
        self.selection.get_selected_module(&self.tree)
    }

    pub fn get_selected_lesson(&self) -> Option<Lesson> {
        self.selection.get_selected_lesson(&self.tree)
    }

    // -----------------------------------------------------------------------
    // Delete confirmation
    // -----------------------------------------------------------------------

    pub fn open_delete_modal(&mut self, target: DeleteTarget) {
        self.delete_flow.open(target);
    }

    pub fn close_delete_modal(&mut self) {
        self.delete_flow.close();
    }

    pub fn delete_flow(&self) -> &DeleteFlow {
        &self.delete_flow
    }

    /// Delete the pending target and retarget the selection.
    ///
    /// Returns `None` when no confirmation is pending.
    pub fn confirm_delete(&mut self) -> Option<MutationOutcome> {
        let target = self.delete_flow.take()?;

        let outcome = match target {
            DeleteTarget::Module { module_id } => {
                let outcome = self.delete_module(&module_id);
                self.selection.module_deleted();
                outcome
            }
            DeleteTarget::Lesson {
                module_id,
                lesson_id,
            } => {
                let outcome = self.delete_lesson(&module_id, &lesson_id);
                self.selection.set_selected_module(module_id);
                outcome
            }
        };
        Some(outcome)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Send the pending changes as one batch.
    ///
    /// On success the ledger is cleared, issued ids replace local ones and the
    /// current tree becomes the new baseline. On failure the ledger is left
    /// exactly as it was, ready for a retry of the whole batch.
    pub async fn submit_pending_changes<S>(
        &mut self,
        submitter: &S,
    ) -> Result<SubmitReceipt, EditorError>
    where
        S: ChangeSubmitter + ?Sized,
    {
        let changes = self.ledger.drain_for_submission();
        if changes.is_empty() {
            tracing::info!("no pending changes to submit");
            return Ok(SubmitReceipt::default());
        }

        let _saving = self.saving.raise();
        tracing::info!(
            additions = changes.additions.len(),
            edits = changes.edits.len(),
            deletions = changes.deletions.len(),
            "submitting pending changes"
        );

        match submitter.submit(&changes).await {
            Ok(receipt) => {
                self.ledger.clear();
                self.reconcile_ids(&receipt.issued_ids);
                self.original = self.tree.tree();
                tracing::info!(issued = receipt.issued_ids.len(), "submission accepted");
                Ok(receipt)
            }
            Err(e) => {
                tracing::error!(error = %e, pending = self.ledger.len(), "submission failed");
                Err(e.into())
            }
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_saving()
    }

    /// Handle for observing the busy flag from outside the session
    pub fn saving_flag(&self) -> SavingFlag {
        self.saving.clone()
    }

    /// Swap local ids for the ids the backend issued
    pub fn reconcile_ids(&mut self, issued_ids: &HashMap<EntityId, EntityId>) {
        for (local, remote) in issued_ids {
            if self.tree.rename_id(local, remote) {
                self.selection.rename_id(local, remote);
            } else {
                tracing::warn!(local = %local, remote = %remote, "could not reconcile id");
            }
        }
    }

    /// Revert to the snapshot the session started from and forget all
    /// pending changes
    pub fn discard_changes(&mut self) {
        tracing::info!(dropped = self.ledger.len(), "discarding changes");
        self.tree = ContentTree::from_content(self.original.clone());
        self.ledger.clear();
        self.selection = SelectionCursor::new();
        self.delete_flow = DeleteFlow::Idle;
    }

    /// Replace the tree with an empty skeleton course. The original snapshot
    /// is kept.
    pub fn reset(&mut self) {
        tracing::info!("resetting to empty course");
        self.tree = ContentTree::new();
        self.ledger.clear();
        self.selection = SelectionCursor::new();
        self.delete_flow = DeleteFlow::Idle;
    }
}
