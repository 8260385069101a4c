//! # Content Mutations
//!
//! One variant per editing operation the UI may invoke on the content tree.
//!
//! ## Semantics
//!
//! - There is no business validation here: duplicate titles, empty quizzes
//!   and question shapes are the form layer's concern.
//! - A target that does not resolve through its full parent chain yields a
//!   `*NotFound` error and leaves the tree untouched.
//! - A successful apply returns the [`Change`] records describing it, ready
//!   to be stamped into the ledger.
//!
//! ### Add*
//! - Every id in the payload, nested ones included, must be new to the tree
//!   and unique within the payload. Otherwise nothing is inserted.
//! - A quiz-kind lesson added without a quiz gets an empty one, and the
//!   recorded addition carries it.
//!
//! ### UpdateLesson
//! - Switching `lessonType` to quiz on a lesson without a quiz synthesizes
//!   an empty quiz in the same step. Only the lesson edit is recorded.
//!
//! ### DeleteQuiz
//! - Also resets the lesson's kind to the configured fallback (markdown).
//!
//! ### ReorderModules / ReorderLessons
//! - Order becomes the 1-based position in the given list.
//! - Siblings missing from the list are dropped from the tree, without a
//!   deletion record.

use crate::config::EditorConfig;
use crate::content::{
    Answer, AnswerPatch, Lesson, LessonPatch, LessonType, Module, ModulePatch, Question,
    QuestionPatch, Quiz, QuizPatch,
};
use crate::document::ContentTree;
use crate::ids::EntityId;
use crate::ledger::{Change, EntityPatch, EntityPayload, EntityType, ParentChain};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Editing operations on the content tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    AddModule {
        module: Module,
    },
    UpdateModule {
        module_id: EntityId,
        patch: ModulePatch,
    },
    DeleteModule {
        module_id: EntityId,
    },
    ReorderModules {
        ordered_ids: Vec<EntityId>,
    },

    AddLesson {
        module_id: EntityId,
        lesson: Lesson,
    },
    UpdateLesson {
        module_id: EntityId,
        lesson_id: EntityId,
        patch: LessonPatch,
    },
    DeleteLesson {
        module_id: EntityId,
        lesson_id: EntityId,
    },
    ReorderLessons {
        module_id: EntityId,
        ordered_ids: Vec<EntityId>,
    },

    AddQuiz {
        module_id: EntityId,
        lesson_id: EntityId,
        quiz: Quiz,
    },
    UpdateQuiz {
        module_id: EntityId,
        lesson_id: EntityId,
        patch: QuizPatch,
    },
    DeleteQuiz {
        module_id: EntityId,
        lesson_id: EntityId,
    },

    AddQuestion {
        module_id: EntityId,
        lesson_id: EntityId,
        question: Question,
    },
    UpdateQuestion {
        module_id: EntityId,
        lesson_id: EntityId,
        question_id: EntityId,
        patch: QuestionPatch,
    },
    DeleteQuestion {
        module_id: EntityId,
        lesson_id: EntityId,
        question_id: EntityId,
    },

    AddAnswer {
        module_id: EntityId,
        lesson_id: EntityId,
        question_id: EntityId,
        answer: Answer,
    },
    UpdateAnswer {
        module_id: EntityId,
        lesson_id: EntityId,
        question_id: EntityId,
        answer_id: EntityId,
        patch: AnswerPatch,
    },
    DeleteAnswer {
        module_id: EntityId,
        lesson_id: EntityId,
        question_id: EntityId,
        answer_id: EntityId,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Module not found: {0}")]
    ModuleNotFound(EntityId),

    #[error("Lesson {lesson_id} not found in module {module_id}")]
    LessonNotFound {
        module_id: EntityId,
        lesson_id: EntityId,
    },

    #[error("Lesson {0} has no quiz")]
    QuizNotFound(EntityId),

    #[error("Question {question_id} not found in lesson {lesson_id}")]
    QuestionNotFound {
        lesson_id: EntityId,
        question_id: EntityId,
    },

    #[error("Answer {answer_id} not found in question {question_id}")]
    AnswerNotFound {
        question_id: EntityId,
        answer_id: EntityId,
    },

    #[error("Id already in use: {0}")]
    DuplicateId(EntityId),
}

type ApplyResult = Result<Vec<Change>, MutationError>;

impl Mutation {
    /// Debug name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::AddModule { .. } => "AddModule",
            Mutation::UpdateModule { .. } => "UpdateModule",
            Mutation::DeleteModule { .. } => "DeleteModule",
            Mutation::ReorderModules { .. } => "ReorderModules",
            Mutation::AddLesson { .. } => "AddLesson",
            Mutation::UpdateLesson { .. } => "UpdateLesson",
            Mutation::DeleteLesson { .. } => "DeleteLesson",
            Mutation::ReorderLessons { .. } => "ReorderLessons",
            Mutation::AddQuiz { .. } => "AddQuiz",
            Mutation::UpdateQuiz { .. } => "UpdateQuiz",
            Mutation::DeleteQuiz { .. } => "DeleteQuiz",
            Mutation::AddQuestion { .. } => "AddQuestion",
            Mutation::UpdateQuestion { .. } => "UpdateQuestion",
            Mutation::DeleteQuestion { .. } => "DeleteQuestion",
            Mutation::AddAnswer { .. } => "AddAnswer",
            Mutation::UpdateAnswer { .. } => "UpdateAnswer",
            Mutation::DeleteAnswer { .. } => "DeleteAnswer",
        }
    }

    /// Apply mutation to the tree, returning the changes to record
    pub fn apply(&self, tree: &mut ContentTree, config: &EditorConfig) -> ApplyResult {
        match self {
            Mutation::AddModule { module } => Self::apply_add_module(tree, module, config),
            Mutation::UpdateModule { module_id, patch } => {
                Self::apply_update_module(tree, module_id, patch)
            }
            Mutation::DeleteModule { module_id } => Self::apply_delete_module(tree, module_id),
            Mutation::ReorderModules { ordered_ids } => {
                Ok(Self::apply_reorder_modules(tree, ordered_ids))
            }

            Mutation::AddLesson { module_id, lesson } => {
                Self::apply_add_lesson(tree, module_id, lesson, config)
            }
            Mutation::UpdateLesson {
                module_id,
                lesson_id,
                patch,
            } => Self::apply_update_lesson(tree, module_id, lesson_id, patch, config),
            Mutation::DeleteLesson {
                module_id,
                lesson_id,
            } => Self::apply_delete_lesson(tree, module_id, lesson_id),
            Mutation::ReorderLessons {
                module_id,
                ordered_ids,
            } => Self::apply_reorder_lessons(tree, module_id, ordered_ids),

            Mutation::AddQuiz {
                module_id,
                lesson_id,
                quiz,
            } => Self::apply_add_quiz(tree, module_id, lesson_id, quiz),
            Mutation::UpdateQuiz {
                module_id,
                lesson_id,
                patch,
            } => Self::apply_update_quiz(tree, module_id, lesson_id, patch),
            Mutation::DeleteQuiz {
                module_id,
                lesson_id,
            } => Self::apply_delete_quiz(tree, module_id, lesson_id, config),

            Mutation::AddQuestion {
                module_id,
                lesson_id,
                question,
            } => Self::apply_add_question(tree, module_id, lesson_id, question),
            Mutation::UpdateQuestion {
                module_id,
                lesson_id,
                question_id,
                patch,
            } => Self::apply_update_question(tree, module_id, lesson_id, question_id, patch),
            Mutation::DeleteQuestion {
                module_id,
                lesson_id,
                question_id,
            } => Self::apply_delete_question(tree, module_id, lesson_id, question_id),

            Mutation::AddAnswer {
                module_id,
                lesson_id,
                question_id,
                answer,
            } => Self::apply_add_answer(tree, module_id, lesson_id, question_id, answer),
            Mutation::UpdateAnswer {
                module_id,
                lesson_id,
                question_id,
                answer_id,
                patch,
            } => Self::apply_update_answer(tree, module_id, lesson_id, question_id, answer_id, patch),
            Mutation::DeleteAnswer {
                module_id,
                lesson_id,
                question_id,
                answer_id,
            } => Self::apply_delete_answer(tree, module_id, lesson_id, question_id, answer_id),
        }
    }

    // -----------------------------------------------------------------------
    // Modules
    // -----------------------------------------------------------------------

    fn apply_add_module(
        tree: &mut ContentTree,
        module: &Module,
        config: &EditorConfig,
    ) -> ApplyResult {
        FreshIds::new(tree).module(module)?;

        let mut module = module.clone();
        module.lessons = module
            .lessons
            .into_iter()
            .map(|lesson| with_quiz_initialized(lesson, config))
            .collect();
        let module_id = module.id.clone();
        tree.insert_module(module);
        let data = tree
            .module(&module_id)
            .ok_or_else(|| MutationError::ModuleNotFound(module_id.clone()))?;

        Ok(vec![Change::Addition {
            data: EntityPayload::Module(data),
            parents: ParentChain::root(),
        }])
    }

    fn apply_update_module(
        tree: &mut ContentTree,
        module_id: &EntityId,
        patch: &ModulePatch,
    ) -> ApplyResult {
        let module = tree
            .modules
            .get_mut(module_id)
            .ok_or_else(|| MutationError::ModuleNotFound(module_id.clone()))?;

        if let Some(title) = &patch.title {
            module.title = title.clone();
        }
        if let Some(order) = patch.order {
            module.order = order;
        }

        Ok(vec![Change::Edit {
            original_id: module_id.clone(),
            data: EntityPatch::Module(patch.clone()),
            parents: ParentChain::root(),
        }])
    }

    fn apply_delete_module(tree: &mut ContentTree, module_id: &EntityId) -> ApplyResult {
        if !tree.remove_module(module_id) {
            return Err(MutationError::ModuleNotFound(module_id.clone()));
        }

        Ok(vec![Change::Deletion {
            entity_type: EntityType::Module,
            original_id: module_id.clone(),
            parents: ParentChain::root(),
        }])
    }

    fn apply_reorder_modules(tree: &mut ContentTree, ordered_ids: &[EntityId]) -> Vec<Change> {
        let ranked = rank(ordered_ids, |id| tree.modules.contains_key(id));

        let dropped: Vec<EntityId> = tree
            .module_order
            .iter()
            .filter(|id| !ranked.iter().any(|(kept, _)| kept == *id))
            .cloned()
            .collect();
        for module_id in &dropped {
            tree.remove_module(module_id);
        }
        if !dropped.is_empty() {
            tracing::debug!(dropped = dropped.len(), "reorder dropped unlisted modules");
        }

        tree.module_order = ranked.iter().map(|(id, _)| id.clone()).collect();

        let mut changes = Vec::with_capacity(ranked.len());
        for (module_id, order) in ranked {
            if let Some(module) = tree.modules.get_mut(&module_id) {
                module.order = order;
            }
            changes.push(Change::Edit {
                original_id: module_id,
                data: EntityPatch::Module(ModulePatch {
                    title: None,
                    order: Some(order),
                }),
                parents: ParentChain::root(),
            });
        }
        changes
    }

    // -----------------------------------------------------------------------
    // Lessons
    // -----------------------------------------------------------------------

    fn apply_add_lesson(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson: &Lesson,
        config: &EditorConfig,
    ) -> ApplyResult {
        FreshIds::new(tree).lesson(lesson)?;
        if !tree.insert_lesson(module_id, with_quiz_initialized(lesson.clone(), config)) {
            return Err(MutationError::ModuleNotFound(module_id.clone()));
        }

        let data = tree
            .lesson(module_id, &lesson.id)
            .ok_or_else(|| lesson_not_found(module_id, &lesson.id))?;

        Ok(vec![Change::Addition {
            data: EntityPayload::Lesson(data),
            parents: ParentChain::module(module_id),
        }])
    }

    fn apply_update_lesson(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        patch: &LessonPatch,
        config: &EditorConfig,
    ) -> ApplyResult {
        let lesson = tree
            .lesson_in_mut(module_id, lesson_id)
            .ok_or_else(|| lesson_not_found(module_id, lesson_id))?;

        if let Some(title) = &patch.title {
            lesson.title = title.clone();
        }
        if let Some(lesson_type) = patch.lesson_type {
            lesson.lesson_type = Some(lesson_type);
        }
        if let Some(content) = &patch.content {
            lesson.content = content.clone();
        }
        if let Some(content_url) = &patch.content_url {
            lesson.content_url = Some(content_url.clone());
        }
        if let Some(duration) = patch.duration {
            lesson.duration = duration;
        }
        if let Some(order) = patch.order {
            lesson.order = order;
        }
        if let Some(is_preview) = patch.is_preview {
            lesson.is_preview = is_preview;
        }

        let title = lesson.title.clone();
        if patch.lesson_type == Some(LessonType::Quiz) && !tree.quizzes.contains_key(lesson_id) {
            tracing::debug!(lesson = %lesson_id, "initializing empty quiz");
            tree.set_quiz(lesson_id, Quiz::empty(title, config.default_passing_score));
        }

        Ok(vec![Change::Edit {
            original_id: lesson_id.clone(),
            data: EntityPatch::Lesson(patch.clone()),
            parents: ParentChain::module(module_id),
        }])
    }

    fn apply_delete_lesson(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
    ) -> ApplyResult {
        if tree.lesson_in(module_id, lesson_id).is_none() {
            return Err(lesson_not_found(module_id, lesson_id));
        }
        tree.remove_lesson(lesson_id);

        Ok(vec![Change::Deletion {
            entity_type: EntityType::Lesson,
            original_id: lesson_id.clone(),
            parents: ParentChain::module(module_id),
        }])
    }

    fn apply_reorder_lessons(
        tree: &mut ContentTree,
        module_id: &EntityId,
        ordered_ids: &[EntityId],
    ) -> ApplyResult {
        let current = tree
            .modules
            .get(module_id)
            .map(|module| module.lessons.clone())
            .ok_or_else(|| MutationError::ModuleNotFound(module_id.clone()))?;

        let ranked = rank(ordered_ids, |id| current.contains(id));

        let mut dropped = 0;
        for lesson_id in &current {
            if !ranked.iter().any(|(kept, _)| kept == lesson_id) {
                tree.remove_lesson(lesson_id);
                dropped += 1;
            }
        }
        if dropped > 0 {
            tracing::debug!(module = %module_id, dropped, "reorder dropped unlisted lessons");
        }

        if let Some(module) = tree.modules.get_mut(module_id) {
            module.lessons = ranked.iter().map(|(id, _)| id.clone()).collect();
        }

        let mut changes = Vec::with_capacity(ranked.len());
        for (lesson_id, order) in ranked {
            if let Some(lesson) = tree.lessons.get_mut(&lesson_id) {
                lesson.order = order;
            }
            changes.push(Change::Edit {
                original_id: lesson_id,
                data: EntityPatch::Lesson(LessonPatch {
                    order: Some(order),
                    ..Default::default()
                }),
                parents: ParentChain::module(module_id),
            });
        }
        Ok(changes)
    }

    // -----------------------------------------------------------------------
    // Quiz
    // -----------------------------------------------------------------------

    fn apply_add_quiz(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        quiz: &Quiz,
    ) -> ApplyResult {
        if tree.lesson_in(module_id, lesson_id).is_none() {
            return Err(lesson_not_found(module_id, lesson_id));
        }
        // Ids owned by the quiz being replaced may be reused
        FreshIds::new(tree)
            .reusing(tree.quiz_descendants(lesson_id))
            .quiz(quiz)?;

        tree.set_quiz(lesson_id, quiz.clone());
        let data = tree
            .quiz_view(lesson_id)
            .ok_or_else(|| MutationError::QuizNotFound(lesson_id.clone()))?;

        Ok(vec![Change::Addition {
            data: EntityPayload::Quiz(data),
            parents: ParentChain::lesson(module_id, lesson_id),
        }])
    }

    fn apply_update_quiz(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        patch: &QuizPatch,
    ) -> ApplyResult {
        if tree.lesson_in(module_id, lesson_id).is_none() {
            return Err(lesson_not_found(module_id, lesson_id));
        }
        let quiz = tree
            .quizzes
            .get_mut(lesson_id)
            .ok_or_else(|| MutationError::QuizNotFound(lesson_id.clone()))?;

        if let Some(title) = &patch.title {
            quiz.title = title.clone();
        }
        if let Some(passing_score) = patch.passing_score {
            quiz.passing_score = passing_score;
        }

        Ok(vec![Change::Edit {
            original_id: lesson_id.clone(),
            data: EntityPatch::Quiz(patch.clone()),
            parents: ParentChain::lesson(module_id, lesson_id),
        }])
    }

    fn apply_delete_quiz(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        config: &EditorConfig,
    ) -> ApplyResult {
        if tree.lesson_in(module_id, lesson_id).is_none() {
            return Err(lesson_not_found(module_id, lesson_id));
        }
        if !tree.remove_quiz(lesson_id) {
            return Err(MutationError::QuizNotFound(lesson_id.clone()));
        }

        // A quiz-kind lesson must never be left without a quiz
        let fallback = match config.kind_after_quiz_delete {
            LessonType::Quiz => LessonType::Markdown,
            kind => kind,
        };
        if let Some(lesson) = tree.lesson_in_mut(module_id, lesson_id) {
            lesson.lesson_type = Some(fallback);
        }

        Ok(vec![Change::Deletion {
            entity_type: EntityType::Quiz,
            original_id: lesson_id.clone(),
            parents: ParentChain::lesson(module_id, lesson_id),
        }])
    }

    // -----------------------------------------------------------------------
    // Questions
    // -----------------------------------------------------------------------

    fn apply_add_question(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question: &Question,
    ) -> ApplyResult {
        if tree.lesson_in(module_id, lesson_id).is_none() {
            return Err(lesson_not_found(module_id, lesson_id));
        }
        FreshIds::new(tree).question(question)?;
        if !tree.insert_question(lesson_id, question.clone()) {
            return Err(MutationError::QuizNotFound(lesson_id.clone()));
        }
        tree.recompute_total_marks(lesson_id);

        let data = tree
            .question_view(&question.id)
            .ok_or_else(|| question_not_found(lesson_id, &question.id))?;

        Ok(vec![Change::Addition {
            data: EntityPayload::Question(data),
            parents: ParentChain::lesson(module_id, lesson_id),
        }])
    }

    fn apply_update_question(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
        patch: &QuestionPatch,
    ) -> ApplyResult {
        if tree.question_in(module_id, lesson_id, question_id).is_none() {
            return Err(question_not_found(lesson_id, question_id));
        }
        let question = tree
            .questions
            .get_mut(question_id)
            .ok_or_else(|| question_not_found(lesson_id, question_id))?;

        if let Some(text) = &patch.question_text {
            question.question_text = text.clone();
        }
        if let Some(question_type) = patch.question_type {
            question.question_type = question_type;
        }
        if let Some(marks) = patch.marks {
            question.marks = marks;
            tree.recompute_total_marks(lesson_id);
        }

        Ok(vec![Change::Edit {
            original_id: question_id.clone(),
            data: EntityPatch::Question(patch.clone()),
            parents: ParentChain::lesson(module_id, lesson_id),
        }])
    }

    fn apply_delete_question(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
    ) -> ApplyResult {
        if tree.question_in(module_id, lesson_id, question_id).is_none() {
            return Err(question_not_found(lesson_id, question_id));
        }
        tree.remove_question(question_id);

        Ok(vec![Change::Deletion {
            entity_type: EntityType::Question,
            original_id: question_id.clone(),
            parents: ParentChain::lesson(module_id, lesson_id),
        }])
    }

    // -----------------------------------------------------------------------
    // Answers
    // -----------------------------------------------------------------------

    fn apply_add_answer(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
        answer: &Answer,
    ) -> ApplyResult {
        if tree.question_in(module_id, lesson_id, question_id).is_none() {
            return Err(question_not_found(lesson_id, question_id));
        }
        FreshIds::new(tree).answer(answer)?;
        tree.insert_answer(question_id, answer.clone());

        Ok(vec![Change::Addition {
            data: EntityPayload::Answer(answer.clone()),
            parents: ParentChain::question(module_id, lesson_id, question_id),
        }])
    }

    fn apply_update_answer(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
        answer_id: &EntityId,
        patch: &AnswerPatch,
    ) -> ApplyResult {
        if tree.answer_in(module_id, lesson_id, question_id, answer_id).is_none() {
            return Err(answer_not_found(question_id, answer_id));
        }
        let answer = tree
            .answers
            .get_mut(answer_id)
            .ok_or_else(|| answer_not_found(question_id, answer_id))?;

        if let Some(text) = &patch.answer_text {
            answer.answer_text = text.clone();
        }
        if let Some(is_correct) = patch.is_correct {
            answer.is_correct = is_correct;
        }

        Ok(vec![Change::Edit {
            original_id: answer_id.clone(),
            data: EntityPatch::Answer(patch.clone()),
            parents: ParentChain::question(module_id, lesson_id, question_id),
        }])
    }

    fn apply_delete_answer(
        tree: &mut ContentTree,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
        answer_id: &EntityId,
    ) -> ApplyResult {
        if tree.answer_in(module_id, lesson_id, question_id, answer_id).is_none() {
            return Err(answer_not_found(question_id, answer_id));
        }
        tree.remove_answer(answer_id);

        Ok(vec![Change::Deletion {
            entity_type: EntityType::Answer,
            original_id: answer_id.clone(),
            parents: ParentChain::question(module_id, lesson_id, question_id),
        }])
    }
}

/// Fill in the empty quiz a quiz-kind lesson must always carry
fn with_quiz_initialized(mut lesson: Lesson, config: &EditorConfig) -> Lesson {
    if lesson.lesson_type == Some(LessonType::Quiz) && lesson.quiz.is_none() {
        tracing::debug!(lesson = %lesson.id, "initializing empty quiz");
        lesson.quiz = Some(Quiz::empty(lesson.title.clone(), config.default_passing_score));
    }
    lesson
}

/// Walks an addition payload and claims every id in it, so nothing is
/// inserted when one collides with the tree or with a sibling in the payload
struct FreshIds<'a> {
    tree: &'a ContentTree,
    reusable: HashSet<EntityId>,
    claimed: HashSet<EntityId>,
}

impl<'a> FreshIds<'a> {
    fn new(tree: &'a ContentTree) -> Self {
        Self {
            tree,
            reusable: HashSet::new(),
            claimed: HashSet::new(),
        }
    }

    fn reusing(mut self, ids: HashSet<EntityId>) -> Self {
        self.reusable = ids;
        self
    }

    fn claim(&mut self, id: &EntityId) -> Result<(), MutationError> {
        let taken = self.tree.is_known(id) && !self.reusable.contains(id);
        if taken || !self.claimed.insert(id.clone()) {
            return Err(MutationError::DuplicateId(id.clone()));
        }
        Ok(())
    }

    fn module(&mut self, module: &Module) -> Result<(), MutationError> {
        self.claim(&module.id)?;
        module.lessons.iter().try_for_each(|lesson| self.lesson(lesson))
    }

    fn lesson(&mut self, lesson: &Lesson) -> Result<(), MutationError> {
        self.claim(&lesson.id)?;
        match &lesson.quiz {
            Some(quiz) => self.quiz(quiz),
            None => Ok(()),
        }
    }

    fn quiz(&mut self, quiz: &Quiz) -> Result<(), MutationError> {
        quiz.quiz_questions
            .iter()
            .try_for_each(|question| self.question(question))
    }

    fn question(&mut self, question: &Question) -> Result<(), MutationError> {
        self.claim(&question.id)?;
        question.answers.iter().try_for_each(|answer| self.answer(answer))
    }

    fn answer(&mut self, answer: &Answer) -> Result<(), MutationError> {
        self.claim(&answer.id)
    }
}

/// Pair each known id with its 1-based position in `ordered_ids`.
/// Unknown ids and repeats are skipped; positions are not compacted.
fn rank(ordered_ids: &[EntityId], known: impl Fn(&EntityId) -> bool) -> Vec<(EntityId, u32)> {
    let mut seen = HashSet::new();
    ordered_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| known(id) && seen.insert((*id).clone()))
        .map(|(index, id)| (id.clone(), index as u32 + 1))
        .collect()
}

fn lesson_not_found(module_id: &EntityId, lesson_id: &EntityId) -> MutationError {
    MutationError::LessonNotFound {
        module_id: module_id.clone(),
        lesson_id: lesson_id.clone(),
    }
}

fn question_not_found(lesson_id: &EntityId, question_id: &EntityId) -> MutationError {
    MutationError::QuestionNotFound {
        lesson_id: lesson_id.clone(),
        question_id: question_id.clone(),
    }
}

fn answer_not_found(question_id: &EntityId, answer_id: &EntityId) -> MutationError {
    MutationError::AnswerNotFound {
        question_id: question_id.clone(),
        answer_id: answer_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{CourseContent, QuestionType};

    fn tree() -> ContentTree {
        let content: CourseContent = serde_json::from_str(
            r#"{
                "modules": [
                    { "id": "m1", "title": "One", "order": 1, "lessons": [
                        { "id": "l1", "title": "Read", "lessonType": "markdown", "order": 1 },
                        { "id": "l2", "title": "Watch", "lessonType": "video", "order": 2 }
                    ]},
                    { "id": "m2", "title": "Two", "order": 2 },
                    { "id": "m3", "title": "Three", "order": 3 }
                ]
            }"#,
        )
        .unwrap();
        ContentTree::from_content(content)
    }

    fn ids(raw: &[&str]) -> Vec<EntityId> {
        raw.iter().map(|id| EntityId::from(*id)).collect()
    }

    #[test]
    fn test_mutation_serialization() {
        let mutation = Mutation::UpdateModule {
            module_id: "m1".into(),
            patch: ModulePatch {
                title: Some("Renamed".to_string()),
                order: None,
            },
        };

        let json = serde_json::to_string(&mutation).unwrap();
        let deserialized: Mutation = serde_json::from_str(&json).unwrap();

        assert_eq!(mutation, deserialized);
    }

    #[test]
    fn test_update_module_merges_patch() {
        let mut tree = tree();
        let mutation = Mutation::UpdateModule {
            module_id: "m1".into(),
            patch: ModulePatch {
                title: Some("Renamed".to_string()),
                order: None,
            },
        };

        let changes = mutation.apply(&mut tree, &EditorConfig::default()).unwrap();

        let module = tree.module(&"m1".into()).unwrap();
        assert_eq!(module.title, "Renamed");
        assert_eq!(module.order, 1);
        assert_eq!(module.lessons.len(), 2);
        assert_eq!(changes.len(), 1);
    }

    #[test]
    fn test_update_missing_module_is_not_found() {
        let mut tree = tree();
        let before = tree.tree();

        let result = Mutation::UpdateModule {
            module_id: "nope".into(),
            patch: ModulePatch::default(),
        }
        .apply(&mut tree, &EditorConfig::default());

        assert_eq!(result, Err(MutationError::ModuleNotFound("nope".into())));
        assert_eq!(tree.tree(), before);
    }

    #[test]
    fn test_reorder_modules_ranks_and_drops() {
        let mut tree = tree();

        let changes = Mutation::ReorderModules {
            ordered_ids: ids(&["m3", "m1"]),
        }
        .apply(&mut tree, &EditorConfig::default())
        .unwrap();

        let content = tree.tree();
        let order: Vec<(&str, u32)> = content
            .modules
            .iter()
            .map(|m| (m.id.as_str(), m.order))
            .collect();

        assert_eq!(order, vec![("m3", 1), ("m1", 2)]);
        assert!(!tree.contains_module(&"m2".into()));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_reorder_ignores_unknown_and_repeated_ids() {
        let mut tree = tree();

        Mutation::ReorderModules {
            ordered_ids: ids(&["m2", "ghost", "m2", "m1", "m3"]),
        }
        .apply(&mut tree, &EditorConfig::default())
        .unwrap();

        let orders: Vec<u32> = tree.tree().modules.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![1, 4, 5]);
    }

    #[test]
    fn test_reorder_lessons_drops_unlisted() {
        let mut tree = tree();

        Mutation::ReorderLessons {
            module_id: "m1".into(),
            ordered_ids: ids(&["l2"]),
        }
        .apply(&mut tree, &EditorConfig::default())
        .unwrap();

        let module = tree.module(&"m1".into()).unwrap();
        assert_eq!(module.lessons.len(), 1);
        assert_eq!(module.lessons[0].id, EntityId::from("l2"));
        assert_eq!(module.lessons[0].order, 1);
        assert!(!tree.lessons.contains_key(&EntityId::from("l1")));
    }

    #[test]
    fn test_lesson_switch_to_quiz_initializes_quiz() {
        let mut tree = tree();

        Mutation::UpdateLesson {
            module_id: "m1".into(),
            lesson_id: "l1".into(),
            patch: LessonPatch {
                lesson_type: Some(LessonType::Quiz),
                ..Default::default()
            },
        }
        .apply(&mut tree, &EditorConfig::default())
        .unwrap();

        let lesson = tree.lesson(&"m1".into(), &"l1".into()).unwrap();
        let quiz = lesson.quiz.unwrap();
        assert_eq!(lesson.lesson_type, Some(LessonType::Quiz));
        assert_eq!(quiz.title, "Read");
        assert_eq!(quiz.passing_score, 70);
        assert_eq!(quiz.total_marks, 0);
        assert!(quiz.quiz_questions.is_empty());
    }

    #[test]
    fn test_lesson_scoped_to_module() {
        let mut tree = tree();

        let result = Mutation::DeleteLesson {
            module_id: "m2".into(),
            lesson_id: "l1".into(),
        }
        .apply(&mut tree, &EditorConfig::default());

        assert!(matches!(result, Err(MutationError::LessonNotFound { .. })));
        assert!(tree.lesson(&"m1".into(), &"l1".into()).is_some());
    }

    #[test]
    fn test_delete_quiz_resets_kind() {
        let mut tree = tree();
        let config = EditorConfig::default();

        Mutation::AddQuiz {
            module_id: "m1".into(),
            lesson_id: "l2".into(),
            quiz: Quiz::empty("Check", 50),
        }
        .apply(&mut tree, &config)
        .unwrap();

        Mutation::DeleteQuiz {
            module_id: "m1".into(),
            lesson_id: "l2".into(),
        }
        .apply(&mut tree, &config)
        .unwrap();

        let lesson = tree.lesson(&"m1".into(), &"l2".into()).unwrap();
        assert!(lesson.quiz.is_none());
        assert_eq!(lesson.lesson_type, Some(LessonType::Markdown));
    }

    #[test]
    fn test_question_marks_drive_total() {
        let mut tree = tree();
        let config = EditorConfig::default();
        let (m, l) = (EntityId::from("m1"), EntityId::from("l1"));

        Mutation::AddQuiz {
            module_id: m.clone(),
            lesson_id: l.clone(),
            quiz: Quiz::empty("Check", 50),
        }
        .apply(&mut tree, &config)
        .unwrap();

        Mutation::AddQuestion {
            module_id: m.clone(),
            lesson_id: l.clone(),
            question: Question {
                id: "q1".into(),
                question_text: "Why?".to_string(),
                question_type: QuestionType::ShortAnswer,
                marks: 2,
                answers: vec![],
            },
        }
        .apply(&mut tree, &config)
        .unwrap();

        Mutation::UpdateQuestion {
            module_id: m.clone(),
            lesson_id: l.clone(),
            question_id: "q1".into(),
            patch: QuestionPatch {
                marks: Some(5),
                ..Default::default()
            },
        }
        .apply(&mut tree, &config)
        .unwrap();

        let quiz = tree.lesson(&m, &l).unwrap().quiz.unwrap();
        assert_eq!(quiz.total_marks, 5);
    }

    #[test]
    fn test_add_question_without_quiz() {
        let mut tree = tree();

        let result = Mutation::AddQuestion {
            module_id: "m1".into(),
            lesson_id: "l1".into(),
            question: Question {
                id: "q1".into(),
                question_text: "?".to_string(),
                question_type: QuestionType::TrueFalse,
                marks: 1,
                answers: vec![],
            },
        }
        .apply(&mut tree, &EditorConfig::default());

        assert_eq!(result, Err(MutationError::QuizNotFound("l1".into())));
    }

    #[test]
    fn test_duplicate_module_id_rejected() {
        let mut tree = tree();
        let module = tree.module(&"m2".into()).unwrap();

        let result = Mutation::AddModule { module }.apply(&mut tree, &EditorConfig::default());
        assert_eq!(result, Err(MutationError::DuplicateId("m2".into())));
        assert_eq!(tree.module_count(), 3);
    }

    fn lesson(id: &str, lesson_type: LessonType) -> Lesson {
        Lesson {
            id: id.into(),
            title: format!("Lesson {}", id),
            lesson_type: Some(lesson_type),
            content: String::new(),
            content_url: None,
            duration: 0,
            order: 1,
            is_preview: false,
            quiz: None,
        }
    }

    fn question(id: &str, answer_ids: &[&str]) -> Question {
        Question {
            id: id.into(),
            question_text: "?".to_string(),
            question_type: QuestionType::SingleChoice,
            marks: 1,
            answers: answer_ids
                .iter()
                .map(|answer_id| Answer {
                    id: (*answer_id).into(),
                    answer_text: answer_id.to_string(),
                    is_correct: false,
                })
                .collect(),
        }
    }

    #[test]
    fn test_add_quiz_lesson_initializes_quiz() {
        let mut tree = tree();

        let changes = Mutation::AddLesson {
            module_id: "m2".into(),
            lesson: lesson("l9", LessonType::Quiz),
        }
        .apply(&mut tree, &EditorConfig::default())
        .unwrap();

        let stored = tree.lesson(&"m2".into(), &"l9".into()).unwrap();
        let quiz = stored.quiz.expect("quiz-kind lesson must carry a quiz");
        assert_eq!(quiz.title, "Lesson l9");
        assert_eq!(quiz.passing_score, 70);

        match &changes[0] {
            Change::Addition {
                data: EntityPayload::Lesson(recorded),
                ..
            } => assert!(recorded.quiz.is_some()),
            other => panic!("Expected lesson addition, got {:?}", other),
        }
    }

    #[test]
    fn test_add_module_initializes_nested_quiz_lessons() {
        let mut tree = tree();
        let module = Module {
            id: "m4".into(),
            title: "Four".to_string(),
            order: 4,
            lessons: vec![lesson("l7", LessonType::Video), lesson("l8", LessonType::Quiz)],
        };

        Mutation::AddModule { module }
            .apply(&mut tree, &EditorConfig::default())
            .unwrap();

        assert!(tree.lesson(&"m4".into(), &"l7".into()).unwrap().quiz.is_none());
        assert!(tree.lesson(&"m4".into(), &"l8".into()).unwrap().quiz.is_some());
    }

    #[test]
    fn test_nested_lesson_id_collision_rejected() {
        let mut tree = tree();
        let before = tree.tree();
        let module = Module {
            id: "m4".into(),
            title: "Four".to_string(),
            order: 4,
            lessons: vec![lesson("l1", LessonType::Markdown)],
        };

        let result = Mutation::AddModule { module }.apply(&mut tree, &EditorConfig::default());

        assert_eq!(result, Err(MutationError::DuplicateId("l1".into())));
        assert_eq!(tree.tree(), before);

        Mutation::DeleteLesson {
            module_id: "m1".into(),
            lesson_id: "l1".into(),
        }
        .apply(&mut tree, &EditorConfig::default())
        .unwrap();
    }

    #[test]
    fn test_repeated_id_within_payload_rejected() {
        let mut tree = tree();
        let before = tree.tree();
        let mut quiz_lesson = lesson("l9", LessonType::Quiz);
        let mut quiz = Quiz::empty("Check", 50);
        quiz.quiz_questions = vec![question("q1", &["a1"]), question("q2", &["a1"])];
        quiz_lesson.quiz = Some(quiz);

        let result = Mutation::AddLesson {
            module_id: "m2".into(),
            lesson: quiz_lesson,
        }
        .apply(&mut tree, &EditorConfig::default());

        assert_eq!(result, Err(MutationError::DuplicateId("a1".into())));
        assert_eq!(tree.tree(), before);
    }

    #[test]
    fn test_nested_answer_collision_rejected() {
        let mut tree = tree();
        let config = EditorConfig::default();
        let (m, l) = (EntityId::from("m1"), EntityId::from("l1"));

        let mut quiz = Quiz::empty("Check", 50);
        quiz.quiz_questions = vec![question("q1", &["a1"])];
        Mutation::AddQuiz {
            module_id: m.clone(),
            lesson_id: l.clone(),
            quiz,
        }
        .apply(&mut tree, &config)
        .unwrap();
        let before = tree.tree();

        let result = Mutation::AddQuestion {
            module_id: m.clone(),
            lesson_id: l.clone(),
            question: question("q2", &["a1"]),
        }
        .apply(&mut tree, &config);

        assert_eq!(result, Err(MutationError::DuplicateId("a1".into())));
        assert_eq!(tree.tree(), before);
    }

    #[test]
    fn test_replacing_quiz_may_reuse_its_ids() {
        let mut tree = tree();
        let config = EditorConfig::default();
        let (m, l) = (EntityId::from("m1"), EntityId::from("l1"));

        for title in ["First", "Second"] {
            let mut quiz = Quiz::empty(title, 50);
            quiz.quiz_questions = vec![question("q1", &["a1", "a2"])];
            Mutation::AddQuiz {
                module_id: m.clone(),
                lesson_id: l.clone(),
                quiz,
            }
            .apply(&mut tree, &config)
            .unwrap();
        }

        let quiz = tree.lesson(&m, &l).unwrap().quiz.unwrap();
        assert_eq!(quiz.title, "Second");
        assert_eq!(quiz.quiz_questions[0].answers.len(), 2);
    }
}
