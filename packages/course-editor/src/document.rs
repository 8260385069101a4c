//! # Content Tree Store
//!
//! Arena-backed storage for one course's content.
//!
//! Entities live in flat maps keyed by [`EntityId`]. Every child carries a
//! pointer to its parent and every parent keeps the ordered list of its
//! children's ids, so a mutation touches one map entry instead of rebuilding
//! the nested structure. The nested [`CourseContent`] is a computed view.
//!
//! ## Layout
//!
//! ```text
//! module_order: [m1, m2]
//! modules:   m1 → { lessons: [l1, l2] }
//! lessons:   l1 → { module_id: m1 }
//! quizzes:   l1 → { questions: [q1] }      (keyed by owning lesson)
//! questions: q1 → { lesson_id: l1, answers: [a1] }
//! answers:   a1 → { question_id: q1 }
//! ```

use crate::content::{
    Answer, CourseContent, Lesson, LessonType, Module, Question, QuestionType, Quiz,
};
use crate::config::EditorConfig;
use crate::ids::EntityId;
use crate::ledger::Change;
use crate::mutations::{Mutation, MutationError};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ModuleNode {
    pub title: String,
    pub order: u32,
    pub lessons: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LessonNode {
    pub module_id: EntityId,
    pub title: String,
    pub lesson_type: Option<LessonType>,
    pub content: String,
    pub content_url: Option<String>,
    pub duration: u32,
    pub order: u32,
    pub is_preview: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuizNode {
    pub title: String,
    pub passing_score: u32,
    pub total_marks: u32,
    pub questions: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuestionNode {
    pub lesson_id: EntityId,
    pub question_text: String,
    pub question_type: QuestionType,
    pub marks: u32,
    pub answers: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnswerNode {
    pub question_id: EntityId,
    pub answer_text: String,
    pub is_correct: bool,
}

/// In-memory content tree of the course being edited
#[derive(Debug, Clone, Default)]
pub struct ContentTree {
    /// Current version number (increments on each applied mutation)
    version: u64,

    pub(crate) module_order: Vec<EntityId>,
    pub(crate) modules: HashMap<EntityId, ModuleNode>,
    pub(crate) lessons: HashMap<EntityId, LessonNode>,
    pub(crate) quizzes: HashMap<EntityId, QuizNode>,
    pub(crate) questions: HashMap<EntityId, QuestionNode>,
    pub(crate) answers: HashMap<EntityId, AnswerNode>,
}

impl ContentTree {
    /// Empty skeleton course
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a nested content tree
    pub fn from_content(content: CourseContent) -> Self {
        let mut tree = Self::new();
        for module in content.modules {
            tree.insert_module(module);
        }
        tree
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply a mutation; the version only moves when it succeeds
    pub fn apply(
        &mut self,
        mutation: &Mutation,
        config: &EditorConfig,
    ) -> Result<Vec<Change>, MutationError> {
        let changes = mutation.apply(self, config)?;
        self.version += 1;
        Ok(changes)
    }

    pub fn module_count(&self) -> usize {
        self.module_order.len()
    }

    pub fn contains_module(&self, module_id: &EntityId) -> bool {
        self.modules.contains_key(module_id)
    }

    // -----------------------------------------------------------------------
    // Computed views
    // -----------------------------------------------------------------------

    /// Build the nested view of the whole course
    pub fn tree(&self) -> CourseContent {
        CourseContent {
            modules: self
                .module_order
                .iter()
                .filter_map(|id| self.module(id))
                .collect(),
        }
    }

    pub fn module(&self, module_id: &EntityId) -> Option<Module> {
        let node = self.modules.get(module_id)?;
        Some(Module {
            id: module_id.clone(),
            title: node.title.clone(),
            order: node.order,
            lessons: node
                .lessons
                .iter()
                .filter_map(|id| self.lesson_view(id))
                .collect(),
        })
    }

    /// Look up a lesson scoped to its owning module
    pub fn lesson(&self, module_id: &EntityId, lesson_id: &EntityId) -> Option<Lesson> {
        self.lesson_in(module_id, lesson_id)?;
        self.lesson_view(lesson_id)
    }

    fn lesson_view(&self, lesson_id: &EntityId) -> Option<Lesson> {
        let node = self.lessons.get(lesson_id)?;
        Some(Lesson {
            id: lesson_id.clone(),
            title: node.title.clone(),
            lesson_type: node.lesson_type,
            content: node.content.clone(),
            content_url: node.content_url.clone(),
            duration: node.duration,
            order: node.order,
            is_preview: node.is_preview,
            quiz: self.quiz_view(lesson_id),
        })
    }

    pub(crate) fn quiz_view(&self, lesson_id: &EntityId) -> Option<Quiz> {
        let node = self.quizzes.get(lesson_id)?;
        Some(Quiz {
            title: node.title.clone(),
            passing_score: node.passing_score,
            total_marks: node.total_marks,
            quiz_questions: node
                .questions
                .iter()
                .filter_map(|id| self.question_view(id))
                .collect(),
        })
    }

    pub(crate) fn question_view(&self, question_id: &EntityId) -> Option<Question> {
        let node = self.questions.get(question_id)?;
        Some(Question {
            id: question_id.clone(),
            question_text: node.question_text.clone(),
            question_type: node.question_type,
            marks: node.marks,
            answers: node
                .answers
                .iter()
                .filter_map(|id| self.answer_view(id))
                .collect(),
        })
    }

    fn answer_view(&self, answer_id: &EntityId) -> Option<Answer> {
        let node = self.answers.get(answer_id)?;
        Some(Answer {
            id: answer_id.clone(),
            answer_text: node.answer_text.clone(),
            is_correct: node.is_correct,
        })
    }

    // -----------------------------------------------------------------------
    // Scoped lookups (parent chain must match)
    // -----------------------------------------------------------------------

    pub(crate) fn lesson_in(&self, module_id: &EntityId, lesson_id: &EntityId) -> Option<&LessonNode> {
        self.lessons
            .get(lesson_id)
            .filter(|lesson| &lesson.module_id == module_id)
    }

    pub(crate) fn lesson_in_mut(
        &mut self,
        module_id: &EntityId,
        lesson_id: &EntityId,
    ) -> Option<&mut LessonNode> {
        self.lessons
            .get_mut(lesson_id)
            .filter(|lesson| &lesson.module_id == module_id)
    }

    pub(crate) fn question_in(
        &self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
    ) -> Option<&QuestionNode> {
        self.lesson_in(module_id, lesson_id)?;
        self.questions
            .get(question_id)
            .filter(|question| &question.lesson_id == lesson_id)
    }

    pub(crate) fn answer_in(
        &self,
        module_id: &EntityId,
        lesson_id: &EntityId,
        question_id: &EntityId,
        answer_id: &EntityId,
    ) -> Option<&AnswerNode> {
        self.question_in(module_id, lesson_id, question_id)?;
        self.answers
            .get(answer_id)
            .filter(|answer| &answer.question_id == question_id)
    }

    /// Ids of the questions and answers owned by a lesson's quiz
    pub(crate) fn quiz_descendants(&self, lesson_id: &EntityId) -> HashSet<EntityId> {
        let Some(quiz) = self.quizzes.get(lesson_id) else {
            return HashSet::new();
        };

        let mut ids = HashSet::new();
        for question_id in &quiz.questions {
            ids.insert(question_id.clone());
            if let Some(question) = self.questions.get(question_id) {
                ids.extend(question.answers.iter().cloned());
            }
        }
        ids
    }

    // -----------------------------------------------------------------------
    // Arena primitives
    // -----------------------------------------------------------------------

    /// Append a module (and everything nested in it) to the end of the course
    pub(crate) fn insert_module(&mut self, module: Module) {
        let module_id = module.id;
        self.module_order.push(module_id.clone());
        self.modules.insert(
            module_id.clone(),
            ModuleNode {
                title: module.title,
                order: module.order,
                lessons: Vec::new(),
            },
        );

        for lesson in module.lessons {
            self.insert_lesson(&module_id, lesson);
        }
    }

    /// Append a lesson to a module. Returns false if the module is missing.
    pub(crate) fn insert_lesson(&mut self, module_id: &EntityId, lesson: Lesson) -> bool {
        let Some(module) = self.modules.get_mut(module_id) else {
            return false;
        };

        let lesson_id = lesson.id;
        module.lessons.push(lesson_id.clone());
        self.lessons.insert(
            lesson_id.clone(),
            LessonNode {
                module_id: module_id.clone(),
                title: lesson.title,
                lesson_type: lesson.lesson_type,
                content: lesson.content,
                content_url: lesson.content_url,
                duration: lesson.duration,
                order: lesson.order,
                is_preview: lesson.is_preview,
            },
        );

        if let Some(quiz) = lesson.quiz {
            self.set_quiz(&lesson_id, quiz);
        }
        true
    }

    /// Attach a quiz to a lesson, replacing any existing one
    pub(crate) fn set_quiz(&mut self, lesson_id: &EntityId, quiz: Quiz) {
        self.remove_quiz(lesson_id);
        self.quizzes.insert(
            lesson_id.clone(),
            QuizNode {
                title: quiz.title,
                passing_score: quiz.passing_score,
                total_marks: 0,
                questions: Vec::new(),
            },
        );

        for question in quiz.quiz_questions {
            self.insert_question(lesson_id, question);
        }
        self.recompute_total_marks(lesson_id);
    }

    /// Append a question to a lesson's quiz. Returns false if there is no quiz.
    pub(crate) fn insert_question(&mut self, lesson_id: &EntityId, question: Question) -> bool {
        let Some(quiz) = self.quizzes.get_mut(lesson_id) else {
            return false;
        };

        let question_id = question.id;
        quiz.questions.push(question_id.clone());
        self.questions.insert(
            question_id.clone(),
            QuestionNode {
                lesson_id: lesson_id.clone(),
                question_text: question.question_text,
                question_type: question.question_type,
                marks: question.marks,
                answers: Vec::new(),
            },
        );

        for answer in question.answers {
            self.insert_answer(&question_id, answer);
        }
        true
    }

    pub(crate) fn insert_answer(&mut self, question_id: &EntityId, answer: Answer) -> bool {
        let Some(question) = self.questions.get_mut(question_id) else {
            return false;
        };

        question.answers.push(answer.id.clone());
        self.answers.insert(
            answer.id,
            AnswerNode {
                question_id: question_id.clone(),
                answer_text: answer.answer_text,
                is_correct: answer.is_correct,
            },
        );
        true
    }

    /// Remove a module and all its descendants
    pub(crate) fn remove_module(&mut self, module_id: &EntityId) -> bool {
        let Some(module) = self.modules.remove(module_id) else {
            return false;
        };

        self.module_order.retain(|id| id != module_id);
        for lesson_id in &module.lessons {
            self.drop_lesson_subtree(lesson_id);
        }
        true
    }

    pub(crate) fn remove_lesson(&mut self, lesson_id: &EntityId) -> bool {
        let Some(lesson) = self.lessons.get(lesson_id) else {
            return false;
        };

        if let Some(module) = self.modules.get_mut(&lesson.module_id) {
            module.lessons.retain(|id| id != lesson_id);
        }
        self.drop_lesson_subtree(lesson_id);
        true
    }

    fn drop_lesson_subtree(&mut self, lesson_id: &EntityId) {
        self.remove_quiz(lesson_id);
        self.lessons.remove(lesson_id);
    }

    pub(crate) fn remove_quiz(&mut self, lesson_id: &EntityId) -> bool {
        let Some(quiz) = self.quizzes.remove(lesson_id) else {
            return false;
        };

        for question_id in &quiz.questions {
            self.drop_question_subtree(question_id);
        }
        true
    }

    pub(crate) fn remove_question(&mut self, question_id: &EntityId) -> bool {
        let Some(question) = self.questions.get(question_id) else {
            return false;
        };

        let lesson_id = question.lesson_id.clone();
        if let Some(quiz) = self.quizzes.get_mut(&lesson_id) {
            quiz.questions.retain(|id| id != question_id);
        }
        self.drop_question_subtree(question_id);
        self.recompute_total_marks(&lesson_id);
        true
    }

    fn drop_question_subtree(&mut self, question_id: &EntityId) {
        if let Some(question) = self.questions.remove(question_id) {
            for answer_id in &question.answers {
                self.answers.remove(answer_id);
            }
        }
    }

    pub(crate) fn remove_answer(&mut self, answer_id: &EntityId) -> bool {
        let Some(answer) = self.answers.remove(answer_id) else {
            return false;
        };

        if let Some(question) = self.questions.get_mut(&answer.question_id) {
            question.answers.retain(|id| id != answer_id);
        }
        true
    }

    /// Total marks is derived: the sum of the quiz's question marks
    pub(crate) fn recompute_total_marks(&mut self, lesson_id: &EntityId) {
        let Some(quiz) = self.quizzes.get(lesson_id) else {
            return;
        };

        let total = quiz
            .questions
            .iter()
            .filter_map(|id| self.questions.get(id))
            .map(|question| question.marks)
            .sum();

        if let Some(quiz) = self.quizzes.get_mut(lesson_id) {
            quiz.total_marks = total;
        }
    }

    /// Rewrite an entity id everywhere it is referenced.
    ///
    /// Used after submission to swap local ids for the ids the backend issued.
    /// Returns false if `from` is not a known entity or `to` is already taken.
    pub fn rename_id(&mut self, from: &EntityId, to: &EntityId) -> bool {
        if from == to || self.is_known(to) {
            return false;
        }

        if let Some(module) = self.modules.remove(from) {
            replace_id(&mut self.module_order, from, to);
            for lesson_id in &module.lessons {
                if let Some(lesson) = self.lessons.get_mut(lesson_id) {
                    lesson.module_id = to.clone();
                }
            }
            self.modules.insert(to.clone(), module);
            return true;
        }

        if let Some(lesson) = self.lessons.remove(from) {
            if let Some(module) = self.modules.get_mut(&lesson.module_id) {
                replace_id(&mut module.lessons, from, to);
            }
            if let Some(quiz) = self.quizzes.remove(from) {
                for question_id in &quiz.questions {
                    if let Some(question) = self.questions.get_mut(question_id) {
                        question.lesson_id = to.clone();
                    }
                }
                self.quizzes.insert(to.clone(), quiz);
            }
            self.lessons.insert(to.clone(), lesson);
            return true;
        }

        if let Some(question) = self.questions.remove(from) {
            if let Some(quiz) = self.quizzes.get_mut(&question.lesson_id) {
                replace_id(&mut quiz.questions, from, to);
            }
            for answer_id in &question.answers {
                if let Some(answer) = self.answers.get_mut(answer_id) {
                    answer.question_id = to.clone();
                }
            }
            self.questions.insert(to.clone(), question);
            return true;
        }

        if let Some(answer) = self.answers.remove(from) {
            if let Some(question) = self.questions.get_mut(&answer.question_id) {
                replace_id(&mut question.answers, from, to);
            }
            self.answers.insert(to.clone(), answer);
            return true;
        }

        false
    }

    pub(crate) fn is_known(&self, id: &EntityId) -> bool {
        self.modules.contains_key(id)
            || self.lessons.contains_key(id)
            || self.questions.contains_key(id)
            || self.answers.contains_key(id)
    }
}

impl From<CourseContent> for ContentTree {
    fn from(content: CourseContent) -> Self {
        Self::from_content(content)
    }
}

fn replace_id(ids: &mut [EntityId], from: &EntityId, to: &EntityId) {
    for id in ids.iter_mut() {
        if id == from {
            *id = to.clone();
        }
    }
}
