//! # Pending Change Ledger
//!
//! Append-only record of every addition, edit and deletion made in an
//! editing session, waiting to be submitted to the backend as one batch.
//!
//! ## Semantics
//!
//! - Records are never merged or rewritten: editing the same field twice
//!   yields two `Edit` records.
//! - Within each of the three lists records keep call order. There is no
//!   ordering across lists; replay order is the backend's concern.
//! - A `Deletion` of an entity that owns children carries `cascade: true`.
//!   Descendants are not recorded individually and the backend is expected
//!   to delete them along with their parent.
//! - The ledger is only emptied wholesale, by [`ChangeLedger::clear`].

use crate::content::{
    Answer, AnswerPatch, Lesson, LessonPatch, Module, ModulePatch, Question, QuestionPatch, Quiz,
    QuizPatch,
};
use crate::ids::EntityId;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Module,
    Lesson,
    Quiz,
    Question,
    Answer,
}

impl EntityType {
    /// Whether deleting this entity implicitly deletes nested entities
    pub fn owns_children(self) -> bool {
        !matches!(self, EntityType::Answer)
    }
}

/// Enough of the ancestry to locate an entity on replay
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentChain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<EntityId>,
}

impl ParentChain {
    /// Top-level entity (a module)
    pub fn root() -> Self {
        Self::default()
    }

    pub fn module(module_id: &EntityId) -> Self {
        Self {
            module_id: Some(module_id.clone()),
            ..Default::default()
        }
    }

    pub fn lesson(module_id: &EntityId, lesson_id: &EntityId) -> Self {
        Self {
            module_id: Some(module_id.clone()),
            lesson_id: Some(lesson_id.clone()),
            question_id: None,
        }
    }

    pub fn question(module_id: &EntityId, lesson_id: &EntityId, question_id: &EntityId) -> Self {
        Self {
            module_id: Some(module_id.clone()),
            lesson_id: Some(lesson_id.clone()),
            question_id: Some(question_id.clone()),
        }
    }
}

/// Full payload of a newly added entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityPayload {
    Module(Module),
    Lesson(Lesson),
    Quiz(Quiz),
    Question(Question),
    Answer(Answer),
}

impl EntityPayload {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityPayload::Module(_) => EntityType::Module,
            EntityPayload::Lesson(_) => EntityType::Lesson,
            EntityPayload::Quiz(_) => EntityType::Quiz,
            EntityPayload::Question(_) => EntityType::Question,
            EntityPayload::Answer(_) => EntityType::Answer,
        }
    }
}

/// Changed fields of an edited entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityPatch {
    Module(ModulePatch),
    Lesson(LessonPatch),
    Quiz(QuizPatch),
    Question(QuestionPatch),
    Answer(AnswerPatch),
}

impl EntityPatch {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityPatch::Module(_) => EntityType::Module,
            EntityPatch::Lesson(_) => EntityType::Lesson,
            EntityPatch::Quiz(_) => EntityType::Quiz,
            EntityPatch::Question(_) => EntityType::Question,
            EntityPatch::Answer(_) => EntityType::Answer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Addition {
    pub entry_id: String,
    pub entity_type: EntityType,
    pub parents: ParentChain,
    pub data: EntityPayload,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edit {
    pub entry_id: String,
    pub entity_type: EntityType,
    /// Id of the edited entity (the owning lesson's id for a quiz)
    pub original_id: EntityId,
    pub parents: ParentChain,
    pub data: EntityPatch,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deletion {
    pub entry_id: String,
    pub entity_type: EntityType,
    pub original_id: EntityId,
    pub parents: ParentChain,
    /// Nested entities go with this one
    pub cascade: bool,
    pub recorded_at: DateTime<Utc>,
}

/// A change produced by an applied mutation, not yet stamped into the ledger
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Addition {
        data: EntityPayload,
        parents: ParentChain,
    },
    Edit {
        original_id: EntityId,
        data: EntityPatch,
        parents: ParentChain,
    },
    Deletion {
        entity_type: EntityType,
        original_id: EntityId,
        parents: ParentChain,
    },
}

/// The three ledger lists, as handed to the persistence collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet {
    pub additions: Vec<Addition>,
    pub edits: Vec<Edit>,
    pub deletions: Vec<Deletion>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.edits.is_empty() && self.deletions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.additions.len() + self.edits.len() + self.deletions.len()
    }
}

#[derive(Debug, Default)]
pub struct ChangeLedger {
    additions: Vec<Addition>,
    edits: Vec<Edit>,
    deletions: Vec<Deletion>,

    /// Entry counter; survives `clear()` so entry ids stay unique per session
    next_entry: u64,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_entry_id(&mut self) -> String {
        self.next_entry += 1;
        format!("change-{}", self.next_entry)
    }

    pub fn record_addition(&mut self, data: EntityPayload, parents: ParentChain) {
        let entry_id = self.next_entry_id();
        tracing::debug!(entry_id = %entry_id, entity = ?data.entity_type(), "recorded addition");

        self.additions.push(Addition {
            entry_id,
            entity_type: data.entity_type(),
            parents,
            data,
            recorded_at: Utc::now(),
        });
    }

    pub fn record_edit(&mut self, original_id: EntityId, data: EntityPatch, parents: ParentChain) {
        let entry_id = self.next_entry_id();
        tracing::debug!(entry_id = %entry_id, id = %original_id, "recorded edit");

        self.edits.push(Edit {
            entry_id,
            entity_type: data.entity_type(),
            original_id,
            parents,
            data,
            recorded_at: Utc::now(),
        });
    }

    pub fn record_deletion(
        &mut self,
        entity_type: EntityType,
        original_id: EntityId,
        parents: ParentChain,
    ) {
        let entry_id = self.next_entry_id();
        tracing::debug!(entry_id = %entry_id, id = %original_id, "recorded deletion");

        self.deletions.push(Deletion {
            entry_id,
            entity_type,
            original_id,
            parents,
            cascade: entity_type.owns_children(),
            recorded_at: Utc::now(),
        });
    }

    /// Stamp a change into the matching list
    pub fn record(&mut self, change: Change) {
        match change {
            Change::Addition { data, parents } => self.record_addition(data, parents),
            Change::Edit {
                original_id,
                data,
                parents,
            } => self.record_edit(original_id, data, parents),
            Change::Deletion {
                entity_type,
                original_id,
                parents,
            } => self.record_deletion(entity_type, original_id, parents),
        }
    }

    /// Snapshot of the three lists in accumulated order. Does not clear.
    pub fn drain_for_submission(&self) -> ChangeSet {
        ChangeSet {
            additions: self.additions.clone(),
            edits: self.edits.clone(),
            deletions: self.deletions.clone(),
        }
    }

    pub fn clear(&mut self) {
        self.additions.clear();
        self.edits.clear();
        self.deletions.clear();
    }

    pub fn additions(&self) -> &[Addition] {
        &self.additions
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn deletions(&self) -> &[Deletion] {
        &self.deletions
    }

    pub fn len(&self) -> usize {
        self.additions.len() + self.edits.len() + self.deletions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title_patch(title: &str) -> EntityPatch {
        EntityPatch::Module(ModulePatch {
            title: Some(title.to_string()),
            order: None,
        })
    }

    #[test]
    fn test_repeated_edits_are_not_merged() {
        let mut ledger = ChangeLedger::new();
        let id = EntityId::remote("m1");

        ledger.record_edit(id.clone(), title_patch("a"), ParentChain::root());
        ledger.record_edit(id.clone(), title_patch("b"), ParentChain::root());

        let edits = ledger.edits();
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].data, title_patch("a"));
        assert_eq!(edits[1].data, title_patch("b"));
        assert_ne!(edits[0].entry_id, edits[1].entry_id);
    }

    #[test]
    fn test_entry_ids_stay_unique_across_clear() {
        let mut ledger = ChangeLedger::new();
        ledger.record_deletion(EntityType::Module, "m1".into(), ParentChain::root());
        let first = ledger.deletions()[0].entry_id.clone();

        ledger.clear();
        ledger.record_deletion(EntityType::Module, "m2".into(), ParentChain::root());

        assert_ne!(ledger.deletions()[0].entry_id, first);
    }

    #[test]
    fn test_deletion_cascade_flag() {
        let mut ledger = ChangeLedger::new();
        let m = EntityId::from("m1");
        let l = EntityId::from("l1");
        let q = EntityId::from("q1");

        ledger.record_deletion(EntityType::Lesson, l.clone(), ParentChain::module(&m));
        ledger.record_deletion(EntityType::Answer, "a1".into(), ParentChain::question(&m, &l, &q));

        assert!(ledger.deletions()[0].cascade);
        assert!(!ledger.deletions()[1].cascade);
    }

    #[test]
    fn test_drain_does_not_clear() {
        let mut ledger = ChangeLedger::new();
        ledger.record_edit("m1".into(), title_patch("x"), ParentChain::root());

        let drained = ledger.drain_for_submission();
        assert_eq!(drained.len(), 1);
        assert_eq!(ledger.len(), 1);

        ledger.clear();
        assert!(ledger.drain_for_submission().is_empty());
    }

    #[test]
    fn test_change_set_serializes_payload_inline() {
        let mut ledger = ChangeLedger::new();
        ledger.record_edit(
            "l1".into(),
            EntityPatch::Lesson(LessonPatch {
                duration: Some(90),
                ..Default::default()
            }),
            ParentChain::module(&"m1".into()),
        );

        let json = serde_json::to_value(ledger.drain_for_submission()).unwrap();
        let edit = &json["edits"][0];

        assert_eq!(edit["entityType"], "lesson");
        assert_eq!(edit["originalId"], "l1");
        assert_eq!(edit["parents"]["moduleId"], "m1");
        assert_eq!(edit["data"], serde_json::json!({ "duration": 90 }));
    }
}
