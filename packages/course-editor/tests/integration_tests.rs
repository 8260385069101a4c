//! End-to-end editing scenarios through the session facade

use course_editor::{
    EditSession, EditorConfig, EntityId, EntityPayload, EntityType, LessonDraft, LessonPatch,
    LessonType, ModuleDraft,
};

fn new_session() -> EditSession {
    EditSession::new(EditorConfig::default().with_id_seed("it"))
}

fn created(outcome: course_editor::MutationOutcome) -> EntityId {
    outcome
        .created_id()
        .cloned()
        .expect("mutation should create an entity")
}

#[test]
fn test_skeleton_to_quiz_lesson() {
    let mut session = new_session();

    let m1 = created(session.add_module(ModuleDraft::new("M1", 1)));
    let l1 = created(session.add_lesson(&m1, LessonDraft::new("L1", LessonType::Markdown)));

    let outcome = session.update_lesson(
        &m1,
        &l1,
        LessonPatch {
            lesson_type: Some(LessonType::Quiz),
            ..Default::default()
        },
    );
    assert!(outcome.is_applied());

    let tree = session.tree();
    assert_eq!(tree.modules.len(), 1);
    assert_eq!(tree.modules[0].lessons.len(), 1);

    let lesson = &tree.modules[0].lessons[0];
    assert_eq!(lesson.lesson_type, Some(LessonType::Quiz));
    let quiz = lesson.quiz.as_ref().expect("quiz should be initialized");
    assert!(quiz.quiz_questions.is_empty());
    assert_eq!(quiz.passing_score, 70);
    assert_eq!(quiz.title, "L1");

    let ledger = session.ledger();
    assert_eq!(ledger.additions().len(), 2);
    assert_eq!(ledger.edits().len(), 1);
    assert!(ledger.deletions().is_empty());

    assert_eq!(ledger.additions()[0].entity_type, EntityType::Module);
    assert_eq!(ledger.additions()[1].entity_type, EntityType::Lesson);
    assert_eq!(ledger.additions()[1].parents.module_id.as_ref(), Some(&m1));
}

#[test]
fn test_generated_ids_are_local_and_unique() {
    let mut session = new_session();

    let m1 = created(session.add_module(ModuleDraft::new("M1", 1)));
    let m2 = created(session.add_module(ModuleDraft::new("M2", 2)));
    let l1 = created(session.add_lesson(&m1, LessonDraft::new("L1", LessonType::Video)));

    assert!(m1.is_local() && m2.is_local() && l1.is_local());
    assert_ne!(m1, m2);
    assert_ne!(m2, l1);
}

#[test]
fn test_module_addition_carries_nested_lessons() {
    let mut session = new_session();

    let mut draft = ModuleDraft::new("With lessons", 1);
    draft.lessons.push(LessonDraft::new("A", LessonType::Markdown));
    draft.lessons.push(LessonDraft::new("B", LessonType::Video));
    session.add_module(draft);

    let additions = session.ledger().additions();
    assert_eq!(additions.len(), 1);

    match &additions[0].data {
        EntityPayload::Module(module) => {
            assert_eq!(module.lessons.len(), 2);
            assert_eq!(module.lessons[1].title, "B");
        }
        other => panic!("Expected module payload, got {:?}", other),
    }
}

#[test]
fn test_change_set_json_for_backend() -> anyhow::Result<()> {
    let mut session = new_session();
    let m1 = created(session.add_module(ModuleDraft::new("M1", 1)));
    session.delete_module(&m1);

    let json = serde_json::to_value(session.drain_for_submission())?;

    assert_eq!(json["additions"][0]["data"]["title"], "M1");
    assert_eq!(json["deletions"][0]["entityType"], "module");
    assert_eq!(json["deletions"][0]["originalId"], m1.as_str());
    assert_eq!(json["deletions"][0]["cascade"], true);
    Ok(())
}
