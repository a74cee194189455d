use serde_json::json;
use simplelens_core::{
    ApplyOutcome, Change, ChangeRecord, ReconcileError, Reconciler, Sample, SampleName,
    SkipReason, Subject, SubjectCollection, SubjectId,
};

const ID: &str = "461ed5e0-0976-47c6-8cee-b9e1d0864fdc";

fn fellowship_subject() -> Subject {
    serde_json::from_value(json!({
        "absolutePath": "Fellowship",
        "childCount": 11,
        "id": ID,
        "name": "Fellowship",
        "parentAbsolutePath": "",
        "parentId": "",
        "samples": [],
        "tags": ["Tag1", "Tag2", "Tag3"]
    }))
    .unwrap()
}

fn minimal_sample() -> Sample {
    Sample::new("Fellowship|minimalSample").with_status("OK")
}

fn with_subject(subject: Subject) -> SubjectCollection {
    std::iter::once(subject).collect()
}

fn only_subject(subjects: &SubjectCollection) -> &Subject {
    assert_eq!(subjects.len(), 1);
    subjects.iter().next().unwrap()
}

#[test]
fn subject_add_grows_collection_per_distinct_id() {
    let reconciler = Reconciler::default();
    let mut subjects = SubjectCollection::new();

    for n in 0..5 {
        let outcome = reconciler
            .add_subject(Subject::new(format!("id-{n}"), format!("Path{n}")), &mut subjects)
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Inserted);
    }
    assert_eq!(subjects.len(), 5);
}

#[test]
fn subject_add_is_idempotent_for_resent_ids() {
    let reconciler = Reconciler::default();
    let mut subjects = SubjectCollection::new();

    reconciler
        .add_subject(fellowship_subject(), &mut subjects)
        .unwrap();
    let outcome = reconciler
        .add_subject(fellowship_subject(), &mut subjects)
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Upserted);
    assert_eq!(subjects.len(), 1);
}

#[test]
fn subject_remove_deletes_member_by_id() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(fellowship_subject());

    // Structurally different payload, same id.
    let payload = Subject::new(ID, "Fellowship");
    let outcome = reconciler.remove_subject(&payload, &mut subjects).unwrap();

    assert_eq!(outcome, ApplyOutcome::Removed { count: 1 });
    assert!(subjects.is_empty());
}

#[test]
fn subject_remove_of_non_member_leaves_size_unchanged() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(fellowship_subject());

    let outcome = reconciler
        .remove_subject(&Subject::new("someone-else", "Fellowship"), &mut subjects)
        .unwrap();

    assert_eq!(
        outcome,
        ApplyOutcome::Skipped {
            reason: SkipReason::SubjectNotFound
        }
    );
    assert_eq!(subjects.len(), 1);
}

#[test]
fn subject_update_renames_and_keeps_previous_samples() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(fellowship_subject());

    let renamed: Subject = serde_json::from_value(json!({
        "absolutePath": "toot",
        "childCount": 11,
        "id": ID,
        "name": "toot",
        "parentAbsolutePath": "",
        "parentId": "",
        "samples": [{ "name": "Fellowship|minimalSample", "status": "OK" }],
        "tags": ["Tag1", "Tag2", "Tag3"]
    }))
    .unwrap();

    let outcome = reconciler
        .update_subject(Change::to(renamed), &mut subjects)
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Updated);
    let subject = only_subject(&subjects);
    assert_eq!(subject.extra["name"], "toot");
    assert_eq!(subject.absolute_path, "toot");
    assert!(subject.samples.is_empty());
}

#[test]
fn subject_update_keeps_position_in_collection() {
    let reconciler = Reconciler::default();
    let mut subjects: SubjectCollection = vec![
        Subject::new("a", "A"),
        Subject::new("b", "B"),
        Subject::new("c", "C"),
    ]
    .into_iter()
    .collect();

    reconciler
        .update_subject(Change::to(Subject::new("a", "A2")), &mut subjects)
        .unwrap();

    let order: Vec<&str> = subjects.ids().map(SubjectId::as_str).collect();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert_eq!(subjects.position(&SubjectId::from("a")), Some(0));
    assert_eq!(subjects.get(&SubjectId::from("a")).unwrap().absolute_path, "A2");
}

#[test]
fn subject_update_of_unknown_id_inserts_with_empty_samples() {
    let reconciler = Reconciler::default();
    let mut subjects = SubjectCollection::new();

    let snapshot = Subject::new(ID, "Fellowship").with_samples(vec![minimal_sample()]);
    let outcome = reconciler
        .update_subject(Change::to(snapshot), &mut subjects)
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Inserted);
    assert!(only_subject(&subjects).samples.is_empty());
}

#[test]
fn sample_add_appends_to_owning_subject() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(fellowship_subject());

    reconciler
        .add_sample(minimal_sample(), &mut subjects)
        .unwrap();

    assert_eq!(only_subject(&subjects).samples, vec![minimal_sample()]);
}

#[test]
fn sample_add_without_owner_is_dropped() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(fellowship_subject());

    let outcome = reconciler
        .add_sample(Sample::new("Mordor|aspectX"), &mut subjects)
        .unwrap();

    assert_eq!(
        outcome,
        ApplyOutcome::Skipped {
            reason: SkipReason::SubjectNotFound
        }
    );
    assert_eq!(subjects.len(), 1);
    assert_eq!(subjects.sample_count(), 0);
}

#[test]
fn sample_remove_drops_every_sample_with_the_name() {
    let reconciler = Reconciler::default();
    let other =
        Subject::new("other", "Shire").with_samples(vec![Sample::new("Shire|minimalSample")]);
    let fellowship = fellowship_subject().with_samples(vec![
        minimal_sample(),
        Sample::new("Fellowship|keep"),
        minimal_sample().with_status("Critical"),
    ]);
    let mut subjects: SubjectCollection = vec![fellowship, other].into_iter().collect();

    let outcome = reconciler
        .remove_sample(&Sample::new("Fellowship|minimalSample"), &mut subjects)
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Removed { count: 2 });
    let fellowship = subjects.get(&SubjectId::new(ID)).unwrap();
    assert_eq!(fellowship.samples, vec![Sample::new("Fellowship|keep")]);
    let shire = subjects.get(&SubjectId::new("other")).unwrap();
    assert_eq!(shire.samples.len(), 1);
}

#[test]
fn sample_update_replaces_slot_and_preserves_length() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(fellowship_subject().with_samples(vec![
        Sample::new("Fellowship|first"),
        minimal_sample(),
        Sample::new("Fellowship|last"),
    ]));

    let updated = Sample::new("Fellowship|minimalSample").with_status("Critical");
    reconciler
        .update_sample(Change::to(updated.clone()), &mut subjects)
        .unwrap();

    let samples = &only_subject(&subjects).samples;
    assert_eq!(samples.len(), 3);
    assert_eq!(samples[1], updated);
}

#[test]
fn sample_update_of_missing_sample_is_invariant_violation() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(fellowship_subject());

    let err = reconciler
        .update_sample(Change::to(minimal_sample()), &mut subjects)
        .unwrap_err();

    assert_eq!(
        err,
        ReconcileError::InvariantViolation {
            subject_path: "Fellowship".to_string(),
            sample_name: SampleName::new("Fellowship|minimalSample"),
        }
    );
    assert!(only_subject(&subjects).samples.is_empty());
}

#[test]
fn sample_update_without_owner_is_noop() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(fellowship_subject());

    let outcome = reconciler
        .update_sample(Change::to(Sample::new("Mordor|aspectX")), &mut subjects)
        .unwrap();
    assert!(!outcome.is_mutation());
}

#[test]
fn add_update_remove_sample_scenario() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(Subject::new("X", "Fellowship"));

    let batch: Vec<ChangeRecord> = serde_json::from_value(json!([
        { "sample.add": { "name": "Fellowship|minimalSample", "status": "OK" } }
    ]))
    .unwrap();
    assert!(reconciler.apply_batch(batch, &mut subjects).is_clean());
    assert_eq!(only_subject(&subjects).samples, vec![minimal_sample()]);

    let batch: Vec<ChangeRecord> = serde_json::from_value(json!([
        { "sample.update": { "new": { "name": "Fellowship|minimalSample", "status": "Critical" } } }
    ]))
    .unwrap();
    assert!(reconciler.apply_batch(batch, &mut subjects).is_clean());
    assert_eq!(
        only_subject(&subjects).samples,
        vec![Sample::new("Fellowship|minimalSample").with_status("Critical")]
    );

    let batch: Vec<ChangeRecord> = serde_json::from_value(json!([
        { "sample.remove": { "name": "Fellowship|minimalSample" } }
    ]))
    .unwrap();
    assert!(reconciler.apply_batch(batch, &mut subjects).is_clean());
    assert!(only_subject(&subjects).samples.is_empty());
}

#[test]
fn batch_applies_in_delivery_order() {
    let reconciler = Reconciler::default();
    let mut subjects = SubjectCollection::new();

    let batch: Vec<ChangeRecord> = serde_json::from_value(json!([
        { "sample.add": { "name": "Fellowship|early" } },
        { "subject.add": { "id": "X", "absolutePath": "Fellowship" } },
        { "sample.add": { "name": "Fellowship|late" } }
    ]))
    .unwrap();
    let applied = reconciler.apply_batch(batch, &mut subjects);

    assert!(applied.is_clean());
    assert_eq!(
        applied.outcomes,
        vec![
            ApplyOutcome::Skipped {
                reason: SkipReason::SubjectNotFound
            },
            ApplyOutcome::Inserted,
            ApplyOutcome::Inserted,
        ]
    );
    assert_eq!(
        only_subject(&subjects).samples,
        vec![Sample::new("Fellowship|late")]
    );
}

#[test]
fn refused_record_does_not_drop_the_rest_of_the_batch() {
    let reconciler = Reconciler::default();
    let mut subjects = with_subject(Subject::new("X", "Fellowship"));

    let batch: Vec<ChangeRecord> = serde_json::from_value(json!([
        { "subject.add": { "id": "S", "absolutePath": "Shire" } },
        { "sample.update": { "new": { "name": "Fellowship|a" } } },
        { "sample.add": { "name": "Shire|a" } }
    ]))
    .unwrap();
    let applied = reconciler.apply_batch(batch, &mut subjects);

    assert_eq!(applied.failures.len(), 1);
    assert_eq!(applied.failures[0].index, Some(1));
    assert_eq!(applied.failures[0].error.code(), "invariant_violation");
    assert_eq!(
        applied.outcomes,
        vec![
            ApplyOutcome::Inserted,
            ApplyOutcome::Failed {
                error_code: "invariant_violation"
            },
            ApplyOutcome::Inserted,
        ]
    );
    assert_eq!(subjects.len(), 2);
    assert!(subjects.get(&SubjectId::from("X")).unwrap().samples.is_empty());
    assert_eq!(
        subjects.get(&SubjectId::from("S")).unwrap().samples,
        vec![Sample::new("Shire|a")]
    );

    let batch: Vec<ChangeRecord> = serde_json::from_value(json!([
        { "sample.add": { "name": "Shire|b" } }
    ]))
    .unwrap();
    let applied = reconciler.apply_batch(batch, &mut subjects);
    assert_eq!(applied.outcomes, vec![ApplyOutcome::Inserted]);
}
