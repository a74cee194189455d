use simplelens_core::{
    CellRef, GridIndex, GridLayout, Sample, SampleName, Subject, SubjectCollection,
    SubjectDescriptor,
};

fn layout() -> GridLayout {
    GridLayout::new(
        vec![SubjectDescriptor::new("Fellowship")],
        vec!["minimalSample".to_string()],
    )
}

#[test]
fn locates_subject_row_and_sample_columns() {
    let subject = Subject::new("X", "Fellowship")
        .with_samples(vec![Sample::new("Fellowship|minimalSample")]);

    let index = layout().locate(&subject);

    assert_eq!(index.subject_index, Some(0));
    assert_eq!(index.sample_indexes, vec![Some(0)]);
    assert_eq!(index.subject_sentinel(), 0);
    assert_eq!(index.sample_sentinels(), vec![0]);
}

#[test]
fn unknown_aspect_yields_sentinel_in_its_slot() {
    let subject = Subject::new("X", "Fellowship").with_samples(vec![
        Sample::new("Fellowship|minimalSample"),
        Sample::new("Fellowship|unknownAspect"),
        Sample::new("Fellowship"),
    ]);

    let index = layout().locate(&subject);

    assert_eq!(
        index.sample_sentinels(),
        vec![GridIndex::NOT_FOUND, GridIndex::NOT_FOUND, 0]
    );
    assert_eq!(index.cells().collect::<Vec<_>>(), vec![CellRef::new(0, 0)]);
}

#[test]
fn sample_columns_run_from_last_sample_to_first() {
    let layout = GridLayout::new(
        vec![SubjectDescriptor::new("Fellowship")],
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
    );
    let subject = Subject::new("X", "Fellowship").with_samples(vec![
        Sample::new("Fellowship|a"),
        Sample::new("Fellowship|b"),
        Sample::new("Fellowship|c"),
    ]);

    let index = layout.locate(&subject);

    assert_eq!(index.sample_indexes, vec![Some(2), Some(1), Some(0)]);
    assert_eq!(
        serde_json::to_value(&index).unwrap(),
        serde_json::json!({ "subjectIndex": 0, "sampleIndexes": [2, 1, 0] })
    );
}

#[test]
fn unknown_subject_yields_sentinel_row() {
    let subject =
        Subject::new("X", "Mordor").with_samples(vec![Sample::new("Mordor|minimalSample")]);

    let index = layout().locate(&subject);

    assert_eq!(index.subject_sentinel(), GridIndex::NOT_FOUND);
    assert_eq!(index.sample_sentinels(), vec![0]);
    assert_eq!(index.cells().count(), 0);
}

#[test]
fn repeated_reference_path_resolves_to_last_row() {
    let layout = GridLayout::new(
        vec![
            SubjectDescriptor::new("Fellowship"),
            SubjectDescriptor::new("Shire"),
            SubjectDescriptor::new("Fellowship"),
        ],
        vec!["a".to_string()],
    );
    assert_eq!(layout.subject_row("Fellowship"), Some(2));
    assert_eq!(layout.subject_row("Shire"), Some(1));
}

#[test]
fn place_splits_placed_and_unplaced_samples() {
    let layout = GridLayout::new(
        vec![
            SubjectDescriptor::new("Fellowship"),
            SubjectDescriptor::new("Shire"),
        ],
        vec!["a".to_string(), "b".to_string()],
    );
    let subjects: SubjectCollection = vec![
        Subject::new("s", "Shire").with_samples(vec![Sample::new("Shire|b")]),
        Subject::new("f", "Fellowship")
            .with_samples(vec![Sample::new("Fellowship|a"), Sample::new("Fellowship|zzz")]),
        Subject::new("m", "Mordor").with_samples(vec![Sample::new("Mordor|a")]),
    ]
    .into_iter()
    .collect();

    let placement = layout.place(&subjects);

    assert_eq!(placement.placed, vec![CellRef::new(1, 1), CellRef::new(0, 0)]);
    assert_eq!(
        placement.unplaced,
        vec![SampleName::new("Fellowship|zzz"), SampleName::new("Mordor|a")]
    );
}

#[test]
fn loads_reference_datasets_from_json() {
    let layout = GridLayout::from_json(
        r#"{
            "absolutePath": "Root",
            "children": [
                { "absolutePath": "Fellowship", "childCount": 11, "name": "Fellowship" },
                { "absolutePath": "Shire", "childCount": 0 }
            ]
        }"#,
        r#"["minimalSample", "latency"]"#,
    )
    .unwrap();

    assert_eq!(layout.rows(), 2);
    assert_eq!(layout.columns(), 2);
    assert_eq!(layout.aspect_column("latency"), Some(1));
    assert_eq!(layout.subjects()[0].extra["name"], "Fellowship");
}
