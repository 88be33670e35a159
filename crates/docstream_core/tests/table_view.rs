use docstream_core::{
    derive_table, update, AppState, DocumentView, Effect, FileResult, Msg, SelectedFile,
    TableView, ViewMode,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn array_of_objects_uses_first_element_keys() {
    let data = json!([
        {"sku": "A-1", "qty": 2, "meta": {"color": "red"}},
        {"sku": "B-2", "extra": true},
    ]);

    assert_eq!(
        derive_table(&data),
        TableView::Rows {
            headers: vec!["sku".into(), "qty".into(), "meta".into()],
            rows: vec![
                vec!["A-1".into(), "2".into(), r#"{"color":"red"}"#.into()],
                vec!["B-2".into(), String::new(), String::new()],
            ],
        }
    );
}

#[test]
fn object_becomes_key_value_rows() {
    let data = json!({"vendor": "ACME", "total": 12.5, "paid": null, "lines": [1]});

    assert_eq!(
        derive_table(&data),
        TableView::KeyValue(vec![
            ("vendor".into(), "ACME".into()),
            ("total".into(), "12.5".into()),
            ("paid".into(), "null".into()),
            ("lines".into(), "[\n  1\n]".into()),
        ])
    );
}

#[test]
fn empty_and_scalar_documents() {
    assert_eq!(derive_table(&json!([])), TableView::EmptyArray);
    assert_eq!(derive_table(&json!({})), TableView::EmptyObject);
    assert_eq!(derive_table(&json!("text")), TableView::Unsupported);
    assert_eq!(derive_table(&json!([1, 2])), TableView::Unsupported);
}

#[test]
fn selected_document_follows_view_mode() {
    let (state, effects) = update(
        AppState::new(),
        Msg::FilesSelected {
            files: vec![SelectedFile::new("a.pdf", "a.pdf")],
            prompt: None,
        },
    );
    let batch_id = match &effects[..] {
        [Effect::SubmitBatch { batch_id, .. }] => *batch_id,
        other => panic!("unexpected effects {other:?}"),
    };
    let (state, _) = update(state, Msg::UploadAccepted { batch_id });
    let (state, _) = update(
        state,
        Msg::FileResult {
            batch_id,
            result: FileResult {
                file_name: "a.pdf".into(),
                data: Some(json!({"a": 1})),
                ..FileResult::default()
            },
        },
    );

    let selected = state.view().selected.expect("auto-selected");
    assert_eq!(selected.file_name, "a.pdf");
    assert_eq!(
        selected.document,
        Some(DocumentView::Json("{\n  \"a\": 1\n}".into()))
    );

    let (mut state, _) = update(state, Msg::ViewModeChanged(ViewMode::Table));
    assert!(state.consume_dirty());
    let selected = state.view().selected.expect("still selected");
    assert_eq!(
        selected.document,
        Some(DocumentView::Table(TableView::KeyValue(vec![(
            "a".into(),
            "1".into()
        )])))
    );
}
