//! Golden wire tests for the backend JSON contract.
//!
//! The files under `tests/golden/` are captured server responses. If a
//! field is added, removed, or renamed on either side, these tests fail
//! before any client does. The fixtures are the contract, not the code.

use custommarket_protocol::{
    Acknowledged, ApiErrorBody, FileRecord, LoginRequest, NotesUpdate, ParsedDataUpdate,
    RegisterRequest, ResearchAccepted, ResearchAllRequest, ResearchRequest, SearchResults, Tab,
    TabCreate, TabRename, TokenResponse, UploadResponse, UserInfo,
};

fn read_golden(name: &str) -> String {
    let path = format!("tests/golden/{}", name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {}", path, e))
}

// ---- Server responses deserialize from captured bodies ----

#[test]
fn golden_file_record() {
    let record: FileRecord = serde_json::from_str(&read_golden("file-record.json")).unwrap();

    assert_eq!(record.id, 17);
    assert_eq!(record.filename, "suppliers.csv");
    assert_eq!(record.mime_type.as_deref(), Some("text/csv"));
    assert_eq!(record.size, Some(2048));
    assert_eq!(record.tab_id, Some(3));
    assert_eq!(record.notes, "Q2 shortlist");

    let grid = record.parsed_data.expect("tabular record carries a grid");
    assert_eq!(grid.len(), 3);
    assert_eq!(grid[0], vec!["name", "country", "rating"]);
    assert_eq!(grid[2][0], "Globex");
}

#[test]
fn golden_upload_response() {
    let resp: UploadResponse = serde_json::from_str(&read_golden("upload-response.json")).unwrap();

    assert_eq!(resp.uploaded.len(), 2);
    assert_eq!(resp.uploaded[0].filename, "catalog.xlsx");
    assert!(resp.uploaded[0].parsed_data.is_some());
    // Image records come back without parsed_data at all.
    assert_eq!(resp.uploaded[1].filename, "logo.png");
    assert!(resp.uploaded[1].parsed_data.is_none());
}

#[test]
fn golden_search_results() {
    let results: SearchResults =
        serde_json::from_str(&read_golden("search-results.json")).unwrap();

    // String object keys parse into integer row indices.
    assert_eq!(results.by_row.len(), 2);
    let row0 = &results.by_row[&0];
    assert_eq!(row0.results_count, 2);
    assert_eq!(row0.results.len(), 2);
    assert_eq!(row0.query_used, "Acme GmbH Germany supplier");
    let row2 = &results.by_row[&2];
    assert_eq!(row2.results_count, 0);
    assert!(row2.results.is_empty());
    assert!(!results.by_row.contains_key(&1));
}

#[test]
fn golden_user_info() {
    let user: UserInfo = serde_json::from_str(&read_golden("user-info.json")).unwrap();

    assert_eq!(user.id, 7);
    assert_eq!(user.email, "buyer@example.com");
    assert_eq!(user.name.as_deref(), Some("Dana Buyer"));
    assert_eq!(user.workspace_name, "Procurement");
}

// ---- Server leniency: missing optional fields do not break parsing ----

#[test]
fn file_record_tolerates_minimal_body() {
    let record: FileRecord =
        serde_json::from_str(r#"{"id": 5, "filename": "x.png"}"#).unwrap();

    assert_eq!(record.id, 5);
    assert_eq!(record.document_id, "");
    assert_eq!(record.storage_path, "");
    assert!(record.mime_type.is_none());
    assert!(record.parsed_data.is_none());
    assert_eq!(record.notes, "");
}

#[test]
fn research_accepted_tolerates_missing_counters() {
    let resp: ResearchAccepted = serde_json::from_str(r#"{"id": 99}"#).unwrap();
    assert_eq!(resp.id, 99);
    assert_eq!(resp.analyze_id, 0);
    assert_eq!(resp.searchable_count, 0);
    assert!(!resp.ok);
}

#[test]
fn tab_tolerates_missing_counts() {
    let tab: Tab = serde_json::from_str(r#"{"id": 1, "name": "Default"}"#).unwrap();
    assert_eq!(tab.file_count, 0);
    assert_eq!(tab.sort_order, 0);
}

#[test]
fn acknowledged_and_error_bodies() {
    let ack: Acknowledged = serde_json::from_str(r#"{"ok": true}"#).unwrap();
    assert!(ack.ok);

    let err: ApiErrorBody =
        serde_json::from_str(r#"{"detail": "File not found"}"#).unwrap();
    assert_eq!(err.detail, "File not found");

    // Non-JSON bodies must NOT parse; callers fall back to the status code.
    assert!(serde_json::from_str::<ApiErrorBody>("<html>502</html>").is_err());
}

// ---- Request bodies serialize to the exact shapes the server expects ----

#[test]
fn auth_request_shapes() {
    let login = serde_json::to_value(&LoginRequest {
        email: "a@b.c".into(),
        password: "hunter2".into(),
    })
    .unwrap();
    assert_eq!(login, serde_json::json!({"email": "a@b.c", "password": "hunter2"}));

    // `name: None` is omitted entirely, not sent as null.
    let register = serde_json::to_value(&RegisterRequest {
        email: "a@b.c".into(),
        password: "hunter2".into(),
        name: None,
    })
    .unwrap();
    assert_eq!(register, serde_json::json!({"email": "a@b.c", "password": "hunter2"}));

    let token: TokenResponse = serde_json::from_str(r#"{"access_token": "tok_abc"}"#).unwrap();
    assert_eq!(token.access_token, "tok_abc");
}

#[test]
fn tab_request_shapes() {
    let create = serde_json::to_value(&TabCreate::default()).unwrap();
    assert_eq!(create, serde_json::json!({"name": "New Tab"}));

    let rename = serde_json::to_value(&TabRename { name: "Vendors".into() }).unwrap();
    assert_eq!(rename, serde_json::json!({"name": "Vendors"}));
}

#[test]
fn file_patch_shapes() {
    let notes = serde_json::to_value(&NotesUpdate { notes: "checked".into() }).unwrap();
    assert_eq!(notes, serde_json::json!({"notes": "checked"}));

    let data = serde_json::to_value(&ParsedDataUpdate {
        parsed_data: vec![vec!["h".into()], vec!["v".into()]],
    })
    .unwrap();
    assert_eq!(data, serde_json::json!({"parsed_data": [["h"], ["v"]]}));
}

#[test]
fn research_request_shapes() {
    let scoped = serde_json::to_value(&ResearchRequest {
        file_id: 17,
        selected_rows: vec![0, 2],
        selected_columns: vec![1],
        why_fields: "match by name and country".into(),
        what_result: "company homepage".into(),
    })
    .unwrap();
    assert_eq!(
        scoped,
        serde_json::json!({
            "file_id": 17,
            "selected_rows": [0, 2],
            "selected_columns": [1],
            "why_fields": "match by name and country",
            "what_result": "company homepage",
        })
    );

    let all = serde_json::to_value(&ResearchAllRequest {
        file_id: 17,
        total_rows: 120,
        total_columns: 8,
        why_fields: "match by name and country".into(),
        what_result: "company homepage".into(),
    })
    .unwrap();
    assert_eq!(all["total_rows"], 120);
    assert_eq!(all["total_columns"], 8);
}
