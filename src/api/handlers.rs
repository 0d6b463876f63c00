//! Admin surface request handlers
//!
//! Every mutating handler validates its whole input before touching the
//! store, so a rejected request never leaves a partial write behind.

use axum::{
    extract::{rejection::FormRejection, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::error::ApiError;
use super::routes::AdminState;
use crate::store::{SecretRecord, DEFAULT_FILE_MODE};

/// Fields posted by the add/update form
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSecretForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteSecretForm {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkImportForm {
    #[serde(default)]
    pub json_data: String,
}

/// One entry of the bulk import payload
#[derive(Debug, Deserialize)]
pub struct BulkSecret {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub version: String,
}

/// Parse a file mode given as decimal (`420`) or octal (`0644`, `0o644`)
///
/// Missing, unparseable or out-of-range input falls back to 0644.
pub fn parse_mode(raw: Option<&str>) -> i32 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_FILE_MODE;
    };

    let parsed = if let Some(octal) = raw.strip_prefix("0o").or_else(|| raw.strip_prefix("0O")) {
        i32::from_str_radix(octal, 8).ok()
    } else if raw.len() > 1 && raw.starts_with('0') {
        i32::from_str_radix(&raw[1..], 8).ok()
    } else {
        raw.parse::<i32>().ok()
    };

    match parsed {
        Some(mode) if (0..=0o7777).contains(&mode) => mode,
        _ => DEFAULT_FILE_MODE,
    }
}

/// Parse and validate a bulk import payload without touching the store
pub fn parse_bulk_payload(data: &str) -> Result<Vec<SecretRecord>, ApiError> {
    let items: Vec<BulkSecret> = serde_json::from_str(data)
        .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if item.name.is_empty() || item.value.is_empty() {
                return Err(ApiError::bad_request(format!(
                    "Invalid JSON: item {} requires a name and a value",
                    index
                )));
            }
            Ok(SecretRecord::new(item.name, item.value, item.version, DEFAULT_FILE_MODE))
        })
        .collect()
}

fn form_rejection(rejection: FormRejection) -> ApiError {
    ApiError::bad_request(format!("Bad request: {}", rejection.body_text()))
}

/// `GET /` - render the current store
pub async fn index_handler(State(state): State<AdminState>) -> Result<Html<String>, ApiError> {
    let records = state.store.list()?;
    let body = state.renderer.render_index(records).map_err(|e| {
        warn!(error = %e, "Failed to render admin page");
        ApiError::internal("Internal Server Error")
    })?;
    Ok(Html(body))
}

/// `POST /update` - create or overwrite one secret
pub async fn update_secret_handler(
    State(state): State<AdminState>,
    form: Result<Form<UpdateSecretForm>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let Form(form) = form.map_err(form_rejection)?;

    if form.name.is_empty() || form.value.is_empty() {
        return Err(ApiError::bad_request("Name and Value required"));
    }
    let mode = parse_mode(form.mode.as_deref());

    state.store.set(form.name.as_str(), form.value, form.version.as_str(), mode)?;
    info!(name = %form.name, version = %form.version, mode, "Secret added/updated via UI");

    Ok(Redirect::to("/"))
}

/// `POST /delete` - remove one secret
pub async fn delete_secret_handler(
    State(state): State<AdminState>,
    form: Result<Form<DeleteSecretForm>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let Form(form) = form.map_err(form_rejection)?;

    if form.name.is_empty() {
        return Err(ApiError::bad_request("Name required"));
    }

    let removed = state.store.delete(&form.name)?;
    info!(name = %form.name, removed, "Secret deleted via UI");

    Ok(Redirect::to("/"))
}

/// `POST /bulk` - import a JSON array of secrets as one batch
pub async fn bulk_import_handler(
    State(state): State<AdminState>,
    form: Result<Form<BulkImportForm>, FormRejection>,
) -> Result<Redirect, ApiError> {
    let Form(form) = form.map_err(form_rejection)?;

    let records = parse_bulk_payload(&form.json_data).inspect_err(|e| {
        warn!(error = ?e, "Bulk upload failed");
    })?;

    let count = state.store.set_many(records)?;
    info!(count, "Bulk secrets imported");

    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_defaults() {
        assert_eq!(parse_mode(None), 420);
        assert_eq!(parse_mode(Some("")), 420);
        assert_eq!(parse_mode(Some("   ")), 420);
        assert_eq!(parse_mode(Some("rw-r--r--")), 420);
    }

    #[test]
    fn test_parse_mode_decimal_and_octal() {
        assert_eq!(parse_mode(Some("420")), 420);
        assert_eq!(parse_mode(Some("384")), 0o600);
        assert_eq!(parse_mode(Some("0644")), 420);
        assert_eq!(parse_mode(Some("0600")), 384);
        assert_eq!(parse_mode(Some("0o755")), 0o755);
        assert_eq!(parse_mode(Some("0")), 0);
    }

    #[test]
    fn test_parse_mode_rejects_out_of_range() {
        assert_eq!(parse_mode(Some("-1")), 420);
        assert_eq!(parse_mode(Some("70000")), 420);
        assert_eq!(parse_mode(Some("0999")), 420);
    }

    #[test]
    fn test_parse_bulk_payload() {
        let records = parse_bulk_payload(
            r#"[{"name":"a","value":"1","version":"v1"},{"name":"b","value":"2"}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], SecretRecord::new("a", "1", "v1", 420));
        assert_eq!(records[1], SecretRecord::new("b", "2", "", 420));
    }

    #[test]
    fn test_parse_bulk_payload_rejects_malformed_json() {
        assert!(matches!(parse_bulk_payload("{not json"), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_bulk_payload(r#"{"name":"a"}"#), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_bulk_payload(""), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_parse_bulk_payload_rejects_incomplete_items() {
        let result = parse_bulk_payload(
            r#"[{"name":"a","value":"1"},{"name":"","value":"2"},{"name":"c","value":"3"}]"#,
        );
        assert!(matches!(result, Err(ApiError::BadRequest(msg)) if msg.contains("item 1")));
    }

    #[test]
    fn test_parse_bulk_payload_keeps_names_verbatim() {
        let records = parse_bulk_payload(r#"[{"name":" padded.txt ","value":"1"}]"#).unwrap();
        assert_eq!(records[0].name, " padded.txt ");
    }

    #[test]
    fn test_parse_bulk_payload_empty_array() {
        assert!(parse_bulk_payload("[]").unwrap().is_empty());
    }
}
