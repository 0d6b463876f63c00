//! HTML rendering of the admin page
//!
//! The template is registered under an `.html` name so Tera escapes every
//! interpolated value; secret contents are operator-supplied text.

use serde::Serialize;
use tera::{Context, Tera};

use crate::store::SecretRecord;
use crate::{Error, Result};

const INDEX_TEMPLATE: &str = "index.html";

const ADMIN_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <title>CSI Debugger Admin</title>
    <style>
        body { font-family: sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }
        table { width: 100%; border-collapse: collapse; margin-top: 20px; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #f2f2f2; }
        .form-group { margin-bottom: 15px; }
        label { display: block; margin-bottom: 5px; }
        input, textarea { width: 100%; padding: 8px; box-sizing: border-box; }
        button { padding: 10px 15px; background-color: #007bff; color: white; border: none; cursor: pointer; }
        button.delete { background-color: #dc3545; }
        .header { display: flex; justify-content: space-between; align-items: center; }
    </style>
</head>
<body>
    <div class="header">
        <h1>CSI Secret Debugger</h1>
        <button onclick="location.reload()">Refresh</button>
    </div>

    <h3>Active Secrets (In-Memory)</h3>
    <p>These secrets will be returned to the CSI Driver upon the next <code>Mount</code> call.</p>

    <table>
        <thead>
            <tr>
                <th>File Name (Path)</th>
                <th>Content Preview</th>
                <th>Version</th>
                <th>Mode</th>
                <th>Action</th>
            </tr>
        </thead>
        <tbody>
            {% for secret in secrets %}
            <tr>
                <td>{{ secret.name }}</td>
                <td>{{ secret.value }}</td>
                <td>{{ secret.version }}</td>
                <td>{{ secret.mode }} ({{ secret.mode_octal }})</td>
                <td>
                    <form action="/delete" method="POST" style="margin:0;">
                        <input type="hidden" name="name" value="{{ secret.name }}">
                        <button type="submit" class="delete">Delete</button>
                    </form>
                </td>
            </tr>
            {% endfor %}
            {% if secrets | length == 0 %}
            <tr><td colspan="5">No secrets configured.</td></tr>
            {% endif %}
        </tbody>
    </table>

    <hr>

    <h3>Add / Update Secret</h3>
    <form action="/update" method="POST">
        <div class="form-group">
            <label>File Name (e.g., database.yaml)</label>
            <input type="text" name="name" required placeholder="config.json">
        </div>
        <div class="form-group">
            <label>Content</label>
            <textarea name="value" rows="4" required placeholder="super-secret-value"></textarea>
        </div>
        <div class="form-group">
            <label>Version (Arbitrary string, changes trigger rotation)</label>
            <input type="text" name="version" value="v1">
        </div>
        <div class="form-group">
            <label>File Mode (decimal 420, or octal 0644)</label>
            <input type="text" name="mode" value="420" placeholder="420 is 0644 decimal">
        </div>
        <button type="submit">Save Secret</button>
    </form>

    <hr>
    <h3>Bulk Upload (JSON)</h3>
    <form action="/bulk" method="POST">
        <div class="form-group">
            <label>JSON Array [{"name": "x", "value": "y", "version": "1"}]</label>
            <textarea name="json_data" rows="4"></textarea>
        </div>
        <button type="submit">Upload Bulk</button>
    </form>
</body>
</html>
"#;

/// One table row of the admin page
#[derive(Debug, Serialize)]
struct SecretRow {
    name: String,
    value: String,
    version: String,
    mode: i32,
    mode_octal: String,
}

impl From<SecretRecord> for SecretRow {
    fn from(record: SecretRecord) -> Self {
        Self {
            value: record.value_lossy(),
            mode_octal: format!("{:04o}", record.mode),
            name: record.name,
            version: record.version,
            mode: record.mode,
        }
    }
}

/// Compiled admin page templates
#[derive(Debug)]
pub struct AdminRenderer {
    tera: Tera,
}

impl AdminRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(INDEX_TEMPLATE, ADMIN_HTML)
            .map_err(|e| Error::internal(format!("Failed to parse admin template: {}", e)))?;
        Ok(Self { tera })
    }

    /// Render the listing page for `records`
    pub fn render_index(&self, records: Vec<SecretRecord>) -> Result<String> {
        let rows: Vec<SecretRow> = records.into_iter().map(SecretRow::from).collect();
        let mut context = Context::new();
        context.insert("secrets", &rows);

        self.tera
            .render(INDEX_TEMPLATE, &context)
            .map_err(|e| Error::internal(format!("Failed to render admin page: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DEFAULT_FILE_MODE;

    #[test]
    fn test_render_empty_store() {
        let html = AdminRenderer::new().unwrap().render_index(Vec::new()).unwrap();
        assert!(html.contains("No secrets configured."));
    }

    #[test]
    fn test_render_lists_records() {
        let records = vec![SecretRecord::new("db.yaml", "user: admin", "v3", DEFAULT_FILE_MODE)];
        let html = AdminRenderer::new().unwrap().render_index(records).unwrap();

        assert!(html.contains("<td>db.yaml</td>"));
        assert!(html.contains("<td>user: admin</td>"));
        assert!(html.contains("<td>v3</td>"));
        assert!(html.contains("420 (0644)"));
        assert!(!html.contains("No secrets configured."));
    }

    #[test]
    fn test_render_escapes_values() {
        let records =
            vec![SecretRecord::new("x.html", "<script>alert(1)</script>", "v1", DEFAULT_FILE_MODE)];
        let html = AdminRenderer::new().unwrap().render_index(records).unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
