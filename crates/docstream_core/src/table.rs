use serde_json::Value;

/// Tabular rendering of a decoded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableView {
    /// Array of objects: one column per key of the first element.
    Rows {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Single object: one `(key, value)` row per field.
    KeyValue(Vec<(String, String)>),
    EmptyArray,
    EmptyObject,
    /// Scalars and arrays of non-objects have no table form.
    Unsupported,
}

pub fn derive_table(value: &Value) -> TableView {
    match value {
        Value::Array(items) => {
            let Some(first) = items.first() else {
                return TableView::EmptyArray;
            };
            let Value::Object(first) = first else {
                return TableView::Unsupported;
            };
            let headers: Vec<String> = first.keys().cloned().collect();
            let rows = items
                .iter()
                .map(|item| {
                    headers
                        .iter()
                        .map(|header| item.get(header).map(compact_cell).unwrap_or_default())
                        .collect()
                })
                .collect();
            TableView::Rows { headers, rows }
        }
        Value::Object(fields) if fields.is_empty() => TableView::EmptyObject,
        Value::Object(fields) => TableView::KeyValue(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), pretty_cell(value)))
                .collect(),
        ),
        _ => TableView::Unsupported,
    }
}

fn compact_cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn pretty_cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}
