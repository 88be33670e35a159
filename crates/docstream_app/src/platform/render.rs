use std::collections::HashMap;

use docstream_core::{
    AppViewModel, DocumentView, FileId, FileRowView, FileStatus, SelectedFileView, TableView,
};

/// Turns successive view models into terminal lines, printing only what changed.
#[derive(Debug, Default)]
pub struct Renderer {
    statuses: HashMap<FileId, FileStatus>,
    error: Option<String>,
    success: Option<String>,
}

impl Renderer {
    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let mut lines = Vec::new();

        for row in &view.files {
            if self.statuses.get(&row.file_id) != Some(&row.status) {
                lines.push(row_line(row));
                self.statuses.insert(row.file_id, row.status.clone());
            }
        }

        if view.error != self.error {
            if let Some(error) = &view.error {
                lines.push(format!("Error: {error}"));
            }
            self.error = view.error.clone();
        }
        if view.success != self.success {
            if let Some(success) = &view.success {
                lines.push(success.clone());
            }
            self.success = view.success.clone();
        }
        lines
    }
}

fn row_line(row: &FileRowView) -> String {
    let status = match &row.status {
        FileStatus::Processing => "Processing...".to_string(),
        FileStatus::Failed(error) => format!("Error: {error}"),
        FileStatus::Succeeded => "Processed successfully".to_string(),
        FileStatus::NoData => "No data or not processed".to_string(),
    };
    match &row.prompt {
        Some(prompt) => format!("[{}] {} ({prompt}): {status}", row.batch_id, row.file_name),
        None => format!("[{}] {}: {status}", row.batch_id, row.file_name),
    }
}

pub fn render_selected(selected: Option<&SelectedFileView>) -> String {
    let Some(selected) = selected else {
        return "Select a file to view its data, or upload new files.".to_string();
    };
    let body = match &selected.document {
        None => "No data or not processed".to_string(),
        Some(DocumentView::Json(text)) => text.clone(),
        Some(DocumentView::Table(table)) => render_table(table),
    };
    format!("== {} ==\n{body}", selected.file_name)
}

pub fn render_table(table: &TableView) -> String {
    match table {
        TableView::Rows { headers, rows } => grid(headers, rows),
        TableView::KeyValue(pairs) => {
            let headers = vec!["Key".to_string(), "Value".to_string()];
            let rows: Vec<Vec<String>> = pairs
                .iter()
                .map(|(key, value)| vec![key.clone(), value.clone()])
                .collect();
            grid(&headers, &rows)
        }
        TableView::EmptyArray => "The data array is empty.".to_string(),
        TableView::EmptyObject => "The data object is empty.".to_string(),
        TableView::Unsupported => "Data is not in a recognized format for table view.".to_string(),
    }
}

fn grid(headers: &[String], rows: &[Vec<String>]) -> String {
    // Multi-line cells (pretty JSON) are measured by their widest line.
    let cell_width = |cell: &str| cell.lines().map(|line| line.chars().count()).max().unwrap_or(0);
    let mut widths: Vec<usize> = headers.iter().map(|h| cell_width(h.as_str())).collect();
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(index) {
                *width = (*width).max(cell_width(cell.as_str()));
            }
        }
    }

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(grid_line(headers, &widths));
    out.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in rows {
        out.push(grid_line(row, &widths));
    }
    out.join("\n")
}

fn grid_line(cells: &[String], widths: &[usize]) -> String {
    let height = cells.iter().map(|cell| cell.lines().count()).max().unwrap_or(1).max(1);
    let columns: Vec<Vec<&str>> = cells.iter().map(|cell| cell.lines().collect()).collect();

    (0..height)
        .map(|line_index| {
            widths
                .iter()
                .enumerate()
                .map(|(col, &width)| {
                    let text = columns
                        .get(col)
                        .and_then(|lines| lines.get(line_index))
                        .copied()
                        .unwrap_or("");
                    format!("{text:<width$}")
                })
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
