// 📤 Result Projector - labels back onto the original table shape
//
// Pure augmentation: original columns and row order are kept as-is, two
// columns are appended (or refreshed when the input already carries them).

use crate::resolver::Resolution;
use crate::table::Table;

pub const ACCOUNT_TYPE_COLUMN: &str = "Account Type";
pub const PROPOSED_PARENT_COLUMN: &str = "Proposed Parent Account ID";

/// One output row per input row. Rows excluded from resolution get empty
/// label cells; their problems are in `resolution.errors`.
pub fn project(table: &Table, resolution: &Resolution) -> Table {
    let mut headers = table.headers.clone();
    let type_column = column_or_append(&mut headers, ACCOUNT_TYPE_COLUMN);
    let parent_column = column_or_append(&mut headers, PROPOSED_PARENT_COLUMN);

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let mut out = row.clone();
            out.resize(headers.len(), String::new());

            let (account_type, parent) = match resolution.label(row_index) {
                Some(label) => (
                    label.account_type.as_str().to_string(),
                    label.proposed_parent_id.clone().unwrap_or_default(),
                ),
                None => (String::new(), String::new()),
            };
            out[type_column] = account_type;
            out[parent_column] = parent;
            out
        })
        .collect();

    Table::new(headers, rows)
}

/// Remove the augmentation columns, giving back the original table shape
pub fn strip_augmentation(table: &Table) -> Table {
    let keep: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.as_str() != ACCOUNT_TYPE_COLUMN && h.as_str() != PROPOSED_PARENT_COLUMN)
        .map(|(i, _)| i)
        .collect();

    Table::new(
        keep.iter().map(|&i| table.headers[i].clone()).collect(),
        table
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row.get(i).cloned().unwrap_or_default()).collect())
            .collect(),
    )
}

fn column_or_append(headers: &mut Vec<String>, name: &str) -> usize {
    match headers.iter().position(|h| h == name) {
        Some(pos) => pos,
        None => {
            headers.push(name.to_string());
            headers.len() - 1
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
