use std::path::Path;

use calamine::{Data, Reader, Xlsx, XlsxError, open_workbook};
use tracing::debug;

use crate::{ClientError, ClientResult};

/// The first worksheet of a workbook, split into its header row and the
/// data rows below it.
#[derive(Debug, Clone, Default)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Data>>,
    /// 1-based sheet row number of the header row.
    pub header_row: usize,
}

impl SheetTable {
    pub fn new(headers: Vec<&str>, rows: Vec<Vec<Data>>) -> Self {
        Self {
            headers: headers.into_iter().map(str::to_string).collect(),
            rows,
            header_row: 1,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// 1-based sheet row number of the data row at `index`.
    pub fn sheet_row_number(&self, index: usize) -> usize {
        self.header_row + 1 + index
    }
}

pub fn load_first_sheet(path: &Path) -> ClientResult<SheetTable> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|error: XlsxError| ClientError::parse_failure(path, &error.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ClientError::schema_violation(path, "the workbook has no worksheets"))?
        .map_err(|error| ClientError::parse_failure(path, &error.to_string()))?;

    let header_row = range
        .start()
        .map(|(row, _)| row as usize + 1)
        .unwrap_or(1);

    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|cells| cells.iter().map(header_name).collect::<Vec<String>>())
        .unwrap_or_default();
    let rows = rows.map(<[Data]>::to_vec).collect::<Vec<Vec<Data>>>();

    debug!(
        file = %path.display(),
        columns = headers.len(),
        rows = rows.len(),
        "loaded worksheet"
    );

    Ok(SheetTable {
        headers,
        rows,
        header_row,
    })
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(value) => value.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}
