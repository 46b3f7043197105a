use crate::error::DecodeError;
use crate::error::ResultMessage;
use crate::table::Value;
use crate::workbook::cell::Cell;

/// Cells of one worksheet, collected sparsely as the reader encounters them.
pub(crate) struct Grid {
    pub(crate) name: String,
    /// (row, col, value) of every non-blank cell
    cells: Vec<(usize, usize, Value)>,
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Grid {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Converts and stores a cell. Blank cells are not kept.
    pub(crate) fn push(&mut self, cell: Cell) -> Result<(), DecodeError> {
        let value = cell.to_value().with_prefix(&format!("Cell {}", cell.reference()))?;
        if !value.is_blank() {
            self.update_bound(cell.row, cell.col);
            self.cells.push((cell.row, cell.col, value));
        }
        Ok(())
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        self.row_lower_bound = Some(self.row_lower_bound.map_or(row, |lower| lower.min(row)));
        self.row_upper_bound = Some(self.row_upper_bound.map_or(row, |upper| upper.max(row)));
        self.col_lower_bound = Some(self.col_lower_bound.map_or(col, |lower| lower.min(col)));
        self.col_upper_bound = Some(self.col_upper_bound.map_or(col, |upper| upper.max(col)));
    }

    /// Height of the used range, in rows.
    pub(crate) fn height(&self) -> usize {
        match self.row_lower_bound.zip(self.row_upper_bound) {
            Some((lower, upper)) => upper - lower + 1,
            None => 0,
        }
    }

    /// Width of the used range, in columns.
    pub(crate) fn width(&self) -> usize {
        match self.col_lower_bound.zip(self.col_upper_bound) {
            Some((lower, upper)) => upper - lower + 1,
            None => 0,
        }
    }

    /// Dense rows of the used range, top to bottom. Rows without any
    /// non-blank cell are not materialized; columns are relative to the
    /// leftmost used column.
    pub(crate) fn into_rows(mut self) -> Vec<Vec<Value>> {
        let col_lower = self.col_lower_bound.unwrap_or(0);
        self.cells.sort_by_key(|(row, col, _)| (*row, *col));

        let mut rows: Vec<(usize, Vec<Value>)> = Vec::new();
        for (row, col, value) in self.cells {
            let offset = col - col_lower;
            if rows.last().map_or(true, |(last, _)| *last != row) {
                rows.push((row, Vec::new()));
            }
            let values = &mut rows.last_mut().expect("row just pushed").1;
            if values.len() <= offset {
                values.resize(offset + 1, Value::Empty);
            }
            values[offset] = value;
        }
        rows.into_iter().map(|(_, values)| values).collect()
    }
}
