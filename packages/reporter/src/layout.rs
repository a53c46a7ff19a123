//! Fixed positions of the values read from the Judge Center tables.

/// Rows before the first data row in every grid.
pub const HEADER_ROWS: usize = 1;

/// Row clicked to reset the list view before paging starts.
pub const RESET_ROW: usize = 1;

/// Offset from a list row index to its control index in the postback
/// target. The header is row 0 (`ctl02`), so the first data row is `ctl03`.
pub const TARGET_ROW_OFFSET: usize = 2;

/// Columns of the investigation list on the `select` tab.
pub mod list {
    pub const ID: usize = 0;
    pub const ENTERED_BY: usize = 3;
    pub const SUBJECT: usize = 4;
    pub const EVENT_REL: usize = 5;
    pub const EVENT_TYPE: usize = 6;
    pub const CITY: usize = 7;
    pub const COUNTRY: usize = 8;
    pub const INFRACTION: usize = 9;
    pub const STATUS: usize = 10;
    pub const RESOLUTION: usize = 11;
}

/// Rows of the summary table on the investigation `view` tab. Each value is
/// in the row's first cell.
pub mod summary {
    pub const COLUMN: usize = 0;

    pub const ID: usize = 0;
    pub const INCIDENT_DATE: usize = 1;
    pub const ENTERED_DATE: usize = 2;
    pub const SANCTIONING_NUMBER: usize = 3;
    pub const ENTERED_BY_DCI_NUMBER: usize = 5;
    pub const SUBJECT_DCI_NUMBER: usize = 7;
    pub const SUBJECT_ROLE: usize = 8;
}

/// Columns of the witness grid.
pub mod witness {
    pub const NAME: usize = 0;
    pub const DCI_NUMBER: usize = 1;
    pub const ROLE: usize = 2;
}

/// Columns of the infraction grid.
pub mod infraction {
    pub const LABEL: usize = 0;
}

/// Columns of the statement grid, and lines of its info cell.
pub mod statement {
    pub const INFO: usize = 1;
    pub const BODY: usize = 2;

    pub const WITNESS_NAME_LINE: usize = 0;
    pub const ENTERED_BY_LINE: usize = 2;
}
