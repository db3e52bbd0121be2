//! Error types for sheetwatch-core

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("range is empty; expected A1 notation such as A1:C100")]
    EmptyRange,

    #[error("sheet name is empty")]
    EmptySheetName,

    #[error("unknown locale '{0}' (expected 'vi' or 'en')")]
    UnknownLocale(String),

    #[error("range spans {rows} rows; sheets hold at most {max}")]
    RangeTooLarge { rows: u64, max: u64 },
}
