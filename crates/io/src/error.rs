use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    /// File extension with no reader or writer.
    #[error("unsupported file type '.{extension}' (expected xlsx, xls, xlsb, ods, csv or tsv)")]
    Unsupported { extension: String },

    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The content could not be parsed as a spreadsheet or delimited text.
    #[error("invalid file: {0}")]
    Read(String),

    #[error("workbook contains no sheets")]
    EmptyWorkbook,

    #[error("cannot write output: {0}")]
    Write(String),
}
