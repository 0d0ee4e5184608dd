//! pmsg 错误类型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PmsgError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid file name: {0:?}")]
    InvalidFilename(String),
    #[error("content too large: {len} bytes needs {chunks} chunks (max {max})")]
    ContentTooLarge { len: usize, chunks: usize, max: usize },
}
