//! Serializable `{data, error}` result shape.

use crate::error::{DbResult, ErrorInfo};
use serde::Serialize;

/// Wire form of an operation result: exactly one of `data` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
}

impl<T> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ErrorInfo) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    /// Flatten a [`DbResult`]; `include_original` controls `ErrorInfo::original_error`.
    pub fn from_result(result: DbResult<T>, include_original: bool) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_info(include_original)),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
