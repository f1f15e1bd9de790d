use serde::Serialize;

use super::response::Response;
use crate::error::HttpError;

/// Structured success envelope: `{"message", "data", "statusCode"}`.
///
/// ```rust,ignore
/// SuccessResponse::ok(items).send(res)
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse<T> {
    message: String,
    data: T,
    #[serde(rename = "statusCode")]
    status: u16,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self::with_status(message, data, 200)
    }

    pub fn with_status(message: impl Into<String>, data: T, status: u16) -> Self {
        Self {
            message: message.into(),
            data,
            status,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::new("Success", data)
    }

    pub fn created(data: T) -> Self {
        Self::with_status("Created", data, 201)
    }

    /// Terminal write of the envelope as JSON with its status code.
    pub fn send(&self, res: &mut Response) -> Result<(), HttpError> {
        res.status(self.status).json(self)
    }
}
