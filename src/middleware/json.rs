use http::Method;
use serde_json::Value;

use crate::error::HttpError;
use crate::http::{Request, Response};

use super::chain::Chain;
use super::core::{media_type, Handler};

/// Body-decoding middleware for `application/json` requests.
///
/// GET requests pass through untouched. For other methods the raw body is
/// parsed into the request's decoded body slot; a parse failure is a
/// bad-request error and any other content type is rejected as
/// unsupported-media-type, both routed through the chain's error path.
pub struct JsonBody;

impl Handler for JsonBody {
    fn handle(
        &self,
        req: &mut Request,
        res: &mut Response,
        next: &mut Chain,
    ) -> Result<(), HttpError> {
        if req.method() == Method::GET {
            return next.next(req, res);
        }
        let is_json = req
            .header("content-type")
            .map(media_type)
            .is_some_and(|media| media.eq_ignore_ascii_case("application/json"));
        if !is_json {
            return Err(HttpError::unsupported_media_type("Unsupported Media Type"));
        }
        let value: Value = serde_json::from_slice(req.raw_body())
            .map_err(|_| HttpError::bad_request("Invalid JSON format"))?;
        req.set_body(value);
        next.next(req, res)
    }
}
