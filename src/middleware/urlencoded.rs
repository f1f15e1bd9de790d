use http::Method;
use serde_json::{Map, Value};

use crate::error::HttpError;
use crate::http::{Request, Response};

use super::chain::Chain;
use super::core::{media_type, Handler};

/// Body-decoding middleware for `application/x-www-form-urlencoded`
/// requests.
///
/// Decodes percent-escapes and `+` spaces into a string map in the
/// request's body slot. Requests with any other content type pass through
/// unchanged so the middleware can sit in front of routes that also accept
/// JSON.
pub struct Urlencoded;

impl Handler for Urlencoded {
    fn handle(
        &self,
        req: &mut Request,
        res: &mut Response,
        next: &mut Chain,
    ) -> Result<(), HttpError> {
        if req.method() == Method::GET {
            return next.next(req, res);
        }
        let is_form = req
            .header("content-type")
            .map(media_type)
            .is_some_and(|media| media.eq_ignore_ascii_case("application/x-www-form-urlencoded"));
        if is_form {
            let mut fields = Map::new();
            for (key, value) in url::form_urlencoded::parse(req.raw_body()) {
                fields.insert(key.into_owned(), Value::String(value.into_owned()));
            }
            req.set_body(Value::Object(fields));
        }
        next.next(req, res)
    }
}
