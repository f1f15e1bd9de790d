use std::fmt;

use http::Method;

use crate::error::HttpError;
use crate::http::{Request, Response};

use super::chain::Chain;
use super::core::Handler;

/// CORS configuration error, returned by [`Cors::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsConfigError {
    /// The wildcard origin `*` cannot be combined with credentials; exact
    /// origins are required when `allow_credentials` is set.
    WildcardWithCredentials,
}

impl fmt::Display for CorsConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorsConfigError::WildcardWithCredentials => write!(
                f,
                "CORS configuration error: cannot use the wildcard origin (*) \
                 together with credentials; list exact origins instead"
            ),
        }
    }
}

impl std::error::Error for CorsConfigError {}

/// Cross-origin resource sharing middleware.
///
/// When the request's `Origin` header matches the allow list, the
/// `Access-Control-Allow-*` headers are set on the response. `OPTIONS`
/// preflights are answered directly with `204 No Content`; every other
/// method continues down the chain.
#[derive(Debug)]
pub struct Cors {
    allowed_origins: Vec<String>,
    allowed_methods: Vec<String>,
    allowed_headers: Vec<String>,
    allow_credentials: bool,
}

impl Cors {
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_methods: Vec<String>,
        allowed_headers: Vec<String>,
        allow_credentials: bool,
    ) -> Result<Self, CorsConfigError> {
        if allow_credentials && allowed_origins.iter().any(|origin| origin == "*") {
            return Err(CorsConfigError::WildcardWithCredentials);
        }
        Ok(Self {
            allowed_origins,
            allowed_methods,
            allowed_headers,
            allow_credentials,
        })
    }

    /// Any origin, the common methods, `Content-Type` and `Authorization`
    /// headers, no credentials.
    pub fn permissive() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .map(String::from)
                .to_vec(),
            allowed_headers: ["Content-Type", "Authorization"].map(String::from).to_vec(),
            allow_credentials: false,
        }
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }
}

impl Default for Cors {
    fn default() -> Self {
        Self::permissive()
    }
}

impl Handler for Cors {
    fn handle(
        &self,
        req: &mut Request,
        res: &mut Response,
        next: &mut Chain,
    ) -> Result<(), HttpError> {
        let origin = req.header("origin").map(str::to_string);
        if let Some(origin) = origin {
            if self.origin_allowed(&origin) {
                res.set_header("Access-Control-Allow-Origin", origin);
                res.set_header(
                    "Access-Control-Allow-Methods",
                    self.allowed_methods.join(", "),
                );
                res.set_header(
                    "Access-Control-Allow-Headers",
                    self.allowed_headers.join(", "),
                );
                if self.allow_credentials {
                    res.set_header("Access-Control-Allow-Credentials", "true");
                }
            }
        }

        if req.method() == Method::OPTIONS {
            res.status(204).send("")
        } else {
            next.next(req, res)
        }
    }
}
