use std::error::Error;

use serde_json::json;
use tracing::info;
use trellis::config;
use trellis::middleware::{AccessLog, Chain, JsonBody};
use trellis::{HttpError, Request, Response, Router, Server, SuccessResponse};

fn main() -> Result<(), Box<dyn Error>> {
    config::load_dotenv()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);

    let mut app = Server::new();
    app.middleware(AccessLog);

    app.get(
        "/api/info",
        |_req: &mut Request, res: &mut Response, _next: &mut Chain| {
            SuccessResponse::ok(json!([
                {"name": "trellis", "version": env!("CARGO_PKG_VERSION")},
            ]))
            .send(res)
        },
    )?;

    app.post(
        "/api/echo",
        (
            JsonBody,
            |req: &mut Request, res: &mut Response, _next: &mut Chain| {
                let body = req.body().cloned().unwrap_or(serde_json::Value::Null);
                res.json(&json!({"received": body}))
            },
        ),
    )?;

    app.get(
        "/hello/:name",
        |req: &mut Request, res: &mut Response, _next: &mut Chain| {
            let name = req.param("name").unwrap_or("world");
            res.send(format!("hello {name}"))
        },
    )?;

    let mut api = Router::new();
    api.get(
        "/blogs",
        |_req: &mut Request, res: &mut Response, _next: &mut Chain| {
            res.json(&json!([{"title": "first post"}]))
        },
    )?;
    app.mount("/v1", api)?;

    app.error_handler(|err: HttpError, _req: &mut Request, res: &mut Response| {
        res.status(err.status()).json(&json!({
            "error": err.message(),
            "status": err.status(),
        }))
    });

    app.listen_with(port, || info!(port, "server is running"))?;
    Ok(())
}
