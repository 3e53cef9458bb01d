//! Request routing
//!
//! The route table is an ordered list scanned front to back; the first
//! route whose method and path both match wins. Register literal routes
//! before any pattern that could also match them.
//!
//! # Request State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Parse the request from the input stream
//!        └──────┬──────┘
//!               │ Request parsed          (parse error ──┐)
//!               ▼                                        │
//!        ┌──────────────────┐                            │
//!        │   Routing        │ ← Match route, run handler │
//!        └──────┬───────────┘                            │
//!               │ Response built (success or error)      │
//!               ▼                                        │
//!        ┌──────────────────┐                            │
//!        │   Writing        │ ← ─────────────────────────┘
//!        └──────┬───────────┘
//!               │ Response sent
//!               ▼
//!             Done
//! ```

pub mod route;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::Config;
use crate::error::{ApiError, RoutingError, error_response};
use crate::http::parser::{ParseLimits, read_request};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

pub use route::{Handler, PathMatch, PathMatcher, Route, RouteError};

/// Settings the router applies to each exchange.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub limits: ParseLimits,
    pub write_timeout: Option<Duration>,
    pub expose_error_details: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            limits: ParseLimits::default(),
            write_timeout: None,
            expose_error_details: true,
        }
    }
}

impl From<&Config> for RouterOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            limits: ParseLimits::from(cfg),
            write_timeout: cfg.server.write_timeout(),
            expose_error_details: cfg.http.expose_error_details,
        }
    }
}

/// Immutable route table plus dispatch.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
    options: RouterOptions,
}

/// Collects routes in registration order.
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<Route>,
    options: RouterOptions,
}

enum ExchangeState {
    Reading,
    Routing(Request),
    Writing(Response),
    Done,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    /// Appends a prebuilt route.
    pub fn add(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Appends several routes, keeping their order.
    pub fn extend(mut self, routes: impl IntoIterator<Item = Route>) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Registers an exact-path route.
    pub fn route<F>(self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(&Request, Option<&str>) -> Result<Response, ApiError> + Send + Sync + 'static,
    {
        self.add(Route::literal(method, path, handler))
    }

    /// Registers a pattern route; fails if the pattern is invalid or does
    /// not have exactly one capture group.
    pub fn pattern<F>(self, method: Method, pattern: &str, handler: F) -> Result<Self, RouteError>
    where
        F: Fn(&Request, Option<&str>) -> Result<Response, ApiError> + Send + Sync + 'static,
    {
        Ok(self.add(Route::pattern(method, pattern, handler)?))
    }

    pub fn build(self) -> Router {
        for route in &self.routes {
            tracing::debug!(method = %route.method, path = %route.matcher, "Registered route");
        }
        Router {
            routes: self.routes,
            options: self.options,
        }
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Finds the first route matching `method` and `path`.
    pub fn find<'p>(
        &self,
        method: &Method,
        path: &'p str,
    ) -> Result<(&Route, Option<&'p str>), RoutingError> {
        self.routes
            .iter()
            .find_map(|route| {
                route.matches(method, path).map(|m| match m {
                    PathMatch::Exact => (route, None),
                    PathMatch::Captured(var) => (route, Some(var)),
                })
            })
            .ok_or_else(|| RoutingError::no_route(path))
    }

    /// Routes a parsed request and always produces a response.
    ///
    /// Handler errors and panics are converted by the error mapper.
    pub fn dispatch(&self, request: &Request) -> Response {
        let result = self.find(&request.method, &request.path).map_err(ApiError::from).and_then(
            |(route, var)| {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    route = %route.matcher,
                    var = ?var,
                    "Route matched"
                );
                let handler = route.handler.as_ref();
                match catch_unwind(AssertUnwindSafe(|| handler(request, var))) {
                    Ok(result) => result,
                    Err(panic) => Err(ApiError::Unexpected(anyhow::anyhow!(
                        "handler panicked: {}",
                        panic_message(&*panic)
                    ))),
                }
            },
        );

        match result {
            Ok(response) => response,
            Err(err) => self.error_response(&err),
        }
    }

    pub fn error_response(&self, err: &ApiError) -> Response {
        error_response(err, self.options.expose_error_details)
    }

    /// Reads one request from `input`, routes it, and writes exactly one
    /// response to `output`.
    ///
    /// Only a failure to write the response is returned; everything before
    /// that ends up in the response itself.
    pub async fn handle_request<R, W>(&self, input: &mut R, output: &mut W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let mut state = ExchangeState::Reading;

        loop {
            state = match state {
                ExchangeState::Reading => match read_request(input, &self.options.limits).await {
                    Ok(request) => ExchangeState::Routing(request),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to parse request");
                        ExchangeState::Writing(self.error_response(&ApiError::from(e)))
                    }
                },

                ExchangeState::Routing(request) => {
                    let response = self.dispatch(&request);
                    tracing::info!(
                        method = %request.method,
                        path = %request.path,
                        status = response.status.as_u16(),
                        "Request handled"
                    );
                    ExchangeState::Writing(response)
                }

                ExchangeState::Writing(response) => {
                    let mut writer = ResponseWriter::new(&response);
                    match self.options.write_timeout {
                        Some(limit) => tokio::time::timeout(limit, writer.write_to_stream(output))
                            .await
                            .map_err(|_| anyhow::anyhow!("timed out writing response"))??,
                        None => writer.write_to_stream(output).await?,
                    }
                    ExchangeState::Done
                }

                ExchangeState::Done => break,
            };
        }

        Ok(())
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
