//! Ordered route table
//!
//! Routes are registered once at startup and matched sequentially: the first
//! route whose method and pattern both match a request handles it. Each route
//! may carry a middleware chain that runs before its terminal handler.

use std::{
    convert::Infallible,
    fmt,
    future::Future,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::Request,
    http::{Extensions, HeaderMap, Method},
    response::{IntoResponse, Response},
};
use futures_util::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tower::Service;

use super::pattern::{PathParams, PathPattern};
use crate::error::ApiError;

/// Errors raised while assembling a route table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Route already registered: {method} {pattern}")]
    DuplicateRoute { method: Method, pattern: String },
}

/// Everything a middleware or handler sees for a single request
pub struct RequestContext<S> {
    request: Request,
    params: PathParams,
    state: S,
}

impl<S> RequestContext<S> {
    pub fn new(request: Request, params: PathParams, state: S) -> Self {
        Self {
            request,
            params,
            state,
        }
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    pub fn extensions(&self) -> &Extensions {
        self.request.extensions()
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        self.request.extensions_mut()
    }

    /// Value bound to a named path parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Terminal handler of a route
///
/// Implemented for every `Fn(RequestContext<S>) -> impl Future` whose output
/// implements [`IntoResponse`], so plain async functions can be registered.
pub trait Handler<S>: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext<S>) -> BoxFuture<'static, Response>;
}

impl<S, F, Fut> Handler<S> for F
where
    F: Fn(RequestContext<S>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, ctx: RequestContext<S>) -> BoxFuture<'static, Response> {
        let fut = self(ctx);
        async move { fut.await.into_response() }.boxed()
    }
}

/// Route middleware
///
/// A middleware either continues the chain with [`Next::run`] or returns its
/// own response, in which case nothing after it runs.
pub trait Middleware<S>: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext<S>, next: Next<S>) -> BoxFuture<'static, Response>;
}

impl<S, F, Fut> Middleware<S> for F
where
    F: Fn(RequestContext<S>, Next<S>) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoResponse,
{
    fn call(&self, ctx: RequestContext<S>, next: Next<S>) -> BoxFuture<'static, Response> {
        let fut = self(ctx, next);
        async move { fut.await.into_response() }.boxed()
    }
}

pub type SharedMiddleware<S> = Arc<dyn Middleware<S>>;

/// Wrap an async function as route middleware
pub fn from_fn<S, M>(middleware: M) -> SharedMiddleware<S>
where
    M: Middleware<S>,
{
    Arc::new(middleware)
}

/// The remainder of a route's middleware chain, ending in its handler
pub struct Next<S> {
    middleware: Arc<[SharedMiddleware<S>]>,
    handler: Arc<dyn Handler<S>>,
    position: usize,
}

impl<S: Send + 'static> Next<S> {
    pub async fn run(mut self, ctx: RequestContext<S>) -> Response {
        match self.middleware.get(self.position).cloned() {
            Some(middleware) => {
                self.position += 1;
                middleware.call(ctx, self).await
            }
            None => self.handler.call(ctx).await,
        }
    }
}

/// A single (method, pattern, middleware, handler) entry
pub struct Route<S> {
    method: Method,
    pattern: PathPattern,
    middleware: Arc<[SharedMiddleware<S>]>,
    handler: Arc<dyn Handler<S>>,
}

impl<S> Route<S> {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }
}

impl<S> Clone for Route<S> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            pattern: self.pattern.clone(),
            middleware: self.middleware.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<S> fmt::Debug for Route<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Ordered list of routes bound to a shared state value
///
/// Clones share the same route list, so the table can be handed to the
/// server as a [`tower::Service`].
pub struct RouteTable<S> {
    routes: Arc<Vec<Route<S>>>,
    state: S,
}

impl<S> RouteTable<S> {
    pub fn new(state: S) -> Self {
        Self {
            routes: Arc::new(Vec::new()),
            state,
        }
    }

    /// Append a route. Fails on a malformed pattern or when the same
    /// method and pattern shape is already registered.
    pub fn add_route<H, I>(
        &mut self,
        method: Method,
        pattern: &str,
        middleware: I,
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        H: Handler<S>,
        I: IntoIterator<Item = SharedMiddleware<S>>,
    {
        let pattern = PathPattern::parse(pattern)?;

        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.pattern.same_shape(&pattern))
        {
            return Err(RouteError::DuplicateRoute {
                method,
                pattern: pattern.as_str().to_string(),
            });
        }

        Arc::make_mut(&mut self.routes).push(Route {
            method,
            pattern,
            middleware: middleware.into_iter().collect(),
            handler: Arc::new(handler),
        });

        Ok(self)
    }

    /// Register a route without middleware
    pub fn route<H>(mut self, method: Method, pattern: &str, handler: H) -> Result<Self, RouteError>
    where
        H: Handler<S>,
    {
        self.add_route(method, pattern, Vec::new(), handler)?;
        Ok(self)
    }

    /// Register a route whose middleware runs in the given order before `handler`
    pub fn route_with<H, I>(
        mut self,
        method: Method,
        pattern: &str,
        middleware: I,
        handler: H,
    ) -> Result<Self, RouteError>
    where
        H: Handler<S>,
        I: IntoIterator<Item = SharedMiddleware<S>>,
    {
        self.add_route(method, pattern, middleware, handler)?;
        Ok(self)
    }

    /// First route matching `method` and `path`, with its bound parameters
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route<S>, PathParams)> {
        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| route.pattern.matches(path).map(|params| (route, params)))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route<S>> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<S> RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Dispatch a request through the matching route's chain
    ///
    /// Unmatched requests get the standard 404 error body.
    pub async fn handle(&self, request: Request) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        let Some((route, params)) = self.find(&method, &path) else {
            tracing::debug!(method = %method, path = %path, "No route matched");
            return ApiError::NotFound(format!("Cannot {} {}", method, path)).into_response();
        };

        tracing::debug!(
            method = %method,
            path = %path,
            pattern = %route.pattern,
            params = params.len(),
            "Route matched"
        );

        let next = Next {
            middleware: route.middleware.clone(),
            handler: route.handler.clone(),
            position: 0,
        };

        next.run(RequestContext::new(request, params, self.state.clone()))
            .await
    }
}

impl<S: Clone> Clone for RouteTable<S> {
    fn clone(&self) -> Self {
        Self {
            routes: self.routes.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S> fmt::Debug for RouteTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}

impl<S> Service<Request> for RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let table = self.clone();
        async move { Ok(table.handle(request).await) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(method: Method, uri: &str) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn echo_id(ctx: RequestContext<()>) -> String {
        format!("id={}", ctx.param("id").unwrap_or("-"))
    }

    async fn list(ctx: RequestContext<()>) -> String {
        format!("list params={}", ctx.params().len())
    }

    #[tokio::test]
    async fn test_dispatches_by_method_and_pattern() {
        let table = RouteTable::new(())
            .route(Method::GET, "/", list)
            .unwrap()
            .route(Method::GET, "/:id", echo_id)
            .unwrap();

        let response = table.handle(request(Method::GET, "/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "list params=0");

        let response = table.handle(request(Method::GET, "/42")).await;
        assert_eq!(body_text(response).await, "id=42");
    }

    #[tokio::test]
    async fn test_unmatched_request_is_not_found() {
        let table = RouteTable::new(())
            .route(Method::GET, "/:id", echo_id)
            .unwrap();

        let response = table.handle(request(Method::POST, "/42")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = table.handle(request(Method::GET, "/42/extra")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = table.handle(request(Method::HEAD, "/42")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_first_registered_route_wins() {
        let table = RouteTable::new(())
            .route(Method::GET, "/me", |_ctx: RequestContext<()>| async { "literal" })
            .unwrap()
            .route(Method::GET, "/:id", echo_id)
            .unwrap();

        let response = table.handle(request(Method::GET, "/me")).await;
        assert_eq!(body_text(response).await, "literal");

        let response = table.handle(request(Method::GET, "/you")).await;
        assert_eq!(body_text(response).await, "id=you");
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let result = RouteTable::new(())
            .route(Method::GET, "/:id", echo_id)
            .unwrap()
            .route(Method::GET, "/:user_id", echo_id);

        assert_eq!(
            result.unwrap_err(),
            RouteError::DuplicateRoute {
                method: Method::GET,
                pattern: "/:user_id".to_string(),
            }
        );

        // Same pattern under another method is fine
        let table = RouteTable::new(())
            .route(Method::GET, "/:id", echo_id)
            .unwrap()
            .route(Method::DELETE, "/:id", echo_id)
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let result = RouteTable::new(()).route(Method::GET, "no-slash", list);
        assert!(matches!(result, Err(RouteError::InvalidPattern { .. })));
    }

    #[tokio::test]
    async fn test_middleware_runs_in_order_before_handler() {
        async fn tag_first(mut ctx: RequestContext<()>, next: Next<()>) -> Response {
            ctx.extensions_mut().insert(vec!["first"]);
            next.run(ctx).await
        }

        async fn tag_second(mut ctx: RequestContext<()>, next: Next<()>) -> Response {
            if let Some(trail) = ctx.extensions_mut().get_mut::<Vec<&'static str>>() {
                trail.push("second");
            }
            next.run(ctx).await
        }

        async fn report(ctx: RequestContext<()>) -> String {
            ctx.extensions()
                .get::<Vec<&'static str>>()
                .map(|trail| trail.join(","))
                .unwrap_or_default()
        }

        let table = RouteTable::new(())
            .route_with(
                Method::GET,
                "/:id",
                [from_fn(tag_first), from_fn(tag_second)],
                report,
            )
            .unwrap();

        let response = table.handle(request(Method::GET, "/1")).await;
        assert_eq!(body_text(response).await, "first,second");
    }

    #[tokio::test]
    async fn test_rejecting_middleware_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));

        let handler_calls = calls.clone();
        let handler = move |_ctx: RequestContext<()>| {
            handler_calls.fetch_add(1, Ordering::SeqCst);
            async { "reached" }
        };

        let deny = |ctx: RequestContext<()>, next: Next<()>| async move {
            if ctx.param("id") == Some("allowed") {
                next.run(ctx).await
            } else {
                (StatusCode::UNAUTHORIZED, "denied").into_response()
            }
        };

        let table = RouteTable::new(())
            .route_with(Method::GET, "/:id", [from_fn(deny)], handler)
            .unwrap();

        let response = table.handle(request(Method::GET, "/blocked")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, "denied");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let response = table.handle(request(Method::GET, "/allowed")).await;
        assert_eq!(body_text(response).await, "reached");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_table_serves_as_tower_service() {
        use tower::ServiceExt;

        let table = RouteTable::new(())
            .route(Method::GET, "/:id", echo_id)
            .unwrap();

        let response = table.oneshot(request(Method::GET, "/7")).await.unwrap();
        assert_eq!(body_text(response).await, "id=7");
    }
}
