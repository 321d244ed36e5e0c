//! Axum integration utilities.
//!
//! Thin edge layer translating engine outcomes to HTTP statuses: 401 for
//! authentication failures, 403 for permission denials, 429 for rate-limit
//! rejections. The engine itself never formats responses.

use std::future::{Future, poll_fn};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use crate::engine::Engine;
use crate::permission::Permission;
use crate::rate_limit::RateLimiter;
use crate::store::{RoleStore, TokenVerifier, UserStore};
use crate::types::UserRecord;

use ::axum::body::Body;
use ::axum::extract::{ConnectInfo, FromRequestParts};
use ::axum::http::header::AUTHORIZATION;
use ::axum::http::request::Parts;
use ::axum::http::{HeaderMap, Request, StatusCode};
use ::axum::response::{IntoResponse, Response};
use ::tower::{Layer, Service};

const ANONYMOUS_RATE_KEY: &str = "anonymous";

/// Authenticated user attached to request extensions by [`AuthLayer`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "missing auth context"))
    }
}

/// Middleware layer that authenticates the bearer token and attaches
/// [`CurrentUser`] to the request.
#[derive(Debug)]
pub struct AuthLayer<R, U, V> {
    engine: Arc<Engine<R, U, V>>,
}

impl<R, U, V> AuthLayer<R, U, V> {
    /// Creates a new authentication layer.
    pub fn new(engine: Arc<Engine<R, U, V>>) -> Self {
        Self { engine }
    }
}

impl<R, U, V> Clone for AuthLayer<R, U, V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<R, U, V, Inner> Layer<Inner> for AuthLayer<R, U, V> {
    type Service = AuthService<Inner, R, U, V>;

    fn layer(&self, inner: Inner) -> Self::Service {
        AuthService {
            inner,
            engine: Arc::clone(&self.engine),
        }
    }
}

/// Middleware service produced by [`AuthLayer`].
#[derive(Debug)]
pub struct AuthService<Inner, R, U, V> {
    inner: Inner,
    engine: Arc<Engine<R, U, V>>,
}

impl<Inner: Clone, R, U, V> Clone for AuthService<Inner, R, U, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<Inner, R, U, V> Service<Request<Body>> for AuthService<Inner, R, U, V>
where
    Inner: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
    R: RoleStore + 'static,
    U: UserStore + 'static,
    V: TokenVerifier + 'static,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let engine = Arc::clone(&self.engine);

        Box::pin(async move {
            let Some(token) = bearer_token(req.headers()) else {
                return Ok((StatusCode::UNAUTHORIZED, "invalid token").into_response());
            };
            match engine.authenticate(&token).await {
                Ok(user) => {
                    req.extensions_mut().insert(CurrentUser(user));
                    poll_fn(|cx| inner.poll_ready(cx)).await?;
                    inner.call(req).await
                }
                // Uniform response regardless of cause.
                Err(_) => Ok((StatusCode::UNAUTHORIZED, "invalid token").into_response()),
            }
        })
    }
}

/// Middleware layer that requires one permission, evaluated against the
/// already-attached [`CurrentUser`]. Compose after [`AuthLayer`].
#[derive(Debug)]
pub struct RequirePermissionLayer<R, U, V> {
    engine: Arc<Engine<R, U, V>>,
    permission: Permission,
}

impl<R, U, V> RequirePermissionLayer<R, U, V> {
    /// Creates a new permission-gate layer.
    pub fn new(engine: Arc<Engine<R, U, V>>, permission: Permission) -> Self {
        Self { engine, permission }
    }
}

impl<R, U, V> Clone for RequirePermissionLayer<R, U, V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            permission: self.permission.clone(),
        }
    }
}

impl<R, U, V, Inner> Layer<Inner> for RequirePermissionLayer<R, U, V> {
    type Service = RequirePermissionService<Inner, R, U, V>;

    fn layer(&self, inner: Inner) -> Self::Service {
        RequirePermissionService {
            inner,
            engine: Arc::clone(&self.engine),
            permission: self.permission.clone(),
        }
    }
}

/// Middleware service produced by [`RequirePermissionLayer`].
#[derive(Debug)]
pub struct RequirePermissionService<Inner, R, U, V> {
    inner: Inner,
    engine: Arc<Engine<R, U, V>>,
    permission: Permission,
}

impl<Inner: Clone, R, U, V> Clone for RequirePermissionService<Inner, R, U, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            engine: Arc::clone(&self.engine),
            permission: self.permission.clone(),
        }
    }
}

impl<Inner, R, U, V> Service<Request<Body>> for RequirePermissionService<Inner, R, U, V>
where
    Inner: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
    R: RoleStore + 'static,
    U: UserStore + 'static,
    V: TokenVerifier + 'static,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut inner = self.inner.clone();
        let engine = Arc::clone(&self.engine);
        let permission = self.permission.clone();

        Box::pin(async move {
            let Some(CurrentUser(user)) = req.extensions().get::<CurrentUser>().cloned() else {
                return Ok((StatusCode::UNAUTHORIZED, "missing auth context").into_response());
            };
            if engine.has_permission(&user, &permission).await {
                poll_fn(|cx| inner.poll_ready(cx)).await?;
                inner.call(req).await
            } else {
                Ok((StatusCode::FORBIDDEN, "forbidden").into_response())
            }
        })
    }
}

/// Middleware layer applying a sliding-window rate limit per caller.
///
/// The key is the authenticated user id when [`AuthLayer`] ran earlier in
/// the stack, else the client socket address when the server was started
/// with `Router::into_make_service_with_connect_info`, else a shared
/// constant. Rejections answer 429 and are not recorded against the caller.
#[derive(Debug, Clone)]
pub struct RateLimitLayer {
    limiter: RateLimiter,
    max: usize,
    window: Duration,
}

impl RateLimitLayer {
    /// Creates a rate-limit layer sharing `limiter`'s state.
    pub fn new(limiter: RateLimiter, max: usize, window: Duration) -> Self {
        Self {
            limiter,
            max,
            window,
        }
    }
}

impl<Inner> Layer<Inner> for RateLimitLayer {
    type Service = RateLimitService<Inner>;

    fn layer(&self, inner: Inner) -> Self::Service {
        RateLimitService {
            inner,
            limiter: self.limiter.clone(),
            max: self.max,
            window: self.window,
        }
    }
}

/// Middleware service produced by [`RateLimitLayer`].
#[derive(Debug, Clone)]
pub struct RateLimitService<Inner> {
    inner: Inner,
    limiter: RateLimiter,
    max: usize,
    window: Duration,
}

impl<Inner> Service<Request<Body>> for RateLimitService<Inner>
where
    Inner: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let key = req
            .extensions()
            .get::<CurrentUser>()
            .map(|CurrentUser(user)| user.id.as_str().to_string())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.to_string())
            })
            .unwrap_or_else(|| ANONYMOUS_RATE_KEY.to_string());
        let allowed = self.limiter.allow(&key, self.max, self.window);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !allowed {
                return Ok((StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded").into_response());
            }
            poll_fn(|cx| inner.poll_ready(cx)).await?;
            inner.call(req).await
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
