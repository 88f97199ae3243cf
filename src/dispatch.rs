use crate::params::ParamMap;
use crate::pattern::{PathParams, PathPattern};
use crate::resource::Method;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use serde_json::json;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{BoxError, Service};
use tracing::{debug, error};

/// Outcome of one route's middleware.
///
/// Redesign of the router escape sentinel: every composing layer inspects
/// this enum instead of sniffing a magic continuation value.
pub enum RouteFlow {
    /// The route ran to completion; no other route may observe the request.
    Done(Response),
    /// The route declined the request. The request is handed back so the
    /// dispatcher can try the next structural candidate.
    Retry(Request<Body>),
    /// Downstream failure. Propagated verbatim, never treated as a retry.
    Failed(BoxError),
}

/// Per-operation request handler produced by the handler factory.
pub type Middleware = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, RouteFlow> + Send + Sync>;

/// Wrap a plain async closure into the boxed middleware type.
pub fn middleware_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RouteFlow> + Send + 'static,
{
    Arc::new(move |req| -> BoxFuture<'static, RouteFlow> { Box::pin(f(req)) })
}

/// One bound route: a verb, a compiled path pattern, and the middleware the
/// handler factory produced for it.
pub(crate) struct CompiledRoute {
    pub(crate) method: Method,
    pub(crate) pattern: PathPattern,
    pub(crate) middleware: Middleware,
}

/// Terminal outcome of dispatching one request.
pub enum Dispatch {
    /// A route matched and ran to completion.
    Handled(Response),
    /// No route completed. The request is returned untouched so an outer
    /// router can keep going; `into_response` turns it into a 404.
    NotFound(Request<Body>),
}

impl Dispatch {
    pub fn into_response(self) -> Response {
        match self {
            Dispatch::Handled(response) => response,
            Dispatch::NotFound(_) => (
                StatusCode::NOT_FOUND,
                axum::Json(json!({ "error": "Route not found" })),
            )
                .into_response(),
        }
    }
}

/// The compiled resource tree: an ordered route table plus the aggregated
/// parameter map, immutable after compilation.
pub struct CompiledDispatcher {
    routes: Vec<CompiledRoute>,
    parameters: ParamMap,
}

impl CompiledDispatcher {
    pub(crate) fn new(routes: Vec<CompiledRoute>, parameters: ParamMap) -> Self {
        Self { routes, parameters }
    }

    /// Every path parameter declared anywhere in the compiled tree.
    pub fn parameters(&self) -> &ParamMap {
        &self.parameters
    }

    /// The bound routes, in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> {
        self.routes
            .iter()
            .map(|route| (route.method, route.pattern.as_str()))
    }

    /// Route a request to the first matching bound route.
    ///
    /// Candidates are attempted strictly in declaration order. A route that
    /// returns [`RouteFlow::Retry`] hands the request back and the search
    /// continues; the first route to complete ends the search. A request
    /// that exhausts every candidate comes back as [`Dispatch::NotFound`].
    pub async fn dispatch(&self, mut req: Request<Body>) -> Result<Dispatch, BoxError> {
        for route in &self.routes {
            if !route.method.matches(req.method()) {
                continue;
            }
            let Some(params) = route.pattern.matches(req.uri().path()) else {
                continue;
            };

            debug!(method = %route.method, path = %route.pattern, "route matched");
            req.extensions_mut().insert(params);

            match (route.middleware)(req).await {
                RouteFlow::Done(response) => return Ok(Dispatch::Handled(response)),
                RouteFlow::Retry(returned) => {
                    debug!(method = %route.method, path = %route.pattern, "route declined, trying next candidate");
                    req = returned;
                }
                RouteFlow::Failed(err) => return Err(err),
            }
        }

        debug!(method = %req.method(), path = %req.uri().path(), "no route matched");
        req.extensions_mut().remove::<PathParams>();
        Ok(Dispatch::NotFound(req))
    }

    /// Wrap the dispatcher in a [`tower::Service`] for mounting, e.g. as an
    /// axum fallback service.
    pub fn into_service(self) -> DispatcherService {
        DispatcherService {
            inner: Arc::new(self),
        }
    }
}

/// [`tower::Service`] adapter around a shared dispatcher.
///
/// Unmatched requests become a JSON 404; downstream errors become a JSON
/// 500 so the service itself is infallible.
#[derive(Clone)]
pub struct DispatcherService {
    inner: Arc<CompiledDispatcher>,
}

impl Service<Request<Body>> for DispatcherService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move {
            let response = match inner.dispatch(req).await {
                Ok(outcome) => outcome.into_response(),
                Err(err) => {
                    error!("Request failed: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        axum::Json(json!({ "error": err.to_string() })),
                    )
                        .into_response()
                }
            };
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamMap;

    fn empty_dispatcher() -> CompiledDispatcher {
        CompiledDispatcher::new(Vec::new(), ParamMap::new())
    }

    fn request(method: &str, path: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_dispatcher_is_not_found() {
        let dispatcher = empty_dispatcher();
        let outcome = dispatcher.dispatch(request("GET", "/anything")).await.unwrap();
        assert!(matches!(outcome, Dispatch::NotFound(_)));
    }

    #[tokio::test]
    async fn test_not_found_becomes_404() {
        let response = Dispatch::NotFound(request("GET", "/missing")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_service_converts_errors_to_500() {
        let route = CompiledRoute {
            method: Method::Get,
            pattern: PathPattern::compile("/boom", &ParamMap::new()),
            middleware: middleware_fn(|_req| async {
                RouteFlow::Failed("downstream exploded".into())
            }),
        };
        let mut service =
            CompiledDispatcher::new(vec![route], ParamMap::new()).into_service();

        let response = service.call(request("GET", "/boom")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
