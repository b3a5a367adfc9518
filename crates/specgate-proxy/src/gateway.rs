//! The forwarding gateway and its route registration.
//!
//! `ForwardingGateway` owns the route table, the backend configuration and a
//! single pooled HTTP client. All three are read-only after construction, so
//! one `Arc<ForwardingGateway>` is shared by every request task without
//! locking.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::http::header::ALLOW;
use axum::http::{Method, StatusCode};
use axum::routing::{MethodFilter, MethodRouter};
use reqwest::Client;
use reqwest::redirect::Policy;
use specgate_core::{GatewayConfig, HttpMethod, RouteTable};
use tracing::info;

use crate::error::GatewayError;

/// Idle connections kept per backend host.
const POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Build the shared outbound client.
///
/// Redirects are not followed so that 3xx responses reach the caller
/// unchanged, and environment proxies are ignored since the backend is a
/// direct upstream.
pub fn build_client(config: &GatewayConfig) -> Result<Client, GatewayError> {
    let client = Client::builder()
        .timeout(config.timeout)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .redirect(Policy::none())
        .no_proxy()
        .build()?;
    Ok(client)
}

/// Reverse proxy forwarding OpenAPI-declared routes to one backend.
pub struct ForwardingGateway {
    config: GatewayConfig,
    /// `backend_url[:port]`, computed once.
    authority: String,
    pub(crate) client: Client,
    routes: RouteTable,
}

impl ForwardingGateway {
    /// Create a gateway with its own pooled client.
    pub fn new(config: GatewayConfig, routes: RouteTable) -> Result<Self, GatewayError> {
        let client = build_client(&config)?;
        Ok(Self::with_client(config, routes, client))
    }

    /// Create a gateway around an existing client. The client's own timeout
    /// applies; `config.timeout` is not re-applied.
    #[must_use]
    pub fn with_client(config: GatewayConfig, routes: RouteTable, client: Client) -> Self {
        Self {
            authority: config.backend_authority(),
            config,
            client,
            routes,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Install one dispatch entry per route definition.
    ///
    /// Definitions sharing a path template are merged into one method router,
    /// each method with its own handler bound to that method. Calling this
    /// more than once yields independent routers; serve only one of them.
    pub fn register_routes(self: &Arc<Self>) -> Result<Router, GatewayError> {
        let mut by_path: BTreeMap<String, Vec<HttpMethod>> = BTreeMap::new();
        let mut shapes: HashMap<String, String> = HashMap::new();

        for route in &self.routes {
            let template = route.template();
            check_unique_params(template.raw(), template.param_names())?;

            match shapes.get(&template.shape()) {
                Some(existing) if *existing != template.raw() => {
                    return Err(GatewayError::ConflictingTemplates {
                        first: existing.clone(),
                        second: template.raw().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    shapes.insert(template.shape(), template.raw().to_string());
                }
            }

            by_path
                .entry(template.dispatch_path())
                .or_default()
                .push(route.method());

            info!(
                method = %route.method(),
                pattern = %route.routing_pattern(),
                "Added route: {} {}",
                route.method(),
                route.routing_pattern()
            );
        }

        // Literal segments may legitimately start with ':' or '*' in OpenAPI.
        let router = by_path
            .into_iter()
            .fold(Router::new().without_v07_checks(), |router, (path, methods)| {
                router.route(&path, self.method_router(&methods))
            });
        Ok(router)
    }

    /// One handler per declared method. Every other method, including HEAD
    /// on a path that declares only GET, gets a 405 whose `Allow` header
    /// lists exactly the declared methods.
    fn method_router(self: &Arc<Self>, methods: &[HttpMethod]) -> MethodRouter {
        let allow = methods
            .iter()
            .copied()
            .map(HttpMethod::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let reject = move || {
            let allow = allow.clone();
            async move { (StatusCode::METHOD_NOT_ALLOWED, [(ALLOW, allow)]) }
        };

        let mut router = MethodRouter::new().fallback(reject.clone());
        for &method in methods {
            let gateway = Arc::clone(self);
            let handler = move |request: Request| {
                let gateway = Arc::clone(&gateway);
                async move { gateway.forward(method, request).await }
            };
            router = router.on(method_filter(method), handler);
        }

        // The router would otherwise answer HEAD with the GET handler.
        if methods.contains(&HttpMethod::Get) && !methods.contains(&HttpMethod::Head) {
            router = router.on(MethodFilter::HEAD, reject);
        }
        router
    }
}

fn check_unique_params<'a>(
    path: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), GatewayError> {
    let mut seen = Vec::new();
    for name in names {
        if seen.contains(&name) {
            return Err(GatewayError::DuplicateParameter {
                path: path.to_string(),
                name: name.to_string(),
            });
        }
        seen.push(name);
    }
    Ok(())
}

pub(crate) fn method_filter(method: HttpMethod) -> MethodFilter {
    match method {
        HttpMethod::Get => MethodFilter::GET,
        HttpMethod::Post => MethodFilter::POST,
        HttpMethod::Put => MethodFilter::PUT,
        HttpMethod::Patch => MethodFilter::PATCH,
        HttpMethod::Delete => MethodFilter::DELETE,
        HttpMethod::Options => MethodFilter::OPTIONS,
        HttpMethod::Head => MethodFilter::HEAD,
        HttpMethod::Trace => MethodFilter::TRACE,
    }
}

pub(crate) fn http_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Trace => Method::TRACE,
    }
}
