use serde::Serialize;
use weave::{HttpRoute, HttpRouteSpec, RouteKey};

/// `apiVersion` of emitted routes.
pub const GATEWAY_API_VERSION: &str = "gateway.networking.k8s.io/v1";

/// `kind` of emitted routes.
pub const HTTP_ROUTE_KIND: &str = "HTTPRoute";

/// Serializable `HTTPRoute` document borrowing a converted route.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest<'a> {
    pub api_version: &'static str,
    pub kind: &'static str,
    pub metadata: &'a RouteKey,
    pub spec: &'a HttpRouteSpec,
}

impl<'a> From<&'a HttpRoute> for Manifest<'a> {
    fn from(route: &'a HttpRoute) -> Self {
        Self {
            api_version: GATEWAY_API_VERSION,
            kind: HTTP_ROUTE_KIND,
            metadata: &route.metadata,
            spec: &route.spec,
        }
    }
}
