//! Default Ingress → `HTTPRoute` translation.
//!
//! One route per (namespace, host), one rule per distinct match key, plain
//! backend references and no filters. The merge engine enriches these routes
//! afterwards.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use k8s_openapi::api::networking::v1::{HTTPIngressPath, Ingress};
use weave::{
    path_only_match, BackendRef, FieldError, HostKey, HttpRoute, MatchKey, ParentRef, PathType,
    RawPathEntry, RouteKey, RouteRule, ServiceBackend, SourceRecord, SourceRef,
};

use crate::store::{ingress_class, name_of, namespace_of};
use crate::IngressStore;

/// Path used when an Ingress path omits one.
pub const DEFAULT_PATH: &str = "/";

/// Host slug used for rules without a host.
pub const ALL_HOSTS: &str = "all-hosts";

/// Route name for a rule group: `<group name>-<host slug>`.
///
/// The slug replaces every run of non-alphanumeric characters with `-` and
/// trims leading and trailing dashes.
pub fn route_name(group: &str, host: &str) -> String {
    let mut slug = String::with_capacity(host.len());
    let mut dash = false;
    for c in host.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            dash = false;
        } else if !dash {
            slug.push('-');
            dash = true;
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        format!("{group}-{ALL_HOSTS}")
    } else {
        format!("{group}-{slug}")
    }
}

/// Ingress rules sharing a (namespace, host).
#[derive(Debug)]
struct RuleGroup {
    key: HostKey,
    /// Name of the first Ingress contributing to the group.
    name: String,
    class: Option<String>,
    rules: Vec<(MatchKey, Vec<BackendRef>)>,
}

impl RuleGroup {
    fn add(&mut self, entry: &RawPathEntry) {
        let key = entry.match_key();
        let backend = entry.backend.to_backend_ref();
        match self.rules.iter_mut().find(|(k, _)| *k == key) {
            Some((_, backends)) => {
                if !backends.contains(&backend) {
                    backends.push(backend);
                }
            }
            None => self.rules.push((key, vec![backend])),
        }
    }

    fn into_route(self) -> HttpRoute {
        let mut route = HttpRoute::new(RouteKey::new(
            self.key.namespace.clone(),
            route_name(&self.name, &self.key.host),
        ));
        if let Some(class) = self.class {
            route.spec.parent_refs.push(ParentRef { name: class });
        }
        if !self.key.host.is_empty() {
            route.spec.hostnames.push(self.key.host.clone());
        }
        route.rules_mut().extend(self.rules.into_iter().map(|(key, backends)| {
            RouteRule::new(
                vec![path_only_match(key.path_type.to_path_match(&key.path))],
                Vec::new(),
                backends,
            )
        }));
        route
    }
}

/// Skeleton routes plus the raw path entries they were built from.
#[derive(Debug, Default)]
pub struct Skeleton {
    /// Routes by key.
    pub routes: BTreeMap<RouteKey, HttpRoute>,
    /// Path entries in store order.
    pub entries: Vec<RawPathEntry>,
    /// Paths that could not be translated.
    pub errors: Vec<FieldError>,
    route_keys: HashMap<HostKey, RouteKey>,
}

impl Skeleton {
    /// Translate every Ingress of `store`.
    pub fn build(store: &IngressStore) -> Self {
        let mut skeleton = Self::default();
        let mut groups: Vec<RuleGroup> = Vec::new();
        let mut index: HashMap<HostKey, usize> = HashMap::new();

        for ingress in store.iter() {
            let record = Arc::new(source_record(ingress));
            let class = ingress_class(ingress).map(str::to_owned);
            let Some(spec) = &ingress.spec else {
                continue;
            };
            if spec.default_backend.is_some() {
                tracing::debug!(ingress = %record.id, "default backend is not converted");
            }

            for (i, rule) in spec.rules.iter().flatten().enumerate() {
                let key = HostKey {
                    namespace: record.id.namespace.clone(),
                    host: rule.host.clone().unwrap_or_default(),
                };
                let idx = *index.entry(key.clone()).or_insert_with(|| {
                    groups.push(RuleGroup {
                        key: key.clone(),
                        name: record.id.name.clone(),
                        class: class.clone(),
                        rules: Vec::new(),
                    });
                    groups.len() - 1
                });

                let Some(http) = &rule.http else {
                    continue;
                };
                for (j, path) in http.paths.iter().enumerate() {
                    let field = format!("spec.rules[{i}].http.paths[{j}]");
                    match raw_entry(&record, &key.host, path, &field) {
                        Ok(entry) => {
                            groups[idx].add(&entry);
                            skeleton.entries.push(entry);
                        }
                        Err(err) => skeleton.errors.push(err.with_source(&record.id).logged()),
                    }
                }
            }
        }

        for group in groups {
            let host_key = group.key.clone();
            let route = group.into_route();
            skeleton.route_keys.insert(host_key, route.key().clone());
            skeleton.routes.insert(route.key().clone(), route);
        }
        skeleton
    }

    /// Key of the route built for `host`.
    pub fn route_key(&self, host: &HostKey) -> Option<&RouteKey> {
        self.route_keys.get(host)
    }
}

fn source_record(ingress: &Ingress) -> SourceRecord {
    SourceRecord {
        id: SourceRef::new(namespace_of(ingress), name_of(ingress)),
        annotations: ingress.metadata.annotations.clone().unwrap_or_default(),
    }
}

fn raw_entry(
    record: &Arc<SourceRecord>,
    host: &str,
    path: &HTTPIngressPath,
    field: &str,
) -> Result<RawPathEntry, FieldError> {
    let path_type = PathType::parse(&path.path_type).ok_or_else(|| {
        FieldError::not_supported(format!("{field}.pathType"), path.path_type.clone(), "unknown path type")
    })?;

    let Some(service) = &path.backend.service else {
        return Err(FieldError::not_supported(
            format!("{field}.backend"),
            "resource",
            "only service backends are supported",
        ));
    };

    let port = match &service.port {
        None => None,
        Some(port) => match (port.number, port.name.as_deref()) {
            (Some(number), _) => Some(u16::try_from(number).map_err(|_| {
                FieldError::invalid(
                    format!("{field}.backend.service.port.number"),
                    number.to_string(),
                    "port out of range",
                )
            })?),
            (None, Some(name)) => {
                return Err(FieldError::not_supported(
                    format!("{field}.backend.service.port.name"),
                    name,
                    format!("named ports not supported: {name}"),
                ));
            }
            (None, None) => None,
        },
    };

    Ok(RawPathEntry {
        source: Arc::clone(record),
        host: host.to_owned(),
        path: path
            .path
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_owned()),
        path_type,
        backend: ServiceBackend::new(service.name.clone(), port),
    })
}
