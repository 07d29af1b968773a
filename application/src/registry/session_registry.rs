//! Session registry: the set of open tool sessions and their merged catalog.
//!
//! The registry is built once by [`SessionRegistry::open_all`] and is
//! immutable afterwards. It owns:
//!
//! - the sessions, in registration order (configuration order)
//! - the flat tool catalog, one descriptor per distinct tool name
//! - the route table, tool name to owning session
//! - the resource catalog, keyed by [`ResourceKey`]
//!
//! When two sessions advertise the same tool name the configured
//! [`CollisionPolicy`] decides the owner.

use super::error::{DispatchError, RegistryError, ResourceReadError};
use crate::config::RegistryParams;
use crate::ports::tool_session::{ToolSession, ToolSessionConnector, ToolSessionError};
use futures::future::join_all;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use toolhost_domain::{
    BackendSpec, CollisionPolicy, ResourceCatalog, ResourceContents, ResourceDescriptor,
    ResourceKey, ToolCallResult, ToolDescriptor,
};
use tracing::{debug, info, warn};

/// A resource together with the backend that serves it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredResource {
    pub backend: String,
    pub descriptor: ResourceDescriptor,
}

/// Named collection of open tool sessions
pub struct SessionRegistry {
    sessions: Vec<Arc<dyn ToolSession>>,
    tools: Vec<ToolDescriptor>,
    routes: HashMap<String, usize>,
    resources: Vec<RegisteredResource>,
    resource_catalog: ResourceCatalog<usize>,
    closed: AtomicBool,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("backends", &self.backend_names())
            .field("tools", &self.tools.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}

impl SessionRegistry {
    /// Open every backend concurrently.
    ///
    /// Startup is all-or-nothing: if any backend fails to open or to list
    /// its tools, every session that did open is closed before the error is
    /// returned.
    pub async fn open_all(
        connector: &dyn ToolSessionConnector,
        backends: &BTreeMap<String, BackendSpec>,
        params: RegistryParams,
    ) -> Result<Self, RegistryError> {
        info!(count = backends.len(), "Opening tool backends");

        let attempts = join_all(backends.iter().map(|(name, spec)| async move {
            debug!(backend = %name, command = %spec, "Starting backend");
            (name.clone(), connector.open(name, spec).await)
        }))
        .await;

        let mut sessions = Vec::with_capacity(attempts.len());
        let mut failure: Option<RegistryError> = None;
        for (backend, attempt) in attempts {
            match attempt {
                Ok(session) => sessions.push(session),
                Err(source) => {
                    warn!(backend = %backend, error = %source, "Backend failed to start");
                    if failure.is_none() {
                        failure = Some(RegistryError::Startup { backend, source });
                    }
                }
            }
        }

        if let Some(error) = failure {
            close_sessions(&sessions).await;
            return Err(error);
        }

        Self::from_sessions(sessions, params).await
    }

    /// Build a registry from sessions that are already open.
    ///
    /// Sessions are registered in the given order. On error every session is
    /// closed.
    pub async fn from_sessions(
        sessions: Vec<Arc<dyn ToolSession>>,
        params: RegistryParams,
    ) -> Result<Self, RegistryError> {
        let listings = join_all(sessions.iter().map(|session| session.list_tools())).await;

        let mut catalogs = Vec::with_capacity(listings.len());
        for (session, listing) in sessions.iter().zip(listings) {
            match listing {
                Ok(tools) => catalogs.push(tools),
                Err(source) => {
                    let backend = session.name().to_string();
                    close_sessions(&sessions).await;
                    return Err(RegistryError::Catalog { backend, source });
                }
            }
        }

        let (tools, routes) = match merge_catalogs(&sessions, catalogs, params.collision_policy) {
            Ok(merged) => merged,
            Err(error) => {
                close_sessions(&sessions).await;
                return Err(error);
            }
        };

        let (resources, resource_catalog) = collect_resources(&sessions).await;

        info!(
            backends = sessions.len(),
            tools = tools.len(),
            resources = resources.len(),
            "Tool backends ready"
        );

        Ok(Self {
            sessions,
            tools,
            routes,
            resources,
            resource_catalog,
            closed: AtomicBool::new(false),
        })
    }

    /// Flat tool catalog, one descriptor per distinct name
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Name of the backend that owns `tool`
    pub fn owner_of(&self, tool: &str) -> Option<&str> {
        self.routes
            .get(tool)
            .map(|&index| self.sessions[index].name())
    }

    /// `(tool, backend)` pairs in catalog order
    pub fn routes(&self) -> Vec<(&str, &str)> {
        self.tools
            .iter()
            .filter_map(|tool| {
                self.owner_of(&tool.name)
                    .map(|backend| (tool.name.as_str(), backend))
            })
            .collect()
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.sessions.iter().map(|s| s.name()).collect()
    }

    pub fn resources(&self) -> &[RegisteredResource] {
        &self.resources
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Route a tool call to the session that owns the tool.
    ///
    /// `Null` arguments are sent as an empty object; any other non-object
    /// value is rejected without reaching the backend.
    pub async fn dispatch(
        &self,
        tool: &str,
        arguments: Value,
    ) -> Result<ToolCallResult, DispatchError> {
        if self.is_closed() {
            return Err(DispatchError::Closed);
        }

        let index = *self
            .routes
            .get(tool)
            .ok_or_else(|| DispatchError::UnknownTool(tool.to_string()))?;

        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(DispatchError::InvalidArguments {
                    tool: tool.to_string(),
                    message: format!("expected a JSON object, got {}", other),
                });
            }
        };

        let session = &self.sessions[index];
        debug!(tool = %tool, backend = %session.name(), "Dispatching tool call");

        session
            .invoke(tool, arguments)
            .await
            .map_err(|error| DispatchError::from_session(tool, session.name(), error))
    }

    /// Read a resource from the backend that advertised it.
    pub async fn read_resource(
        &self,
        uri: &str,
    ) -> Result<Vec<ResourceContents>, ResourceReadError> {
        if self.is_closed() {
            return Err(ResourceReadError::Closed);
        }

        let key = ResourceKey::parse(uri)?;
        let index = *self.resource_catalog.resolve(&key)?;
        let resource = &self.resources[index];
        let session = self
            .sessions
            .iter()
            .find(|s| s.name() == resource.backend)
            .ok_or_else(|| ResourceReadError::Session {
                backend: resource.backend.clone(),
                source: ToolSessionError::Connection("backend is not registered".to_string()),
            })?;

        session
            .read_resource(&resource.descriptor.uri)
            .await
            .map_err(|source| ResourceReadError::Session {
                backend: resource.backend.clone(),
                source,
            })
    }

    /// Close every session.
    ///
    /// Failures are collected and do not stop the remaining sessions from
    /// closing. Calls after the first return `Ok(())` immediately.
    pub async fn close_all(&self) -> Result<(), RegistryError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let failures = close_sessions(&self.sessions).await;
        if failures.is_empty() {
            info!("All tool backends closed");
            Ok(())
        } else {
            Err(RegistryError::Shutdown(failures))
        }
    }
}

/// Close sessions concurrently, returning the failures.
async fn close_sessions(sessions: &[Arc<dyn ToolSession>]) -> Vec<(String, ToolSessionError)> {
    let results = join_all(sessions.iter().map(|session| session.close())).await;

    sessions
        .iter()
        .zip(results)
        .filter_map(|(session, result)| {
            result.err().map(|error| {
                warn!(backend = %session.name(), error = %error, "Backend failed to close");
                (session.name().to_string(), error)
            })
        })
        .collect()
}

/// Flatten per-session catalogs into one list and a route table.
///
/// A name keeps the catalog position where it first appeared; the policy
/// decides which descriptor and owner it ends up with.
fn merge_catalogs(
    sessions: &[Arc<dyn ToolSession>],
    catalogs: Vec<Vec<ToolDescriptor>>,
    policy: CollisionPolicy,
) -> Result<(Vec<ToolDescriptor>, HashMap<String, usize>), RegistryError> {
    let mut tools: Vec<ToolDescriptor> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut routes: HashMap<String, usize> = HashMap::new();

    for (index, catalog) in catalogs.into_iter().enumerate() {
        for tool in catalog {
            let Some(&position) = positions.get(&tool.name) else {
                positions.insert(tool.name.clone(), tools.len());
                routes.insert(tool.name.clone(), index);
                tools.push(tool);
                continue;
            };

            let previous = sessions[routes[&tool.name]].name().to_string();
            let current = sessions[index].name().to_string();
            match policy {
                CollisionPolicy::LastWins => {
                    warn!(tool = %tool.name, replaced = %previous, owner = %current, "Duplicate tool name, last registered wins");
                    routes.insert(tool.name.clone(), index);
                    tools[position] = tool;
                }
                CollisionPolicy::FirstWins => {
                    warn!(tool = %tool.name, ignored = %current, owner = %previous, "Duplicate tool name, first registered wins");
                }
                CollisionPolicy::Reject => {
                    return Err(RegistryError::DuplicateTool {
                        tool: tool.name,
                        first: previous,
                        second: current,
                    });
                }
            }
        }
    }

    Ok((tools, routes))
}

/// List resources of every session. Failures only drop that session's
/// resources.
async fn collect_resources(
    sessions: &[Arc<dyn ToolSession>],
) -> (Vec<RegisteredResource>, ResourceCatalog<usize>) {
    let listings = join_all(sessions.iter().map(|session| session.list_resources())).await;

    let mut resources = Vec::new();
    let mut keyed = Vec::new();
    for (session, listing) in sessions.iter().zip(listings) {
        let descriptors = match listing {
            Ok(descriptors) => descriptors,
            Err(error) => {
                warn!(backend = %session.name(), error = %error, "Failed to list resources");
                continue;
            }
        };

        for descriptor in descriptors {
            match ResourceKey::parse(&descriptor.uri) {
                Ok(key) => keyed.push((key, resources.len())),
                Err(error) => debug!(error = %error, "Resource is listed but not addressable"),
            }
            resources.push(RegisteredResource {
                backend: session.name().to_string(),
                descriptor,
            });
        }
    }

    (resources, keyed.into_iter().collect())
}
