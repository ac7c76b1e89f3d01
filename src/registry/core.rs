use crate::resource::RestResource;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Reasons a resource cannot be registered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The declared name is not of the form `"<group>.<item>"`
    #[error("malformed resource name '{name}': expected \"<group>.<item>\"")]
    MalformedName {
        /// The rejected name
        name: String,
    },
}

/// Derive the endpoint path for a declared resource name.
///
/// Splits on the last `.`: `"user.profile"` → `/user/profile/`.
///
/// # Errors
///
/// Returns [`RegistrationError::MalformedName`] when the name has no `.` or
/// either side of the last `.` is empty.
pub fn endpoint_for(name: &str) -> Result<String, RegistrationError> {
    match name.rsplit_once('.') {
        Some((group, item)) if !group.is_empty() && !item.is_empty() => {
            Ok(format!("/{group}/{item}/"))
        }
        _ => Err(RegistrationError::MalformedName {
            name: name.to_owned(),
        }),
    }
}

/// Concurrent table of endpoint path → resource.
#[derive(Default)]
pub struct ResourceRegistry {
    endpoints: RwLock<HashMap<String, Arc<dyn RestResource>>>,
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("endpoints", &self.endpoints())
            .finish()
    }
}

impl ResourceRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resource` at the endpoint derived from its declared name.
    ///
    /// A later registration for the same endpoint replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::MalformedName`] without touching the table
    /// when the declared name cannot be turned into an endpoint.
    pub fn register(&self, resource: Arc<dyn RestResource>) -> Result<String, RegistrationError> {
        let endpoint = match endpoint_for(resource.resource()) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!(error = %e, "Rejected REST resource registration");
                return Err(e);
            }
        };

        let mut endpoints = self.endpoints.write();
        let name = resource.resource().to_owned();
        if endpoints.insert(endpoint.clone(), resource).is_some() {
            warn!(
                endpoint = %endpoint,
                resource = %name,
                "Replaced existing REST resource"
            );
        }
        info!(
            endpoint = %endpoint,
            resource = %name,
            total_endpoints = endpoints.len(),
            "Registered REST resource"
        );
        Ok(endpoint)
    }

    /// Resource registered at exactly `endpoint`, which must already be normalized.
    #[must_use]
    pub fn lookup(&self, endpoint: &str) -> Option<Arc<dyn RestResource>> {
        let found = self.endpoints.read().get(endpoint).map(Arc::clone);
        if found.is_none() {
            debug!(endpoint = %endpoint, "No REST resource registered");
        }
        found
    }

    /// Registered endpoints, sorted.
    #[must_use]
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<String> = self.endpoints.read().keys().cloned().collect();
        endpoints.sort_unstable();
        endpoints
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.read().is_empty()
    }
}
