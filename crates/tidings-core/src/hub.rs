//! The hub ties the registry, the content provider and the channel resolver
//! together. One hub exists per process; sessions and the refresh scheduler
//! share it through an `Arc`.

use crate::channel::{ContentRequest, Resolver};
use crate::provider::{self, Content, ContentProvider, FetchError};
use crate::registry::Registry;
use std::sync::Arc;

/// Shared engine state.
pub struct Hub {
    registry: Registry,
    provider: Arc<dyn ContentProvider>,
    resolver: Resolver,
}

impl Hub {
    /// Create a hub resolving routes against the default site root.
    #[must_use]
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self::with_resolver(provider, Resolver::default())
    }

    /// Create a hub with a custom resolver.
    #[must_use]
    pub fn with_resolver(provider: Arc<dyn ContentProvider>, resolver: Resolver) -> Self {
        Self {
            registry: Registry::new(),
            provider,
            resolver,
        }
    }

    /// The channel registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The channel resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Fetch the content for a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails or reports the content missing.
    pub async fn fetch(&self, request: &ContentRequest) -> Result<Content, FetchError> {
        provider::fetch(self.provider.as_ref(), request).await
    }
}
