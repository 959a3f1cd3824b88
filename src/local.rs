//! Local bypass
//!
//! When an address carries `local=true` the connection skips HTTP and talks
//! to a data service running in the same process. The embedding application
//! publishes that service into a [`LocalServiceRegistry`], and the registry
//! handle is passed to the driver at construction.

use crate::catalog::ServiceInformation;
use crate::descriptor::ConnectionDescriptor;
use crate::error::{ClientError, ClientResult};
use crate::transport::{DataServiceClient, QueryRequest, ResponseBody};
use arc_swap::ArcSwapOption;
use std::fmt;
use std::sync::Arc;

/// Publication slot for the in-process service.
///
/// Clones share the slot. Reads are lock-free.
#[derive(Clone)]
pub struct LocalServiceRegistry {
    // ArcSwap needs a sized payload, hence the box
    slot: Arc<ArcSwapOption<Box<dyn DataServiceClient>>>,
}

impl LocalServiceRegistry {
    pub fn new() -> Self {
        LocalServiceRegistry {
            slot: Arc::new(ArcSwapOption::empty()),
        }
    }

    /// Registry with a service already published
    pub fn with_service(service: impl DataServiceClient + 'static) -> Self {
        let registry = LocalServiceRegistry::new();
        registry.register(service);
        registry
    }

    /// Publish the in-process service, replacing any previous one
    pub fn register(&self, service: impl DataServiceClient + 'static) {
        let service: Box<dyn DataServiceClient> = Box::new(service);
        self.slot.store(Some(Arc::new(service)));
        tracing::info!("local_service_registered");
    }

    pub fn unregister(&self) {
        if self.slot.swap(None).is_some() {
            tracing::info!("local_service_unregistered");
        }
    }

    pub fn is_registered(&self) -> bool {
        self.slot.load().is_some()
    }

    /// The published service, or `LocalServiceUnavailable`
    pub fn service(&self) -> ClientResult<Arc<Box<dyn DataServiceClient>>> {
        self.slot
            .load_full()
            .ok_or(ClientError::LocalServiceUnavailable)
    }
}

impl Default for LocalServiceRegistry {
    fn default() -> Self {
        LocalServiceRegistry::new()
    }
}

impl fmt::Debug for LocalServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalServiceRegistry")
            .field("registered", &self.is_registered())
            .finish()
    }
}

/// Backend that forwards to the registered in-process service.
///
/// The service is looked up on every call, so a registration made after the
/// connection was opened is picked up.
pub struct LocalGateway {
    descriptor: Arc<ConnectionDescriptor>,
    registry: LocalServiceRegistry,
}

impl LocalGateway {
    pub fn new(descriptor: Arc<ConnectionDescriptor>, registry: LocalServiceRegistry) -> Self {
        LocalGateway {
            descriptor,
            registry,
        }
    }
}

impl DataServiceClient for LocalGateway {
    fn status(&self) -> ClientResult<()> {
        self.registry.service()?.status()
    }

    fn service_information(&self) -> ClientResult<Vec<ServiceInformation>> {
        self.registry.service()?.service_information()
    }

    fn query(&self, request: &QueryRequest) -> ClientResult<ResponseBody> {
        let service = self.registry.service()?;
        tracing::debug!(max_rows = request.max_rows, "local_query");
        service.query(&request.with_descriptor_defaults(&self.descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Credentials;

    struct Healthy;

    impl DataServiceClient for Healthy {
        fn status(&self) -> ClientResult<()> {
            Ok(())
        }

        fn service_information(&self) -> ClientResult<Vec<ServiceInformation>> {
            Ok(vec![ServiceInformation::new("s", Vec::new())])
        }

        fn query(&self, _request: &QueryRequest) -> ClientResult<ResponseBody> {
            Ok(Box::new(std::io::empty()))
        }
    }

    fn gateway(registry: &LocalServiceRegistry) -> LocalGateway {
        let descriptor = ConnectionDescriptor::parse(
            "jdbc:pdi://localhost:9080/kettle?local=true",
            Credentials::anonymous(),
        )
        .unwrap();
        LocalGateway::new(Arc::new(descriptor), registry.clone())
    }

    #[test]
    fn test_unset_registry_fails() {
        let registry = LocalServiceRegistry::new();
        let gateway = gateway(&registry);
        assert!(matches!(
            gateway.status(),
            Err(ClientError::LocalServiceUnavailable)
        ));
        assert!(matches!(
            gateway.service_information(),
            Err(ClientError::LocalServiceUnavailable)
        ));
    }

    #[test]
    fn test_registration_is_shared_by_clones() {
        let registry = LocalServiceRegistry::new();
        let gateway = gateway(&registry);

        registry.register(Healthy);
        assert!(gateway.status().is_ok());
        assert_eq!(gateway.service_information().unwrap()[0].name, "s");

        registry.unregister();
        assert!(!registry.is_registered());
        assert!(gateway.status().is_err());
    }
}
