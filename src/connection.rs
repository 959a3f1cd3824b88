//! Driver and connection entry points
//!
//! ```no_run
//! use dataservice_client::{ClientConfig, Credentials, Driver, LocalServiceRegistry};
//!
//! let driver = Driver::new(ClientConfig::default(), LocalServiceRegistry::new());
//! let connection = driver
//!     .connect(
//!         "jdbc:pdi://localhost:9080/kettle?webappname=pentaho-di",
//!         Credentials::new("admin", "password"),
//!     )
//!     .unwrap();
//! for row in connection.execute_query("SELECT * FROM sequence", 10).unwrap() {
//!     println!("{}", row.unwrap());
//! }
//! ```

use crate::capabilities::{self, Capability, FixedValue, Operation};
use crate::catalog::{DatabaseMetadata, ServiceInformation};
use crate::config::ClientConfig;
use crate::descriptor::{ConnectionDescriptor, Credentials, BASE_URL};
use crate::error::ClientResult;
use crate::local::{LocalGateway, LocalServiceRegistry};
use crate::protocol::RowStream;
use crate::transport::{DataServiceClient, HttpExecutor, QueryRequest, RemoteClient, ResponseBody};
use std::sync::Arc;

pub const DRIVER_NAME: &str = "PDI Data Services client";

/// Opens connections for `jdbc:pdi://` addresses
#[derive(Debug, Clone)]
pub struct Driver {
    config: ClientConfig,
    registry: LocalServiceRegistry,
}

impl Driver {
    pub fn new(config: ClientConfig, registry: LocalServiceRegistry) -> Self {
        Driver { config, registry }
    }

    pub fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    pub fn major_version(&self) -> u32 {
        env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0)
    }

    pub fn minor_version(&self) -> u32 {
        env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0)
    }

    /// Prefix check only; the address is not parsed
    pub fn accepts_address(&self, address: &str) -> bool {
        address.starts_with(BASE_URL)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &LocalServiceRegistry {
        &self.registry
    }

    /// Parse the address, build the backend and check the service is reachable
    pub fn connect(&self, address: &str, credentials: Credentials) -> ClientResult<Connection> {
        let connection = self.open(address, credentials)?;
        connection.test_connection()?;
        tracing::info!(
            host = connection.descriptor().host(),
            port = connection.descriptor().port(),
            local = connection.descriptor().is_local(),
            "connected"
        );
        Ok(connection)
    }

    /// Like [`Driver::connect`] without the reachability check
    pub fn open(&self, address: &str, credentials: Credentials) -> ClientResult<Connection> {
        let descriptor = Arc::new(ConnectionDescriptor::parse(address, credentials)?);
        let client: Arc<dyn DataServiceClient> = if descriptor.is_local() {
            Arc::new(LocalGateway::new(
                Arc::clone(&descriptor),
                self.registry.clone(),
            ))
        } else {
            Arc::new(RemoteClient::from_config(
                Arc::clone(&descriptor),
                &self.config.http,
            )?)
        };
        Ok(Connection::new(descriptor, client))
    }

    /// Open a connection that sends its HTTP traffic through `executor`.
    ///
    /// `local=true` addresses still use the registry.
    pub fn open_with_executor(
        &self,
        address: &str,
        credentials: Credentials,
        executor: Arc<dyn HttpExecutor>,
    ) -> ClientResult<Connection> {
        let descriptor = Arc::new(ConnectionDescriptor::parse(address, credentials)?);
        let client: Arc<dyn DataServiceClient> = if descriptor.is_local() {
            Arc::new(LocalGateway::new(
                Arc::clone(&descriptor),
                self.registry.clone(),
            ))
        } else {
            Arc::new(RemoteClient::new(
                Arc::clone(&descriptor),
                executor,
                self.config.http.max_redirects,
            ))
        };
        Ok(Connection::new(descriptor, client))
    }
}

/// An open connection to one data-service server.
///
/// Row streams returned by queries own their response body and do not borrow
/// the connection.
pub struct Connection {
    descriptor: Arc<ConnectionDescriptor>,
    client: Arc<dyn DataServiceClient>,
}

impl Connection {
    pub fn new(descriptor: Arc<ConnectionDescriptor>, client: Arc<dyn DataServiceClient>) -> Self {
        Connection { descriptor, client }
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn test_connection(&self) -> ClientResult<()> {
        self.client.status()
    }

    /// Reachability check that never fails
    pub fn is_valid(&self) -> bool {
        match self.test_connection() {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(error = %e, kind = e.kind(), "connection_invalid");
                false
            }
        }
    }

    pub fn execute_query(&self, sql: &str, max_rows: usize) -> ClientResult<RowStream<ResponseBody>> {
        self.execute(QueryRequest::new(sql).with_max_rows(max_rows))
    }

    pub fn execute(&self, request: QueryRequest) -> ClientResult<RowStream<ResponseBody>> {
        let body = self.client.query(&request)?;
        RowStream::open(body, request.max_rows)
    }

    pub fn service_information(&self) -> ClientResult<Vec<ServiceInformation>> {
        self.client.service_information()
    }

    pub fn metadata(&self) -> DatabaseMetadata {
        DatabaseMetadata::new(Arc::clone(&self.descriptor), Arc::clone(&self.client))
    }

    pub fn capability(&self, op: Operation) -> Capability {
        capabilities::capability_of(op)
    }

    /// See [`capabilities::check`]
    pub fn check(&self, op: Operation) -> ClientResult<Option<FixedValue>> {
        capabilities::check(op)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
