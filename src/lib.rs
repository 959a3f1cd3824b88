//! # PDI Data Service Client
//!
//! Thin client for remote data services addressed with `jdbc:pdi://` URLs.
//! It parses connection addresses, sends SQL over HTTP to a data-service
//! server, decodes the streamed row results, and presents the server's
//! service listing as a read-only relational catalog.
//!
//! ## Pipeline
//!
//! ```text
//! address + credentials
//!     ↓
//! [descriptor]          → ConnectionDescriptor
//!     ↓
//! [connection::Driver]  → Connection (HTTP backend, or local bypass)
//!     ↓
//! [transport]           → status / listServices / sql requests
//!     ↓
//! [protocol]            → RowStream of typed rows
//! [catalog]             → ServiceInformation → schemas, tables, columns
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dataservice_client::{ClientConfig, Credentials, Driver, LocalServiceRegistry};
//!
//! let driver = Driver::new(ClientConfig::load()?, LocalServiceRegistry::new());
//! let connection = driver.connect(
//!     "jdbc:pdi://localhost:9080/kettle?webappname=pentaho-di",
//!     Credentials::new("admin", "password"),
//! )?;
//!
//! for table in connection.metadata().tables(None, None)? {
//!     println!("{}", table.name);
//! }
//!
//! let rows = connection.execute_query("SELECT * FROM sequence", 100)?;
//! for row in rows {
//!     println!("{}", row?);
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `descriptor` | Address parsing, credentials, endpoints |
//! | `transport` | HTTP requests, redirects, status mapping |
//! | `protocol` | Row stream decoding and encoding |
//! | `catalog` | Service listings and the virtual catalog |
//! | `capabilities` | Read-only operation policy, feature table |
//! | `local` | In-process service bypass |
//! | `connection` | Driver and connection entry points |

// Connection setup
pub mod config; // Configuration system
pub mod connection; // Driver and Connection
pub mod descriptor; // jdbc:pdi:// address parsing
pub mod error; // Error taxonomy

// Wire
pub mod protocol; // Row stream format
pub mod transport; // HTTP backend

// Catalog and policy
pub mod capabilities;
pub mod catalog;

// Local bypass
pub mod local;

// Value type system
pub mod value;

pub use capabilities::{Capability, Feature, FixedValue, Operation};
pub use catalog::{DatabaseMetadata, MetadataKind, MetadataResult, ServiceField, ServiceInformation};
pub use config::ClientConfig;
pub use connection::{Connection, Driver};
pub use descriptor::{ConnectionDescriptor, Credentials, DebugOptions};
pub use error::{ClientError, ClientResult};
pub use local::{LocalGateway, LocalServiceRegistry};
pub use protocol::{RowStream, RowStreamWriter, StreamHeader};
pub use transport::{
    DataServiceClient, HttpExecutor, HttpRequest, HttpResponse, QueryRequest, RemoteClient,
    ResponseBody,
};
pub use value::{FieldMeta, FieldType, Row, RowMeta, Value};
