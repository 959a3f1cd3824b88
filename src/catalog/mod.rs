//! Service catalog: listing documents and the virtual relational catalog
//! built from them.

pub mod metadata;
pub mod services;

pub use metadata::{
    ColumnRow, DatabaseMetadata, MetadataKind, MetadataResult, NamePattern, SchemaRow, TableRow,
    SCHEMA_NAME,
};
pub use services::{parse_service_list, ServiceField, ServiceInformation};
