//! Row Protocol
//!
//! Binary format streamed back by the `/sql` endpoint. All integers are
//! big-endian.
//!
//! ```text
//! banner   := utf(service name) utf(service transformation) utf(service object id)
//!             utf(sql transformation) utf(sql object id)
//! utf      := u16 byte length, UTF-8 bytes
//! metadata := i32 field count, count x (i32 type id, utf name)
//! rows     := { 0x01 row }* 0x00
//! row      := per field: u8 null flag (1 = null), then the value unless null
//! ```
//!
//! Values: Number `f64`; String and BigNumber `i32` length + UTF-8; Date and
//! Timestamp `i64` epoch milliseconds; Boolean `u8`; Integer `i64`; Binary
//! `i32` length + bytes.

pub mod reader;
pub mod writer;

pub use reader::RowStream;
pub use writer::{encode_rows, RowStreamWriter};

/// Precedes every row record
pub const ROW_MARKER: u8 = 0x01;

/// Terminates the row section
pub const END_MARKER: u8 = 0x00;

/// Identification banner sent ahead of the row metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamHeader {
    /// Name of the data service (virtual table) being queried
    pub service_name: String,
    /// Transformation that produces the service rows
    pub service_transformation: String,
    pub service_object_id: String,
    /// Transformation generated for the SQL statement
    pub sql_transformation: String,
    pub sql_object_id: String,
}

impl StreamHeader {
    pub fn for_service(name: impl Into<String>) -> Self {
        StreamHeader {
            service_name: name.into(),
            ..StreamHeader::default()
        }
    }
}
