//! Row stream encoder
//!
//! Produces the same format [`super::RowStream`] reads. In-process services
//! registered with the local gateway use it to answer queries.

use super::{StreamHeader, END_MARKER, ROW_MARKER};
use crate::value::{Row, RowMeta, Value};
use std::io::{self, Write};

#[derive(Debug)]
pub struct RowStreamWriter<W: Write> {
    writer: W,
    row_meta: RowMeta,
    rows_written: usize,
}

impl<W: Write> RowStreamWriter<W> {
    /// Write the banner and metadata
    pub fn new(mut writer: W, header: &StreamHeader, row_meta: RowMeta) -> io::Result<Self> {
        for text in [
            &header.service_name,
            &header.service_transformation,
            &header.service_object_id,
            &header.sql_transformation,
            &header.sql_object_id,
        ] {
            write_utf(&mut writer, text)?;
        }

        let count = i32::try_from(row_meta.len()).map_err(|_| invalid("too many fields"))?;
        writer.write_all(&count.to_be_bytes())?;
        for field in row_meta.fields() {
            writer.write_all(&field.field_type.wire_id().to_be_bytes())?;
            write_utf(&mut writer, &field.name)?;
        }

        Ok(RowStreamWriter {
            writer,
            row_meta,
            rows_written: 0,
        })
    }

    /// Append a row; its arity and value types must match the metadata
    pub fn write_row(&mut self, row: &Row) -> io::Result<()> {
        if row.len() != self.row_meta.len() {
            return Err(invalid(&format!(
                "row has {} values, metadata declares {}",
                row.len(),
                self.row_meta.len()
            )));
        }
        for (field, value) in self.row_meta.fields().iter().zip(row.values()) {
            if !field.field_type.matches(value) {
                return Err(invalid(&format!(
                    "value {value:?} does not fit field '{}' of type {}",
                    field.name, field.field_type
                )));
            }
        }

        self.writer.write_all(&[ROW_MARKER])?;
        for value in row.values() {
            write_value(&mut self.writer, value)?;
        }
        self.rows_written += 1;
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Write the terminator and hand back the writer
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.write_all(&[END_MARKER])?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Encode a complete stream into memory
pub fn encode_rows(header: &StreamHeader, row_meta: &RowMeta, rows: &[Row]) -> io::Result<Vec<u8>> {
    let mut writer = RowStreamWriter::new(Vec::new(), header, row_meta.clone())?;
    for row in rows {
        writer.write_row(row)?;
    }
    writer.finish()
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.to_string())
}

fn write_utf<W: Write>(writer: &mut W, text: &str) -> io::Result<()> {
    let len = u16::try_from(text.len()).map_err(|_| invalid("string longer than 65535 bytes"))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(text.as_bytes())
}

fn write_long_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    let len = i32::try_from(bytes.len()).map_err(|_| invalid("value too large"))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(bytes)
}

fn write_value<W: Write>(writer: &mut W, value: &Value) -> io::Result<()> {
    if value.is_null() {
        return writer.write_all(&[1]);
    }
    writer.write_all(&[0])?;
    match value {
        Value::Null => Ok(()),
        Value::Number(v) => writer.write_all(&v.to_bits().to_be_bytes()),
        Value::String(s) | Value::BigNumber(s) => write_long_bytes(writer, s.as_bytes()),
        Value::Date(d) | Value::Timestamp(d) => {
            writer.write_all(&d.timestamp_millis().to_be_bytes())
        }
        Value::Boolean(b) => writer.write_all(&[u8::from(*b)]),
        Value::Integer(v) => writer.write_all(&v.to_be_bytes()),
        Value::Binary(b) => write_long_bytes(writer, b),
    }
}
