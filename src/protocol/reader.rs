//! Streaming row decoder

use super::{StreamHeader, END_MARKER, ROW_MARKER};
use crate::error::{ClientError, ClientResult};
use crate::value::{FieldMeta, FieldType, Row, RowMeta, Value};
use chrono::DateTime;
use std::io::{self, BufReader, Read};

/// Forward-only sequence of rows decoded from a byte stream.
///
/// The banner and metadata are read by [`RowStream::open`]; rows are decoded
/// one at a time as the iterator advances. The stream ends at the terminator,
/// after `max_rows` rows (0 = unbounded), on the first error, or when closed.
/// The underlying reader is dropped as soon as the stream ends.
pub struct RowStream<R: Read> {
    reader: Option<BufReader<R>>,
    header: StreamHeader,
    row_meta: RowMeta,
    max_rows: usize,
    rows_read: usize,
}

impl<R: Read> RowStream<R> {
    /// Read the banner and row metadata and position at the first row
    pub fn open(reader: R, max_rows: usize) -> ClientResult<Self> {
        let mut reader = BufReader::new(reader);

        let header = StreamHeader {
            service_name: read_utf(&mut reader, "service name")?,
            service_transformation: read_utf(&mut reader, "service transformation")?,
            service_object_id: read_utf(&mut reader, "service object id")?,
            sql_transformation: read_utf(&mut reader, "sql transformation")?,
            sql_object_id: read_utf(&mut reader, "sql object id")?,
        };
        let row_meta = read_row_meta(&mut reader)?;

        tracing::debug!(
            service = %header.service_name,
            fields = row_meta.len(),
            max_rows,
            "row_stream_opened"
        );

        Ok(RowStream {
            reader: Some(reader),
            header,
            row_meta,
            max_rows,
            rows_read: 0,
        })
    }

    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    pub fn row_meta(&self) -> &RowMeta {
        &self.row_meta
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Number of rows handed out so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Release the underlying stream. Remaining content is discarded.
    pub fn close(&mut self) {
        if self.reader.take().is_some() {
            tracing::debug!(rows = self.rows_read, "row_stream_closed");
        }
    }

    /// Decode the next row, `Ok(None)` once the stream has ended
    pub fn next_row(&mut self) -> ClientResult<Option<Row>> {
        if self.max_rows > 0 && self.rows_read >= self.max_rows {
            self.close();
            return Ok(None);
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let result = match read_u8(reader, "row marker") {
            Ok(ROW_MARKER) => read_row(reader, &self.row_meta).map(Some),
            Ok(END_MARKER) => Ok(None),
            Ok(other) => Err(ClientError::protocol(format!(
                "Unexpected row marker 0x{other:02x}"
            ))),
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(row)) => {
                self.rows_read += 1;
                Ok(Some(row))
            }
            Ok(None) => {
                self.close();
                Ok(None)
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    /// Drain the remaining rows into a vector
    pub fn collect_rows(mut self) -> ClientResult<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        Ok(rows)
    }
}

impl<R: Read> Iterator for RowStream<R> {
    type Item = ClientResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

impl<R: Read> std::fmt::Debug for RowStream<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowStream")
            .field("header", &self.header)
            .field("row_meta", &self.row_meta)
            .field("max_rows", &self.max_rows)
            .field("rows_read", &self.rows_read)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn read_row_meta<R: Read>(reader: &mut R) -> ClientResult<RowMeta> {
    let count = read_i32(reader, "field count")?;
    let count = usize::try_from(count)
        .map_err(|_| ClientError::protocol(format!("Negative field count {count}")))?;

    let mut fields = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let type_id = read_i32(reader, "field type")?;
        let field_type = FieldType::from_wire_id(type_id)
            .ok_or_else(|| ClientError::protocol(format!("Unknown field type id {type_id}")))?;
        let name = read_utf(reader, "field name")?;
        fields.push(FieldMeta::new(name, field_type));
    }
    Ok(RowMeta::new(fields))
}

fn read_row<R: Read>(reader: &mut R, meta: &RowMeta) -> ClientResult<Row> {
    let mut values = Vec::with_capacity(meta.len());
    for field in meta.fields() {
        values.push(read_value(reader, field)?);
    }
    Ok(Row::new(values))
}

fn read_value<R: Read>(reader: &mut R, field: &FieldMeta) -> ClientResult<Value> {
    if read_u8(reader, &field.name)? != 0 {
        return Ok(Value::Null);
    }
    let what = field.name.as_str();
    let value = match field.field_type {
        FieldType::Number => Value::Number(f64::from_bits(read_u64(reader, what)?)),
        FieldType::String => Value::String(read_long_string(reader, what)?),
        FieldType::BigNumber => Value::BigNumber(read_long_string(reader, what)?),
        FieldType::Date => Value::Date(read_datetime(reader, what)?),
        FieldType::Timestamp => Value::Timestamp(read_datetime(reader, what)?),
        FieldType::Boolean => Value::Boolean(read_u8(reader, what)? != 0),
        FieldType::Integer => Value::Integer(read_u64(reader, what)? as i64),
        FieldType::Binary => Value::Binary(read_long_bytes(reader, what)?),
    };
    Ok(value)
}

/// Map an I/O failure: EOF means the stream was cut short, anything else is
/// the connection failing underneath us.
fn io_failure(e: io::Error, what: &str) -> ClientError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        ClientError::protocol_with(format!("Truncated row stream while reading {what}"), e)
    } else {
        ClientError::connectivity_with(format!("Failed reading row stream ({what})"), e)
    }
}

fn read_array<R: Read, const N: usize>(reader: &mut R, what: &str) -> ClientResult<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf).map_err(|e| io_failure(e, what))?;
    Ok(buf)
}

fn read_u8<R: Read>(reader: &mut R, what: &str) -> ClientResult<u8> {
    Ok(read_array::<R, 1>(reader, what)?[0])
}

fn read_i32<R: Read>(reader: &mut R, what: &str) -> ClientResult<i32> {
    Ok(i32::from_be_bytes(read_array(reader, what)?))
}

fn read_u64<R: Read>(reader: &mut R, what: &str) -> ClientResult<u64> {
    Ok(u64::from_be_bytes(read_array(reader, what)?))
}

fn read_datetime<R: Read>(reader: &mut R, what: &str) -> ClientResult<DateTime<chrono::Utc>> {
    let millis = read_u64(reader, what)? as i64;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| ClientError::protocol(format!("Date out of range in {what}: {millis}")))
}

fn read_exact_vec<R: Read>(reader: &mut R, len: usize, what: &str) -> ClientResult<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .take(len as u64)
        .read_to_end(&mut buf)
        .map_err(|e| io_failure(e, what))?;
    if buf.len() < len {
        return Err(ClientError::protocol(format!(
            "Truncated row stream while reading {what}: expected {len} bytes, got {}",
            buf.len()
        )));
    }
    Ok(buf)
}

fn into_string(bytes: Vec<u8>, what: &str) -> ClientResult<String> {
    String::from_utf8(bytes)
        .map_err(|e| ClientError::protocol_with(format!("Invalid UTF-8 in {what}"), e))
}

fn read_utf<R: Read>(reader: &mut R, what: &str) -> ClientResult<String> {
    let len = u16::from_be_bytes(read_array(reader, what)?) as usize;
    into_string(read_exact_vec(reader, len, what)?, what)
}

fn read_long_bytes<R: Read>(reader: &mut R, what: &str) -> ClientResult<Vec<u8>> {
    let len = read_i32(reader, what)?;
    let len = usize::try_from(len)
        .map_err(|_| ClientError::protocol(format!("Negative length {len} in {what}")))?;
    read_exact_vec(reader, len, what)
}

fn read_long_string<R: Read>(reader: &mut R, what: &str) -> ClientResult<String> {
    into_string(read_long_bytes(reader, what)?, what)
}
