//! Service listing documents
//!
//! `GET /kettle/listServices/` answers with an XML document describing every
//! virtual table the server exposes:
//!
//! ```xml
//! <services>
//!   <service>
//!     <name>sequence</name>
//!     <row-meta>
//!       <value-meta><type>Integer</type><name>id</name><length>-1</length><precision>-1</precision></value-meta>
//!     </row-meta>
//!   </service>
//! </services>
//! ```

use crate::error::{ClientError, ClientResult};
use crate::value::{FieldMeta, FieldType, RowMeta};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// One field of a service's output row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceField {
    pub name: String,
    pub field_type: FieldType,
    /// Declared length, `None` when unspecified or negative
    pub length: Option<i32>,
    pub precision: Option<i32>,
}

impl ServiceField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        ServiceField {
            name: name.into(),
            field_type,
            length: None,
            precision: None,
        }
    }
}

/// A virtual table and its field layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInformation {
    pub name: String,
    pub fields: Vec<ServiceField>,
}

impl ServiceInformation {
    pub fn new(name: impl Into<String>, fields: Vec<ServiceField>) -> Self {
        ServiceInformation {
            name: name.into(),
            fields,
        }
    }

    /// Row metadata a query over the whole service would return
    pub fn row_meta(&self) -> RowMeta {
        RowMeta::new(
            self.fields
                .iter()
                .map(|f| FieldMeta::new(f.name.clone(), f.field_type))
                .collect(),
        )
    }
}

#[derive(Default)]
struct PendingService {
    name: Option<String>,
    fields: Vec<ServiceField>,
}

#[derive(Default)]
struct PendingField {
    name: Option<String>,
    type_name: Option<String>,
    length: Option<i32>,
    precision: Option<i32>,
}

impl PendingField {
    fn finish(self, service: Option<&str>) -> ClientResult<ServiceField> {
        let owner = service.unwrap_or("<unnamed>");
        let name = self.name.ok_or_else(|| {
            ClientError::protocol(format!("Field of service '{owner}' has no <name>"))
        })?;
        let type_name = self.type_name.ok_or_else(|| {
            ClientError::protocol(format!("Field '{name}' of service '{owner}' has no <type>"))
        })?;
        let field_type = FieldType::from_type_name(&type_name).ok_or_else(|| {
            ClientError::protocol(format!(
                "Field '{name}' of service '{owner}' has unknown type '{type_name}'"
            ))
        })?;
        Ok(ServiceField {
            name,
            field_type,
            length: self.length,
            precision: self.precision,
        })
    }
}

/// Parse a listing document into service descriptions, in document order
pub fn parse_service_list(xml: &str) -> ClientResult<Vec<ServiceInformation>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut saw_root = false;
    let mut services = Vec::new();
    let mut service: Option<PendingService> = None;
    let mut field: Option<PendingField> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match tag.as_str() {
                    "services" if path.is_empty() => saw_root = true,
                    "service" => service = Some(PendingService::default()),
                    "value-meta" if service.is_some() => field = Some(PendingField::default()),
                    _ => {}
                }
                path.push(tag);
                text.clear();
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"services" if path.is_empty() => saw_root = true,
                b"service" => return Err(ClientError::protocol("Service entry has no <name>")),
                b"value-meta" if service.is_some() => {
                    return Err(ClientError::protocol("Service field has no <name>"));
                }
                _ => {}
            },
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(_) => {
                let Some(tag) = path.pop() else {
                    return Err(ClientError::protocol("Unbalanced service listing"));
                };
                let value = text.trim().to_string();
                text.clear();

                match (tag.as_str(), path.last().map(String::as_str)) {
                    ("name", Some("value-meta")) => {
                        if let Some(f) = field.as_mut() {
                            f.name = Some(value);
                        }
                    }
                    ("type", Some("value-meta")) => {
                        if let Some(f) = field.as_mut() {
                            f.type_name = Some(value);
                        }
                    }
                    ("length", Some("value-meta")) => {
                        if let Some(f) = field.as_mut() {
                            f.length = parse_dimension(&value);
                        }
                    }
                    ("precision", Some("value-meta")) => {
                        if let Some(f) = field.as_mut() {
                            f.precision = parse_dimension(&value);
                        }
                    }
                    ("name", Some("service")) => {
                        if let Some(s) = service.as_mut() {
                            s.name = Some(value);
                        }
                    }
                    ("value-meta", _) => {
                        if let (Some(pending), Some(s)) = (field.take(), service.as_mut()) {
                            let finished = pending.finish(s.name.as_deref())?;
                            s.fields.push(finished);
                        }
                    }
                    ("service", _) => {
                        if let Some(s) = service.take() {
                            let name = s
                                .name
                                .filter(|n| !n.is_empty())
                                .ok_or_else(|| ClientError::protocol("Service entry has no <name>"))?;
                            services.push(ServiceInformation::new(name, s.fields));
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(ClientError::protocol(format!(
            "Service listing ends inside <{}>",
            path.join("/")
        )));
    }
    if !saw_root {
        return Err(ClientError::protocol(
            "Service listing has no <services> element",
        ));
    }
    Ok(services)
}

fn parse_dimension(value: &str) -> Option<i32> {
    value.parse::<i32>().ok().filter(|v| *v >= 0)
}
