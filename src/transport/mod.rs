//! Transport
//!
//! Request/response types, the [`HttpExecutor`] seam over the HTTP library,
//! and the [`DataServiceClient`] contract shared by the HTTP and local
//! backends.

pub mod http;
pub mod remote;

pub use http::ReqwestExecutor;
pub use remote::RemoteClient;

use crate::catalog::ServiceInformation;
use crate::descriptor::{ConnectionDescriptor, DebugOptions};
use crate::error::ClientResult;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

/// Health-check endpoint
pub const STATUS_PATH: &str = "/kettle/status/";
/// Service listing endpoint
pub const LIST_SERVICES_PATH: &str = "/kettle/listServices/";
/// Query endpoint
pub const SQL_PATH: &str = "/kettle/sql";

pub const HEADER_SQL: &str = "SQL";
pub const HEADER_MAX_ROWS: &str = "MaxRows";
pub const HEADER_LOCATION: &str = "Location";

/// Streamed response body
pub type ResponseBody = Box<dyn Read + Send>;

/// Operations every backend offers.
///
/// Implemented by [`RemoteClient`] over HTTP and by in-process services
/// registered with [`crate::local::LocalServiceRegistry`]. Query bodies are in
/// the row protocol format (see [`crate::protocol`]).
pub trait DataServiceClient: Send + Sync {
    /// Check that the service is reachable
    fn status(&self) -> ClientResult<()>;

    /// Snapshot of the virtual tables the service currently exposes
    fn service_information(&self) -> ClientResult<Vec<ServiceInformation>>;

    /// Run a query and return the raw row-protocol stream
    fn query(&self, request: &QueryRequest) -> ClientResult<ResponseBody>;
}

/// A SQL statement plus the options sent along with it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    /// Opaque SQL text, interpreted by the service only
    pub sql: String,
    /// Row cap, 0 = unbounded
    pub max_rows: usize,
    /// Extra request parameters
    pub parameters: BTreeMap<String, String>,
    pub debug: DebugOptions,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        QueryRequest {
            sql: sql.into(),
            ..QueryRequest::default()
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_debug(mut self, debug: DebugOptions) -> Self {
        self.debug = debug;
        self
    }

    /// Fill in the descriptor's debug switches and pass-through parameters.
    ///
    /// Values set on the request win over the descriptor's.
    pub fn with_descriptor_defaults(&self, descriptor: &ConnectionDescriptor) -> QueryRequest {
        let mut merged = self.clone();
        let defaults = descriptor.debug_options();
        if merged.debug.transformation_file.is_none() {
            merged.debug.transformation_file = defaults.transformation_file;
        }
        merged.debug.remote_log |= defaults.remote_log;
        for (key, value) in descriptor.extra_parameters() {
            merged
                .parameters
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        merged
    }

    /// SQL as it travels in the `SQL` header: line breaks become spaces
    pub fn header_sql(&self) -> String {
        self.sql.replace("\r\n", " ").replace(['\n', '\r'], " ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A fully built request, ready for an [`HttpExecutor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Form-encoded body parameters
    pub form: Vec<(String, String)>,
    /// Attach the connection credentials. Cleared once a redirect leaves the
    /// original origin.
    pub authorize: bool,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            form: Vec::new(),
            authorize: true,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        HttpRequest {
            method: HttpMethod::Post,
            ..HttpRequest::get(url)
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status, headers and a streamed body
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: Box::new(body),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Executes a single HTTP exchange. Redirects are not followed here.
pub trait HttpExecutor: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> ClientResult<HttpResponse>;
}

fn lookup<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
