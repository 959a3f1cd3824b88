//! HTTP backend
//!
//! Sends status, listing and query requests to a remote data-service server
//! through an [`HttpExecutor`], following redirects up to a fixed number of
//! hops and mapping non-2xx statuses onto [`ClientError`] kinds.

use super::{
    DataServiceClient, HttpExecutor, HttpRequest, HttpResponse, QueryRequest, ResponseBody,
    ReqwestExecutor, HEADER_LOCATION, HEADER_MAX_ROWS, HEADER_SQL, LIST_SERVICES_PATH, SQL_PATH,
    STATUS_PATH,
};
use crate::catalog::{parse_service_list, ServiceInformation};
use crate::config::HttpClientConfig;
use crate::descriptor::{ConnectionDescriptor, ARG_DEBUGLOG, ARG_DEBUGTRANS};
use crate::error::{ClientError, ClientResult};
use reqwest::Url;
use std::io::Read;
use std::sync::Arc;

/// Longest error body quoted in an error message
const MAX_ERROR_BODY: usize = 2048;

pub struct RemoteClient {
    descriptor: Arc<ConnectionDescriptor>,
    executor: Arc<dyn HttpExecutor>,
    max_redirects: usize,
}

impl RemoteClient {
    pub fn new(
        descriptor: Arc<ConnectionDescriptor>,
        executor: Arc<dyn HttpExecutor>,
        max_redirects: usize,
    ) -> Self {
        RemoteClient {
            descriptor,
            executor,
            max_redirects,
        }
    }

    /// Client backed by a reqwest executor built from `config`
    pub fn from_config(
        descriptor: Arc<ConnectionDescriptor>,
        config: &HttpClientConfig,
    ) -> ClientResult<Self> {
        let executor = ReqwestExecutor::new(&descriptor, config)?;
        Ok(RemoteClient::new(
            descriptor,
            Arc::new(executor),
            config.max_redirects,
        ))
    }

    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    pub fn max_redirects(&self) -> usize {
        self.max_redirects
    }

    /// GET a service path and return the body as text
    pub fn exec_service(&self, path: &str) -> ClientResult<String> {
        let request = HttpRequest::get(self.descriptor.endpoint(path));
        let response = self.exec_method(request)?;
        read_text(response.body)
    }

    /// Execute a request, following redirects.
    ///
    /// A 2xx response is returned as is. 301/302/303/307/308 re-issue the same
    /// request against the `Location` target; more than `max_redirects` hops
    /// is a protocol error. Once a hop leaves the scheme, host and port of the
    /// current URL, credentials are no longer attached. Any other status is a
    /// connectivity error carrying the status and the response text.
    pub fn exec_method(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        let origin = request.url.clone();
        let mut request = request;
        let mut hops = 0usize;

        loop {
            tracing::debug!(method = %request.method, url = %request.url, "http_request");
            let response = self.executor.execute(&request)?;

            if response.is_success() {
                tracing::debug!(url = %request.url, status = response.status, "http_response");
                return Ok(response);
            }

            if response.is_redirect() {
                let Some(location) = response.header(HEADER_LOCATION) else {
                    return Err(ClientError::protocol(format!(
                        "Redirect status {} from {} without a Location header",
                        response.status, request.url
                    )));
                };
                let target = resolve_location(&request.url, location)?;
                hops += 1;
                if hops > self.max_redirects {
                    tracing::warn!(url = %origin, max_redirects = self.max_redirects, "redirect_limit_exceeded");
                    return Err(ClientError::protocol(format!(
                        "Too many redirects (more than {}) requesting {origin}",
                        self.max_redirects
                    )));
                }
                if request.authorize && !same_origin(&request.url, &target) {
                    tracing::info!(to = %target, "redirect_leaves_origin_dropping_credentials");
                    request.authorize = false;
                }
                tracing::info!(from = %request.url, to = %target, hop = hops, "following_redirect");
                request.url = target;
                continue;
            }

            let status = response.status;
            let body = read_text(response.body).unwrap_or_default();
            tracing::warn!(url = %request.url, status, "http_request_failed");
            return Err(ClientError::connectivity(status_message(status, &body)));
        }
    }

    fn sql_request(&self, request: &QueryRequest) -> HttpRequest {
        let request = request.with_descriptor_defaults(&self.descriptor);
        let mut http = HttpRequest::post(self.descriptor.endpoint(SQL_PATH))
            .with_header(HEADER_SQL, request.header_sql())
            .with_header(HEADER_MAX_ROWS, request.max_rows.to_string());

        if let Some(file) = &request.debug.transformation_file {
            http = http.with_param(ARG_DEBUGTRANS, file.as_str());
        }
        if request.debug.remote_log {
            http = http.with_param(ARG_DEBUGLOG, "true");
        }
        for (key, value) in &request.parameters {
            http = http.with_param(key.as_str(), value.as_str());
        }
        http
    }
}

impl DataServiceClient for RemoteClient {
    fn status(&self) -> ClientResult<()> {
        self.exec_service(STATUS_PATH).map(|_| ())
    }

    fn service_information(&self) -> ClientResult<Vec<ServiceInformation>> {
        let xml = self.exec_service(LIST_SERVICES_PATH)?;
        let services = parse_service_list(&xml)?;
        tracing::debug!(count = services.len(), "services_listed");
        Ok(services)
    }

    fn query(&self, request: &QueryRequest) -> ClientResult<ResponseBody> {
        tracing::info!(max_rows = request.max_rows, "executing_query");
        let response = self.exec_method(self.sql_request(request))?;
        Ok(response.body)
    }
}

fn resolve_location(current: &str, location: &str) -> ClientResult<String> {
    let base = Url::parse(current)
        .map_err(|e| ClientError::protocol_with(format!("Invalid request URL '{current}'"), e))?;
    let target = base
        .join(location)
        .map_err(|e| ClientError::protocol_with(format!("Invalid redirect target '{location}'"), e))?;
    Ok(target.to_string())
}

/// Same scheme, host and port. Unparseable URLs never match.
fn same_origin(current: &str, target: &str) -> bool {
    match (Url::parse(current), Url::parse(target)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => false,
    }
}

fn read_text(mut body: ResponseBody) -> ClientResult<String> {
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes)
        .map_err(|e| ClientError::connectivity_with("Failed to read response body", e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn status_message(status: u16, body: &str) -> String {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(|r| format!(" {r}"))
        .unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP status {status}{reason}");
    }
    let mut quoted: String = body.chars().take(MAX_ERROR_BODY).collect();
    if quoted.len() < body.len() {
        quoted.push_str("...");
    }
    format!("HTTP status {status}{reason}: {quoted}")
}
