//! Connection Descriptor
//!
//! Parses `jdbc:pdi://host:port/kettle?key=value&...` addresses into an
//! immutable [`ConnectionDescriptor`].
//!
//! Argument parsing is tolerant: a pair that does not split into exactly a key
//! and a value is dropped without error. Existing addresses in the wild rely on
//! this, so it is kept as is.

use crate::error::{ClientError, ClientResult};
use std::collections::BTreeMap;
use std::fmt;

/// Address prefix accepted by this client
pub const BASE_URL: &str = "jdbc:pdi://";

/// Path marker of the remote data-service servlet
pub const SERVICE_PATH: &str = "/kettle";

pub const ARG_WEBAPPNAME: &str = "webappname";
pub const ARG_PROXYHOSTNAME: &str = "proxyhostname";
pub const ARG_PROXYPORT: &str = "proxyport";
pub const ARG_NONPROXYHOSTS: &str = "nonproxyhosts";
pub const ARG_DEBUGTRANS: &str = "debugtrans";
pub const ARG_DEBUGLOG: &str = "debuglog";
pub const ARG_ISSECURE: &str = "secure";
pub const ARG_LOCAL: &str = "local";

const RECOGNIZED_ARGS: [&str; 8] = [
    ARG_WEBAPPNAME,
    ARG_PROXYHOSTNAME,
    ARG_PROXYPORT,
    ARG_NONPROXYHOSTS,
    ARG_DEBUGTRANS,
    ARG_DEBUGLOG,
    ARG_ISSECURE,
    ARG_LOCAL,
];

/// Username and password supplied alongside the address
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    pub fn anonymous() -> Self {
        Credentials::default()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Debug switches forwarded to the remote service with every query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugOptions {
    /// Ask the server to save the generated transformation to this file
    pub transformation_file: Option<String>,
    /// Ask the server to write remote execution logging
    pub remote_log: bool,
}

/// Parsed, immutable connection configuration
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    raw_address: String,
    host: String,
    port: String,
    web_app_name: Option<String>,
    proxy_host: Option<String>,
    proxy_port: Option<String>,
    non_proxy_hosts: Option<String>,
    secure: bool,
    local: bool,
    debug_transformation_file: Option<String>,
    debug_remote_log: bool,
    extra_parameters: BTreeMap<String, String>,
    credentials: Credentials,
}

impl ConnectionDescriptor {
    /// Parse an address string
    pub fn parse(address: &str, credentials: Credentials) -> ClientResult<Self> {
        if !address.starts_with(BASE_URL) {
            return Err(ClientError::malformed_address(
                address,
                format!("address must start with '{BASE_URL}'"),
            ));
        }

        let authority_start = BASE_URL.len();
        let port_colon = address[authority_start..]
            .find(':')
            .map(|i| i + authority_start)
            .ok_or_else(|| ClientError::malformed_address(address, "missing ':port'"))?;
        let service_index = address[port_colon..]
            .find(SERVICE_PATH)
            .map(|i| i + port_colon)
            .ok_or_else(|| {
                ClientError::malformed_address(
                    address,
                    format!("missing '{SERVICE_PATH}' service path"),
                )
            })?;

        let host = &address[authority_start..port_colon];
        let port = &address[port_colon + 1..service_index];
        if host.is_empty() {
            return Err(ClientError::malformed_address(address, "empty host name"));
        }
        if port.is_empty() {
            return Err(ClientError::malformed_address(address, "empty port"));
        }

        let mut arguments = address[service_index..]
            .find('?')
            .map(|i| parse_arguments(&address[service_index + i + 1..]))
            .unwrap_or_default();

        let mut take = |key: &str| arguments.remove(key);
        let web_app_name = take(ARG_WEBAPPNAME);
        let proxy_host = take(ARG_PROXYHOSTNAME);
        let proxy_port = take(ARG_PROXYPORT);
        let non_proxy_hosts = take(ARG_NONPROXYHOSTS);
        let debug_transformation_file = take(ARG_DEBUGTRANS);
        let debug_remote_log = is_true(take(ARG_DEBUGLOG));
        let secure = is_true(take(ARG_ISSECURE));
        let local = is_true(take(ARG_LOCAL));

        Ok(ConnectionDescriptor {
            raw_address: address.to_string(),
            host: host.to_string(),
            port: port.to_string(),
            web_app_name,
            proxy_host,
            proxy_port,
            non_proxy_hosts,
            secure,
            local,
            debug_transformation_file,
            debug_remote_log,
            extra_parameters: arguments,
            credentials,
        })
    }

    /// Rebuild an address from the parsed fields.
    ///
    /// Boolean switches are written only when set; parsing the result yields an
    /// equal descriptor (apart from `raw_address`).
    pub fn to_address(&self) -> String {
        let mut args: Vec<(&str, &str)> = Vec::new();
        let optional = [
            (ARG_WEBAPPNAME, &self.web_app_name),
            (ARG_PROXYHOSTNAME, &self.proxy_host),
            (ARG_PROXYPORT, &self.proxy_port),
            (ARG_NONPROXYHOSTS, &self.non_proxy_hosts),
            (ARG_DEBUGTRANS, &self.debug_transformation_file),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                args.push((key, value));
            }
        }
        for (key, set) in [
            (ARG_DEBUGLOG, self.debug_remote_log),
            (ARG_ISSECURE, self.secure),
            (ARG_LOCAL, self.local),
        ] {
            if set {
                args.push((key, "true"));
            }
        }
        for (key, value) in &self.extra_parameters {
            args.push((key, value));
        }

        let mut address = format!("{BASE_URL}{}:{}{SERVICE_PATH}", self.host, self.port);
        for (i, (key, value)) in args.iter().enumerate() {
            address.push(if i == 0 { '?' } else { '&' });
            address.push_str(key);
            address.push('=');
            address.push_str(value);
        }
        address
    }

    pub fn raw_address(&self) -> &str {
        &self.raw_address
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn web_app_name(&self) -> Option<&str> {
        self.web_app_name.as_deref()
    }

    pub fn proxy_host(&self) -> Option<&str> {
        self.proxy_host.as_deref()
    }

    pub fn proxy_port(&self) -> Option<&str> {
        self.proxy_port.as_deref()
    }

    pub fn non_proxy_hosts(&self) -> Option<&str> {
        self.non_proxy_hosts.as_deref()
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn debug_transformation_file(&self) -> Option<&str> {
        self.debug_transformation_file.as_deref()
    }

    pub fn is_debugging_remote_log(&self) -> bool {
        self.debug_remote_log
    }

    /// Unrecognized address arguments, forwarded to the service as parameters
    pub fn extra_parameters(&self) -> &BTreeMap<String, String> {
        &self.extra_parameters
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.credentials.password.as_deref()
    }

    pub fn debug_options(&self) -> DebugOptions {
        DebugOptions {
            transformation_file: self.debug_transformation_file.clone(),
            remote_log: self.debug_remote_log,
        }
    }

    /// Base URL of the service endpoints, e.g. `https://host:9080/pdi`
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        match self.web_app_name.as_deref() {
            Some(app) if !app.is_empty() => {
                format!("{scheme}://{}:{}/{}", self.host, self.port, app.trim_matches('/'))
            }
            _ => format!("{scheme}://{}:{}", self.host, self.port),
        }
    }

    /// Fully qualified endpoint for a relative service path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url())
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("web_app_name", &self.web_app_name)
            .field("proxy_host", &self.proxy_host)
            .field("proxy_port", &self.proxy_port)
            .field("non_proxy_hosts", &self.non_proxy_hosts)
            .field("secure", &self.secure)
            .field("local", &self.local)
            .field("debug_transformation_file", &self.debug_transformation_file)
            .field("debug_remote_log", &self.debug_remote_log)
            .field("extra_parameters", &self.extra_parameters)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Whether a key is one of the recognized address arguments
pub fn is_recognized_argument(key: &str) -> bool {
    RECOGNIZED_ARGS.contains(&key)
}

fn is_true(value: Option<String>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Split `k=v&k=v` into a map, dropping pairs that are not exactly two parts.
///
/// Trailing empty parts do not count, so `key=` and `key=a=` are dropped while
/// `=value` keeps an empty key. Later duplicates win.
fn parse_arguments(query: &str) -> BTreeMap<String, String> {
    let mut arguments = BTreeMap::new();
    for arg in query.split('&') {
        let mut parts: Vec<&str> = arg.split('=').collect();
        while parts.last().is_some_and(|p| p.is_empty()) {
            parts.pop();
        }
        if let [key, value] = parts.as_slice() {
            arguments.insert((*key).to_string(), (*value).to_string());
        }
    }
    arguments
}
