//! reqwest-backed [`HttpExecutor`]

use super::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse};
use crate::config::HttpClientConfig;
use crate::descriptor::ConnectionDescriptor;
use crate::error::{ClientError, ClientResult};
use reqwest::blocking::Client;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use reqwest::{NoProxy, Proxy};

/// Blocking HTTP executor.
///
/// Redirects are disabled at this layer; [`super::RemoteClient`] follows them
/// itself so the hop limit and logging stay in one place. Credentials go out
/// as HTTP Basic authentication on every request with `authorize` set.
pub struct ReqwestExecutor {
    client: Client,
    username: Option<String>,
    password: Option<String>,
}

impl ReqwestExecutor {
    pub fn new(descriptor: &ConnectionDescriptor, config: &HttpClientConfig) -> ClientResult<Self> {
        let mut builder = Client::builder()
            .redirect(Policy::none())
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout());

        if let Some(proxy) = proxy_for(descriptor)? {
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;
        Ok(ReqwestExecutor {
            client,
            username: descriptor.username().map(str::to_string),
            password: descriptor.password().map(str::to_string),
        })
    }
}

impl HttpExecutor for ReqwestExecutor {
    fn execute(&self, request: &HttpRequest) -> ClientResult<HttpResponse> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|e| {
                ClientError::protocol_with(
                    format!("Header {name} cannot be encoded (control characters?)"),
                    e,
                )
            })?;
            builder = builder.header(name.as_str(), value);
        }
        if let Some(username) = self.username.as_ref().filter(|_| request.authorize) {
            builder = builder.basic_auth(username, self.password.as_ref());
        }
        if !request.form.is_empty() {
            builder = builder.form(&request.form);
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        Ok(HttpResponse {
            status,
            headers,
            body: Box::new(response),
        })
    }
}

/// Proxy for all schemes, honoring the `|`-separated bypass list
fn proxy_for(descriptor: &ConnectionDescriptor) -> ClientResult<Option<Proxy>> {
    let Some(host) = descriptor.proxy_host().filter(|h| !h.is_empty()) else {
        return Ok(None);
    };
    let url = match descriptor.proxy_port().filter(|p| !p.is_empty()) {
        Some(port) => format!("http://{host}:{port}"),
        None => format!("http://{host}"),
    };
    let proxy = Proxy::all(&url)
        .map_err(|e| ClientError::connectivity_with(format!("Invalid proxy '{url}'"), e))?;

    let bypass = descriptor.non_proxy_hosts().map(no_proxy_list);
    Ok(Some(proxy.no_proxy(bypass.as_deref().and_then(NoProxy::from_string))))
}

/// `*.example.com|localhost` to `.example.com,localhost`
fn no_proxy_list(hosts: &str) -> String {
    hosts
        .split(['|', ','])
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| h.strip_prefix('*').unwrap_or(h))
        .collect::<Vec<_>>()
        .join(",")
}
