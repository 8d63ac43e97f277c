//! HTTP transport abstraction.
//!
//! The client only prepares and signs requests; moving bytes is delegated to
//! an [`HttpTransport`]. [`UreqTransport`] is the default implementation.

use std::time::Duration;

use error_stack::Report;
use http::{HeaderMap, Method, Request, Response};
use tbep_common::error::TbepError;

/// Executes a fully prepared request.
pub trait HttpTransport {
    /// Sends `request` and returns the response with its body read to the end.
    /// Non-2xx statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Http`] on connection, timeout or I/O failures.
    fn execute(
        &self,
        request: Request<Vec<u8>>,
        timeout: Option<Duration>,
    ) -> Result<Response<Vec<u8>>, Report<TbepError>>;
}

/// [`HttpTransport`] backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Creates a transport whose requests time out after `timeout` unless a
    /// request carries its own timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: config.into(),
        }
    }
}

fn prepare<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &HeaderMap,
    timeout: Option<Duration>,
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.clone(), value.clone());
    }
    if let Some(timeout) = timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }
    builder
}

impl HttpTransport for UreqTransport {
    fn execute(
        &self,
        request: Request<Vec<u8>>,
        timeout: Option<Duration>,
    ) -> Result<Response<Vec<u8>>, Report<TbepError>> {
        let (parts, body) = request.into_parts();
        let uri = parts.uri.to_string();
        let headers = &parts.headers;

        log::debug!("{} {}", parts.method, uri);

        let result = match parts.method {
            Method::GET => prepare(self.agent.get(&uri), headers, timeout).call(),
            Method::HEAD => prepare(self.agent.head(&uri), headers, timeout).call(),
            Method::DELETE => prepare(self.agent.delete(&uri), headers, timeout).call(),
            Method::OPTIONS => prepare(self.agent.options(&uri), headers, timeout).call(),
            Method::POST => prepare(self.agent.post(&uri), headers, timeout).send(&body[..]),
            Method::PUT => prepare(self.agent.put(&uri), headers, timeout).send(&body[..]),
            Method::PATCH => prepare(self.agent.patch(&uri), headers, timeout).send(&body[..]),
            other => {
                return Err(Report::new(TbepError::Http {
                    message: format!("Unsupported HTTP method: {other}"),
                }))
            }
        };

        let response = result.map_err(|e| {
            Report::new(TbepError::Http {
                message: format!("Failed to send request to {uri}: {e}"),
            })
        })?;

        let (parts, mut body) = response.into_parts();
        let bytes = body.read_to_vec().map_err(|e| {
            Report::new(TbepError::Http {
                message: format!("Failed to read response body: {e}"),
            })
        })?;

        log::debug!("{} {} -> {}", parts.status, uri, bytes.len());

        Ok(Response::from_parts(parts, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_method() {
        let transport = UreqTransport::new(Duration::from_secs(1));
        let request = Request::builder()
            .method(Method::TRACE)
            .uri("http://127.0.0.1:9/")
            .body(Vec::new())
            .expect("should build request");

        let err = transport
            .execute(request, None)
            .expect_err("TRACE should be rejected before any I/O");
        assert!(matches!(err.current_context(), TbepError::Http { .. }));
    }
}
