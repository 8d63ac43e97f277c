//! TBEP API client.
//!
//! Every request is signed with the platform private key (`TBEP-Authorization`)
//! over the exact body bytes sent. Responses are wrapped in [`TbepResponse`];
//! their signatures are checked on demand with
//! [`TbepClient::verify_response_signature`].

use std::time::Duration;

use error_stack::{Report, ResultExt};
use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tbep_common::constants::{CONTENT_TYPE_JSON, HEADER_TBEP_AUTHORIZATION, HEADER_TBEP_ENCRYPT};
use tbep_common::encryption::{RequestEncryption, ResponseEncryption};
use tbep_common::error::TbepError;
use tbep_common::request_signing::{
    verify_signature_header, CredentialSet, VerificationOutcome,
};
use tbep_common::settings::Settings;

use crate::transport::{HttpTransport, UreqTransport};

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Overrides the client timeout for this request.
    pub timeout: Option<Duration>,
    /// Sets `TBEP-Encrypt` on the request.
    pub encryption: Option<RequestEncryption>,
}

/// A request prepared by [`TbepClient::create_request`], not yet signed.
#[derive(Debug, Clone)]
pub struct TbepRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl TbepRequest {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// GET, HEAD and OPTIONS requests never carry a body.
    fn is_simple(&self) -> bool {
        matches!(self.method, Method::GET | Method::HEAD | Method::OPTIONS)
    }
}

/// Error body returned by the platform on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug)]
pub struct TbepResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Body bytes exactly as received; signatures are computed over these.
    pub raw_body: Vec<u8>,
    pub data: T,
    pub encryption: Option<ResponseEncryption>,
    pub error: Option<ApiErrorBody>,
}

impl<T> TbepResponse<T> {
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(HEADER_TBEP_AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
    }
}

pub struct TbepClient<T = UreqTransport> {
    endpoint: String,
    credentials: CredentialSet,
    transport: T,
}

impl TbepClient<UreqTransport> {
    /// Builds a client with the default `ureq` transport.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Configuration`] if the credentials cannot be loaded.
    pub fn new(settings: &Settings) -> Result<Self, Report<TbepError>> {
        Self::with_transport(settings, UreqTransport::new(settings.client.timeout()))
    }
}

impl<T: HttpTransport> TbepClient<T> {
    /// Builds a client over a caller supplied transport.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Configuration`] if the credentials cannot be loaded.
    pub fn with_transport(settings: &Settings, transport: T) -> Result<Self, Report<TbepError>> {
        let credentials = CredentialSet::from_settings(&settings.credentials)?;

        Ok(Self {
            endpoint: settings.client.endpoint.trim_end_matches('/').to_string(),
            credentials,
            transport,
        })
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Prepares a request to `endpoint/segment/...`, URL-encoding each segment.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::MalformedHeader`] if `options.encryption` cannot be
    /// carried in a `TBEP-Encrypt` header.
    pub fn create_request(
        &self,
        method: Method,
        path_segments: &[&str],
        options: &RequestOptions,
    ) -> Result<TbepRequest, Report<TbepError>> {
        let mut url = self.endpoint.clone();
        for segment in path_segments {
            for part in segment.split('/').filter(|part| !part.is_empty()) {
                url.push('/');
                url.push_str(&urlencoding::encode(part));
            }
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(CONTENT_TYPE_JSON));

        if let Some(encryption) = &options.encryption {
            let value = HeaderValue::from_str(&encryption.to_header_value()).map_err(|e| {
                Report::new(TbepError::MalformedHeader {
                    message: format!("invalid TBEP-Encrypt value: {e}"),
                })
            })?;
            headers.insert(HEADER_TBEP_ENCRYPT, value);
        }

        Ok(TbepRequest {
            method,
            url,
            headers,
            timeout: options.timeout,
        })
    }

    /// Signs and sends `request` with a raw body.
    ///
    /// # Errors
    ///
    /// Returns [`TbepError::Signing`] if signing fails, [`TbepError::Http`] on
    /// transport failures, [`TbepError::Serialization`] if a 2xx body cannot be
    /// deserialized into `R`, and [`TbepError::MalformedHeader`] if the
    /// response carries an unparsable `TBEP-Encrypt` header.
    pub fn send_request<R>(
        &self,
        request: TbepRequest,
        body: Option<(Vec<u8>, &str)>,
    ) -> Result<TbepResponse<R>, Report<TbepError>>
    where
        R: DeserializeOwned + Default,
    {
        let body = if request.is_simple() { None } else { body };
        let timeout = request.timeout;
        let http_request = self.sign(request, body)?;

        let response = self.transport.execute(http_request, timeout)?;
        wrap_response(response)
    }

    /// Serializes `data` as JSON, signs and sends `request`.
    ///
    /// # Errors
    ///
    /// See [`TbepClient::send_request`]; additionally
    /// [`TbepError::Serialization`] if `data` cannot be serialized.
    pub fn send_request_with_json<B, R>(
        &self,
        request: TbepRequest,
        data: Option<&B>,
    ) -> Result<TbepResponse<R>, Report<TbepError>>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned + Default,
    {
        let body = match data {
            Some(data) if !request.is_simple() => {
                let bytes = serde_json::to_vec(data).map_err(|e| {
                    Report::new(TbepError::Serialization {
                        message: format!("Failed to serialize request body: {e}"),
                    })
                })?;
                Some((bytes, CONTENT_TYPE_JSON))
            }
            _ => None,
        };

        self.send_request(request, body)
    }

    /// Verifies the `TBEP-Authorization` header of `response` against its raw
    /// body.
    pub fn verify_response_signature<R>(&self, response: &TbepResponse<R>) -> VerificationOutcome {
        verify_signature_header(
            &self.credentials,
            response.authorization().unwrap_or_default(),
            &response.raw_body,
        )
    }

    /// Verifies a signature received outside a client call, such as an event
    /// notification pushed by the platform.
    pub fn verify_event_signature(
        &self,
        authorization: &str,
        body: impl AsRef<[u8]>,
    ) -> VerificationOutcome {
        verify_signature_header(&self.credentials, authorization, body)
    }

    fn sign(
        &self,
        request: TbepRequest,
        body: Option<(Vec<u8>, &str)>,
    ) -> Result<Request<Vec<u8>>, Report<TbepError>> {
        let TbepRequest {
            method,
            url,
            mut headers,
            ..
        } = request;

        let body = match body {
            Some((bytes, content_type)) => {
                let content_type = HeaderValue::from_str(content_type).map_err(|e| {
                    Report::new(TbepError::Http {
                        message: format!("Invalid content type: {e}"),
                    })
                })?;
                headers.insert(CONTENT_TYPE, content_type);
                bytes
            }
            None => Vec::new(),
        };

        let authorization = self
            .credentials
            .signer()
            .authorize(&body)
            .attach(format!("while signing {method} {url}"))?;
        let authorization = HeaderValue::from_str(&authorization).map_err(|e| {
            Report::new(TbepError::Signing {
                message: format!("Invalid authorization header: {e}"),
            })
        })?;
        headers.insert(HEADER_TBEP_AUTHORIZATION, authorization);

        let mut http_request = Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(body)
            .map_err(|e| {
                Report::new(TbepError::Http {
                    message: format!("Failed to build request for {url}: {e}"),
                })
            })?;
        *http_request.headers_mut() = headers;

        Ok(http_request)
    }
}

fn wrap_response<R>(response: http::Response<Vec<u8>>) -> Result<TbepResponse<R>, Report<TbepError>>
where
    R: DeserializeOwned + Default,
{
    let (parts, raw_body) = response.into_parts();

    let encryption = match parts
        .headers
        .get(HEADER_TBEP_ENCRYPT)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
    {
        Some(value) => Some(ResponseEncryption::parse(value).attach("while reading TBEP-Encrypt")?),
        None => None,
    };

    let error = if parts.status.is_success() {
        None
    } else {
        log::warn!("TBEP API responded with {}", parts.status);
        serde_json::from_slice::<ApiErrorBody>(&raw_body).ok()
    };

    // Error bodies never match `R`; they are kept in `error` and `raw_body`.
    let data = if !parts.status.is_success() || raw_body.iter().all(u8::is_ascii_whitespace) {
        R::default()
    } else {
        serde_json::from_slice(&raw_body).map_err(|e| {
            Report::new(TbepError::Serialization {
                message: format!("Failed to deserialize response body: {e}"),
            })
        })?
    };

    Ok(TbepResponse {
        status: parts.status,
        headers: parts.headers,
        raw_body,
        data,
        encryption,
        error,
    })
}
