use async_trait::async_trait;
use shared::{error::TransportError, protocol::SubmissionPayload};

/// Status line and body of a completed request. Any status counts as
/// completed; only transport failures are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one multipart submission. Futures are not required to be `Send`:
/// the wizard runs on a single-threaded event loop.
#[async_trait(?Send)]
pub trait SubmissionTransport {
    async fn post(
        &self,
        endpoint: &str,
        payload: SubmissionPayload,
    ) -> Result<TransportResponse, TransportError>;
}

pub struct MissingTransport;

#[async_trait(?Send)]
impl SubmissionTransport for MissingTransport {
    async fn post(
        &self,
        endpoint: &str,
        _payload: SubmissionPayload,
    ) -> Result<TransportResponse, TransportError> {
        Err(TransportError::new(format!(
            "no submission transport configured for {endpoint}"
        )))
    }
}

#[cfg(feature = "native")]
pub use http::HttpTransport;

#[cfg(feature = "native")]
mod http {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::{
        multipart::{Form, Part},
        Client,
    };
    use shared::{
        error::TransportError,
        protocol::{FormPart, SubmissionPayload},
    };
    use tracing::{debug, warn};

    use super::{SubmissionTransport, TransportResponse};

    #[derive(Clone)]
    pub struct HttpTransport {
        http: Client,
        base_url: String,
    }

    impl HttpTransport {
        pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
            let http = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| TransportError::new(format!("failed to build http client: {e}")))?;
            Ok(Self {
                http,
                base_url: base_url.into(),
            })
        }

        pub fn url_for(&self, endpoint: &str) -> String {
            if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                return endpoint.to_string();
            }
            let base = self.base_url.trim_end_matches('/');
            let path = endpoint.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    fn multipart_form(payload: SubmissionPayload) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for part in payload.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::File { name, file } => {
                    let mut file_part = Part::bytes(file.contents).file_name(file.name);
                    if let Some(mime_type) = file.mime_type {
                        file_part = file_part.mime_str(&mime_type).map_err(|e| {
                            TransportError::new(format!("invalid mime type '{mime_type}': {e}"))
                        })?;
                    }
                    form.part(name, file_part)
                }
            };
        }
        Ok(form)
    }

    #[async_trait(?Send)]
    impl SubmissionTransport for HttpTransport {
        async fn post(
            &self,
            endpoint: &str,
            payload: SubmissionPayload,
        ) -> Result<TransportResponse, TransportError> {
            let url = self.url_for(endpoint);
            let parts = payload.parts.len();
            let form = multipart_form(payload)?;
            debug!(%url, parts, "posting form submission");

            let response = self
                .http
                .post(&url)
                .multipart(form)
                .send()
                .await
                .map_err(|e| TransportError::new(e.to_string()))?;

            let status = response.status().as_u16();
            let body = match response.bytes().await {
                Ok(bytes) => bytes.to_vec(),
                Err(error) => {
                    warn!(%url, status, %error, "failed to read submission response body");
                    Vec::new()
                }
            };
            Ok(TransportResponse { status, body })
        }
    }
}
