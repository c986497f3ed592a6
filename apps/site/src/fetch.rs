use async_trait::async_trait;
use shared::{error::TransportError, protocol::SubmissionPayload};
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, HtmlFormElement, RequestInit, Response};
use wizard_core::{SubmissionTransport, TransportResponse};

use crate::describe_js;

/// Posts the page's own form with `fetch`. The body is built from the form
/// element so selected files go out with their contents; the payload only
/// mirrors the field metadata the controller validated.
#[derive(Clone)]
pub struct FetchTransport {
    form: HtmlFormElement,
}

impl FetchTransport {
    pub fn new(form: HtmlFormElement) -> Self {
        Self { form }
    }
}

fn transport_error(value: JsValue) -> TransportError {
    TransportError::new(describe_js(&value))
}

#[async_trait(?Send)]
impl SubmissionTransport for FetchTransport {
    async fn post(
        &self,
        endpoint: &str,
        payload: SubmissionPayload,
    ) -> Result<TransportResponse, TransportError> {
        let window = web_sys::window().ok_or_else(|| TransportError::new("no window"))?;
        let body = FormData::new_with_form(&self.form).map_err(transport_error)?;
        debug!(endpoint, parts = payload.parts.len(), "posting form submission");

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_body(&body);
        let response: Response = JsFuture::from(window.fetch_with_str_and_init(endpoint, &init))
            .await
            .map_err(transport_error)?
            .dyn_into()
            .map_err(transport_error)?;

        let status = response.status();
        let body = match response.text() {
            Ok(text) => match JsFuture::from(text).await {
                Ok(text) => text.as_string().unwrap_or_default().into_bytes(),
                Err(err) => {
                    warn!(endpoint, status, error = %describe_js(&err), "failed to read submission response body");
                    Vec::new()
                }
            },
            Err(err) => {
                warn!(endpoint, status, error = %describe_js(&err), "failed to read submission response body");
                Vec::new()
            }
        };
        Ok(TransportResponse::new(status, body))
    }
}
