//! Browser host for the application wizard. Mounts itself on pages that
//! contain `.form-step` containers and does nothing elsewhere.

mod attributes;
mod bindings;
mod dom;
mod effects;
mod fetch;

use thiserror::Error;
use tracing::{debug, error};
use wasm_bindgen::{prelude::*, JsCast};

pub use fetch::FetchTransport;

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("browser call failed: {0}")]
    Js(String),
    #[error("page is missing {0}")]
    Missing(&'static str),
}

impl From<JsValue> for SiteError {
    fn from(value: JsValue) -> Self {
        SiteError::Js(describe_js(&value))
    }
}

pub(crate) fn describe_js(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    match bindings::mount() {
        Ok(true) => Ok(()),
        Ok(false) => {
            debug!("no form steps on this page");
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "failed to mount form wizard");
            Err(JsValue::from_str(&err.to_string()))
        }
    }
}
