use serde::{Deserialize, Serialize};

use crate::domain::SelectedFile;

/// One entry of a multipart submission body, in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text { name: String, value: String },
    File { name: String, file: SelectedFile },
}

impl FormPart {
    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub parts: Vec<FormPart>,
}

impl SubmissionPayload {
    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: SelectedFile) {
        self.parts.push(FormPart::File {
            name: name.into(),
            file,
        });
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &SelectedFile)> {
        self.parts.iter().filter_map(|part| match part {
            FormPart::File { name, file } => Some((name.as_str(), file)),
            FormPart::Text { .. } => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Body the endpoint may send back with a non-success status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionErrorBody {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Human-readable rejection message from a response body, if it carries one.
pub fn error_message_from_body(body: &[u8]) -> Option<String> {
    let parsed: SubmissionErrorBody = serde_json::from_slice(body).ok()?;
    parsed
        .error
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
}
