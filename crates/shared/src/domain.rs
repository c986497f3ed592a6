use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{FieldViolation, FileSizeViolation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    DirectDeposit,
    PaperCheck,
    FfgCard,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::DirectDeposit,
        PaymentMethod::PaperCheck,
        PaymentMethod::FfgCard,
    ];

    /// Value carried by the `<option>` of the payment selector.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::DirectDeposit => "direct-deposit",
            PaymentMethod::PaperCheck => "paper-check",
            PaymentMethod::FfgCard => "ffg-card",
        }
    }

    /// Id of the sub-section revealed when this method is selected.
    pub fn section_id(self) -> &'static str {
        match self {
            PaymentMethod::DirectDeposit => "direct-deposit-section",
            PaymentMethod::PaperCheck => "paper-check-section",
            PaymentMethod::FfgCard => "ffg-card-section",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPaymentMethod(pub String);

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == value.trim())
            .ok_or_else(|| UnknownPaymentMethod(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// Let the browser post the form and follow the redirect.
    Navigation,
    /// Post in-page and render the result without leaving the page.
    #[default]
    Asynchronous,
}

impl FromStr for SubmissionMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "navigation" | "native" => Ok(SubmissionMode::Navigation),
            "asynchronous" | "async" | "fetch" => Ok(SubmissionMode::Asynchronous),
            other => Err(format!("unknown submission mode '{other}'")),
        }
    }
}

/// A file picked in a file input.
///
/// `size` is authoritative. Hosts that cannot read file contents up front
/// (the browser adapter) leave `contents` empty and only report metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub mime_type: Option<String>,
    pub contents: Vec<u8>,
}

impl SelectedFile {
    pub fn from_bytes(name: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: contents.len() as u64,
            mime_type: None,
            contents,
        }
    }

    pub fn metadata(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: None,
            contents: Vec::new(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Why a submission never left the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalRejection {
    InvalidField(FieldViolation),
    FileTooLarge(FileSizeViolation),
}

impl LocalRejection {
    pub fn message(&self) -> String {
        match self {
            LocalRejection::InvalidField(violation) => violation.to_string(),
            LocalRejection::FileTooLarge(violation) => violation.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The endpoint accepted the asynchronous submission.
    Success,
    /// Navigation mode passed local checks; the browser posts the form itself.
    NativeSubmission,
    ValidationFailure(LocalRejection),
    ServerError { status: u16, message: String },
    NetworkError { message: String },
    /// A submission is already pending; the call was ignored.
    InFlight,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SubmissionOutcome::Success | SubmissionOutcome::NativeSubmission
        )
    }
}
