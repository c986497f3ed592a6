//! Visible changes produced by the controller, drained and applied by the host.

use std::time::Duration;

use shared::error::WizardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    FileSize,
    Server,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    /// Transport failures carry technical detail; the user gets
    /// `network_message` instead.
    pub fn from_error(error: &WizardError, network_message: &str) -> Self {
        match error {
            WizardError::Field(violation) => Self {
                kind: NoticeKind::Validation,
                message: violation.message.clone(),
            },
            WizardError::FileSize(violation) => Self {
                kind: NoticeKind::FileSize,
                message: violation.to_string(),
            },
            WizardError::Server { message, .. } => Self {
                kind: NoticeKind::Server,
                message: message.clone(),
            },
            WizardError::Network(_) => Self {
                kind: NoticeKind::Network,
                message: network_message.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEffect {
    StepShown {
        index: usize,
    },
    /// Inline validation bubble on one field, like `reportValidity()`.
    FieldMessage {
        step: usize,
        field: String,
        message: String,
    },
    SectionVisibility {
        id: String,
        visible: bool,
    },
    DefaultPrevented,
    SubmitControl {
        enabled: bool,
    },
    FormHidden,
    SuccessShown {
        fade: Option<Duration>,
    },
    FieldsReset,
    Notice(Notice),
}

impl ViewEffect {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            ViewEffect::Notice(notice) => Some(notice),
            _ => None,
        }
    }
}
