//! Multi-step form wizard: step navigation gated on field validity, payment
//! sub-section toggling, upload size checks and native or in-page submission.
//!
//! The controller never touches a real page. It updates its `FormDocument`
//! and queues `ViewEffect`s for the host to apply.

pub mod config;
mod controller;
pub mod effects;
pub mod transport;

pub use config::{SettingsError, WizardSettings};
pub use controller::{PendingSubmission, SubmitStart, WizardController, WizardState};
pub use effects::{Notice, NoticeKind, ViewEffect};
pub use transport::{MissingTransport, SubmissionTransport, TransportResponse};

#[cfg(feature = "native")]
pub use config::{load_settings, load_settings_from};
#[cfg(feature = "native")]
pub use transport::HttpTransport;

pub use form_dom;
pub use shared;

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod controller_tests;

#[cfg(all(test, feature = "native"))]
#[path = "tests/transport_tests.rs"]
mod transport_tests;
