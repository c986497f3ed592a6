use form_dom::FormDocument;
use shared::{
    domain::{LocalRejection, SubmissionMode, SubmissionOutcome},
    error::{FieldViolation, FileSizeViolation, TransportError, WizardError},
    protocol::{error_message_from_body, SubmissionPayload},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::WizardSettings,
    effects::{Notice, ViewEffect},
    transport::{SubmissionTransport, TransportResponse},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WizardState {
    pub current_step: usize,
}

/// A request `begin_submit` decided to send. Hand it to the transport and
/// pass the result to `finish_submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub endpoint: String,
    pub payload: SubmissionPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStart {
    Settled(SubmissionOutcome),
    Pending(PendingSubmission),
}

pub struct WizardController<T: SubmissionTransport> {
    document: FormDocument,
    state: WizardState,
    settings: WizardSettings,
    transport: T,
    effects: Vec<ViewEffect>,
}

impl<T: SubmissionTransport> WizardController<T> {
    pub fn new(document: FormDocument, settings: WizardSettings, transport: T) -> Self {
        let mut controller = Self {
            document,
            state: WizardState::default(),
            settings,
            transport,
            effects: Vec::new(),
        };
        for (key, id) in &controller.settings.payment_sections {
            controller.document.register_section(key.clone(), id.clone());
        }
        controller.show_step(0);
        controller
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn step_count(&self) -> usize {
        self.document.step_count()
    }

    pub fn is_last_step(&self) -> bool {
        let count = self.step_count();
        count > 0 && self.state.current_step == count - 1
    }

    pub fn document(&self) -> &FormDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut FormDocument {
        &mut self.document
    }

    pub fn settings(&self) -> &WizardSettings {
        &self.settings
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn pending_effects(&self) -> &[ViewEffect] {
        &self.effects
    }

    pub fn drain_effects(&mut self) -> Vec<ViewEffect> {
        std::mem::take(&mut self.effects)
    }

    pub fn show_step(&mut self, index: usize) {
        let count = self.document.step_count();
        if index >= count {
            debug!(step = index, steps = count, "ignoring show_step outside the wizard");
            return;
        }
        for (position, step) in self.document.steps_mut().iter_mut().enumerate() {
            step.set_visible(position == index);
        }
        self.effects.push(ViewEffect::StepShown { index });
        debug!(step = index, steps = count, "showing form step");
    }

    pub fn validate_step(&mut self, index: usize) -> bool {
        match self.first_violation(index) {
            None => true,
            Some(violation) => {
                self.report_field(violation);
                false
            }
        }
    }

    pub fn go_next(&mut self) -> bool {
        if self.step_count() == 0 {
            return false;
        }
        let current = self.state.current_step;
        if !self.validate_step(current) || self.is_last_step() {
            return false;
        }
        self.state.current_step = current + 1;
        self.show_step(self.state.current_step);
        true
    }

    pub fn go_previous(&mut self) -> bool {
        if self.state.current_step == 0 || self.step_count() == 0 {
            return false;
        }
        self.state.current_step -= 1;
        self.show_step(self.state.current_step);
        true
    }

    /// Hides every registered sub-section, then reveals the one mapped to
    /// `selection`. Returns the revealed section id.
    pub fn toggle_payment_section(&mut self, selection: &str) -> Option<String> {
        for section in self.document.sections_mut() {
            section.visible = false;
            self.effects.push(ViewEffect::SectionVisibility {
                id: section.id.clone(),
                visible: false,
            });
        }

        let key = selection.trim();
        let section = self
            .document
            .sections_mut()
            .iter_mut()
            .find(|section| section.key == key)?;
        section.visible = true;
        let id = section.id.clone();
        self.effects.push(ViewEffect::SectionVisibility {
            id: id.clone(),
            visible: true,
        });
        debug!(selection = key, section = %id, "payment section shown");
        Some(id)
    }

    pub fn check_file_constraints(
        &mut self,
        step: usize,
        max_bytes: u64,
    ) -> Result<(), FileSizeViolation> {
        match self.oversized_file(step, max_bytes) {
            None => Ok(()),
            Some(violation) => {
                warn!(
                    field = %violation.field,
                    file = %violation.file_name,
                    size = violation.size,
                    max_bytes,
                    "file exceeds upload limit"
                );
                self.notify(&WizardError::FileSize(violation.clone()));
                Err(violation)
            }
        }
    }

    pub fn begin_submit(&mut self, mode: SubmissionMode) -> SubmitStart {
        if mode == SubmissionMode::Asynchronous {
            self.effects.push(ViewEffect::DefaultPrevented);
        }
        if !self.document.is_submit_enabled() {
            debug!("submission already in flight");
            return SubmitStart::Settled(SubmissionOutcome::InFlight);
        }

        if let Err(rejection) = self.check_before_submit() {
            if mode == SubmissionMode::Navigation {
                self.effects.push(ViewEffect::DefaultPrevented);
            }
            return SubmitStart::Settled(SubmissionOutcome::ValidationFailure(rejection));
        }

        match mode {
            SubmissionMode::Navigation => {
                info!(step = self.state.current_step, "native form submission allowed");
                SubmitStart::Settled(SubmissionOutcome::NativeSubmission)
            }
            SubmissionMode::Asynchronous => {
                self.set_submit_enabled(false);
                SubmitStart::Pending(PendingSubmission {
                    endpoint: self.endpoint().to_string(),
                    payload: self.document.form_data(),
                })
            }
        }
    }

    /// Applies the transport result. The submit control is re-enabled on
    /// every path.
    pub fn finish_submit(
        &mut self,
        result: Result<TransportResponse, TransportError>,
    ) -> SubmissionOutcome {
        let outcome = match result {
            Ok(response) if response.is_success() => {
                info!(status = response.status, "form submission accepted");
                self.complete_success();
                SubmissionOutcome::Success
            }
            Ok(response) => {
                let message = error_message_from_body(&response.body)
                    .unwrap_or_else(|| self.settings.generic_error_message.clone());
                warn!(status = response.status, %message, "form submission rejected");
                self.notify(&WizardError::Server {
                    status: response.status,
                    message: message.clone(),
                });
                SubmissionOutcome::ServerError {
                    status: response.status,
                    message,
                }
            }
            Err(transport_error) => {
                error!(error = %transport_error, "form submission did not complete");
                self.notify(&WizardError::Network(transport_error));
                SubmissionOutcome::NetworkError {
                    message: self.settings.network_error_message.clone(),
                }
            }
        };
        self.set_submit_enabled(true);
        outcome
    }

    pub async fn submit(&mut self, mode: SubmissionMode) -> SubmissionOutcome {
        let pending = match self.begin_submit(mode) {
            SubmitStart::Settled(outcome) => return outcome,
            SubmitStart::Pending(pending) => pending,
        };
        let result = self
            .transport
            .post(&pending.endpoint, pending.payload)
            .await;
        self.finish_submit(result)
    }

    pub fn endpoint(&self) -> &str {
        match self.document.action() {
            Some(action) if !action.trim().is_empty() => action,
            _ => &self.settings.endpoint,
        }
    }

    fn first_violation(&self, index: usize) -> Option<FieldViolation> {
        self.document
            .first_invalid(index)
            .map(|(field, violation)| FieldViolation::new(index, field.name(), violation.to_string()))
    }

    fn oversized_file(&self, step: usize, max_bytes: u64) -> Option<FileSizeViolation> {
        let step = self.document.step(step)?;
        step.file_fields()
            .filter(|field| !field.is_disabled())
            .flat_map(|field| field.files().iter().map(move |file| (field, file)))
            .find(|(_, file)| file.size > max_bytes)
            .map(|(field, file)| FileSizeViolation {
                field: field.name().to_string(),
                file_name: file.name.clone(),
                size: file.size,
                max_bytes,
            })
    }

    fn check_before_submit(&mut self) -> Result<(), LocalRejection> {
        let current = self.state.current_step;
        if let Some(violation) = self.first_violation(current) {
            self.report_field(violation.clone());
            return Err(LocalRejection::InvalidField(violation));
        }
        if self.is_last_step() {
            if let Some(max_bytes) = self.settings.file_limit() {
                self.check_file_constraints(current, max_bytes)
                    .map_err(LocalRejection::FileTooLarge)?;
            }
        }
        Ok(())
    }

    fn report_field(&mut self, violation: FieldViolation) {
        warn!(
            step = violation.step,
            field = %violation.field,
            message = %violation.message,
            "form field failed validation"
        );
        self.effects.push(ViewEffect::FieldMessage {
            step: violation.step,
            field: violation.field,
            message: violation.message,
        });
    }

    fn notify(&mut self, error: &WizardError) {
        let notice = Notice::from_error(error, &self.settings.network_error_message);
        self.effects.push(ViewEffect::Notice(notice));
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.document.set_submit_enabled(enabled);
        self.effects.push(ViewEffect::SubmitControl { enabled });
    }

    fn complete_success(&mut self) {
        self.document.set_form_visible(false);
        self.effects.push(ViewEffect::FormHidden);

        if let Some(success) = self.document.success_mut() {
            success.visible = true;
            self.effects.push(ViewEffect::SuccessShown {
                fade: self.settings.success_fade(),
            });
        }

        self.document.reset();
        self.effects.push(ViewEffect::FieldsReset);

        self.state = WizardState::default();
        self.show_step(0);
    }
}
