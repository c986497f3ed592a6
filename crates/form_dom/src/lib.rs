//! In-memory model of the application form: steps, fields, payment
//! sub-sections, the success container and the submit control.

use shared::{
    domain::{PaymentMethod, SelectedFile},
    protocol::SubmissionPayload,
};
use thiserror::Error;
use tracing::debug;

pub mod constraints;
pub mod field;
pub mod step;

pub use constraints::{ConstraintViolation, Constraints};
pub use field::{Field, FieldKind, FieldValue};
pub use step::StepView;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("no field named '{0}' in the form")]
    UnknownField(String),
    #[error("field '{field}' does not accept {expected}")]
    KindMismatch {
        field: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub key: String,
    pub id: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessContainer {
    pub id: String,
    pub visible: bool,
}

#[derive(Debug, Clone)]
pub struct FormDocument {
    steps: Vec<StepView>,
    sections: Vec<Section>,
    success: Option<SuccessContainer>,
    action: Option<String>,
    form_visible: bool,
    submit_enabled: bool,
}

impl FormDocument {
    pub fn new(steps: Vec<StepView>) -> Self {
        Self {
            steps,
            sections: Vec::new(),
            success: None,
            action: None,
            form_visible: true,
            submit_enabled: true,
        }
    }

    pub fn with_section(mut self, key: impl Into<String>, id: impl Into<String>) -> Self {
        self.register_section(key, id);
        self
    }

    pub fn with_payment_sections(mut self) -> Self {
        for method in PaymentMethod::ALL {
            self.register_section(method.as_str(), method.section_id());
        }
        self
    }

    pub fn with_success(mut self, id: impl Into<String>) -> Self {
        self.success = Some(SuccessContainer {
            id: id.into(),
            visible: false,
        });
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Later registrations for the same key replace the section id.
    pub fn register_section(&mut self, key: impl Into<String>, id: impl Into<String>) {
        let key = key.into();
        let id = id.into();
        match self.sections.iter_mut().find(|section| section.key == key) {
            Some(section) => section.id = id,
            None => self.sections.push(Section {
                key,
                id,
                visible: false,
            }),
        }
    }

    pub fn steps(&self) -> &[StepView] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StepView> {
        self.steps.get(index)
    }

    pub fn steps_mut(&mut self) -> &mut [StepView] {
        &mut self.steps
    }

    pub fn step_mut(&mut self, index: usize) -> Option<&mut StepView> {
        self.steps.get_mut(index)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn visible_steps(&self) -> Vec<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, step)| step.is_visible())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut [Section] {
        &mut self.sections
    }

    pub fn section(&self, key: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.key == key)
    }

    pub fn visible_sections(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|section| section.visible)
            .map(|section| section.id.as_str())
            .collect()
    }

    pub fn success(&self) -> Option<&SuccessContainer> {
        self.success.as_ref()
    }

    pub fn success_mut(&mut self) -> Option<&mut SuccessContainer> {
        self.success.as_mut()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn is_form_visible(&self) -> bool {
        self.form_visible
    }

    pub fn set_form_visible(&mut self, visible: bool) {
        self.form_visible = visible;
    }

    pub fn is_submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.steps.iter().find_map(|step| step.field(name))
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.steps.iter_mut().find_map(|step| step.field_mut(name))
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<(), DocumentError> {
        let field = self.existing_field_mut(name)?;
        if field.set_text(value) {
            Ok(())
        } else {
            Err(kind_mismatch(name, "text"))
        }
    }

    pub fn set_checked(&mut self, name: &str, checked: bool) -> Result<(), DocumentError> {
        let field = self.existing_field_mut(name)?;
        if field.set_checked(checked) {
            Ok(())
        } else {
            Err(kind_mismatch(name, "a checked state"))
        }
    }

    pub fn select_files(
        &mut self,
        name: &str,
        files: Vec<SelectedFile>,
    ) -> Result<(), DocumentError> {
        let field = self.existing_field_mut(name)?;
        if field.select_files(files) {
            Ok(())
        } else {
            Err(kind_mismatch(name, "files"))
        }
    }

    /// Checks the radio in group `name` whose value is `value` and clears the
    /// rest of the group.
    pub fn select_radio(&mut self, name: &str, value: &str) -> Result<(), DocumentError> {
        let mut found = false;
        for field in self.steps.iter_mut().flat_map(|step| step.fields_mut()) {
            if field.is_radio() && field.name() == name {
                let selected = field.checkbox_value() == value;
                found |= selected;
                field.set_checked(selected);
            }
        }
        if found {
            Ok(())
        } else {
            Err(DocumentError::UnknownField(format!("{name}={value}")))
        }
    }

    /// Constraint validation with form context: a radio is missing a value
    /// when any radio of its group is required and none is checked.
    pub fn check_field(&self, field: &Field) -> Result<(), ConstraintViolation> {
        if !field.is_radio() || field.name().is_empty() {
            return field.check_validity();
        }
        if !field.will_validate() {
            return Ok(());
        }
        let group = self
            .steps
            .iter()
            .flat_map(|step| step.fields())
            .filter(|other| other.is_radio() && other.name() == field.name());
        let (required, answered) = group.fold((false, false), |(required, answered), radio| {
            (
                required || radio.constraints().required,
                answered || radio.is_checked(),
            )
        });
        if required && !answered {
            Err(ConstraintViolation::RadioUnselected)
        } else {
            Ok(())
        }
    }

    pub fn first_invalid(&self, step: usize) -> Option<(&Field, ConstraintViolation)> {
        self.step(step)?
            .fields()
            .iter()
            .find_map(|field| self.check_field(field).err().map(|violation| (field, violation)))
    }

    pub fn reset(&mut self) {
        for step in &mut self.steps {
            for field in step.fields_mut() {
                field.reset();
            }
        }
        debug!(steps = self.steps.len(), "form fields reset");
    }

    /// Same parts, in the same order, as the browser's `FormData`.
    pub fn form_data(&self) -> SubmissionPayload {
        let mut payload = SubmissionPayload::default();
        for field in self.steps.iter().flat_map(|step| step.fields()) {
            if field.is_disabled() || field.name().is_empty() {
                continue;
            }
            match field.value() {
                FieldValue::Text(value) => payload.push_text(field.name(), value.clone()),
                FieldValue::Checked(true) => {
                    payload.push_text(field.name(), field.checkbox_value())
                }
                FieldValue::Checked(false) => {}
                FieldValue::Files(files) => {
                    for file in files {
                        payload.push_file(field.name(), file.clone());
                    }
                }
            }
        }
        payload
    }

    fn existing_field_mut(&mut self, name: &str) -> Result<&mut Field, DocumentError> {
        self.field_mut(name)
            .ok_or_else(|| DocumentError::UnknownField(name.to_string()))
    }
}

fn kind_mismatch(name: &str, expected: &'static str) -> DocumentError {
    DocumentError::KindMismatch {
        field: name.to_string(),
        expected,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
