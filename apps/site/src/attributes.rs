//! Page-independent half of the DOM scan: turns the attributes read off a
//! control into a wizard field, and form attributes into settings.

use form_dom::{Field, FieldKind};
use shared::domain::SubmissionMode;
use tracing::warn;
use wizard_core::WizardSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub default_selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlTag {
    Input { input_type: String },
    Select { options: Vec<SelectOption> },
    TextArea,
}

impl ControlTag {
    pub fn input(input_type: &str) -> Self {
        ControlTag::Input {
            input_type: input_type.trim().to_ascii_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlAttributes {
    pub tag: ControlTag,
    pub name: Option<String>,
    pub id: String,
    /// Live `value`; for checkboxes and radios, the submitted value.
    pub value: String,
    pub default_value: String,
    pub default_checked: bool,
    pub disabled: bool,
    pub required: bool,
    pub pattern: Option<String>,
    pub title: Option<String>,
    pub min_length: Option<String>,
    pub max_length: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub step: Option<String>,
    pub multiple: bool,
    pub accept: Option<String>,
}

impl ControlAttributes {
    pub fn new(tag: ControlTag) -> Self {
        Self {
            tag,
            name: None,
            id: String::new(),
            value: String::new(),
            default_value: String::new(),
            default_checked: false,
            disabled: false,
            required: false,
            pattern: None,
            title: None,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            step: None,
            multiple: false,
            accept: None,
        }
    }

    pub fn name(&self) -> String {
        control_name(self.name.as_deref(), &self.id)
    }

    /// Buttons live inside steps but take no part in validation or submission data.
    pub fn is_button(&self) -> bool {
        matches!(
            &self.tag,
            ControlTag::Input { input_type }
                if matches!(input_type.as_str(), "submit" | "button" | "reset" | "image")
        )
    }

    pub fn to_field(&self) -> Field {
        let name = self.name();
        let field = match &self.tag {
            ControlTag::Input { input_type } => match FieldKind::from_input_type(input_type) {
                FieldKind::Checkbox => Field::new(name, FieldKind::Checkbox)
                    .with_checkbox_value(self.value.clone())
                    .with_default_checked(self.default_checked),
                FieldKind::Radio => Field::radio(name, self.value.clone())
                    .with_default_checked(self.default_checked),
                FieldKind::File => Field::file(name),
                kind => Field::new(name, kind).with_default(self.default_value.clone()),
            },
            ControlTag::Select { options } => {
                let default = options
                    .iter()
                    .find(|option| option.default_selected)
                    .or_else(|| options.first())
                    .map(|option| option.value.clone())
                    .unwrap_or_default();
                Field::select(
                    name,
                    options.iter().map(|option| option.value.clone()).collect(),
                )
                .with_default(default)
            }
            ControlTag::TextArea => {
                Field::new(name, FieldKind::TextArea).with_default(self.default_value.clone())
            }
        };
        let field = self.apply_constraints(field);
        if self.disabled {
            field.disabled()
        } else {
            field
        }
    }

    fn apply_constraints(&self, mut field: Field) -> Field {
        if self.required {
            field = field.required();
        }
        if let Some(pattern) = &self.pattern {
            field = match field.clone().with_pattern(pattern) {
                Ok(field) => field,
                Err(error) => {
                    // The page's own validity state decides this pattern at sync time.
                    warn!(field = field.name(), %pattern, %error, "pattern deferred to the browser");
                    field
                }
            };
        }
        if let Some(title) = &self.title {
            field = field.with_title(title.clone());
        }
        if let Some(min) = parse_length(self.min_length.as_deref()) {
            field = field.with_min_length(min);
        }
        if let Some(max) = parse_length(self.max_length.as_deref()) {
            field = field.with_max_length(max);
        }
        if let Some(min) = &self.min {
            field = field.with_min(min.clone());
        }
        if let Some(max) = &self.max {
            field = field.with_max(max.clone());
        }
        if let Some(step) = &self.step {
            field = field.with_step(step.clone());
        }
        if self.multiple {
            field = field.allow_multiple();
        }
        if let Some(accept) = &self.accept {
            field = field.with_accept(accept);
        }
        field
    }
}

fn parse_length(raw: Option<&str>) -> Option<usize> {
    raw?.trim().parse().ok()
}

/// The submitted name, falling back to the id for unnamed controls.
pub fn control_name(name: Option<&str>, id: &str) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => id.to_string(),
    }
}

/// Default settings with the overrides a page can declare on its form:
/// `data-submit-mode` and `data-max-file-bytes`. Unusable values are logged
/// and ignored.
pub fn settings_from_attributes(
    submit_mode: Option<&str>,
    max_file_bytes: Option<&str>,
) -> WizardSettings {
    let mut settings = WizardSettings::default();
    if let Some(raw) = submit_mode {
        match raw.parse::<SubmissionMode>() {
            Ok(mode) => settings = settings.with_mode(mode),
            Err(error) => warn!(%error, "ignoring data-submit-mode"),
        }
    }
    if let Some(raw) = max_file_bytes {
        match raw.trim().parse::<u64>() {
            Ok(max_bytes) => settings = settings.with_max_file_bytes(max_bytes),
            Err(error) => warn!(value = %raw, %error, "ignoring data-max-file-bytes"),
        }
    }
    settings
}

#[cfg(test)]
#[path = "tests/attributes_tests.rs"]
mod tests;
