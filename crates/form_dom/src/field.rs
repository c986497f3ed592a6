use shared::domain::SelectedFile;

use crate::constraints::{self, ConstraintViolation, Constraints};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Tel,
    Url,
    Date,
    Time,
    Month,
    Week,
    DateTimeLocal,
    Password,
    Hidden,
    Select { options: Vec<String> },
    TextArea,
    Checkbox,
    /// One button of a radio group; the group is every radio sharing a name.
    Radio,
    File,
}

impl FieldKind {
    /// Maps an `<input type=...>` attribute. Unknown types behave as text,
    /// like they do in browsers.
    pub fn from_input_type(input_type: &str) -> Self {
        match input_type.trim().to_ascii_lowercase().as_str() {
            "email" => FieldKind::Email,
            "number" => FieldKind::Number,
            "tel" => FieldKind::Tel,
            "url" => FieldKind::Url,
            "date" => FieldKind::Date,
            "time" => FieldKind::Time,
            "month" => FieldKind::Month,
            "week" => FieldKind::Week,
            "datetime-local" => FieldKind::DateTimeLocal,
            "password" => FieldKind::Password,
            "hidden" => FieldKind::Hidden,
            "checkbox" => FieldKind::Checkbox,
            "radio" => FieldKind::Radio,
            "file" => FieldKind::File,
            _ => FieldKind::Text,
        }
    }

    pub fn is_checkable(&self) -> bool {
        matches!(self, FieldKind::Checkbox | FieldKind::Radio)
    }

    fn empty_value(&self) -> FieldValue {
        match self {
            _ if self.is_checkable() => FieldValue::Checked(false),
            FieldKind::File => FieldValue::Files(Vec::new()),
            _ => FieldValue::Text(String::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
    Files(Vec<SelectedFile>),
}

#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    constraints: Constraints,
    value: FieldValue,
    default_value: FieldValue,
    checkbox_value: String,
    disabled: bool,
    custom_error: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let value = kind.empty_value();
        Self {
            name: name.into(),
            kind,
            constraints: Constraints::default(),
            default_value: value.clone(),
            value,
            checkbox_value: "on".to_string(),
            disabled: false,
            custom_error: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Email)
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::File)
    }

    pub fn radio(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Radio).with_checkbox_value(value)
    }

    pub fn select(name: impl Into<String>, options: Vec<String>) -> Self {
        Self::new(name, FieldKind::Select { options })
    }

    pub fn required(mut self) -> Self {
        self.constraints.required = true;
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, fancy_regex::Error> {
        self.constraints.pattern = Some(Constraints::compile_pattern(pattern)?);
        Ok(self)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.constraints.title = Some(title.into());
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.constraints.min_length = Some(min);
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.constraints.max_length = Some(max);
        self
    }

    pub fn with_min(mut self, min: impl Into<String>) -> Self {
        self.constraints.min = Some(min.into());
        self
    }

    pub fn with_max(mut self, max: impl Into<String>) -> Self {
        self.constraints.max = Some(max.into());
        self
    }

    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.constraints.step = Some(step.into());
        self
    }

    pub fn allow_multiple(mut self) -> Self {
        self.constraints.multiple = true;
        self
    }

    pub fn with_accept(mut self, accept: &str) -> Self {
        self.constraints.accept = Constraints::parse_accept(accept);
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        if let FieldValue::Text(_) = self.value {
            let value = FieldValue::Text(value.into());
            self.default_value = value.clone();
            self.value = value;
        }
        self
    }

    pub fn with_default_checked(mut self, checked: bool) -> Self {
        if let FieldValue::Checked(_) = self.value {
            self.default_value = FieldValue::Checked(checked);
            self.value = FieldValue::Checked(checked);
        }
        self
    }

    pub fn with_checkbox_value(mut self, value: impl Into<String>) -> Self {
        self.checkbox_value = value.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn is_checked(&self) -> bool {
        matches!(self.value, FieldValue::Checked(true))
    }

    pub fn is_radio(&self) -> bool {
        matches!(self.kind, FieldKind::Radio)
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, FieldKind::File)
    }

    pub fn checkbox_value(&self) -> &str {
        &self.checkbox_value
    }

    pub fn text_value(&self) -> &str {
        match &self.value {
            FieldValue::Text(value) => value,
            FieldValue::Checked(_) | FieldValue::Files(_) => "",
        }
    }

    pub fn files(&self) -> &[SelectedFile] {
        match &self.value {
            FieldValue::Files(files) => files,
            FieldValue::Text(_) | FieldValue::Checked(_) => &[],
        }
    }

    pub fn set_text(&mut self, value: impl Into<String>) -> bool {
        match &mut self.value {
            FieldValue::Text(current) => {
                *current = value.into();
                true
            }
            FieldValue::Checked(_) | FieldValue::Files(_) => false,
        }
    }

    pub fn set_checked(&mut self, checked: bool) -> bool {
        match &mut self.value {
            FieldValue::Checked(current) => {
                *current = checked;
                true
            }
            FieldValue::Text(_) | FieldValue::Files(_) => false,
        }
    }

    pub fn select_files(&mut self, files: Vec<SelectedFile>) -> bool {
        match &mut self.value {
            FieldValue::Files(current) => {
                *current = files;
                true
            }
            FieldValue::Text(_) | FieldValue::Checked(_) => false,
        }
    }

    pub fn reset(&mut self) {
        self.value = self.default_value.clone();
    }

    /// Disabled and hidden inputs are barred from constraint validation.
    pub fn will_validate(&self) -> bool {
        !self.disabled && self.kind != FieldKind::Hidden
    }

    /// Like `setCustomValidity`: a non-empty message makes the field invalid
    /// until it is cleared.
    pub fn set_custom_error(&mut self, message: Option<String>) {
        self.custom_error = message.filter(|message| !message.is_empty());
    }

    pub fn check_validity(&self) -> Result<(), ConstraintViolation> {
        if !self.will_validate() {
            return Ok(());
        }
        if let Some(message) = &self.custom_error {
            return Err(ConstraintViolation::Custom(message.clone()));
        }
        constraints::check(self)
    }
}
