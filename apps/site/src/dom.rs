use form_dom::{Field, FormDocument, StepView};
use shared::domain::SelectedFile;
use tracing::debug;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, EventTarget, FileList, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement,
};
use wizard_core::WizardSettings;

use crate::{
    attributes::{self, ControlAttributes, ControlTag, SelectOption},
    SiteError,
};

const CONTROL_SELECTOR: &str = "input, select, textarea";
const SUBMIT_SELECTOR: &str = "button[type=submit], button:not([type]), input[type=submit]";
const SUCCESS_ID: &str = "formSuccess";
const PATTERN_FALLBACK_MESSAGE: &str = "Please match the requested format.";

/// A form control the wizard validates and reads values from.
#[derive(Clone)]
pub enum Control {
    Input(HtmlInputElement),
    Select(HtmlSelectElement),
    TextArea(HtmlTextAreaElement),
}

impl Control {
    fn from_element(element: Element) -> Option<Self> {
        let element = match element.dyn_into::<HtmlInputElement>() {
            Ok(input) => {
                let control = Control::Input(input);
                return (!control.attributes().is_button()).then_some(control);
            }
            Err(element) => element,
        };
        let element = match element.dyn_into::<HtmlSelectElement>() {
            Ok(select) => return Some(Control::Select(select)),
            Err(element) => element,
        };
        element.dyn_into::<HtmlTextAreaElement>().ok().map(Control::TextArea)
    }

    fn element(&self) -> &Element {
        match self {
            Control::Input(input) => input,
            Control::Select(select) => select,
            Control::TextArea(textarea) => textarea,
        }
    }

    pub fn name(&self) -> String {
        let element = self.element();
        attributes::control_name(element.get_attribute("name").as_deref(), &element.id())
    }

    fn is_disabled(&self) -> bool {
        match self {
            Control::Input(input) => input.disabled(),
            Control::Select(select) => select.disabled(),
            Control::TextArea(textarea) => textarea.disabled(),
        }
    }

    pub fn report_validity(&self) -> bool {
        match self {
            Control::Input(input) => input.report_validity(),
            Control::Select(select) => select.report_validity(),
            Control::TextArea(textarea) => textarea.report_validity(),
        }
    }

    /// An empty message clears the custom error.
    pub fn set_custom_validity(&self, message: &str) {
        match self {
            Control::Input(input) => input.set_custom_validity(message),
            Control::Select(select) => select.set_custom_validity(message),
            Control::TextArea(textarea) => textarea.set_custom_validity(message),
        }
    }

    fn attributes(&self) -> ControlAttributes {
        let element = self.element();
        let mut attributes = match self {
            Control::Input(input) => {
                let mut attributes = ControlAttributes::new(ControlTag::input(&input.type_()));
                attributes.value = input.value();
                attributes.default_value = input.default_value();
                attributes.default_checked = input.default_checked();
                attributes.multiple = input.multiple();
                attributes
            }
            Control::Select(select) => ControlAttributes::new(ControlTag::Select {
                options: select_options(select),
            }),
            Control::TextArea(textarea) => {
                let mut attributes = ControlAttributes::new(ControlTag::TextArea);
                attributes.default_value = textarea.default_value();
                attributes
            }
        };
        attributes.name = element.get_attribute("name");
        attributes.id = element.id();
        attributes.disabled = self.is_disabled();
        attributes.required = element.has_attribute("required");
        attributes.pattern = element.get_attribute("pattern");
        attributes.title = element.get_attribute("title");
        attributes.min_length = element.get_attribute("minlength");
        attributes.max_length = element.get_attribute("maxlength");
        attributes.min = element.get_attribute("min");
        attributes.max = element.get_attribute("max");
        attributes.step = element.get_attribute("step");
        attributes.accept = element.get_attribute("accept");
        attributes
    }

    fn to_field(&self) -> Field {
        self.attributes().to_field()
    }

    /// Copies the live DOM state into `field`.
    fn read_into(&self, field: &mut Field) {
        // Stale messages from an earlier report would otherwise mask the
        // control's own validity.
        self.set_custom_validity("");
        field.set_disabled(self.is_disabled());
        match self {
            Control::Input(input) if field.is_file() => {
                field.select_files(input.files().map(selected_files).unwrap_or_default());
            }
            Control::Input(input) if field.kind().is_checkable() => {
                field.set_checked(input.checked());
            }
            Control::Input(input) => {
                field.set_text(input.value());
                field.set_custom_error(deferred_pattern_error(input, field));
            }
            Control::Select(select) => {
                field.set_text(select.value());
            }
            Control::TextArea(textarea) => {
                field.set_text(textarea.value());
            }
        }
    }
}

/// Drops a message attached by an earlier report once the user edits the
/// control, so native submission is not blocked by it.
pub fn clear_custom_validity(target: Option<EventTarget>) {
    if let Some(control) = target
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(Control::from_element)
    {
        control.set_custom_validity("");
    }
}

/// Patterns the wizard could not compile are still enforced, using the
/// browser's verdict.
fn deferred_pattern_error(input: &HtmlInputElement, field: &Field) -> Option<String> {
    if field.constraints().pattern.is_some() || !input.has_attribute("pattern") {
        return None;
    }
    if !input.validity().pattern_mismatch() {
        return None;
    }
    let message = input.validation_message().unwrap_or_default();
    if message.is_empty() {
        Some(PATTERN_FALLBACK_MESSAGE.to_string())
    } else {
        Some(message)
    }
}

fn select_options(select: &HtmlSelectElement) -> Vec<SelectOption> {
    let options = select.options();
    (0..options.length())
        .filter_map(|index| options.item(index))
        .filter_map(|element| element.dyn_into::<HtmlOptionElement>().ok())
        .map(|option| SelectOption {
            value: option.value(),
            default_selected: option.default_selected(),
        })
        .collect()
}

fn selected_files(list: FileList) -> Vec<SelectedFile> {
    (0..list.length())
        .filter_map(|index| list.get(index))
        .map(|file| {
            let selected = SelectedFile::metadata(file.name(), file.size() as u64);
            let mime_type = file.type_();
            if mime_type.is_empty() {
                selected
            } else {
                selected.with_mime_type(mime_type)
            }
        })
        .collect()
}

/// The wizard's form and the elements the controller's state maps onto.
/// `controls[step][i]` backs field `i` of that step in the document.
pub struct PageForm {
    pub form: HtmlFormElement,
    pub steps: Vec<HtmlElement>,
    pub controls: Vec<Vec<Control>>,
    pub submit_controls: Vec<Element>,
    pub success: Option<HtmlElement>,
}

impl PageForm {
    pub fn control(&self, step: usize, name: &str) -> Option<&Control> {
        self.controls
            .get(step)?
            .iter()
            .find(|control| control.name() == name)
    }
}

/// Builds the in-memory document from the first form holding `.form-step`
/// containers. Returns `None` when the page has no wizard.
pub fn scan(document: &Document) -> Result<Option<(PageForm, FormDocument)>, SiteError> {
    let Some(first_step) = document.query_selector(".form-step")? else {
        return Ok(None);
    };
    let form = first_step
        .closest("form")?
        .and_then(|element| element.dyn_into::<HtmlFormElement>().ok())
        .ok_or(SiteError::Missing("a form around the .form-step containers"))?;

    let step_nodes = form.query_selector_all(".form-step")?;
    let mut steps = Vec::new();
    let mut controls = Vec::new();
    let mut views = Vec::new();
    for index in 0..step_nodes.length() {
        let Some(step) = step_nodes
            .item(index)
            .and_then(|node| node.dyn_into::<HtmlElement>().ok())
        else {
            continue;
        };

        let mut view = match step
            .query_selector("h2, h3")?
            .and_then(|heading| heading.text_content())
        {
            Some(title) => StepView::titled(title.trim()),
            None => StepView::new(),
        };
        let mut step_controls = Vec::new();
        let control_nodes = step.query_selector_all(CONTROL_SELECTOR)?;
        for position in 0..control_nodes.length() {
            let Some(control) = control_nodes
                .item(position)
                .and_then(|node| node.dyn_into::<Element>().ok())
                .and_then(Control::from_element)
            else {
                continue;
            };
            view.push_field(control.to_field());
            step_controls.push(control);
        }

        steps.push(step);
        controls.push(step_controls);
        views.push(view);
    }

    let submit_nodes = form.query_selector_all(SUBMIT_SELECTOR)?;
    let submit_controls = (0..submit_nodes.length())
        .filter_map(|index| submit_nodes.item(index))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect();

    let success = document
        .get_element_by_id(SUCCESS_ID)
        .and_then(|element| element.dyn_into::<HtmlElement>().ok());

    let mut form_document = FormDocument::new(views);
    if success.is_some() {
        form_document = form_document.with_success(SUCCESS_ID);
    }
    if let Some(action) = form.get_attribute("action").filter(|a| !a.trim().is_empty()) {
        form_document = form_document.with_action(action);
    }
    debug!(steps = steps.len(), "scanned form wizard");

    Ok(Some((
        PageForm {
            form,
            steps,
            controls,
            submit_controls,
            success,
        },
        form_document,
    )))
}

/// Copies live control values of one step into the document.
pub fn sync_step(page: &PageForm, document: &mut FormDocument, step: usize) {
    let (Some(controls), Some(view)) = (page.controls.get(step), document.step_mut(step)) else {
        return;
    };
    for (control, field) in controls.iter().zip(view.fields_mut()) {
        control.read_into(field);
    }
}

pub fn sync_all(page: &PageForm, document: &mut FormDocument) {
    for step in 0..page.controls.len() {
        sync_step(page, document, step);
    }
}

pub fn settings_for(form: &HtmlFormElement) -> WizardSettings {
    attributes::settings_from_attributes(
        form.get_attribute("data-submit-mode").as_deref(),
        form.get_attribute("data-max-file-bytes").as_deref(),
    )
}
