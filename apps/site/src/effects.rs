use std::time::Duration;

use tracing::warn;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Event, HtmlElement};
use wizard_core::{Notice, ViewEffect};

use crate::{describe_js, dom::PageForm};

/// Applies drained controller effects to the page. `event` is the DOM event
/// being handled, if any; `DefaultPrevented` is a no-op without one.
pub fn apply(page: &PageForm, effects: Vec<ViewEffect>, event: Option<&Event>) {
    for effect in effects {
        if let Err(err) = apply_one(page, effect, event) {
            warn!(error = %describe_js(&err), "failed to apply view effect");
        }
    }
}

fn apply_one(page: &PageForm, effect: ViewEffect, event: Option<&Event>) -> Result<(), JsValue> {
    match effect {
        ViewEffect::StepShown { index } => {
            for (position, step) in page.steps.iter().enumerate() {
                let shown = position == index;
                step.class_list().toggle_with_force("active", shown)?;
                step.style()
                    .set_property("display", if shown { "block" } else { "none" })?;
            }
        }
        ViewEffect::FieldMessage {
            step,
            field,
            message,
        } => report_field(page, step, &field, &message),
        ViewEffect::SectionVisibility { id, visible } => {
            let section = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(&id))
                .and_then(|element| element.dyn_into::<HtmlElement>().ok());
            if let Some(section) = section {
                let display = if visible { "block" } else { "none" };
                section.style().set_property("display", display)?;
            }
        }
        ViewEffect::DefaultPrevented => {
            if let Some(event) = event {
                event.prevent_default();
            }
        }
        ViewEffect::SubmitControl { enabled } => {
            for control in &page.submit_controls {
                control.toggle_attribute_with_force("disabled", !enabled)?;
            }
        }
        ViewEffect::FormHidden => {
            page.form.style().set_property("display", "none")?;
        }
        ViewEffect::SuccessShown { fade } => {
            if let Some(success) = &page.success {
                reveal(success, fade)?;
            }
        }
        ViewEffect::FieldsReset => page.form.reset(),
        ViewEffect::Notice(notice) => alert(&notice),
    }
    Ok(())
}

/// Lets the browser report the control. When the browser finds nothing
/// wrong, the wizard's own message is attached as a custom error and
/// reported instead.
fn report_field(page: &PageForm, step: usize, field: &str, message: &str) {
    let Some(control) = page.control(step, field) else {
        alert_message(message);
        return;
    };
    if control.report_validity() {
        control.set_custom_validity(message);
        if control.report_validity() {
            alert_message(message);
        }
    }
}

fn reveal(success: &HtmlElement, fade: Option<Duration>) -> Result<(), JsValue> {
    success.class_list().remove_1("hidden")?;
    // Reading layout forces a reflow so the icon inside renders before fading.
    let _ = success.offset_height();

    let Some(fade) = fade else {
        return Ok(());
    };
    let style = success.style();
    style.set_property("opacity", "0")?;
    style.set_property(
        "transition",
        &format!("opacity {}ms ease-in-out", fade.as_millis()),
    )?;
    let show = Closure::once_into_js(move || {
        let _ = style.set_property("opacity", "1");
    });
    if let Some(window) = web_sys::window() {
        window.request_animation_frame(show.unchecked_ref())?;
    }
    Ok(())
}

fn alert(notice: &Notice) {
    alert_message(&notice.message);
}

fn alert_message(message: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(err) = window.alert_with_message(message) {
            warn!(error = %describe_js(&err), "failed to show alert");
        }
    }
}
