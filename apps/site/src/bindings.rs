use std::{cell::RefCell, rc::Rc};

use shared::domain::SubmissionMode;
use tracing::{debug, info};
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Event, EventTarget, HtmlSelectElement};
use wizard_core::{SubmissionTransport, SubmitStart, WizardController};

use crate::{dom, dom::PageForm, effects, fetch::FetchTransport, SiteError};

type SharedWizard = Rc<RefCell<WizardController<FetchTransport>>>;

/// Scans the page, shows the first step and wires the buttons, the payment
/// selector and the form's submit event. Returns `false` when there is no
/// wizard on the page.
pub fn mount() -> Result<bool, SiteError> {
    let window = web_sys::window().ok_or(SiteError::Missing("a window"))?;
    let document = window.document().ok_or(SiteError::Missing("a document"))?;
    let Some((page, form_document)) = dom::scan(&document)? else {
        return Ok(false);
    };

    let settings = dom::settings_for(&page.form);
    let mode = settings.mode;
    let transport = FetchTransport::new(page.form.clone());
    let page = Rc::new(page);
    let wizard: SharedWizard = Rc::new(RefCell::new(WizardController::new(
        form_document,
        settings,
        transport,
    )));
    flush(&page, &wizard, None);

    bind_step_buttons(&document, &page, &wizard)?;
    bind_payment_select(&document, &page, &wizard)?;
    bind_submit(&page, &wizard, mode)?;
    bind_edits(&page)?;

    info!(steps = page.steps.len(), ?mode, "form wizard mounted");
    Ok(true)
}

fn listen(
    target: &EventTarget,
    event: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), SiteError> {
    let callback = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
    // Listeners live as long as the page.
    callback.forget();
    Ok(())
}

fn flush(page: &PageForm, wizard: &SharedWizard, event: Option<&Event>) {
    let pending = wizard.borrow_mut().drain_effects();
    effects::apply(page, pending, event);
}

fn bind_step_buttons(
    document: &Document,
    page: &Rc<PageForm>,
    wizard: &SharedWizard,
) -> Result<(), SiteError> {
    for (selector, forward) in [(".next-btn", true), (".prev-btn", false)] {
        let buttons = document.query_selector_all(selector)?;
        for index in 0..buttons.length() {
            let Some(button) = buttons.item(index) else {
                continue;
            };
            let page = Rc::clone(page);
            let wizard = Rc::clone(wizard);
            listen(&button, "click", move |_event| {
                {
                    let mut wizard = wizard.borrow_mut();
                    let moved = if forward {
                        let current = wizard.current_step();
                        dom::sync_step(&page, wizard.document_mut(), current);
                        wizard.go_next()
                    } else {
                        wizard.go_previous()
                    };
                    debug!(forward, moved, step = wizard.current_step(), "step button clicked");
                }
                flush(&page, &wizard, None);
            })?;
        }
    }
    Ok(())
}

fn bind_payment_select(
    document: &Document,
    page: &Rc<PageForm>,
    wizard: &SharedWizard,
) -> Result<(), SiteError> {
    let Some(select) = document
        .get_element_by_id("payment-method")
        .and_then(|element| element.dyn_into::<HtmlSelectElement>().ok())
    else {
        return Ok(());
    };
    let page = Rc::clone(page);
    let wizard = Rc::clone(wizard);
    let source = select.clone();
    listen(&select, "change", move |_event| {
        wizard.borrow_mut().toggle_payment_section(&source.value());
        flush(&page, &wizard, None);
    })
}

fn bind_edits(page: &PageForm) -> Result<(), SiteError> {
    for event in ["input", "change"] {
        listen(&page.form, event, |event| dom::clear_custom_validity(event.target()))?;
    }
    Ok(())
}

fn bind_submit(
    page: &Rc<PageForm>,
    wizard: &SharedWizard,
    mode: SubmissionMode,
) -> Result<(), SiteError> {
    let target = page.form.clone();
    let page = Rc::clone(page);
    let wizard = Rc::clone(wizard);
    listen(&target, "submit", move |event| {
        let start = {
            let mut wizard = wizard.borrow_mut();
            dom::sync_all(&page, wizard.document_mut());
            wizard.begin_submit(mode)
        };
        // preventDefault only counts while the event is being dispatched.
        flush(&page, &wizard, Some(&event));

        let SubmitStart::Pending(pending) = start else {
            return;
        };
        let page = Rc::clone(&page);
        let wizard = Rc::clone(&wizard);
        spawn_local(async move {
            let transport = wizard.borrow().transport().clone();
            let result = transport.post(&pending.endpoint, pending.payload).await;
            let outcome = wizard.borrow_mut().finish_submit(result);
            debug!(?outcome, "form submission settled");
            flush(&page, &wizard, None);
        });
    })
}
