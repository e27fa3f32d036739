// 🧾 Registration Form - element ids, document seam and event dispatch
//
// The browser page has up to nine elements the helpers care about. Presence
// is checked once in `FormBindings::detect`; missing elements are skipped.

use crate::autofill::{CepAutofill, LookupOutcome};
use crate::lookup::AddressLookup;
use crate::masks::FieldKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

// ============================================================================
// ELEMENT IDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementId {
    Cpf,
    Phone,
    Cep,
    FullName,
    Street,
    City,
    State,
    LookupButton,
    LoadingIndicator,
}

impl ElementId {
    pub const ALL: [ElementId; 9] = [
        ElementId::Cpf,
        ElementId::Phone,
        ElementId::Cep,
        ElementId::FullName,
        ElementId::Street,
        ElementId::City,
        ElementId::State,
        ElementId::LookupButton,
        ElementId::LoadingIndicator,
    ];

    /// Stable DOM id rendered by the registration template
    pub fn dom_id(&self) -> &'static str {
        match self {
            ElementId::Cpf => "id_cpf",
            ElementId::Phone => "id_telefone",
            ElementId::Cep => "id_cep",
            ElementId::FullName => "id_nome_completo",
            ElementId::Street => "id_endereco",
            ElementId::City => "id_cidade",
            ElementId::State => "id_estado",
            ElementId::LookupButton => "btn-buscar-cep",
            ElementId::LoadingIndicator => "cep-loading",
        }
    }

    pub fn from_dom_id(dom_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.dom_id() == dom_id)
    }

    /// Mask bound to this element, if any
    pub fn field_kind(&self) -> Option<FieldKind> {
        match self {
            ElementId::Cpf => Some(FieldKind::Cpf),
            ElementId::Phone => Some(FieldKind::Phone),
            ElementId::Cep => Some(FieldKind::Cep),
            ElementId::FullName => Some(FieldKind::FullName),
            _ => None,
        }
    }
}

// ============================================================================
// DOCUMENT SEAM
// ============================================================================

/// FormDocument - what the helpers need from a page
///
/// Methods take `&self` like DOM handles do, so a lookup waiting on the
/// network does not lock out the listeners of the other fields. A wasm build
/// implements this over `web_sys`; `InMemoryForm` backs the CLI, the API
/// server and the tests.
pub trait FormDocument {
    fn has_element(&self, id: ElementId) -> bool;

    fn value(&self, id: ElementId) -> Option<String>;

    fn set_value(&self, id: ElementId, value: &str);

    fn focus(&self, id: ElementId);

    fn set_visible(&self, id: ElementId, visible: bool);

    fn set_disabled(&self, id: ElementId, disabled: bool);

    fn is_disabled(&self, id: ElementId) -> bool;

    /// Blocking user-facing message
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementState {
    pub value: String,
    pub visible: bool,
    pub disabled: bool,
}

impl Default for ElementState {
    fn default() -> Self {
        ElementState {
            value: String::new(),
            visible: true,
            disabled: false,
        }
    }
}

#[derive(Debug, Default)]
struct PageState {
    elements: HashMap<ElementId, ElementState>,
    focused: Option<ElementId>,
    alerts: Vec<String>,
}

/// In-memory page. Interior mutability keeps it shareable while a lookup
/// is pending; a `Mutex` instead of a `RefCell` keeps it `Sync` for the server.
#[derive(Debug, Default)]
pub struct InMemoryForm {
    page: Mutex<PageState>,
}

impl InMemoryForm {
    /// Empty page (no elements)
    pub fn new() -> Self {
        Self::default()
    }

    /// Full registration page: every element present, loading indicator hidden
    pub fn registration() -> Self {
        let form = ElementId::ALL
            .into_iter()
            .fold(Self::new(), |form, id| form.with_element(id));
        form.set_visible(ElementId::LoadingIndicator, false);
        form
    }

    /// Builder pattern: add an element
    pub fn with_element(mut self, id: ElementId) -> Self {
        self.page_mut().elements.entry(id).or_default();
        self
    }

    /// Builder pattern: add an element with an initial value
    pub fn with_value(mut self, id: ElementId, value: &str) -> Self {
        self.page_mut().elements.entry(id).or_default().value = value.to_string();
        self
    }

    fn page(&self) -> MutexGuard<'_, PageState> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn page_mut(&mut self) -> &mut PageState {
        self.page.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of one element
    pub fn element(&self, id: ElementId) -> Option<ElementState> {
        self.page().elements.get(&id).cloned()
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.page().focused
    }

    pub fn alerts(&self) -> Vec<String> {
        self.page().alerts.clone()
    }

    pub fn take_alerts(&self) -> Vec<String> {
        std::mem::take(&mut self.page().alerts)
    }

    /// Simulate typing: replace the raw value the way the browser does before `input` fires
    pub fn type_into(&self, id: ElementId, raw: &str) {
        self.set_value(id, raw);
    }
}

impl FormDocument for InMemoryForm {
    fn has_element(&self, id: ElementId) -> bool {
        self.page().elements.contains_key(&id)
    }

    fn value(&self, id: ElementId) -> Option<String> {
        self.page().elements.get(&id).map(|e| e.value.clone())
    }

    fn set_value(&self, id: ElementId, value: &str) {
        if let Some(element) = self.page().elements.get_mut(&id) {
            element.value = value.to_string();
        }
    }

    fn focus(&self, id: ElementId) {
        let mut page = self.page();
        if page.elements.contains_key(&id) {
            page.focused = Some(id);
        }
    }

    fn set_visible(&self, id: ElementId, visible: bool) {
        if let Some(element) = self.page().elements.get_mut(&id) {
            element.visible = visible;
        }
    }

    fn set_disabled(&self, id: ElementId, disabled: bool) {
        if let Some(element) = self.page().elements.get_mut(&id) {
            element.disabled = disabled;
        }
    }

    fn is_disabled(&self, id: ElementId) -> bool {
        self.page().elements.get(&id).map(|e| e.disabled).unwrap_or(false)
    }

    fn alert(&self, message: &str) {
        self.page().alerts.push(message.to_string());
    }
}

// ============================================================================
// BINDINGS
// ============================================================================

/// Elements the CEP lookup works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupBindings {
    pub cep: ElementId,
    pub trigger: ElementId,
    pub loading_indicator: Option<ElementId>,
    pub street: Option<ElementId>,
    pub city: Option<ElementId>,
    pub state: Option<ElementId>,
}

impl LookupBindings {
    /// Bindings for a page that has every element
    pub fn registration() -> Self {
        LookupBindings {
            cep: ElementId::Cep,
            trigger: ElementId::LookupButton,
            loading_indicator: Some(ElementId::LoadingIndicator),
            street: Some(ElementId::Street),
            city: Some(ElementId::City),
            state: Some(ElementId::State),
        }
    }
}

/// FormBindings - which listeners a page gets, decided once at setup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBindings {
    pub masked: Vec<(ElementId, FieldKind)>,

    /// Requires both the CEP field and the lookup button
    pub lookup: Option<LookupBindings>,
}

impl FormBindings {
    pub fn detect<D: FormDocument>(doc: &D) -> Self {
        let masked = ElementId::ALL
            .into_iter()
            .filter(|id| doc.has_element(*id))
            .filter_map(|id| id.field_kind().map(|kind| (id, kind)))
            .collect();

        let present = |id: ElementId| doc.has_element(id).then_some(id);
        let lookup = match (present(ElementId::Cep), present(ElementId::LookupButton)) {
            (Some(cep), Some(trigger)) => Some(LookupBindings {
                cep,
                trigger,
                loading_indicator: present(ElementId::LoadingIndicator),
                street: present(ElementId::Street),
                city: present(ElementId::City),
                state: present(ElementId::State),
            }),
            _ => None,
        };

        FormBindings { masked, lookup }
    }

    pub fn mask_for(&self, id: ElementId) -> Option<FieldKind> {
        self.masked
            .iter()
            .find(|(bound, _)| *bound == id)
            .map(|(_, kind)| *kind)
    }
}

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// Text changed
    Input(ElementId),
    Click(ElementId),
    KeyPress { target: ElementId, key: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// No listener for this event
    Ignored,
    /// Field rewritten with the masked value
    Masked(String),
    /// Too many digits for the mask; value left as typed
    LeftAsTyped,
    Lookup {
        outcome: LookupOutcome,
        default_prevented: bool,
    },
    /// Enter in the CEP field while the trigger is disabled: no lookup,
    /// but the form must still not submit
    DefaultPrevented,
}

/// FormController - the listeners of one page, attached once at startup
pub struct FormController<L> {
    bindings: FormBindings,
    autofill: Option<CepAutofill<L>>,
}

impl<L: AddressLookup> FormController<L> {
    /// Setup: detect elements and build the listeners
    pub fn attach<D: FormDocument>(doc: &D, lookup: L) -> Self {
        let bindings = FormBindings::detect(doc);
        let autofill = bindings
            .lookup
            .clone()
            .map(|lookup_bindings| CepAutofill::new(lookup, lookup_bindings));

        log::debug!(
            "[form] attached {} masked field(s), cep lookup {}",
            bindings.masked.len(),
            if autofill.is_some() { "on" } else { "off" }
        );

        FormController { bindings, autofill }
    }

    pub fn bindings(&self) -> &FormBindings {
        &self.bindings
    }

    pub fn autofill(&self) -> Option<&CepAutofill<L>> {
        self.autofill.as_ref()
    }

    /// `input` listener: rewrite the field with its masked value
    pub fn handle_input<D: FormDocument>(&self, doc: &D, id: ElementId) -> EventOutcome {
        let Some(kind) = self.bindings.mask_for(id) else {
            return EventOutcome::Ignored;
        };
        let raw = doc.value(id).unwrap_or_default();

        match kind.apply(&raw) {
            Some(masked) => {
                doc.set_value(id, &masked);
                EventOutcome::Masked(masked)
            }
            None => EventOutcome::LeftAsTyped,
        }
    }

    pub async fn dispatch<D: FormDocument>(&self, doc: &D, event: FormEvent) -> EventOutcome {
        match event {
            FormEvent::Input(id) => self.handle_input(doc, id),
            FormEvent::Click(id) => match &self.autofill {
                Some(autofill) if id == autofill.bindings().trigger => {
                    if doc.is_disabled(id) {
                        return EventOutcome::Ignored;
                    }
                    EventOutcome::Lookup {
                        outcome: autofill.trigger(doc).await,
                        default_prevented: false,
                    }
                }
                _ => EventOutcome::Ignored,
            },
            FormEvent::KeyPress { target, key } => match &self.autofill {
                Some(autofill) if target == autofill.bindings().cep && key == "Enter" => {
                    // Enter submits nothing; it clicks the trigger instead
                    let trigger = autofill.bindings().trigger;
                    if doc.is_disabled(trigger) {
                        return EventOutcome::DefaultPrevented;
                    }
                    EventOutcome::Lookup {
                        outcome: autofill.trigger(doc).await,
                        default_prevented: true,
                    }
                }
                _ => EventOutcome::Ignored,
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
