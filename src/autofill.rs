// 🔎 CEP Autofill - Idle → Loading → {Filled | NotFound | NetworkError} → Idle
//
// The loading indicator and the disabled trigger are held by `LoadingGuard`,
// so every exit path (including unwinding) puts the page back to Idle.

use crate::error::CepError;
use crate::form::{ElementId, FormDocument, LookupBindings};
use crate::lookup::{Address, AddressLookup, Cep, LookupResponse};
use std::ops::Deref;

pub const MSG_INVALID_CEP: &str = "Por favor, digite um CEP válido com 8 dígitos.";
pub const MSG_NOT_FOUND: &str = "CEP não encontrado. Por favor, verifique o número digitado.";
pub const MSG_NETWORK_ERROR: &str = "Erro ao buscar CEP. Verifique sua conexão com a internet.";

// ============================================================================
// STATES & OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    Idle,
    Loading,
    Filled,
    NotFound,
    NetworkError,
}

/// Which branch a lookup attempt took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Input guard failed; no request was made
    Rejected(CepError),
    Filled(Address),
    NotFound,
    NetworkError(String),
}

impl LookupOutcome {
    /// State reached before returning to Idle
    pub fn state(&self) -> LookupState {
        match self {
            LookupOutcome::Rejected(_) => LookupState::Idle,
            LookupOutcome::Filled(_) => LookupState::Filled,
            LookupOutcome::NotFound => LookupState::NotFound,
            LookupOutcome::NetworkError(_) => LookupState::NetworkError,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            LookupOutcome::Rejected(_) => "rejected",
            LookupOutcome::Filled(_) => "filled",
            LookupOutcome::NotFound => "not_found",
            LookupOutcome::NetworkError(_) => "network_error",
        }
    }

    /// Alert shown to the user, if any
    pub fn message(&self) -> Option<&'static str> {
        match self {
            LookupOutcome::Rejected(_) => Some(MSG_INVALID_CEP),
            LookupOutcome::Filled(_) => None,
            LookupOutcome::NotFound => Some(MSG_NOT_FOUND),
            LookupOutcome::NetworkError(_) => Some(MSG_NETWORK_ERROR),
        }
    }
}

// ============================================================================
// LOADING GUARD
// ============================================================================

/// Shows the loading indicator and disables the trigger until dropped
pub struct LoadingGuard<'a, D: FormDocument> {
    doc: &'a D,
    indicator: Option<ElementId>,
    trigger: ElementId,
}

impl<'a, D: FormDocument> LoadingGuard<'a, D> {
    pub fn acquire(doc: &'a D, indicator: Option<ElementId>, trigger: ElementId) -> Self {
        if let Some(indicator) = indicator {
            doc.set_visible(indicator, true);
        }
        doc.set_disabled(trigger, true);
        LoadingGuard {
            doc,
            indicator,
            trigger,
        }
    }
}

impl<D: FormDocument> Deref for LoadingGuard<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.doc
    }
}

impl<D: FormDocument> Drop for LoadingGuard<'_, D> {
    fn drop(&mut self) {
        if let Some(indicator) = self.indicator {
            self.doc.set_visible(indicator, false);
        }
        self.doc.set_disabled(self.trigger, false);
    }
}

// ============================================================================
// AUTOFILL
// ============================================================================

pub struct CepAutofill<L> {
    lookup: L,
    bindings: LookupBindings,
}

impl<L: AddressLookup> CepAutofill<L> {
    pub fn new(lookup: L, bindings: LookupBindings) -> Self {
        CepAutofill { lookup, bindings }
    }

    pub fn bindings(&self) -> &LookupBindings {
        &self.bindings
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Run one lookup attempt against `doc`.
    ///
    /// Never fails: every error branch is reported to the user through
    /// `FormDocument::alert` and described by the returned outcome.
    pub async fn trigger<D: FormDocument>(&self, doc: &D) -> LookupOutcome {
        let raw = doc.value(self.bindings.cep).unwrap_or_default();
        let cep = match Cep::parse(&raw) {
            Ok(cep) => cep,
            Err(err) => {
                log::debug!("[cep] rejected {:?}: {}", raw, err);
                doc.alert(MSG_INVALID_CEP);
                return LookupOutcome::Rejected(err);
            }
        };

        let doc = LoadingGuard::acquire(
            doc,
            self.bindings.loading_indicator,
            self.bindings.trigger,
        );
        log::debug!("[cep] looking up {}", cep);

        match self.lookup.lookup(&cep).await {
            Ok(LookupResponse::Found(address)) => {
                self.fill(&*doc, &address);
                log::info!("[cep] {} → {}/{}", cep, address.city, address.state);
                LookupOutcome::Filled(address)
            }
            Ok(LookupResponse::NotFound) => {
                log::info!("[cep] {} not found", cep);
                doc.alert(MSG_NOT_FOUND);
                LookupOutcome::NotFound
            }
            Err(err) => {
                log::error!("[cep] lookup for {} failed: {}", cep, err);
                doc.alert(MSG_NETWORK_ERROR);
                LookupOutcome::NetworkError(err.to_string())
            }
        }
    }

    fn fill<D: FormDocument>(&self, doc: &D, address: &Address) {
        let targets = [
            (self.bindings.street, &address.street),
            (self.bindings.city, &address.city),
            (self.bindings.state, &address.state),
        ];
        for (id, value) in targets {
            if let Some(id) = id {
                doc.set_value(id, value);
            }
        }

        // No house-number field: the user completes it in the street field
        if let Some(street) = self.bindings.street {
            doc.focus(street);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::form::InMemoryForm;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    enum Script {
        Found(Address),
        NotFound,
        Fail(String),
    }

    /// Fake lookup service answering from a fixed script
    pub(crate) struct ScriptedLookup {
        script: Script,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedLookup {
        fn new(script: Script) -> Self {
            ScriptedLookup {
                script,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn paulista() -> Self {
            Self::new(Script::Found(Address {
                street: "Avenida Paulista".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
            }))
        }

        pub(crate) fn not_found() -> Self {
            Self::new(Script::NotFound)
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self::new(Script::Fail(message.to_string()))
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn seen(&self) -> Vec<String> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl AddressLookup for ScriptedLookup {
        async fn lookup(&self, cep: &Cep) -> Result<LookupResponse, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(cep.to_string());
            match &self.script {
                Script::Found(address) => Ok(LookupResponse::Found(address.clone())),
                Script::NotFound => Ok(LookupResponse::NotFound),
                Script::Fail(message) => Err(LookupError::Other(message.clone())),
            }
        }
    }

    /// Fake lookup that stays pending until the test releases it
    pub(crate) struct GatedLookup {
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    impl GatedLookup {
        pub(crate) fn new(gate: oneshot::Receiver<()>) -> Self {
            GatedLookup {
                gate: Mutex::new(Some(gate)),
            }
        }
    }

    impl AddressLookup for GatedLookup {
        async fn lookup(&self, _cep: &Cep) -> Result<LookupResponse, LookupError> {
            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.await
                    .map_err(|_| LookupError::Other("gate dropped".to_string()))?;
            }
            Ok(LookupResponse::Found(Address {
                street: "Avenida Paulista".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
            }))
        }
    }

    fn autofill(lookup: ScriptedLookup) -> CepAutofill<ScriptedLookup> {
        CepAutofill::new(lookup, LookupBindings::registration())
    }

    fn assert_idle(form: &InMemoryForm) {
        let indicator = form.element(ElementId::LoadingIndicator).unwrap();
        let trigger = form.element(ElementId::LookupButton).unwrap();
        assert!(!indicator.visible, "loading indicator still visible");
        assert!(!trigger.disabled, "trigger still disabled");
    }

    #[tokio::test]
    async fn test_lookup_fills_address_and_focuses_street() {
        let form = InMemoryForm::registration().with_value(ElementId::Cep, "01310100");
        let autofill = autofill(ScriptedLookup::paulista());

        let outcome = autofill.trigger(&form).await;

        assert_eq!(outcome.state(), LookupState::Filled);
        assert_eq!(form.value(ElementId::Street).unwrap(), "Avenida Paulista");
        assert_eq!(form.value(ElementId::City).unwrap(), "São Paulo");
        assert_eq!(form.value(ElementId::State).unwrap(), "SP");
        assert_eq!(form.focused(), Some(ElementId::Street));
        assert!(form.alerts().is_empty());
        assert_eq!(autofill.lookup().seen(), vec!["01310100".to_string()]);
        assert_idle(&form);
    }

    #[tokio::test]
    async fn test_lookup_accepts_masked_cep() {
        let form = InMemoryForm::registration().with_value(ElementId::Cep, "01310-100");
        let autofill = autofill(ScriptedLookup::paulista());

        autofill.trigger(&form).await;
        assert_eq!(autofill.lookup().seen(), vec!["01310100".to_string()]);
    }

    #[tokio::test]
    async fn test_lookup_not_found_leaves_fields_untouched() {
        let form = InMemoryForm::registration()
            .with_value(ElementId::Cep, "00000000")
            .with_value(ElementId::Street, "Rua Antiga")
            .with_value(ElementId::City, "Campinas");
        let autofill = autofill(ScriptedLookup::not_found());

        let outcome = autofill.trigger(&form).await;

        assert_eq!(outcome, LookupOutcome::NotFound);
        assert_eq!(form.alerts(), &[MSG_NOT_FOUND.to_string()]);
        assert_eq!(form.value(ElementId::Street).unwrap(), "Rua Antiga");
        assert_eq!(form.value(ElementId::City).unwrap(), "Campinas");
        assert_eq!(form.value(ElementId::State).unwrap(), "");
        assert_eq!(form.focused(), None);
        assert_idle(&form);
    }

    #[tokio::test]
    async fn test_partial_cep_rejected_without_request() {
        let form = InMemoryForm::registration().with_value(ElementId::Cep, "01310");
        let autofill = autofill(ScriptedLookup::paulista());

        let outcome = autofill.trigger(&form).await;

        assert_eq!(outcome, LookupOutcome::Rejected(CepError::InvalidLength(5)));
        assert_eq!(outcome.state(), LookupState::Idle);
        assert_eq!(form.alerts(), &[MSG_INVALID_CEP.to_string()]);
        assert_eq!(autofill.lookup().calls(), 0);
        assert_eq!(form.value(ElementId::Street).unwrap(), "");
        assert_idle(&form);
    }

    #[tokio::test]
    async fn test_network_error_alerts_and_restores() {
        let form = InMemoryForm::registration().with_value(ElementId::Cep, "01310100");
        let autofill = autofill(ScriptedLookup::failing("connection refused"));

        let outcome = autofill.trigger(&form).await;

        match &outcome {
            LookupOutcome::NetworkError(message) => assert!(message.contains("connection refused")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(outcome.message(), Some(MSG_NETWORK_ERROR));
        assert_eq!(form.alerts(), &[MSG_NETWORK_ERROR.to_string()]);
        assert_eq!(form.value(ElementId::Street).unwrap(), "");
        assert_idle(&form);
    }

    #[tokio::test]
    async fn test_every_outcome_returns_to_idle() {
        let lookups = [
            ScriptedLookup::paulista(),
            ScriptedLookup::not_found(),
            ScriptedLookup::failing("timeout"),
        ];
        for lookup in lookups {
            let form = InMemoryForm::registration().with_value(ElementId::Cep, "01310100");
            autofill(lookup).trigger(&form).await;
            assert_idle(&form);
        }
    }

    #[tokio::test]
    async fn test_partial_page_fills_what_exists() {
        let form = InMemoryForm::new()
            .with_value(ElementId::Cep, "01310100")
            .with_element(ElementId::LookupButton)
            .with_element(ElementId::City);
        let bindings = crate::form::FormBindings::detect(&form).lookup.unwrap();
        let autofill = CepAutofill::new(ScriptedLookup::paulista(), bindings);

        let outcome = autofill.trigger(&form).await;

        assert_eq!(outcome.code(), "filled");
        assert_eq!(form.value(ElementId::City).unwrap(), "São Paulo");
        assert_eq!(form.focused(), None);
        assert!(!form.is_disabled(ElementId::LookupButton));
    }

    #[test]
    fn test_loading_guard_shows_then_hides() {
        let form = InMemoryForm::registration();
        {
            let guard = LoadingGuard::acquire(
                &form,
                Some(ElementId::LoadingIndicator),
                ElementId::LookupButton,
            );
            assert!(guard.element(ElementId::LoadingIndicator).unwrap().visible);
            assert!(guard.is_disabled(ElementId::LookupButton));
        }
        assert_idle(&form);
    }

    #[test]
    fn test_loading_guard_released_on_panic() {
        let form = InMemoryForm::registration();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = LoadingGuard::acquire(
                &form,
                Some(ElementId::LoadingIndicator),
                ElementId::LookupButton,
            );
            panic!("handler blew up");
        }));
        assert!(result.is_err());
        assert_idle(&form);
    }
}
