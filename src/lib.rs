// Cadastro Form - Core Library
// Input masks and CEP autofill for the patient registration form,
// shared by the CLI, the API server and tests

pub mod masks;     // Field Masker - CPF, telefone, CEP, nome
pub mod form;      // Element ids, document seam, listeners
pub mod lookup;    // ViaCEP client
pub mod autofill;  // CEP lookup state machine
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use masks::{
    FieldKind,
    mask, mask_cpf, mask_phone, mask_cep, filter_full_name,
    digits_only, search, search_matches,
};
pub use form::{
    ElementId, ElementState, FormDocument, InMemoryForm,
    FormBindings, LookupBindings, FormController, FormEvent, EventOutcome,
};
pub use lookup::{
    AddressLookup, ViaCepClient, Address, Cep, LookupResponse, parse_response,
};
pub use autofill::{
    CepAutofill, LoadingGuard, LookupOutcome, LookupState,
    MSG_INVALID_CEP, MSG_NOT_FOUND, MSG_NETWORK_ERROR,
};
pub use config::{LookupConfig, LogConfig, LogFormat};
pub use error::{CepError, ConfigError, LookupError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
