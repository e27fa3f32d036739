// 🎭 Field Masker - live formatting for the registration form
// CPF, telefone, CEP e nome completo: rules as regex replacements

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ============================================================================
// FIELD KINDS
// ============================================================================

/// FieldKind - Which mask a form field gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Cpf,
    Phone,
    Cep,
    FullName,
}

impl FieldKind {
    pub const ALL: [FieldKind; 4] = [
        FieldKind::Cpf,
        FieldKind::Phone,
        FieldKind::Cep,
        FieldKind::FullName,
    ];

    /// Human-readable name for display
    pub fn name(&self) -> &str {
        match self {
            FieldKind::Cpf => "CPF",
            FieldKind::Phone => "Telefone",
            FieldKind::Cep => "CEP",
            FieldKind::FullName => "Nome completo",
        }
    }

    /// Short code used by the CLI and the API routes
    pub fn code(&self) -> &str {
        match self {
            FieldKind::Cpf => "cpf",
            FieldKind::Phone => "telefone",
            FieldKind::Cep => "cep",
            FieldKind::FullName => "nome",
        }
    }

    /// Parse a short code (Portuguese or English spelling)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "cpf" => Some(FieldKind::Cpf),
            "telefone" | "phone" => Some(FieldKind::Phone),
            "cep" | "postal_code" => Some(FieldKind::Cep),
            "nome" | "nome_completo" | "full_name" => Some(FieldKind::FullName),
            _ => None,
        }
    }

    /// Maximum digit count the mask accepts. Above it the field is left as typed.
    pub fn max_digits(&self) -> Option<usize> {
        match self {
            FieldKind::Cpf => Some(11),
            FieldKind::Phone => Some(11),
            FieldKind::Cep => Some(8),
            FieldKind::FullName => None,
        }
    }

    /// Compute the masked value for `raw`.
    ///
    /// Returns `None` when the field must keep its current value untouched
    /// (more digits than the mask accepts).
    pub fn apply(&self, raw: &str) -> Option<String> {
        match self {
            FieldKind::Cpf => mask_cpf(raw),
            FieldKind::Phone => mask_phone(raw),
            FieldKind::Cep => mask_cep(raw),
            FieldKind::FullName => Some(filter_full_name(raw)),
        }
    }
}

/// Mask `raw` for `kind`, falling back to the input when the mask does not apply
pub fn mask(kind: FieldKind, raw: &str) -> String {
    kind.apply(raw).unwrap_or_else(|| raw.to_string())
}

// ============================================================================
// PATTERNS
// ============================================================================

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("mask pattern must compile"))
}

fn cpf_group() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(\d{3})(\d)")
}

fn cpf_check_digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(\d{3})(\d{1,2})$")
}

fn phone_area_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"^(\d{2})(\d)")
}

fn phone_line_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"(\d)(\d{4})$")
}

fn cep_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"^(\d{5})(\d)")
}

// Latin-1 letters only: × (U+00D7) and ÷ (U+00F7) are excluded
fn non_name_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    pattern(&RE, r"[^A-Za-zÀ-ÖØ-öø-ÿ\s]")
}

// ============================================================================
// MASKS
// ============================================================================

/// Keep only ASCII digits
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// CPF: `NNN.NNN.NNN-NN`, partially applied while typing
pub fn mask_cpf(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    if digits.len() > 11 {
        return None;
    }

    let value = cpf_group().replacen(&digits, 1, "${1}.${2}");
    let value = cpf_group().replacen(&value, 1, "${1}.${2}");
    let value = cpf_check_digits().replacen(&value, 1, "${1}-${2}");
    Some(value.into_owned())
}

/// Telefone: `(NN) N…` after the area code, dash before the last four digits
pub fn mask_phone(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    if digits.len() > 11 {
        return None;
    }

    let value = phone_area_code().replacen(&digits, 1, "(${1}) ${2}");
    let value = phone_line_suffix().replacen(&value, 1, "${1}-${2}");
    Some(value.into_owned())
}

/// CEP: `NNNNN-NNN` once the sixth digit arrives
pub fn mask_cep(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    if digits.len() > 8 {
        return None;
    }

    Some(cep_prefix().replacen(&digits, 1, "${1}-${2}").into_owned())
}

/// Nome completo: letters (accents included) and whitespace only
pub fn filter_full_name(raw: &str) -> String {
    non_name_chars().replace_all(raw, "").into_owned()
}

// ============================================================================
// SEARCH
// ============================================================================

/// Match a dashboard search query against a stored (masked) value.
///
/// A query matches literally (case-insensitive) or, when it carries digits,
/// digit-to-digit so `12345678901` finds `123.456.789-01`.
pub fn search_matches(stored: &str, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }

    if stored.to_lowercase().contains(&query.to_lowercase()) {
        return true;
    }

    let query_digits = digits_only(query);
    !query_digits.is_empty() && digits_only(stored).contains(&query_digits)
}

/// Keep the values a dashboard search for `query` would list, in order
pub fn search<'a, I>(values: I, query: &str) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .filter(|value| search_matches(value, query))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
