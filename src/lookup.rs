// 📮 CEP Lookup - ViaCEP client
// GET {base_url}/{cep}/json/ → logradouro, localidade, uf (+ erro flag)

use crate::config::LookupConfig;
use crate::error::{CepError, LookupError};
use crate::masks::digits_only;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::future::Future;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Cep - exactly 8 ASCII digits, separators stripped
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Cep(String);

impl Cep {
    pub const LEN: usize = 8;

    /// Strip everything but digits and require exactly 8 of them
    pub fn parse(raw: &str) -> Result<Self, CepError> {
        let digits = digits_only(raw);
        if digits.len() != Self::LEN {
            return Err(CepError::InvalidLength(digits.len()));
        }
        Ok(Cep(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Address - the three fields the lookup fills in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResponse {
    Found(Address),
    /// The service answered but does not know the code
    NotFound,
}

// ============================================================================
// LOOKUP TRAIT
// ============================================================================

/// AddressLookup - resolves a CEP into an address
///
/// `ViaCepClient` is the production implementation; tests plug in fakes.
pub trait AddressLookup {
    fn lookup(
        &self,
        cep: &Cep,
    ) -> impl Future<Output = Result<LookupResponse, LookupError>> + Send;
}

// ============================================================================
// VIACEP
// ============================================================================

/// Wire body returned by ViaCEP
#[derive(Debug, Deserialize)]
struct ViaCepBody {
    #[serde(default)]
    logradouro: Option<String>,
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    uf: Option<String>,
    #[serde(default, deserialize_with = "truthy_flag")]
    erro: bool,
}

// ViaCEP has sent both `true` and `"true"` over time
fn truthy_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => flag,
        Some(Value::String(text)) => !text.is_empty() && text != "false",
        Some(Value::Number(n)) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    })
}

/// Parse a ViaCEP JSON body
pub fn parse_response(body: &str) -> Result<LookupResponse, LookupError> {
    let body: ViaCepBody = serde_json::from_str(body)?;
    if body.erro {
        return Ok(LookupResponse::NotFound);
    }

    Ok(LookupResponse::Found(Address {
        street: body.logradouro.unwrap_or_default(),
        city: body.localidade.unwrap_or_default(),
        state: body.uf.unwrap_or_default(),
    }))
}

pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new(config: &LookupConfig) -> Result<Self, LookupError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(ViaCepClient {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, cep: &Cep) -> String {
        format!("{}/{}/json/", self.base_url, cep)
    }
}

impl AddressLookup for ViaCepClient {
    async fn lookup(&self, cep: &Cep) -> Result<LookupResponse, LookupError> {
        let url = self.url_for(cep);
        log::debug!("[cep] GET {}", url);

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

// ============================================================================
// TESTS
// ============================================================================
