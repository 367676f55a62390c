//! ViaCEP postal directory.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::Cep;

use super::geocode::{PostalAddress, PostalDirectory};

pub const DEFAULT_VIACEP_URL: &str = "https://viacep.com.br/ws";

/// Blocking client for `GET {base}/{cep}/json/`.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    logradouro: Option<String>,
    #[serde(default)]
    bairro: Option<String>,
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    uf: Option<String>,
    /// `true` (or `"true"`) when the CEP is unknown.
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn is_error(&self) -> bool {
        match &self.erro {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            Some(_) => true,
        }
    }

    fn into_address(self) -> PostalAddress {
        PostalAddress {
            street: self.logradouro.unwrap_or_default(),
            neighbourhood: self.bairro.unwrap_or_default(),
            city: self.localidade.unwrap_or_default(),
            uf: self.uf.unwrap_or_default(),
        }
    }
}

impl ViaCepClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Http)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl PostalDirectory for ViaCepClient {
    fn lookup(&self, cep: &Cep) -> Result<Option<PostalAddress>> {
        let url = format!("{}/{}/json/", self.base_url, cep.digits());
        let response = self.client.get(url).send()?;
        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::RoutingProvider {
                status: Some(status.as_u16()),
                message: format!("postal directory lookup for {cep} failed"),
            });
        }
        let parsed: ViaCepResponse = response.json()?;
        if parsed.is_error() {
            debug!(%cep, "postal directory does not know this CEP");
            return Ok(None);
        }
        Ok(Some(parsed.into_address()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_flag_accepts_bool_and_string() {
        let unknown: ViaCepResponse = serde_json::from_str(r#"{"erro": "true"}"#).unwrap();
        assert!(unknown.is_error());
        let unknown: ViaCepResponse = serde_json::from_str(r#"{"erro": true}"#).unwrap();
        assert!(unknown.is_error());

        let known: ViaCepResponse = serde_json::from_str(
            r#"{"cep": "01310-200", "logradouro": "Avenida Paulista", "bairro": "Bela Vista",
                "localidade": "São Paulo", "uf": "SP"}"#,
        )
        .unwrap();
        assert!(!known.is_error());
        assert_eq!(
            known.into_address().query(),
            "Avenida Paulista, Bela Vista, São Paulo, SP"
        );
    }
}
