//! Brazilian postal code (CEP) lookup via cep.awesomeapi.com.br.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;

use crate::fetch::{HttpClient, fetch_json};
use crate::services::{CityIdentity, PostalCodeLookup};

#[derive(Debug, Deserialize)]
struct CepResponse {
    city: Option<String>,
    // sent as a string, but tolerate a bare number
    city_ibge: Option<serde_json::Value>,
}

pub struct AwesomeCepClient<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> AwesomeCepClient<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> PostalCodeLookup for AwesomeCepClient<C> {
    #[tracing::instrument(skip(self))]
    async fn lookup(&self, postcode: &str) -> Result<CityIdentity> {
        let url = format!("{}/json/{}", self.base_url.trim_end_matches('/'), postcode);
        let body: CepResponse = fetch_json(&self.client, &url).await?;

        let code = match body.city_ibge {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => return Err(anyhow!("CEP {} has no city_ibge", postcode)),
        };
        let name = body
            .city
            .ok_or_else(|| anyhow!("CEP {} has no city", postcode))?;

        Ok(CityIdentity { name, code })
    }
}
