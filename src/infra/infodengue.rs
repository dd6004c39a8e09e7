//! Weekly dengue surveillance data (InfoDengue `data-dengue` endpoint).

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::analyzers::types::WeekRecord;
use crate::analyzers::window::EpiWindow;
use crate::fetch::{HttpClient, fetch_json};
use crate::services::SurveillanceApi;

const DISEASE: &str = "dengue";
const FORMAT: &str = "json";

pub struct InfoDengueClient<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> InfoDengueClient<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Full request URL for `geocode` over `window`.
    pub fn url(&self, geocode: &str, window: &EpiWindow) -> Result<reqwest::Url> {
        let mut url: reqwest::Url =
            format!("{}/api/data-dengue", self.base_url.trim_end_matches('/')).parse()?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("geocode", geocode)
                .append_pair("disease", DISEASE)
                .append_pair("format", FORMAT);
            for (key, value) in window.query_pairs() {
                query.append_pair(key, &value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient> SurveillanceApi for InfoDengueClient<C> {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, geocode: &str, window: &EpiWindow) -> Result<Vec<WeekRecord>> {
        let url = self.url(geocode, window)?;
        let records: Vec<WeekRecord> = fetch_json(&self.client, url.as_str()).await?;

        info!(geocode, weeks = records.len(), "Surveillance records fetched");
        Ok(records)
    }
}
