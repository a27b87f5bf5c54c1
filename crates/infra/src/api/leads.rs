//! `LeadApi` adapter over the REST lead server

use std::sync::Arc;

use async_trait::async_trait;
use leadflow_core::LeadApi;
use leadflow_domain::{
    ApiConfig, BatchSummary, DispatchOutcome, HistoryPage, HistoryQuery, LeadPage, LeadQuery,
    ProcessOutcome, Product, Result, UploadFile, UploadReceipt,
};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use tracing::{info, instrument};

use super::client::ApiClient;
use super::types::{
    lead_status_to_wire, HistoryResponse, LeadsResponse, ProcessResponse, ProductDocument,
    SendResponse, SummaryResponse, UploadResponse,
};

/// Remote lead operations backed by [`ApiClient`].
#[derive(Clone)]
pub struct LeadApiClient {
    client: Arc<ApiClient>,
}

impl LeadApiClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client: Arc::new(client) }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Ok(Self::new(ApiClient::from_config(config)?))
    }
}

/// Path segments are server-assigned ids; escape anything that would change
/// the route.
fn segment(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '/' => "%2F".to_string(),
            '?' => "%3F".to_string(),
            '#' => "%23".to_string(),
            '%' => "%25".to_string(),
            ' ' => "%20".to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn spreadsheet_mime(file: &UploadFile) -> &'static str {
    match file.extension().as_deref() {
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("html") => "text/html",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl LeadApi for LeadApiClient {
    #[instrument(skip(self))]
    async fn list_products(&self, active_only: bool) -> Result<Vec<Product>> {
        let docs: Vec<ProductDocument> = self
            .client
            .get("/produtos/", &[("apenas_ativos", active_only.to_string())])
            .await?;
        Ok(docs.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self, file), fields(file = %file.name, size = file.bytes.len()))]
    async fn upload(&self, product_id: &str, file: &UploadFile) -> Result<UploadReceipt> {
        let path = format!("/leads/upload/{}", segment(product_id));
        let mime = spreadsheet_mime(file);

        let response: UploadResponse = self
            .client
            .execute(Method::POST, &path, |request| {
                let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
                // A static MIME literal always parses.
                let part = match part.mime_str(mime) {
                    Ok(typed) => typed,
                    Err(_) => Part::bytes(file.bytes.clone()).file_name(file.name.clone()),
                };
                request.multipart(Form::new().part("arquivo", part))
            })
            .await?;

        let receipt = response.into_receipt(&file.name);
        info!(batch_id = %receipt.batch_id, total = receipt.total_records, "Spreadsheet uploaded");
        Ok(receipt)
    }

    #[instrument(skip(self))]
    async fn process(&self, batch_id: &str) -> Result<ProcessOutcome> {
        let response: ProcessResponse =
            self.client.post(&format!("/leads/processar/{}", segment(batch_id))).await?;
        Ok(response.into())
    }

    #[instrument(skip(self))]
    async fn send(&self, batch_id: &str) -> Result<DispatchOutcome> {
        let response: SendResponse =
            self.client.post(&format!("/leads/enviar/{}", segment(batch_id))).await?;
        Ok(response.into())
    }

    #[instrument(skip(self))]
    async fn fetch_summary(&self, batch_id: &str) -> Result<BatchSummary> {
        let response: SummaryResponse = self
            .client
            .get(&format!("/leads/lote/{}/resumo", segment(batch_id)), &[])
            .await?;
        Ok(response.into())
    }

    #[instrument(skip(self))]
    async fn fetch_leads(&self, batch_id: &str, query: &LeadQuery) -> Result<LeadPage> {
        let mut params = vec![("skip", query.skip.to_string()), ("limit", query.limit.to_string())];
        if let Some(status) = query.status {
            params.push(("status_filtro", lead_status_to_wire(status).to_string()));
        }

        let response: LeadsResponse = self
            .client
            .get(&format!("/leads/lote/{}/leads", segment(batch_id)), &params)
            .await?;
        Ok(LeadPage::try_from(response)?)
    }

    #[instrument(skip(self))]
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<HistoryPage> {
        let params = [("skip", query.skip.to_string()), ("limit", query.limit.to_string())];
        let response: HistoryResponse = self.client.get("/leads/historico", &params).await?;
        Ok(response.into())
    }
}
