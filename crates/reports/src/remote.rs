//! Invoice table over the hosted database's PostgREST endpoint.

use async_trait::async_trait;
use serde::Deserialize;

use crate::query::InvoiceQuery;
use crate::row::InvoiceRow;
use crate::table::{InvoiceTable, QueryError};

const DEFAULT_TABLE: &str = "invoices";

#[derive(Debug, Clone)]
pub struct PostgrestInvoiceTable {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    table: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl PostgrestInvoiceTable {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: None,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    /// Query as the signed-in user instead of the anonymous role.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    async fn select(&self, filters: Vec<(&str, String)>) -> Result<Vec<InvoiceRow>, QueryError> {
        let mut params = vec![("select", "*".to_string())];
        params.extend(filters);
        params.push(("order", "created_at.desc".to_string()));

        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        let resp = self
            .client
            .get(self.endpoint())
            .query(&params)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| QueryError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body));
        }
        serde_json::from_str(&body).map_err(|e| QueryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl InvoiceTable for PostgrestInvoiceTable {
    async fn search(&self, query: &InvoiceQuery) -> Result<Vec<InvoiceRow>, QueryError> {
        let mut filters = Vec::new();
        if let Some(number) = query.invoice_number() {
            filters.push(("invoice_number", format!("eq.{number}")));
        }
        if let Some(reference) = query.reference_number() {
            filters.push(("po_number", format!("eq.{reference}")));
        }
        self.select(filters).await
    }

    async fn fetch(&self, id: &str) -> Result<InvoiceRow, QueryError> {
        self.select(vec![("id", format!("eq.{id}"))])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::NotFound(id.to_string()))
    }
}

fn error_from_response(status: u16, body: &str) -> QueryError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    QueryError::Remote {
        code: parsed.code,
        message: parsed
            .message
            .unwrap_or_else(|| format!("request failed with status {status}")),
    }
}
