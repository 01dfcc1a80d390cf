//! Relational table client
//!
//! Every table operation is a direct request/response call against the
//! backend's REST data API under `{base_url}/rest/v1`. Filters, ordering
//! and pagination are encoded as query parameters; mutations ask for the
//! affected representation back where the caller needs it.

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{classify_error, ErrorBody, StoreError};
use crate::token::AuthToken;
use unilearn_common::Config;

#[derive(Clone)]
pub struct TableClient {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
    token: AuthToken,
}

impl TableClient {
    pub fn new(config: &Config, token: AuthToken) -> Self {
        Self {
            http: reqwest::Client::new(),
            rest_url: format!("{}/rest/v1", config.backend_url.trim_end_matches('/')),
            api_key: config.anon_key.clone(),
            token,
        }
    }

    /// Start a query against a table.
    pub fn from(&self, table: &str) -> QueryBuilder {
        QueryBuilder {
            client: self.clone(),
            table: table.to_string(),
            query: Vec::new(),
        }
    }

    /// Call a stored procedure through the RPC endpoint.
    pub async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        params: &serde_json::Value,
    ) -> Result<T, StoreError> {
        let builder = self
            .authorized(Method::POST, &format!("{}/rpc/{}", self.rest_url, function))
            .json(params);
        decode_response(send(builder).await?).await
    }

    fn authorized(&self, method: Method, url: &str) -> RequestBuilder {
        let bearer = self.token.get().unwrap_or_else(|| self.api_key.clone());
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }
}

/// Accumulates filters for one table operation.
pub struct QueryBuilder {
    client: TableClient,
    table: String,
    query: Vec<(String, String)>,
}

impl QueryBuilder {
    /// Columns (and embedded resources) to return.
    pub fn select(mut self, columns: &str) -> Self {
        self.query.push(("select".to_string(), columns.to_string()));
        self
    }

    /// Equality filter on a column.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.query
            .push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// NULL filter on a column.
    pub fn is_null(mut self, column: &str) -> Self {
        self.query.push((column.to_string(), "is.null".to_string()));
        self
    }

    /// Disjunction of raw filters, e.g.
    /// `(title.ilike.*term*,description.ilike.*term*)`.
    pub fn or(mut self, filters: &str) -> Self {
        self.query.push(("or".to_string(), filters.to_string()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.query
            .push(("order".to_string(), format!("{}.{}", column, direction)));
        self
    }

    pub fn limit(mut self, count: usize) -> Self {
        self.query.push(("limit".to_string(), count.to_string()));
        self
    }

    pub fn offset(mut self, count: usize) -> Self {
        self.query.push(("offset".to_string(), count.to_string()));
        self
    }

    /// Fetch all matching rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, StoreError> {
        let builder = self.request(Method::GET);
        decode_response(send(builder).await?).await
    }

    /// Fetch exactly one row; zero rows is `StoreError::NotFound`.
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        let builder = self
            .request(Method::GET)
            .header("Accept", "application/vnd.pgrst.object+json");
        decode_response(send(builder).await?).await
    }

    /// Fetch at most one row, mapping "no row" to `None`.
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, StoreError> {
        match self.fetch_one().await {
            Ok(row) => Ok(Some(row)),
            Err(StoreError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Insert a row and return the stored representation.
    pub async fn insert<T: DeserializeOwned>(
        self,
        body: &impl Serialize,
    ) -> Result<T, StoreError> {
        let builder = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(body);
        decode_response(send(builder).await?).await
    }

    /// Insert a row without reading it back.
    pub async fn insert_void(self, body: &impl Serialize) -> Result<(), StoreError> {
        let builder = self.request(Method::POST).json(body);
        send(builder).await?;
        Ok(())
    }

    /// Insert a row, merging into the existing one on a key conflict,
    /// and return the stored representation.
    pub async fn upsert<T: DeserializeOwned>(
        self,
        body: &impl Serialize,
    ) -> Result<T, StoreError> {
        let builder = self
            .request(Method::POST)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(body);
        decode_response(send(builder).await?).await
    }

    /// Update matching rows and return the first stored representation.
    pub async fn update<T: DeserializeOwned>(
        self,
        body: &impl Serialize,
    ) -> Result<T, StoreError> {
        let builder = self
            .request(Method::PATCH)
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(body);
        decode_response(send(builder).await?).await
    }

    /// Update matching rows; matching zero rows is not an error, which
    /// is what makes bulk updates idempotent.
    pub async fn update_void(self, body: &impl Serialize) -> Result<(), StoreError> {
        let builder = self.request(Method::PATCH).json(body);
        send(builder).await?;
        Ok(())
    }

    /// Delete matching rows.
    pub async fn delete(self) -> Result<(), StoreError> {
        let builder = self.request(Method::DELETE);
        send(builder).await?;
        Ok(())
    }

    fn request(&self, method: Method) -> RequestBuilder {
        let url = format!("{}/{}", self.client.rest_url, self.table);
        self.client.authorized(method, &url).query(&self.query)
    }

    #[cfg(test)]
    fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }
}

async fn send(builder: RequestBuilder) -> Result<reqwest::Response, StoreError> {
    let response = builder
        .send()
        .await
        .map_err(|e| StoreError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        return Err(classify_error(status.as_u16(), body));
    }
    Ok(response)
}

async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StoreError> {
    response
        .json::<T>()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}
