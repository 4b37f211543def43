//! REST client for the cloud document store.
//!
//! Implements the [`DocumentStore`] seam over the Firestore REST API:
//! structured queries with cursor pagination plus document CRUD. Every
//! call fetches a bearer token up front (ending the session when the
//! credential is unusable) and wraps the HTTP exchange in the
//! connectivity retry loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use notewell_core::notify::Notifier;
use notewell_core::store::{Cursor, Direction, Document, DocumentStore, Fields, Page, Query};
use notewell_core::{Result, StoreError};
use serde::Deserialize;

use crate::auth::AuthGuard;
use crate::retry::{retry_with_backoff, DEFAULT_BASE_DELAY, DEFAULT_RETRIES};
use crate::wire::{encode_fields, RawDocument, WireValue};

/// Requests that take longer than this count as a connectivity failure.
const REQUEST_TIMEOUT_SECS: u64 = 3;
const MAX_LOG_BODY_CHARS: usize = 512;
const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Error envelope returned by the store on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn is_transport_connectivity(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

fn map_transport_error(err: reqwest::Error) -> StoreError {
    if is_transport_connectivity(&err) {
        StoreError::connectivity(err.to_string())
    } else {
        StoreError::unexpected(err.to_string())
    }
}

/// Client for the Firestore REST surface.
#[derive(Clone)]
pub struct FirestoreClient {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    auth: AuthGuard,
    notifier: Arc<dyn Notifier>,
    retries: u32,
    base_delay: Duration,
}

impl FirestoreClient {
    pub fn new(project_id: &str, auth: AuthGuard, notifier: Arc<dyn Notifier>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.to_string(),
            auth,
            notifier,
            retries: DEFAULT_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Override the API endpoint, e.g. for an emulator.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Override the retry budget.
    pub fn with_retry(mut self, retries: u32, base_delay: Duration) -> Self {
        self.retries = retries;
        self.base_delay = base_delay;
        self
    }

    /// Resource path prefix shared by every document in the project.
    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root(), collection, id)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("store response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("store response error ({}): {}", status, preview);
    }

    /// Read the body and map non-2xx statuses onto the error taxonomy.
    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        Self::log_response(status, &body);

        if status.is_success() {
            return Ok(body);
        }
        if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&body) {
            return Err(StoreError::api(status.as_u16(), parsed.error.message));
        }
        Err(StoreError::api(
            status.as_u16(),
            format!("Request failed: {}", body),
        ))
    }

    fn wire_json(value: &notewell_core::store::FieldValue) -> serde_json::Value {
        serde_json::to_value(WireValue::from(value)).unwrap_or(serde_json::Value::Null)
    }

    fn direction_str(direction: Direction) -> &'static str {
        match direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        }
    }

    /// Build the `structuredQuery` request body. The document name is
    /// always appended as a trailing order so cursors are total.
    fn build_query_body(query: &Query) -> serde_json::Value {
        let mut structured = serde_json::Map::new();

        if !query.filters.is_empty() {
            let filters: Vec<serde_json::Value> = query
                .filters
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "fieldFilter": {
                            "field": {"fieldPath": f.field},
                            "op": "EQUAL",
                            "value": Self::wire_json(&f.equals),
                        }
                    })
                })
                .collect();
            let clause = if filters.len() == 1 {
                filters.into_iter().next().unwrap_or_default()
            } else {
                serde_json::json!({
                    "compositeFilter": {"op": "AND", "filters": filters}
                })
            };
            structured.insert("where".to_string(), clause);
        }

        let tie_break = query
            .order_by
            .last()
            .map(|o| o.direction)
            .unwrap_or(Direction::Ascending);
        let mut order_by: Vec<serde_json::Value> = query
            .order_by
            .iter()
            .map(|o| {
                serde_json::json!({
                    "field": {"fieldPath": o.field},
                    "direction": Self::direction_str(o.direction),
                })
            })
            .collect();
        order_by.push(serde_json::json!({
            "field": {"fieldPath": "__name__"},
            "direction": Self::direction_str(tie_break),
        }));
        structured.insert("orderBy".to_string(), serde_json::Value::from(order_by));

        if let Some(limit) = query.limit {
            structured.insert("limit".to_string(), serde_json::Value::from(limit));
        }

        if let Some(cursor) = &query.start_after {
            structured.insert(
                "startAt".to_string(),
                serde_json::json!({"values": cursor.raw(), "before": false}),
            );
        }

        serde_json::json!({"structuredQuery": structured})
    }

    /// Resume token for the page ending at `last`: the order-by values of
    /// that row plus its document name.
    fn cursor_after(query: &Query, last: &RawDocument) -> Cursor {
        let mut values: Vec<serde_json::Value> = query
            .order_by
            .iter()
            .map(|o| {
                last.wire_field(&o.field)
                    .map(|v| serde_json::to_value(v).unwrap_or(serde_json::Value::Null))
                    .unwrap_or_else(|| serde_json::json!({"nullValue": null}))
            })
            .collect();
        values.push(serde_json::json!({"referenceValue": last.name}));
        Cursor::new(serde_json::Value::Array(values))
    }

    async fn query_once(&self, collection: &str, query: &Query, token: &str) -> Result<Page> {
        let url = format!("{}:runQuery", self.documents_root());
        let mut body = Self::build_query_body(query);
        if let Some(structured) = body
            .get_mut("structuredQuery")
            .and_then(serde_json::Value::as_object_mut)
        {
            structured.insert(
                "from".to_string(),
                serde_json::json!([{"collectionId": collection}]),
            );
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let text = Self::read_body(response).await?;

        let rows: Vec<serde_json::Value> = serde_json::from_str(&text)
            .map_err(|e| StoreError::unexpected(format!("malformed query response: {e}")))?;
        let raw_docs: Vec<RawDocument> = rows
            .into_iter()
            .filter_map(|row| row.get("document").cloned())
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| StoreError::unexpected(format!("malformed document: {e}")))?;

        let next_cursor = raw_docs.last().map(|last| Self::cursor_after(query, last));
        Ok(Page {
            documents: raw_docs.iter().map(RawDocument::to_document).collect(),
            next_cursor,
        })
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn query(&self, collection: &str, query: Query) -> Result<Page> {
        let token = self.auth.bearer_token()?;

        let page = retry_with_backoff(
            || self.query_once(collection, &query, &token),
            self.retries,
            self.base_delay,
            self.notifier.as_ref(),
        )
        .await?;
        Ok(page)
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String> {
        let token = self.auth.bearer_token()?;
        let url = format!("{}/{}", self.documents_root(), collection);
        let body = serde_json::json!({"fields": encode_fields(&fields)});

        let text = retry_with_backoff(
            || async {
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(map_transport_error)?;
                Self::read_body(response).await
            },
            self.retries,
            self.base_delay,
            self.notifier.as_ref(),
        )
        .await?;

        let raw: RawDocument = serde_json::from_str(&text)
            .map_err(|e| StoreError::unexpected(format!("malformed create response: {e}")))?;
        Ok(raw.doc_id().to_string())
    }

    async fn patch(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mask: &[&str],
    ) -> Result<()> {
        let token = self.auth.bearer_token()?;
        let url = self.document_url(collection, id);
        let body = serde_json::json!({"fields": encode_fields(&fields)});
        let mask_params: Vec<(&str, &str)> = mask
            .iter()
            .map(|field| ("updateMask.fieldPaths", *field))
            .collect();

        retry_with_backoff(
            || async {
                let response = self
                    .client
                    .patch(&url)
                    .query(&mask_params)
                    .bearer_auth(&token)
                    .json(&body)
                    .send()
                    .await
                    .map_err(map_transport_error)?;
                Self::read_body(response).await.map(|_| ())
            },
            self.retries,
            self.base_delay,
            self.notifier.as_ref(),
        )
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let token = self.auth.bearer_token()?;
        let url = self.document_url(collection, id);

        retry_with_backoff(
            || async {
                let response = self
                    .client
                    .delete(&url)
                    .bearer_auth(&token)
                    .send()
                    .await
                    .map_err(map_transport_error)?;
                Self::read_body(response).await.map(|_| ())
            },
            self.retries,
            self.base_delay,
            self.notifier.as_ref(),
        )
        .await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let token = self.auth.bearer_token()?;
        let url = self.document_url(collection, id);

        let text = retry_with_backoff(
            || async {
                let response = self
                    .client
                    .get(&url)
                    .bearer_auth(&token)
                    .send()
                    .await
                    .map_err(map_transport_error)?;
                Self::read_body(response).await
            },
            self.retries,
            self.base_delay,
            self.notifier.as_ref(),
        )
        .await;

        match text {
            Ok(text) => {
                let raw: RawDocument = serde_json::from_str(&text)
                    .map_err(|e| StoreError::unexpected(format!("malformed document: {e}")))?;
                Ok(Some(raw.to_document()))
            }
            Err(StoreError::Api { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}
