//! Hosted store backend speaking the PostgREST dialect.
//!
//! A [`HistoryQuery`] renders to query parameters such as
//! `emiten=in.("BBCA","TLKM")&from_date=gte.2024-01-02&order=from_date.desc,emiten.desc&offset=20&limit=10`.
//! The unpaginated total is requested with `Prefer: count=exact` and read back
//! from the `Content-Range` header (`0-9/57`).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::history::{HistoryPage, HistoryQuery, OrderKey, Predicate, Window};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::store::{StockStore, StoreFuture};
use crate::{
    Emiten, SessionEntry, StockColumn, StockQueryRecord, StoreConfig, StoreError, TradeDate,
    STATUS_SUCCESS,
};

const STOCK_TABLE: &str = "stock_queries";
const SESSION_TABLE: &str = "session";

/// [`StockStore`] over the hosted REST endpoint.
#[derive(Clone)]
pub struct SupabaseStore {
    http_client: Arc<dyn HttpClient>,
    config: StoreConfig,
    auth: HttpAuth,
}

impl SupabaseStore {
    /// Connect through a default reqwest transport.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), config)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, config: StoreConfig) -> Self {
        let auth = HttpAuth::ApiKey(config.api_key().to_owned());
        Self {
            http_client,
            config,
            auth,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn table_request(&self, request: HttpRequest) -> HttpRequest {
        request.with_auth(&self.auth)
    }

    fn select(&self, table: &str, params: &[(String, String)]) -> HttpRequest {
        HttpRequest::get(build_url(&self.config.table_url(table), params))
    }

    async fn read(&self, request: HttpRequest, table: &str) -> Result<HttpResponse, StoreError> {
        let response = self
            .http_client
            .execute(self.table_request(request))
            .await
            .map_err(|error| StoreError::Query(format!("{table} transport error: {}", error.message())))?;

        if !response.is_success() {
            return Err(StoreError::Query(upstream_failure(table, &response)));
        }

        debug!(table, status = response.status, "store read completed");
        Ok(response)
    }

    async fn write(&self, request: HttpRequest, table: &str) -> Result<HttpResponse, StoreError> {
        let response = self
            .http_client
            .execute(self.table_request(request))
            .await
            .map_err(|error| StoreError::Write(format!("{table} transport error: {}", error.message())))?;

        if !response.is_success() {
            return Err(StoreError::Write(upstream_failure(table, &response)));
        }

        debug!(table, status = response.status, "store write completed");
        Ok(response)
    }

    async fn fetch_history_inner(&self, query: &HistoryQuery) -> Result<HistoryPage, StoreError> {
        let request = self
            .select(STOCK_TABLE, &render_history_params(query))
            .with_header("prefer", "count=exact");
        let response = self.read(request, STOCK_TABLE).await?;
        let rows: Vec<StockQueryRecord> = decode_rows(&response.body)?;
        let total_count = response
            .header("content-range")
            .and_then(parse_content_range_total)
            .ok_or_else(|| {
                StoreError::Decode(format!(
                    "{STOCK_TABLE} response carried no total in content-range: {:?}",
                    response.header("content-range")
                ))
            })?;

        Ok(HistoryPage { rows, total_count })
    }

    async fn upsert_record_inner(&self, record: &StockQueryRecord) -> Result<(), StoreError> {
        let mut payload = serde_json::to_value(record)
            .map_err(|error| StoreError::Write(format!("could not encode record: {error}")))?;
        if let Some(object) = payload.as_object_mut() {
            object.remove(StockColumn::Id.as_str());
        }

        let url = build_url(
            &self.config.table_url(STOCK_TABLE),
            &[param("on_conflict", "from_date,emiten")],
        );
        let request = HttpRequest::post(url)
            .with_header("prefer", "resolution=merge-duplicates,return=minimal")
            .with_json_body(payload.to_string());

        self.write(request, STOCK_TABLE).await.map(drop)
    }

    async fn latest_success_inner(
        &self,
        emiten: &Emiten,
        before: Option<TradeDate>,
    ) -> Result<Option<StockQueryRecord>, StoreError> {
        let mut params = vec![
            param("select", "*"),
            param("emiten", format!("eq.{emiten}")),
            param("status", format!("eq.{STATUS_SUCCESS}")),
        ];
        if let Some(before) = before {
            params.push(param("from_date", format!("lt.{before}")));
        }
        params.push(param("order", "from_date.desc"));
        params.push(param("limit", "1"));

        let response = self.read(self.select(STOCK_TABLE, &params), STOCK_TABLE).await?;
        let rows: Vec<StockQueryRecord> = decode_rows(&response.body)?;
        Ok(rows.into_iter().next())
    }

    async fn set_real_price_inner(
        &self,
        emiten: &Emiten,
        from_date: TradeDate,
        price: f64,
    ) -> Result<StockQueryRecord, StoreError> {
        let url = build_url(
            &self.config.table_url(STOCK_TABLE),
            &[
                param("emiten", format!("eq.{emiten}")),
                param("from_date", format!("eq.{from_date}")),
            ],
        );
        let request = HttpRequest::patch(url)
            .with_header("prefer", "return=representation")
            .with_json_body(json!({ "real_harga": price }).to_string());

        let response = self.write(request, STOCK_TABLE).await?;
        let rows: Vec<StockQueryRecord> = decode_rows(&response.body)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("{emiten} on {from_date}")))
    }

    async fn session_inner(&self, key: &str) -> Result<Option<SessionEntry>, StoreError> {
        let params = [
            param("select", "*"),
            param("key", format!("eq.{key}")),
            param("limit", "1"),
        ];
        let response = self
            .read(self.select(SESSION_TABLE, &params), SESSION_TABLE)
            .await?;
        let rows: Vec<SessionEntry> = decode_rows(&response.body)?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_session_inner(&self, entry: &SessionEntry) -> Result<(), StoreError> {
        let payload = serde_json::to_string(entry)
            .map_err(|error| StoreError::Write(format!("could not encode session entry: {error}")))?;
        let url = build_url(
            &self.config.table_url(SESSION_TABLE),
            &[param("on_conflict", "key")],
        );
        let request = HttpRequest::post(url)
            .with_header("prefer", "resolution=merge-duplicates,return=minimal")
            .with_json_body(payload);

        self.write(request, SESSION_TABLE).await.map(drop)
    }
}

impl StockStore for SupabaseStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    fn fetch_history<'a>(&'a self, query: &'a HistoryQuery) -> StoreFuture<'a, HistoryPage> {
        Box::pin(self.fetch_history_inner(query))
    }

    fn upsert_record<'a>(&'a self, record: &'a StockQueryRecord) -> StoreFuture<'a, ()> {
        Box::pin(self.upsert_record_inner(record))
    }

    fn latest_success<'a>(
        &'a self,
        emiten: &'a Emiten,
        before: Option<TradeDate>,
    ) -> StoreFuture<'a, Option<StockQueryRecord>> {
        Box::pin(self.latest_success_inner(emiten, before))
    }

    fn set_real_price<'a>(
        &'a self,
        emiten: &'a Emiten,
        from_date: TradeDate,
        price: f64,
    ) -> StoreFuture<'a, StockQueryRecord> {
        Box::pin(self.set_real_price_inner(emiten, from_date, price))
    }

    fn session<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<SessionEntry>> {
        Box::pin(self.session_inner(key))
    }

    fn upsert_session<'a>(&'a self, entry: &'a SessionEntry) -> StoreFuture<'a, ()> {
        Box::pin(self.upsert_session_inner(entry))
    }
}

/// Render a history plan as PostgREST query parameters, in a stable order.
pub fn render_history_params(query: &HistoryQuery) -> Vec<(String, String)> {
    let mut params = vec![param("select", "*")];

    for predicate in &query.predicates {
        let value = match predicate {
            Predicate::In { values, .. } => {
                let quoted: Vec<String> = values.iter().map(|value| quote_list_item(value)).collect();
                format!("in.({})", quoted.join(","))
            }
            Predicate::Eq { value, .. } => format!("eq.{value}"),
            Predicate::Gte { value, .. } => format!("gte.{value}"),
            Predicate::Lte { value, .. } => format!("lte.{value}"),
        };
        params.push(param(predicate.column().as_str(), value));
    }

    if !query.order.is_empty() {
        let order: Vec<String> = query.order.iter().map(render_order_key).collect();
        params.push(param("order", order.join(",")));
    }

    match query.window {
        Some(Window::Limit(limit)) => params.push(param("limit", limit.to_string())),
        Some(window @ Window::Range { start, .. }) => {
            params.push(param("offset", start.to_string()));
            params.push(param("limit", window.len().to_string()));
        }
        None => {}
    }

    params
}

fn render_order_key(key: &OrderKey) -> String {
    format!("{}.{}", key.column, key.direction)
}

fn quote_list_item(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn param(name: &str, value: impl Into<String>) -> (String, String) {
    (name.to_owned(), value.into())
}

fn build_url(base: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return base.to_owned();
    }

    let query: Vec<String> = params
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect();
    format!("{base}?{}", query.join("&"))
}

/// Total from a `Content-Range` value such as `0-9/57` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<usize> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn decode_rows<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, StoreError> {
    serde_json::from_str(body).map_err(|error| StoreError::Decode(error.to_string()))
}

fn upstream_failure(table: &str, response: &HttpResponse) -> String {
    let detail = response.body.trim();
    if detail.is_empty() {
        format!("{table} returned status {}", response.status)
    } else {
        format!("{table} returned status {}: {detail}", response.status)
    }
}
