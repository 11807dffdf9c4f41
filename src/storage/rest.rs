//! Hosted storage backend speaking the PostgREST dialect
//!
//! Rows live in a hosted Postgres behind `/rest/v1/<table>`. Row-level
//! security on the server scopes every table to the user behind the bearer
//! token; the owner filters added here only narrow hotel queries further.

use super::traits::{HotelStore, StorageError, StorageResult};
use crate::config::RemoteConfig;
use crate::http::{error_message, HttpClient, HttpError};
use crate::model::{
    table, AccessibilityFeature, ComplianceNote, Hotel, HotelId, NewAccessibilityFeature,
    NewComplianceNote, NewHotel, NewSentimentInsight, SentimentInsight, UserId,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Store backed by a hosted PostgREST endpoint
#[derive(Clone)]
pub struct RestStore {
    http: HttpClient,
    base: String,
    anon_key: String,
    access_token: Option<String>,
}

impl RestStore {
    pub fn new(config: &RemoteConfig) -> StorageResult<Self> {
        let http = HttpClient::new(config.timeout).map_err(map_http_error)?;
        Ok(Self {
            http,
            base: config.base().to_string(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base, table)
    }

    fn request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        // Without a user token the anon key doubles as bearer; RLS then
        // denies writes.
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.http
            .request(method, &self.table_url(table))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn insert_rows<I, R>(&self, table: &'static str, rows: &[I]) -> StorageResult<Vec<R>>
    where
        I: Serialize + Sync,
        R: DeserializeOwned,
    {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(rows);

        let body = self
            .http
            .execute(request, table)
            .await
            .map_err(map_http_error)?;
        let inserted: Vec<R> = parse_rows(table, &body)?;

        debug!(table, rows = inserted.len(), "inserted rows");
        Ok(inserted)
    }

    async fn select_rows<R>(
        &self,
        table: &'static str,
        query: &[(&str, String)],
    ) -> StorageResult<Vec<R>>
    where
        R: DeserializeOwned,
    {
        let request = self
            .request(Method::GET, table)
            .query(&[("select", "*")])
            .query(query);

        let body = self
            .http
            .execute(request, table)
            .await
            .map_err(map_http_error)?;
        parse_rows(table, &body)
    }

    async fn delete_rows(
        &self,
        table: &'static str,
        query: &[(&str, String)],
    ) -> StorageResult<usize> {
        let request = self
            .request(Method::DELETE, table)
            .header("Prefer", "return=representation")
            .query(query);

        let body = self
            .http
            .execute(request, table)
            .await
            .map_err(map_http_error)?;
        let deleted: Vec<serde_json::Value> = parse_rows(table, &body)?;
        Ok(deleted.len())
    }
}

/// `column=eq.value` filter
fn eq(column: &'static str, value: impl std::fmt::Display) -> (&'static str, String) {
    (column, format!("eq.{}", value))
}

/// `order=column.direction` clause
fn order(spec: &str) -> (&'static str, String) {
    ("order", spec.to_string())
}

fn parse_rows<R: DeserializeOwned>(table: &'static str, body: &str) -> StorageResult<Vec<R>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(|e| StorageError::InvalidRow {
        table,
        reason: e.to_string(),
    })
}

fn map_http_error(err: HttpError) -> StorageError {
    match err {
        HttpError::Status { status, body } => rejection(status, &body),
        HttpError::Timeout(_) | HttpError::Transport(_) | HttpError::Build(_) => {
            StorageError::Transport(err.to_string())
        }
    }
}

/// Map a failed response to a storage error
pub(crate) fn rejection(status: u16, body: &str) -> StorageError {
    let message = error_message(body);
    match status {
        401 | 403 => StorageError::AccessDenied(message),
        _ => StorageError::Rejected { status, message },
    }
}

#[async_trait]
impl HotelStore for RestStore {
    async fn insert_hotel(&self, hotel: &NewHotel) -> StorageResult<Hotel> {
        let rows: Vec<Hotel> = self
            .insert_rows(table::HOTELS, std::slice::from_ref(hotel))
            .await?;
        rows.into_iter()
            .next()
            .ok_or(StorageError::NoRowReturned(table::HOTELS))
    }

    async fn insert_features(
        &self,
        owner: &UserId,
        rows: &[NewAccessibilityFeature],
    ) -> StorageResult<Vec<AccessibilityFeature>> {
        debug!(user = %owner, "inserting features");
        self.insert_rows(table::FEATURES, rows).await
    }

    async fn insert_compliance_notes(
        &self,
        owner: &UserId,
        rows: &[NewComplianceNote],
    ) -> StorageResult<Vec<ComplianceNote>> {
        debug!(user = %owner, "inserting compliance notes");
        self.insert_rows(table::COMPLIANCE_NOTES, rows).await
    }

    async fn insert_sentiment_insights(
        &self,
        owner: &UserId,
        rows: &[NewSentimentInsight],
    ) -> StorageResult<Vec<SentimentInsight>> {
        debug!(user = %owner, "inserting sentiment insights");
        self.insert_rows(table::SENTIMENT_INSIGHTS, rows).await
    }

    async fn select_hotel(&self, owner: &UserId, id: &HotelId) -> StorageResult<Option<Hotel>> {
        let rows: Vec<Hotel> = self
            .select_rows(table::HOTELS, &[eq("id", id), eq("user_id", owner)])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn list_hotels(&self, owner: &UserId) -> StorageResult<Vec<Hotel>> {
        self.select_rows(
            table::HOTELS,
            &[eq("user_id", owner), order("created_at.desc")],
        )
        .await
    }

    async fn select_features(
        &self,
        _owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<AccessibilityFeature>> {
        self.select_rows(
            table::FEATURES,
            &[eq("hotel_id", hotel_id), order("created_at.asc")],
        )
        .await
    }

    async fn select_compliance_notes(
        &self,
        _owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<ComplianceNote>> {
        self.select_rows(
            table::COMPLIANCE_NOTES,
            &[eq("hotel_id", hotel_id), order("created_at.asc")],
        )
        .await
    }

    async fn select_sentiment_insights(
        &self,
        _owner: &UserId,
        hotel_id: &HotelId,
    ) -> StorageResult<Vec<SentimentInsight>> {
        self.select_rows(
            table::SENTIMENT_INSIGHTS,
            &[eq("hotel_id", hotel_id), order("created_at.asc")],
        )
        .await
    }

    async fn delete_hotel(&self, owner: &UserId, id: &HotelId) -> StorageResult<bool> {
        // The hosted schema may not cascade, so children go first
        for child in [
            table::FEATURES,
            table::COMPLIANCE_NOTES,
            table::SENTIMENT_INSIGHTS,
        ] {
            self.delete_rows(child, &[eq("hotel_id", id)]).await?;
        }
        let deleted = self
            .delete_rows(table::HOTELS, &[eq("id", id), eq("user_id", owner)])
            .await?;
        Ok(deleted > 0)
    }
}
