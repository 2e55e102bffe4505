//! REST handle for the Google Analytics Admin API (v1alpha).
//!
//! `AdminClient` owns the HTTP connection pool, the credential material and
//! the current access token. Requests are made once; retrying transient
//! failures is the caller's concern (see `RetryPolicy`).

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::{AccessToken, AuthError, Credentials};
use crate::models::{Account, DataStream, NewDataStream, NewProperty, Property};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the Admin API
pub const DEFAULT_BASE_URL: &str = "https://analyticsadmin.googleapis.com/v1alpha";

/// Page size requested from list endpoints (the API maximum)
const PAGE_SIZE: &str = "200";

/// One page of a list response. The item field name differs per resource.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new", alias = "accounts", alias = "properties", alias = "dataStreams")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

/// Authenticated Admin API client.
pub struct AdminClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
    token: Mutex<Option<AccessToken>>,
}

impl std::fmt::Debug for AdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl AdminClient {
    /// Create a client; `timeout` bounds each individual request.
    pub fn new(
        credentials: Credentials,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http,
            base_url,
            credentials,
            token: Mutex::new(None),
        })
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn list_accounts(&self) -> Result<Vec<Account>, ApiError> {
        self.list_all("/accounts", &[]).await
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account, ApiError> {
        self.get(&format!("/accounts/{}", account_id)).await
    }

    // ========================================================================
    // Properties
    // ========================================================================

    pub async fn list_properties(&self, account_id: &str) -> Result<Vec<Property>, ApiError> {
        let filter = format!("ancestor:accounts/{}", account_id);
        self.list_all("/properties", &[("filter", filter.as_str())])
            .await
    }

    pub async fn get_property(&self, property_id: &str) -> Result<Property, ApiError> {
        self.get(&format!("/properties/{}", property_id)).await
    }

    pub async fn create_property(&self, property: &NewProperty) -> Result<Property, ApiError> {
        self.post("/properties", property).await
    }

    pub async fn delete_property(&self, property_id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("/properties/{}", property_id));
        let request = self.request(Method::DELETE, &url).await?;
        Self::check_response(request.send().await?).await?;
        debug!(property_id = property_id, "Deleted property");
        Ok(())
    }

    // ========================================================================
    // Data streams
    // ========================================================================

    pub async fn list_data_streams(&self, property_id: &str) -> Result<Vec<DataStream>, ApiError> {
        self.list_all(&format!("/properties/{}/dataStreams", property_id), &[])
            .await
    }

    pub async fn get_data_stream(
        &self,
        property_id: &str,
        stream_id: &str,
    ) -> Result<DataStream, ApiError> {
        self.get(&format!(
            "/properties/{}/dataStreams/{}",
            property_id, stream_id
        ))
        .await
    }

    pub async fn create_web_data_stream(
        &self,
        property_id: &str,
        stream: &NewDataStream,
    ) -> Result<DataStream, ApiError> {
        self.post(&format!("/properties/{}/dataStreams", property_id), stream)
            .await
    }

    // ========================================================================
    // Request plumbing
    // ========================================================================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Current access token, minting a new one when missing or about to expire
    async fn bearer(&self) -> Result<String, ApiError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.credentials.fetch_token(&self.http).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.bearer().await?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    /// Check if response is successful, classifying the failure if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", url, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.request(Method::GET, &url).await?.send().await?;
        Self::parse(Self::check_response(response).await?, &url).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .request(Method::POST, &url)
            .await?
            .json(body)
            .send()
            .await?;
        Self::parse(Self::check_response(response).await?, &url).await
    }

    /// Fetch every page of a list endpoint
    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ApiError> {
        let url = self.url(path);
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .request(Method::GET, &url)
                .await?
                .query(query)
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = Self::check_response(request.send().await?).await?;
            let page: Page<T> = Self::parse(response, &url).await?;
            items.extend(page.items);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!(url = %url, count = items.len(), "Listed resources");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorKind;
    use crate::auth::credentials::tests::write_authorized_user;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    const TOKEN: &str = "ya29.test-token";

    fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .json_body(json!({"access_token": TOKEN, "expires_in": 3600, "token_type": "Bearer"}));
        })
    }

    fn client(server: &MockServer, dir: &TempDir) -> AdminClient {
        let path = write_authorized_user(dir, &server.url("/token"));
        let credentials = Credentials::from_file(&path).unwrap();
        AdminClient::new(credentials, server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_accounts_sends_bearer_token() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        let token = mock_token(&server);
        let accounts = server.mock(|when, then| {
            when.method(GET)
                .path("/accounts")
                .query_param("pageSize", "200")
                .header("authorization", format!("Bearer {}", TOKEN));
            then.status(200).json_body(json!({
                "accounts": [
                    {"name": "accounts/100", "displayName": "First"},
                    {"name": "accounts/200", "displayName": "Second", "regionCode": "DE"}
                ]
            }));
        });

        let client = client(&server, &dir);
        let result = client.list_accounts().await.unwrap();

        token.assert();
        accounts.assert();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id(), "100");
        assert_eq!(result[1].region_code.as_deref(), Some("DE"));
    }

    #[tokio::test]
    async fn test_empty_list_response() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        mock_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/accounts");
            then.status(200).json_body(json!({}));
        });

        let result = client(&server, &dir).list_accounts().await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_access_token_is_reused() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        let token = mock_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/accounts/100");
            then.status(200).json_body(json!({"name": "accounts/100"}));
        });

        let client = client(&server, &dir);
        client.get_account("100").await.unwrap();
        client.get_account("100").await.unwrap();

        token.assert_calls(1);
    }

    #[tokio::test]
    async fn test_list_properties_filters_by_account() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        mock_token(&server);
        let properties = server.mock(|when, then| {
            when.method(GET)
                .path("/properties")
                .query_param("filter", "ancestor:accounts/100");
            then.status(200).json_body(json!({
                "properties": [{"name": "properties/987", "displayName": "Web Shop"}],
                "nextPageToken": ""
            }));
        });

        let result = client(&server, &dir).list_properties("100").await.unwrap();

        properties.assert();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id(), "987");
    }

    #[tokio::test]
    async fn test_create_property_posts_body() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        mock_token(&server);
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/properties")
                .json_body(json!({
                    "parent": "accounts/100",
                    "displayName": "Web Shop",
                    "timeZone": "America/Los_Angeles",
                    "currencyCode": "USD",
                    "industryCategory": "OTHER"
                }));
            then.status(200).json_body(json!({
                "name": "properties/987",
                "displayName": "Web Shop",
                "timeZone": "America/Los_Angeles",
                "currencyCode": "USD"
            }));
        });

        let body = NewProperty::new("100", "Web Shop", "America/Los_Angeles", "USD", "OTHER");
        let created = client(&server, &dir).create_property(&body).await.unwrap();

        create.assert();
        assert_eq!(created.id(), "987");
    }

    #[tokio::test]
    async fn test_delete_property() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        mock_token(&server);
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/properties/987");
            then.status(200).json_body(json!({}));
        });

        client(&server, &dir).delete_property("987").await.unwrap();
        delete.assert();
    }

    #[tokio::test]
    async fn test_create_web_data_stream() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        mock_token(&server);
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/properties/987/dataStreams")
                .body_includes("\"type\":\"WEB_DATA_STREAM\"")
                .body_includes("\"defaultUri\":\"https://example.com\"");
            then.status(200).json_body(json!({
                "name": "properties/987/dataStreams/555",
                "type": "WEB_DATA_STREAM",
                "webStreamData": {"measurementId": "G-ABC123", "defaultUri": "https://example.com"}
            }));
        });

        let stream = NewDataStream::web("Main site", "https://example.com");
        let created = client(&server, &dir)
            .create_web_data_stream("987", &stream)
            .await
            .unwrap();

        create.assert();
        assert_eq!(created.id(), "555");
        assert_eq!(created.measurement_id(), Some("G-ABC123"));
    }

    #[tokio::test]
    async fn test_not_found_is_classified() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        mock_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/properties/1/dataStreams/2");
            then.status(404).json_body(json!({
                "error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}
            }));
        });

        let err = client(&server, &dir)
            .get_data_stream("1", "2")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_unavailable_is_transient() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        mock_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/properties/987/dataStreams");
            then.status(503).body("backend unavailable");
        });

        let err = client(&server, &dir)
            .list_data_streams("987")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unavailable));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_request_timeout_is_deadline_exceeded() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        mock_token(&server);
        server.mock(|when, then| {
            when.method(GET).path("/accounts/100");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({"name": "accounts/100"}));
        });

        let path = write_authorized_user(&dir, &server.url("/token"));
        let credentials = Credentials::from_file(&path).unwrap();
        let client =
            AdminClient::new(credentials, server.base_url(), Duration::from_millis(500)).unwrap();

        let err = client.get_account("100").await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::DeadlineExceeded));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_refused_connection_is_unavailable() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        mock_token(&server);

        let path = write_authorized_user(&dir, &server.url("/token"));
        let credentials = Credentials::from_file(&path).unwrap();
        let client =
            AdminClient::new(credentials, "http://127.0.0.1:1", Duration::from_secs(5)).unwrap();

        let err = client.list_accounts().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Unavailable));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_rejected_token_surfaces_as_unauthenticated() {
        let server = MockServer::start_async().await;
        let dir = TempDir::new().unwrap();
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(400)
                .json_body(json!({"error": "invalid_grant", "error_description": "Token has been expired or revoked."}));
        });
        let accounts = server.mock(|when, then| {
            when.method(GET).path("/accounts");
            then.status(200).json_body(json!({}));
        });

        let err = client(&server, &dir).list_accounts().await.unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::Unauthenticated));
        accounts.assert_calls(0);
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = write_authorized_user(&dir, "http://127.0.0.1:1/token");
        let credentials = Credentials::from_file(&path).unwrap();
        let client =
            AdminClient::new(credentials, "http://localhost/v1alpha/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.url("/accounts"), "http://localhost/v1alpha/accounts");
    }
}
