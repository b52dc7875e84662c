// API client with bearer/CSRF header injection and refresh-on-401

use crate::config::ClientConfig;
use crate::csrf::{CsrfSource, CSRF_HEADER_NAME};
use crate::error::{ClientError, Result};
use crate::navigator::Navigator;
use crate::token_store::CredentialStore;
use crate::types::{AuthMode, RefreshRequest, RefreshResponse};
use async_singleflight::Group;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Macro to check HTTP response status and return error if not successful
macro_rules! check_response {
    ($response:expr, $error_msg:expr) => {
        if !$response.status().is_success() {
            let status = $response.status();
            let text = $response.text().await.unwrap_or_default();
            return Err(ClientError::RefreshFailure(format!(
                "{} with status {}: {}",
                $error_msg, status, text
            )));
        }
    };
}

/// Per-request options
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method. Default: GET
    pub method: Method,
    /// JSON body
    pub body: Option<serde_json::Value>,
    /// Headers applied after the defaults; they replace defaults of the same name.
    /// An `Authorization` header here takes the request out of the refresh flow.
    pub headers: HeaderMap,
    /// Attach `Authorization: Bearer` and take part in the refresh flow.
    /// Default: true
    pub include_auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
            include_auth: true,
        }
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Serialize `body` as the JSON request body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send without the bearer token (public endpoints, login itself)
    pub fn without_auth(mut self) -> Self {
        self.include_auth = false;
        self
    }
}

/// HTTP client for the InvestAfrik backend
///
/// Every request carries the CSRF header when a token is locatable and, unless
/// disabled per request, the stored access token. A 401 triggers one refresh
/// and one retry; if the refresh cannot succeed the session is cleared and the
/// UI is sent to the login page.
pub struct ApiClient {
    config: ClientConfig,
    credentials: CredentialStore,
    csrf: Arc<dyn CsrfSource>,
    navigator: Arc<dyn Navigator>,
    http_client: Client,
    /// Coalesces concurrent refreshes of the same refresh token into one backend call.
    /// Error type is String because singleflight requires shared error type
    refresh_singleflight: Group<String, String>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `config` - Base URL, auth mode and endpoint paths
    /// * `credentials` - Shared credential store
    /// * `csrf` - Where the CSRF token is read from
    /// * `navigator` - Receives login/logout redirects
    pub fn new(
        config: ClientConfig,
        credentials: CredentialStore,
        csrf: Arc<dyn CsrfSource>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Arc<Self>> {
        config.validate()?;

        // cookie jar keeps the session cookie flowing alongside the bearer token
        let mut builder = Client::builder().cookie_store(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        info!(
            base_url = %config.base_url,
            auth_mode = ?config.auth_mode,
            "API client created"
        );

        Ok(Arc::new(Self {
            config,
            credentials,
            csrf,
            navigator,
            http_client,
            refresh_singleflight: Group::new(),
        }))
    }

    /// Perform a request against `endpoint` (a path relative to the base URL)
    ///
    /// Non-2xx responses are returned as-is; only transport failures and an
    /// unrecoverable 401 are errors.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Response> {
        let url = self.config.url_for(endpoint);

        let sent_token = if options.include_auth {
            self.credentials.access_token()?
        } else {
            None
        };

        let response = self.send(&url, &options, sent_token.as_deref()).await?;

        // caller-supplied credentials are not ours to refresh
        let refreshable = options.include_auth && !options.headers.contains_key(AUTHORIZATION);
        if response.status() != StatusCode::UNAUTHORIZED || !refreshable {
            return Ok(response);
        }

        debug!(endpoint = %endpoint, method = %options.method, "Received 401, refreshing access token");

        // another request may already have refreshed, or ended the session,
        // while this one was in flight
        let stored = self.credentials.access_token()?;
        let token = match (stored, sent_token.as_deref()) {
            (Some(stored), sent) if sent != Some(stored.as_str()) => {
                debug!(endpoint = %endpoint, "Access token changed since request was sent, retrying");
                stored
            }
            (None, Some(_)) => {
                debug!(endpoint = %endpoint, "Session ended while request was in flight");
                return Err(ClientError::AuthExpired);
            }
            _ => self.refresh_access_token().await?,
        };

        let retried = self.send(&url, &options, Some(&token)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(endpoint = %endpoint, "Still unauthorized after token refresh");
        }

        Ok(retried)
    }

    pub async fn get(&self, endpoint: &str) -> Result<Response> {
        self.request(endpoint, RequestOptions::new(Method::GET)).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<Response> {
        self.request(endpoint, RequestOptions::new(Method::POST).json(body)?)
            .await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<Response> {
        self.request(endpoint, RequestOptions::new(Method::PUT).json(body)?)
            .await
    }

    pub async fn patch<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<Response> {
        self.request(endpoint, RequestOptions::new(Method::PATCH).json(body)?)
            .await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<Response> {
        self.request(endpoint, RequestOptions::new(Method::DELETE))
            .await
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// On success the new access token is stored. On failure the credentials
    /// are cleared and the UI is sent to the login page before the error is
    /// returned.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = match self.credentials.refresh_token()? {
            Some(token) => token,
            None => {
                warn!("No refresh token stored, ending session");
                self.end_session(&self.config.login_path);
                return Err(ClientError::AuthExpired);
            }
        };

        // Use singleflight so concurrent 401s share one refresh call and the
        // session is ended at most once
        let (success_opt, error_opt, _shared) = self
            .refresh_singleflight
            .work(&refresh_token, async {
                match self.do_refresh(&refresh_token).await {
                    Ok(access) => match self.credentials.set_access(&access) {
                        Ok(()) => {
                            info!("Access token refreshed successfully");
                            Ok(access)
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to store refreshed access token");
                            Err(e.to_string())
                        }
                    },
                    Err(e) => {
                        let err_msg = e.to_string();
                        warn!(error = %err_msg, "Token refresh failed, ending session");
                        self.end_session(&self.config.login_path);
                        Err(err_msg)
                    }
                }
            })
            .await;

        match (success_opt, error_opt) {
            (Some(token), None) => Ok(token),
            (None, Some(err_str)) => Err(ClientError::RefreshFailure(err_str)),
            _ => Err(ClientError::RefreshFailure(
                "Unknown error during token refresh".to_string(),
            )),
        }
    }

    /// Clear credentials and send the UI to the post-logout page
    pub fn logout(&self) -> Result<()> {
        info!("Logging out");
        let cleared = self.credentials.clear();
        self.navigator.navigate(&self.config.logout_path);
        cleared
    }

    /// Whether the client holds a usable session
    ///
    /// Bearer mode: an access token is stored. Session mode: an access token is
    /// stored or a CSRF token can be located.
    pub fn is_authenticated(&self) -> bool {
        let has_token = self.credentials.is_authenticated();
        match self.config.auth_mode {
            AuthMode::Bearer => has_token,
            AuthMode::Session => has_token || self.csrf.csrf_token().is_some(),
        }
    }

    /// Get the credential store (for storing tokens after login)
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
        access_token: Option<&str>,
    ) -> Result<Response> {
        let mut headers = self.base_headers();
        if let Some(token) = access_token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored access token is not a valid header value, sending without it"),
            }
        }
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }

        let mut request = self
            .http_client
            .request(options.method.clone(), url)
            .headers(headers);
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        debug!(url = %url, method = %options.method, auth = access_token.is_some(), "API request");

        match request.send().await {
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "API response");
                Ok(response)
            }
            Err(e) => {
                error!(url = %url, method = %options.method, error = %e, "API request failed");
                Err(ClientError::Network(e))
            }
        }
    }

    /// Content type plus the CSRF header when a token is locatable
    fn base_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(csrf) = self.csrf.csrf_token() {
            match HeaderValue::from_str(&csrf) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static("x-csrftoken"), value);
                }
                Err(_) => warn!(header = CSRF_HEADER_NAME, "CSRF token is not a valid header value"),
            }
        }

        headers
    }

    async fn do_refresh(&self, refresh_token: &str) -> Result<String> {
        let url = self.config.url_for(&self.config.refresh_path);

        let request = RefreshRequest {
            refresh: refresh_token.to_string(),
        };

        let response = self
            .http_client
            .post(&url)
            .headers(self.base_headers())
            .json(&request)
            .send()
            .await?;

        check_response!(response, "Refresh request rejected");

        let refresh_response: RefreshResponse = response.json().await?;
        if refresh_response.access.is_empty() {
            return Err(ClientError::RefreshFailure(
                "Refresh response carried an empty access token".to_string(),
            ));
        }

        Ok(refresh_response.access)
    }

    fn end_session(&self, redirect_to: &str) {
        if let Err(e) = self.credentials.clear() {
            error!(error = %e, "Failed to clear credentials");
        }
        self.navigator.navigate(redirect_to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csrf::{NoCsrf, PageCsrf};
    use crate::navigator::NoopNavigator;

    fn client(config: ClientConfig, csrf: Arc<dyn CsrfSource>) -> Arc<ApiClient> {
        ApiClient::new(config, CredentialStore::in_memory(), csrf, Arc::new(NoopNavigator)).unwrap()
    }

    #[test]
    fn test_request_options() {
        let opts = RequestOptions::default();
        assert_eq!(opts.method, Method::GET);
        assert!(opts.include_auth);
        assert!(opts.body.is_none());

        let opts = RequestOptions::new(Method::POST)
            .json(&serde_json::json!({ "title": "Ferme solaire" }))
            .unwrap()
            .header(
                HeaderName::from_static("x-requested-with"),
                HeaderValue::from_static("XMLHttpRequest"),
            )
            .without_auth();
        assert_eq!(opts.method, Method::POST);
        assert!(!opts.include_auth);
        assert_eq!(opts.body, Some(serde_json::json!({ "title": "Ferme solaire" })));
        assert_eq!(opts.headers.get("x-requested-with").unwrap(), "XMLHttpRequest");
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = ApiClient::new(
            ClientConfig::new("investafrik.example"),
            CredentialStore::in_memory(),
            Arc::new(NoCsrf),
            Arc::new(NoopNavigator),
        );
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn test_is_authenticated_bearer_mode() {
        let api = client(
            ClientConfig::new("http://localhost:8000"),
            Arc::new(PageCsrf::new().with_meta_tag("csrf")),
        );
        // a CSRF token alone is not a bearer session
        assert!(!api.is_authenticated());

        api.credentials().set("a", "r").unwrap();
        assert!(api.is_authenticated());
    }

    #[test]
    fn test_is_authenticated_session_mode() {
        let config = ClientConfig::new("http://localhost:8000").with_auth_mode(AuthMode::Session);
        let api = client(config.clone(), Arc::new(PageCsrf::new().with_meta_tag("csrf")));
        assert!(api.is_authenticated());

        let api = client(config, Arc::new(NoCsrf));
        assert!(!api.is_authenticated());
    }

    #[test]
    fn test_base_headers_include_csrf() {
        let api = client(
            ClientConfig::new("http://localhost:8000"),
            Arc::new(PageCsrf::new().with_cookies("csrftoken=tok")),
        );
        let headers = api.base_headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(CSRF_HEADER_NAME).unwrap(), "tok");

        let api = client(ClientConfig::new("http://localhost:8000"), Arc::new(NoCsrf));
        assert!(api.base_headers().get(CSRF_HEADER_NAME).is_none());
    }

    #[test]
    fn test_logout_clears_and_navigates() {
        let (nav, mut rx) = crate::navigator::ChannelNavigator::new();
        let api = ApiClient::new(
            ClientConfig::new("http://localhost:8000"),
            CredentialStore::in_memory(),
            Arc::new(NoCsrf),
            Arc::new(nav),
        )
        .unwrap();
        api.credentials().set("a", "r").unwrap();

        api.logout().unwrap();

        assert!(!api.is_authenticated());
        assert_eq!(api.credentials().refresh_token().unwrap(), None);
        assert_eq!(rx.try_recv().unwrap(), "/");
    }
}
