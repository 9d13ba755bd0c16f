//! Prompt fetching.

use std::collections::HashMap;
use std::sync::Arc;

use forprompt_core::{Error, MAX_KEY_LENGTH, Prompt, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::TRACING_TARGET_CLIENT;
use crate::config::ClientConfig;
use crate::executor::RequestExecutor;
use crate::logger::TraceLogger;
use crate::transport::{HttpTransport, Method, ReqwestTransport, SharedTransport};

/// Path of the prompt fetch endpoint.
pub const PROMPTS_PATH: &str = "/api/prompts";

/// Maximum number of fetches in flight during a bulk fetch.
pub const BULK_CONCURRENCY_LIMIT: usize = 5;

/// Client for fetching prompts from ForPrompt.
///
/// Cloning is cheap and clones share the connection pool.
///
/// # Examples
///
/// ```rust,ignore
/// use forprompt_client::{ClientConfig, ForPromptClient};
///
/// let client = ForPromptClient::new(ClientConfig::new("fp_xxx"))?;
/// let prompt = client.get_prompt("onboarding", Some(2)).await?;
/// println!("{}", prompt.system_prompt);
/// ```
#[derive(Clone)]
pub struct ForPromptClient {
    executor: RequestExecutor,
}

impl std::fmt::Debug for ForPromptClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForPromptClient")
            .field("config", self.config())
            .finish_non_exhaustive()
    }
}

impl ForPromptClient {
    /// Creates a client over the default reqwest transport.
    ///
    /// Fails with `MISSING_API_KEY` when the configuration has no API key.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.validate()?;
        let transport = ReqwestTransport::new().map_err(|e| {
            Error::network_error(format!("Failed to create HTTP client: {e}")).with_source(e)
        })?;
        Ok(Self::from_parts(config, SharedTransport::new(transport)))
    }

    /// Creates a client from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Creates a client over a custom transport.
    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Result<Self>
    where
        T: HttpTransport + 'static,
    {
        let config = config.validate()?;
        Ok(Self::from_parts(config, SharedTransport::new(transport)))
    }

    fn from_parts(config: ClientConfig, transport: SharedTransport) -> Self {
        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            base_url = %config.base_url,
            retries = config.retries,
            timeout_secs = config.timeout_secs,
            "Creating ForPrompt client"
        );

        Self {
            executor: RequestExecutor::new(config, transport),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    /// Returns a trace logger sharing this client's configuration and
    /// transport.
    pub fn logger(&self) -> TraceLogger {
        TraceLogger::from_executor(self.executor.clone())
    }

    /// Fetches a prompt by key, optionally pinned to a version.
    ///
    /// Without a version the service returns the active one.
    pub async fn get_prompt(&self, key: &str, version: Option<u32>) -> Result<Prompt> {
        validate_prompt_request(key, version)?;

        let mut query = vec![("key", key.to_owned())];
        if let Some(version) = version {
            query.push(("version", version.to_string()));
        }

        let body = self
            .executor
            .execute(Method::GET, PROMPTS_PATH, &query, None)
            .await?;
        let prompt = Prompt::from_value(body)?;

        tracing::debug!(
            target: TRACING_TARGET_CLIENT,
            key = %prompt.key,
            version = prompt.version_number,
            "Fetched prompt"
        );

        Ok(prompt)
    }

    /// Fetches several prompts concurrently.
    ///
    /// At most [`BULK_CONCURRENCY_LIMIT`] fetches run at once. Keys that fail
    /// for any reason are left out of the result; the call itself never
    /// fails.
    pub async fn get_prompts<I, S>(&self, keys: I, version: Option<u32>) -> HashMap<String, Prompt>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let semaphore = Arc::new(Semaphore::new(BULK_CONCURRENCY_LIMIT));
        let mut tasks = JoinSet::new();

        for key in keys {
            let key: String = key.into();
            let client = self.clone();
            let semaphore = semaphore.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;
                let result = client.get_prompt(&key, version).await;
                Some((key, result))
            });
        }

        let mut prompts = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some((key, Ok(prompt)))) => {
                    prompts.insert(key, prompt);
                }
                Ok(Some((key, Err(err)))) => {
                    tracing::debug!(
                        target: TRACING_TARGET_CLIENT,
                        key = %key,
                        error = %err,
                        "Skipping prompt in bulk fetch"
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET_CLIENT,
                        error = %err,
                        "Bulk fetch task failed"
                    );
                }
            }
        }

        prompts
    }
}

/// Checks a prompt key and version before any request is made.
///
/// Keys must be non-empty and at most [`MAX_KEY_LENGTH`] characters;
/// versions must be positive.
pub fn validate_prompt_request(key: &str, version: Option<u32>) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_input("Prompt key must be a non-empty string"));
    }

    if key.chars().count() > MAX_KEY_LENGTH {
        return Err(Error::invalid_input(format!(
            "Prompt key must be {MAX_KEY_LENGTH} characters or less"
        )));
    }

    if version == Some(0) {
        return Err(Error::invalid_input("Version must be a positive integer"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use forprompt_core::ErrorKind;
    use serde_json::{Value, json};

    use super::*;
    use crate::transport::{MockReply, MockTransport};

    fn prompt_body(key: &str, version: u32) -> Value {
        json!({
            "key": key,
            "name": format!("Prompt {key}"),
            "versionNumber": version,
            "systemPrompt": format!("You are {key}."),
            "updatedAt": 1_700_000_000_000_i64,
        })
    }

    fn client(mock: &MockTransport) -> ForPromptClient {
        let config = ClientConfig::new("fp_test").with_base_url("https://api.test/");
        ForPromptClient::with_transport(config, mock.clone()).unwrap()
    }

    #[test]
    fn test_new_requires_api_key() {
        let error = ForPromptClient::with_transport(ClientConfig::default(), MockTransport::new())
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::MissingApiKey);
    }

    #[tokio::test]
    async fn test_get_prompt_active_version() {
        let mock = MockTransport::new();
        mock.push_json(200, prompt_body("greeting", 4));

        let prompt = client(&mock).get_prompt("greeting", None).await.unwrap();
        assert_eq!(prompt.key, "greeting");
        assert_eq!(prompt.version_number, 4);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.url, "https://api.test/api/prompts");
        assert_eq!(request.query, [("key".to_owned(), "greeting".to_owned())]);
        assert_eq!(request.header("X-API-Key"), Some("fp_test"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_get_prompt_pinned_version() {
        let mock = MockTransport::new();
        mock.push_json(200, prompt_body("greeting", 2));

        let prompt = client(&mock).get_prompt("greeting", Some(2)).await.unwrap();
        assert_eq!(prompt.version_number, 2);

        let request = &mock.requests()[0];
        assert_eq!(request.query_param("key"), Some("greeting"));
        assert_eq!(request.query_param("version"), Some("2"));
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_request() {
        let mock = MockTransport::new();
        let client = client(&mock);

        let long_key = "k".repeat(MAX_KEY_LENGTH + 1);
        for (key, version) in [("", None), (long_key.as_str(), None), ("greeting", Some(0))] {
            let error = client.get_prompt(key, version).await.unwrap_err();
            assert_eq!(error.kind, ErrorKind::InvalidInput);
            assert_eq!(error.status, 400);
        }

        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_key_length_counts_characters() {
        let key = "é".repeat(MAX_KEY_LENGTH);
        assert!(validate_prompt_request(&key, None).is_ok());
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mock = MockTransport::new();
        mock.push_json(404, json!({"error": "not found"}));

        let error = client(&mock).get_prompt("missing", None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::PromptNotFound);
        assert_eq!(error.message, "not found");
        assert_eq!(error.status, 404);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_are_retried() {
        let mock = MockTransport::new();
        mock.push(MockReply::text(500, ""))
            .push(MockReply::text(500, ""))
            .push_json(200, prompt_body("greeting", 1));

        let started = tokio::time::Instant::now();
        let prompt = client(&mock).get_prompt("greeting", None).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(prompt.key, "greeting");
        assert_eq!(mock.call_count(), 3);
        assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_surface_last_error() {
        let mock = MockTransport::new();
        mock.push_network_error("connection refused")
            .push(MockReply::text(502, ""))
            .push(MockReply::text(503, ""));

        let error = client(&mock).get_prompt("greeting", None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::ServerError);
        assert_eq!(error.status, 503);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_error_is_retried() {
        let mock = MockTransport::new();
        mock.push_network_error("connection refused")
            .push_json(200, prompt_body("greeting", 1));

        let prompt = client(&mock).get_prompt("greeting", None).await.unwrap();
        assert_eq!(prompt.version_number, 1);
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_not_retried() {
        let mock = MockTransport::new();
        mock.push_timeout();

        let error = client(&mock).get_prompt("greeting", None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::Timeout);
        assert_eq!(error.message, "Request timeout after 30s");
        assert_eq!(error.status, 408);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_prompt_body() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({"key": "greeting"}));

        let error = client(&mock).get_prompt("greeting", None).await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::ApiError);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_get_prompts_omits_failures() {
        let mock = MockTransport::new().with_handler(|request| {
            let key = request.query_param("key").unwrap_or_default();
            if key == "k3" || key == "k5" {
                MockReply::json(404, json!({"error": "not found"}))
            } else {
                MockReply::json(200, prompt_body(key, 1))
            }
        });

        let keys: Vec<String> = (1..=7).map(|i| format!("k{i}")).collect();
        let prompts = client(&mock).get_prompts(keys, None).await;

        assert_eq!(prompts.len(), 5);
        assert!(!prompts.contains_key("k3"));
        assert!(!prompts.contains_key("k5"));
        assert_eq!(prompts["k1"].key, "k1");
        assert_eq!(mock.call_count(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_prompts_concurrency_limit() {
        let mock = MockTransport::new()
            .with_latency(Duration::from_millis(100))
            .with_handler(|request| {
                let key = request.query_param("key").unwrap_or_default();
                MockReply::json(200, prompt_body(key, 1))
            });

        let keys: Vec<String> = (0..12).map(|i| format!("key-{i}")).collect();
        let prompts = client(&mock).get_prompts(keys, None).await;

        assert_eq!(prompts.len(), 12);
        assert!(mock.max_in_flight() <= BULK_CONCURRENCY_LIMIT);
        assert!(mock.max_in_flight() > 1);
    }

    #[tokio::test]
    async fn test_get_prompts_invalid_keys_omitted() {
        let mock = MockTransport::new().with_handler(|request| {
            let key = request.query_param("key").unwrap_or_default();
            MockReply::json(200, prompt_body(key, 1))
        });

        let prompts = client(&mock).get_prompts(["", "valid"], None).await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts.contains_key("valid"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_get_prompts_empty() {
        let mock = MockTransport::new();
        let prompts = client(&mock).get_prompts(Vec::<String>::new(), None).await;
        assert!(prompts.is_empty());
        assert_eq!(mock.call_count(), 0);
    }
}
