//! Form-POST transport.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::SyncError;

/// Bound applied separately to sending a request and to reading its body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Posts form-encoded fields to a named endpoint and returns the response body.
///
/// The session implements this on top of [`HttpTransport`]; tests substitute
/// an in-memory bulletin.
pub trait RelayTransport: Send + Sync {
    fn post_form<'a>(
        &'a self,
        endpoint: &'a str,
        form: &'a [(&'static str, String)],
    ) -> Pin<Box<dyn Future<Output = Result<String, SyncError>> + Send + 'a>>;
}

/// HTTP implementation over `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport rooted at `base_url` (endpoint names are appended).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl RelayTransport for HttpTransport {
    fn post_form<'a>(
        &'a self,
        endpoint: &'a str,
        form: &'a [(&'static str, String)],
    ) -> Pin<Box<dyn Future<Output = Result<String, SyncError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}{endpoint}", self.base_url);

            let resp = tokio::time::timeout(
                REQUEST_TIMEOUT,
                self.client.post(&url).form(form).send(),
            )
            .await
            .map_err(|_| SyncError::Timeout)??;

            let status = resp.status();
            if !status.is_success() {
                return Err(SyncError::Status(status.as_u16()));
            }

            let body = tokio::time::timeout(REQUEST_TIMEOUT, resp.text())
                .await
                .map_err(|_| SyncError::Timeout)??;
            Ok(body)
        })
    }
}
