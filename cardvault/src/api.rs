//! Client for the public card database API.

use reqwest::Client;
use serde::Deserialize;

use crate::card::Card;
use crate::types::CardError;

/// Endpoint returning the full card set in one unauthenticated GET.
pub const DEFAULT_API_URL: &str = "https://db.ygoprodeck.com/api/v7/cardinfo.php";

#[derive(Debug, Deserialize)]
struct CardInfoResponse {
    data: Vec<Card>,
}

/// Thin client around the card info endpoint.
///
/// The API takes no parameters and no auth; the only failure modes are
/// transport errors and non-success statuses, both surfaced as [`CardError`].
#[derive(Clone, Debug)]
pub struct CardApi {
    client: Client,
    endpoint: String,
}

impl CardApi {
    /// Creates a client against the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, CardError> {
        let client = Client::builder()
            .user_agent("duelist-card-ingestor/0.1")
            .use_rustls_tls()
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Creates a client with a preconfigured [`reqwest::Client`].
    #[must_use]
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// The endpoint this client fetches from.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches the complete card set.
    pub async fn fetch_all(&self) -> Result<Vec<Card>, CardError> {
        tracing::debug!(endpoint = %self.endpoint, "fetching card set");
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CardError::Api {
                status: status.as_u16(),
            });
        }
        let payload: CardInfoResponse = response.json().await?;
        tracing::debug!(cards = payload.data.len(), "card set fetched");
        Ok(payload.data)
    }
}
