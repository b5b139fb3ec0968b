//! Agent card discovery.
//!
//! Cards are fetched from the well-known URI. The current path is tried
//! first and a 404 falls back to the legacy one.

use crate::error::{A2AError, A2AResult};
use crate::types::AgentCard;
use crate::utils::{AGENT_CARD_WELL_KNOWN_PATH, PREV_AGENT_CARD_WELL_KNOWN_PATH};

/// Resolves [`AgentCard`]s from agent base URLs.
///
/// ```no_run
/// use a2a_cli::client::CardResolver;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = CardResolver::new();
/// let card = resolver.resolve("http://localhost:7420").await?;
/// println!("Agent: {} v{}", card.name, card.version);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CardResolver {
    client: reqwest::Client,
    /// Overrides the well-known path. No fallback is attempted when set.
    card_path: Option<String>,
}

impl CardResolver {
    /// Create a resolver with default settings.
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a resolver around an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            card_path: None,
        }
    }

    /// Fetch the card from a fixed path instead of the well-known ones.
    pub fn with_card_path(mut self, path: impl Into<String>) -> Self {
        self.card_path = Some(path.into());
        self
    }

    /// Fetch and parse the agent card served under `base_url`.
    ///
    /// # Errors
    ///
    /// [`A2AError::Timeout`] when the request times out and
    /// [`A2AError::Connection`] for every other failure (unreachable host,
    /// non-2xx status, unparseable card).
    pub async fn resolve(&self, base_url: &str) -> A2AResult<AgentCard> {
        let base = base_url.trim_end_matches('/');

        let result = match self.card_path.as_deref() {
            Some(path) => self.fetch_card(base, path).await,
            None => match self.fetch_card(base, AGENT_CARD_WELL_KNOWN_PATH).await {
                Err(A2AError::Http { status: 404, .. }) => {
                    tracing::debug!(
                        "agent card not found at {}{}, trying {}",
                        base,
                        AGENT_CARD_WELL_KNOWN_PATH,
                        PREV_AGENT_CARD_WELL_KNOWN_PATH,
                    );
                    self.fetch_card(base, PREV_AGENT_CARD_WELL_KNOWN_PATH).await
                }
                other => other,
            },
        };

        result.map_err(|e| match e {
            A2AError::Timeout(_) | A2AError::Connection(_) => e,
            other => A2AError::Connection(format!("could not load agent card from {base}: {other}")),
        })
    }

    async fn fetch_card(&self, base: &str, path: &str) -> A2AResult<AgentCard> {
        let url = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        tracing::debug!("resolving agent card from {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| A2AError::from_reqwest("agent card fetch", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(A2AError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| A2AError::from_reqwest("reading agent card", e))?;

        let card: AgentCard = serde_json::from_slice(&bytes)
            .map_err(|e| A2AError::malformed(format!("failed to parse agent card: {e}")))?;

        tracing::debug!("resolved agent card: {} v{}", card.name, card.version);

        Ok(card)
    }

    /// The JSON-RPC endpoint advertised by a card.
    ///
    /// Prefers an interface whose transport is `JSONRPC` (case-insensitive),
    /// then the card's `url`, then `base_url` itself. A relative URL is
    /// resolved against `base_url`.
    pub fn endpoint_url(card: &AgentCard, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        let advertised = card
            .supported_interfaces
            .iter()
            .chain(card.additional_interfaces.iter().flatten())
            .find(|iface| iface.transport.eq_ignore_ascii_case("JSONRPC") && !iface.url.is_empty())
            .map(|iface| iface.url.as_str())
            .or_else(|| Some(card.url.as_str()).filter(|url| !url.is_empty()));

        match advertised {
            Some(url) if url.starts_with('/') => format!("{base}{url}"),
            Some(url) => url.to_string(),
            None => base.to_string(),
        }
    }
}

impl Default for CardResolver {
    fn default() -> Self {
        Self::new()
    }
}
