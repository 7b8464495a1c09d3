use super::error::TrackerError;
use super::response::{parse_announce, AnnounceRequest, AnnounceResponse};
use crate::constants::{HTTP_TRACKER_TIMEOUT, USER_AGENT};
use reqwest::Client;
use tracing::{debug, warn};

pub struct HttpTracker {
    client: Client,
    url: String,
}

impl HttpTracker {
    pub fn new(url: &str) -> Result<Self, TrackerError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(TrackerError::InvalidUrl(url.to_string()));
        }

        let client = Client::builder()
            .timeout(HTTP_TRACKER_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(TrackerError::Http)?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn announce(
        &self,
        request: &AnnounceRequest,
    ) -> Result<AnnounceResponse, TrackerError> {
        let url = self.announce_url(request);
        debug!(tracker = %self.url, left = request.left, "announcing");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(TrackerError::Failure(format!(
                "{}: {}",
                status,
                String::from_utf8_lossy(&bytes)
            )));
        }

        let response = parse_announce(&bytes)?;
        if let Some(warning) = &response.warning_message {
            warn!(tracker = %self.url, %warning, "tracker warning");
        }
        debug!(tracker = %self.url, peers = response.peers.len(), "announce complete");
        Ok(response)
    }

    /// Builds the full GET url. Query parameters are appended with `&` when
    /// the announce url already carries a query string.
    pub fn announce_url(&self, request: &AnnounceRequest) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{}{}info_hash={}&peer_id={}&port={}&uploaded={}&downloaded={}&left={}&compact=1&numwant={}",
            self.url,
            separator,
            url_encode(request.info_hash.as_bytes()),
            url_encode(request.peer_id.as_bytes()),
            request.port,
            request.uploaded,
            request.downloaded,
            request.left,
            request.numwant,
        );

        let event_str = request.event.as_str();
        if !event_str.is_empty() {
            url.push_str(&format!("&event={}", event_str));
        }
        url
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn url_encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.' || b == b'~' {
                format!("{}", b as char)
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect()
}
