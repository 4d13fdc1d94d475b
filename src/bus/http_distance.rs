//! HTTP client for a remote distance tracker.

use reqwest::blocking::Client;
use std::time::Duration;

use super::{BusError, DistanceResponse};
use crate::config::RemoteDistanceConfig;

/// Timeout used when the caller does not bound the request itself.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for the distance trigger service exposed over HTTP.
pub struct HttpDistanceService {
    client: Client,
    config: RemoteDistanceConfig,
}

impl HttpDistanceService {
    /// Create a new client for the configured endpoint.
    pub fn new(config: RemoteDistanceConfig) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client, config })
    }

    /// Trigger the distance service and decode its `{ success, message }` body.
    ///
    /// # Returns
    /// * `Ok(DistanceResponse)` if the service answered with HTTP 2xx and a valid body
    /// * `Err(BusError)` for network errors, timeouts, error statuses and malformed bodies
    pub fn call(&self, timeout: Option<Duration>) -> Result<DistanceResponse, BusError> {
        log::debug!("Requesting distance from {}", self.config.url);

        let mut request = self.client.get(&self.config.url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("X-Api-Key", api_key);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                BusError::Timeout
            } else if e.is_connect() {
                BusError::Disconnected
            } else {
                BusError::Transport(format!("Network error: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BusError::Transport(format!("Distance service returned {}: {}", status.as_u16(), body)));
        }

        response
            .json::<DistanceResponse>()
            .map_err(|e| BusError::Transport(format!("Invalid distance response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_body_decodes_trigger_fields() {
        let body = r#"{"success": true, "message": "3.21"}"#;
        let response: DistanceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response,
            DistanceResponse {
                success: true,
                message: "3.21".to_string()
            }
        );
    }

    #[test]
    fn unreachable_service_is_an_error_not_a_panic() {
        // Port 9 (discard) on localhost is practically never listening.
        let service = HttpDistanceService::new(RemoteDistanceConfig {
            url: "http://127.0.0.1:9/get_distance".to_string(),
            api_key: None,
        })
        .unwrap();
        assert!(service.call(Some(Duration::from_millis(500))).is_err());
    }
}
