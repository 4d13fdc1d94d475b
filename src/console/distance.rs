//! Distance-travelled readout and the query that refreshes it.

use std::time::Duration;

use crate::bus::{Bus, BusError, DistanceResponse};

/// Readout before the first query.
pub const DISTANCE_INITIAL: &str = "0";
/// Readout after a failed query.
pub const DISTANCE_FAILURE: &str = "Failed to get distance!";

/// Text shown in the "Distance Travelled" panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceReadout {
    text: String,
}

impl Default for DistanceReadout {
    fn default() -> Self {
        Self {
            text: DISTANCE_INITIAL.to_string(),
        }
    }
}

impl DistanceReadout {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Issue the query and record its outcome. Blocks for as long as the bus does.
    pub fn query(&mut self, bus: &mut impl Bus, timeout: Option<Duration>) {
        let outcome = bus.call_distance(timeout);
        self.record(outcome);
    }

    /// Replace the readout with the outcome of a query. Failures never propagate.
    pub fn record(&mut self, outcome: Result<DistanceResponse, BusError>) {
        match outcome {
            Ok(DistanceResponse { success: true, message }) => {
                log::info!("Distance: {}", message);
                self.text = message;
            }
            Ok(DistanceResponse { success: false, message }) => {
                log::warn!("Distance service refused the request: {}", message);
                self.text = DISTANCE_FAILURE.to_string();
            }
            Err(e) => {
                log::warn!("Distance query failed: {}", e);
                self.text = DISTANCE_FAILURE.to_string();
            }
        }
    }
}
