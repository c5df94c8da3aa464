//! Endpoint discovery
//!
//! The target's listening port is not always known in advance (dev servers
//! hop ports when the default is taken), so a run can start from an ordered
//! candidate list. Candidates are probed strictly in order, one at a time:
//! the first that answers at all becomes the run's base address. An HTTP
//! error status still counts as reachable; only connection-level failures
//! advance to the next candidate.

use std::time::Duration;

use tracing::{debug, info};

use crate::common::{Error, Result};

/// Probe candidate ports in order and return the first reachable base URL.
///
/// Worst-case latency is the sum of per-candidate timeouts; there is no
/// parallel probing. Exhausting the list is terminal: the caller aborts
/// before any step executes.
pub async fn discover(host: &str, ports: &[u16], probe_timeout: Duration) -> Result<String> {
    if ports.is_empty() {
        return Err(Error::Config(
            "no base URL and no candidate ports configured".to_string(),
        ));
    }

    let client = reqwest::Client::builder()
        .timeout(probe_timeout)
        .build()
        .map_err(|e| Error::Config(format!("failed to build probe client: {e}")))?;

    for &port in ports {
        let base = format!("http://{host}:{port}");
        debug!(%base, "probing candidate");
        match client.get(format!("{base}/")).send().await {
            Ok(response) => {
                // Any response, even a 4xx/5xx, means something is listening.
                info!(%base, status = %response.status(), "candidate reachable");
                return Ok(base);
            }
            Err(e) => {
                debug!(%base, "candidate unreachable: {e}");
            }
        }
    }

    Err(Error::DiscoveryExhausted { tried: ports.len() })
}
