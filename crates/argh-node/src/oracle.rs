//! Oracle fetch client (§6 "Oracle protocol"). `GET {oracle_url}/{slot}`
//! returns a signed flux observation; any failure to reach it or to verify
//! its signature surfaces as [`NodeError::OracleUnavailable`] rather than a
//! panic, since a single down oracle must only stall block production for
//! the affected slot, never crash the node.

use argh_core::{sorted_json, FlareClass, OracleConfig};
use argh_crypto::verify_oracle_signature;
use serde::Deserialize;

use crate::error::NodeError;

#[derive(Clone, Debug, Deserialize)]
pub struct OracleObservation {
    pub id: String,
    pub slot: u64,
    pub class: FlareClass,
    pub flux: String,
    pub geomag: String,
    pub oracle_signature: String,
}

/// Fetches and verifies the oracle observation for `slot`. The secret
/// blinding factor for the commit is never part of this response — it's
/// generated fresh by the producer — so only the signed fields are parsed.
pub async fn fetch_observation(
    client: &reqwest::Client,
    oracle_url: &str,
    slot: u64,
    oracle: &OracleConfig,
) -> Result<OracleObservation, NodeError> {
    let url = format!("{}/{}", oracle_url.trim_end_matches('/'), slot);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|err| NodeError::OracleUnavailable(err.to_string()))?;

    if !response.status().is_success() {
        return Err(NodeError::OracleUnavailable(format!(
            "oracle returned status {}",
            response.status()
        )));
    }

    let observation: OracleObservation = response
        .json()
        .await
        .map_err(|err| NodeError::OracleUnavailable(format!("malformed oracle response: {err}")))?;

    let signed = serde_json::json!({
        "id": observation.id,
        "slot": observation.slot,
        "class": observation.class,
        "flux": observation.flux,
        "geomag": observation.geomag,
    });
    let message = sorted_json(&signed);
    if !verify_oracle_signature(oracle, message.as_bytes(), &observation.oracle_signature) {
        return Err(NodeError::OracleUnavailable(
            "oracle signature failed threshold verification".to_string(),
        ));
    }

    Ok(observation)
}
