//! Canonical byte forms (§4.1 of the design).
//!
//! Three forms exist, all UTF-8 JSON with `,`/`:` separators and no other
//! whitespace:
//!
//! - **signing form**: the literal key order `txid, action, asset, amount,
//!   to, nonce, chainId`, omitting absent keys. Used for `txid` derivation
//!   (without the `txid` key, since it doesn't exist yet) and for the
//!   `personal_sign` message (with it, once the sender has assigned one).
//! - **consensus form**: same fields, sorted lexicographically, plus
//!   `pool_id, asset_paired, amount_paired` for `add_liquidity`. Used inside
//!   block-hash preimages.
//! - **generic sorted form**: arbitrary `serde_json::Value`, sorted
//!   lexicographically. Used for oracle payloads, flare commits, and block
//!   preimages themselves.
//!
//! `_meta`, `_fee`, and `timestamp` never appear in any of the three forms.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::transaction::{Action, Transaction};
use crate::types::TxId;

fn field_value(action: &Action, key: &str) -> Option<Value> {
    match key {
        "asset" => action.asset().map(|a| Value::String(a.as_str().to_string())),
        "amount" => action.amount().map(|a| Value::String(a.to_decimal_string())),
        "to" => action.to().map(|a| Value::String(a.to_hex())),
        _ => None,
    }
}

/// Builds the signing-form JSON string. `txid` is included only when `txid`
/// is `Some` — absent while deriving the txid itself, present once assigned.
fn signing_form_string(txid: Option<&TxId>, action: &Action, nonce: u64, chain_id: u64) -> String {
    let mut out = String::from("{");
    let mut first = true;
    let mut push = |out: &mut String, key: &str, value: Value| {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&serde_json::to_string(key).unwrap());
        out.push(':');
        out.push_str(&serde_json::to_string(&value).unwrap());
    };
    if let Some(txid) = txid {
        push(&mut out, "txid", Value::String(txid.to_hex()));
    }
    push(&mut out, "action", Value::String(action.name().to_string()));
    if let Some(v) = field_value(action, "asset") {
        push(&mut out, "asset", v);
    }
    if let Some(v) = field_value(action, "amount") {
        push(&mut out, "amount", v);
    }
    if let Some(v) = field_value(action, "to") {
        push(&mut out, "to", v);
    }
    push(&mut out, "nonce", Value::Number(nonce.into()));
    push(&mut out, "chainId", Value::Number(chain_id.into()));
    out.push('}');
    out
}

/// Derives `txid = SHA256(signing_form_without_txid)`.
pub fn compute_txid(action: &Action, nonce: u64, chain_id: u64) -> TxId {
    let form = signing_form_string(None, action, nonce, chain_id);
    let digest = Sha256::digest(form.as_bytes());
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&digest);
    TxId(arr)
}

/// The exact byte sequence a wallet signs (and the node re-derives to
/// recover the signer) once `tx.txid` has been assigned.
pub fn signing_message(tx: &Transaction) -> Vec<u8> {
    signing_form_string(Some(&tx.txid), &tx.action, tx.nonce, tx.chain_id).into_bytes()
}

/// Consensus form: sorted keys, `add_liquidity` extras included. Used inside
/// block-hash preimages via [`sorted_json`].
pub fn consensus_form_value(tx: &Transaction) -> Value {
    let mut map = Map::new();
    map.insert("txid".into(), Value::String(tx.txid.to_hex()));
    map.insert("action".into(), Value::String(tx.action.name().to_string()));
    if let Some(v) = field_value(&tx.action, "asset") {
        map.insert("asset".into(), v);
    }
    if let Some(v) = field_value(&tx.action, "amount") {
        map.insert("amount".into(), v);
    }
    if let Some(v) = field_value(&tx.action, "to") {
        map.insert("to".into(), v);
    }
    map.insert("nonce".into(), Value::Number(tx.nonce.into()));
    map.insert("chainId".into(), Value::Number(tx.chain_id.into()));
    if let Some((pool_id, asset_paired, amount_paired)) = tx.action.pool_extra() {
        map.insert("pool_id".into(), Value::String(pool_id.to_string()));
        map.insert(
            "asset_paired".into(),
            Value::String(asset_paired.as_str().to_string()),
        );
        map.insert(
            "amount_paired".into(),
            Value::String(amount_paired.to_decimal_string()),
        );
    }
    Value::Object(map)
}

/// Serializes any `Value` with lexicographically sorted keys and no
/// insignificant whitespace. Relies on `serde_json::Map` being `BTreeMap`
/// backed (the workspace never enables the `preserve_order` feature), which
/// is what guarantees sorted output here and for [`consensus_form_value`].
pub fn sorted_json(value: &Value) -> String {
    serde_json::to_string(value).expect("sorted_json: serialization is infallible for Value")
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Address, Amount, Asset};

    fn sample_transfer() -> Transaction {
        let action = Action::Transfer {
            asset: Asset::new("ARGH"),
            amount: Amount::from_decimal_str("10").unwrap(),
            to: Address::from_hex("0x0000000000000000000000000000000000dead").unwrap(),
        };
        let txid = compute_txid(&action, 0, 1);
        Transaction {
            txid,
            sender: Address::ZERO,
            action,
            nonce: 0,
            chain_id: 1,
            timestamp: 0,
            signature: None,
        }
    }

    #[test]
    fn signing_form_omits_txid_until_assigned() {
        let tx = sample_transfer();
        let without = signing_form_string(None, &tx.action, tx.nonce, tx.chain_id);
        assert!(!without.contains("txid"));
        let with = signing_form_string(Some(&tx.txid), &tx.action, tx.nonce, tx.chain_id);
        assert!(with.starts_with("{\"txid\":"));
    }

    #[test]
    fn txid_is_sha256_of_signing_form_without_txid() {
        let tx = sample_transfer();
        let form = signing_form_string(None, &tx.action, tx.nonce, tx.chain_id);
        assert_eq!(tx.txid.to_hex(), sha256_hex(form.as_bytes()));
    }

    #[test]
    fn consensus_form_includes_pool_extras_only_for_add_liquidity() {
        let tx = sample_transfer();
        let v = consensus_form_value(&tx);
        assert!(v.get("pool_id").is_none());
    }

    #[test]
    fn sorted_json_has_no_whitespace_and_sorted_keys() {
        let v = serde_json::json!({"b": 1, "a": 2});
        let s = sorted_json(&v);
        assert_eq!(s, "{\"a\":2,\"b\":1}");
    }
}
