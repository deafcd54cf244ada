//! Nonce bookkeeping (§3 "Nonces"): the sender-scoped count of prior
//! non-system transactions. Grounded on `core/state.py::compute_nonces`.

use std::collections::HashMap;

use argh_core::{Address, Transaction};

/// Counts non-system transactions per sender across an ordered slice of
/// transactions (typically every transaction in the chain, in block order).
pub fn compute_nonces(all_txs: &[&Transaction]) -> HashMap<Address, u64> {
    let mut nonces = HashMap::new();
    for tx in all_txs {
        if tx.is_system() {
            continue;
        }
        *nonces.entry(tx.sender).or_insert(0) += 1;
    }
    nonces
}

/// The nonce a new transaction from `sender` must carry, given the
/// transactions already committed ahead of it.
pub fn expected_nonce(all_txs: &[&Transaction], sender: Address) -> u64 {
    all_txs
        .iter()
        .filter(|tx| !tx.is_system() && tx.sender == sender)
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh_core::{compute_txid, Action, Amount, Asset};

    fn user_tx(sender: Address, nonce: u64) -> Transaction {
        let action = Action::Transfer {
            asset: Asset::new("ARGH"),
            amount: Amount::from_whole(1),
            to: Address::ZERO,
        };
        let txid = compute_txid(&action, nonce, 1);
        Transaction {
            txid,
            sender,
            action,
            nonce,
            chain_id: 1,
            timestamp: 0,
            signature: Some(argh_core::EthSignature([0u8; 65])),
        }
    }

    #[test]
    fn nonces_increment_per_sender_ignoring_system_txs() {
        let alice = Address::from_hex("0x00000000000000000000000000000000000001").unwrap();
        let tx0 = user_tx(alice, 0);
        let tx1 = user_tx(alice, 1);
        let all = vec![&tx0, &tx1];
        assert_eq!(expected_nonce(&all, alice), 2);
    }
}
