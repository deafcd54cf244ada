//! The chain itself: an ordered sequence of validated blocks, plus the
//! full-replay balance/nonce derivation (§3 "Chain", §8 "compute_balances is
//! a function"). Grounded on `core/state.py::compute_balances`.

use std::collections::HashMap;

use argh_core::{Address, Protocol, Transaction};
use argh_state::Balances;

use crate::block::Block;

#[derive(Clone, Debug, Default)]
pub struct Chain {
    pub blocks: Vec<Block>,
}

impl Chain {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// The protocol parameter set, carried verbatim in the genesis block.
    pub fn protocol(&self) -> Option<&Protocol> {
        self.blocks.first().and_then(|b| b.protocol.as_ref())
    }

    pub fn all_transactions(&self) -> Vec<&Transaction> {
        self.blocks.iter().flat_map(|b| &b.transactions).collect()
    }

    /// Replays every transaction in every block, in order, through
    /// [`argh_state::apply`]. Assumes the chain has already passed block
    /// validation — this is a pure derivation, not a second validation pass.
    pub fn compute_balances(&self) -> Balances {
        let protocol = match self.protocol() {
            Some(p) => p,
            None => return Balances::new(),
        };
        let mut balances = Balances::new();
        for tx in self.all_transactions() {
            // Genesis/system txs and already-included block txs are trusted
            // here; a malformed one would have failed block validation.
            let _ = argh_state::apply(&mut balances, tx, protocol);
        }
        balances
    }

    /// Sender-scoped nonce counters derived from every non-system tx in the
    /// chain, in block order.
    pub fn compute_nonces(&self) -> HashMap<Address, u64> {
        argh_state::compute_nonces(&self.all_transactions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh_core::{Action, Amount, Asset, FeeDistribution, OracleConfig};

    fn protocol() -> Protocol {
        Protocol {
            treasury: Address::ZERO,
            devs: Address::ZERO,
            orbital: Address::ZERO,
            bridge_issuer: Address::ZERO,
            version: 1,
            chain_id: 1,
            soft_cap: Amount::from_whole(12_000_000),
            mint_scale: "0.08".into(),
            flux_scale: "1000000000000000000".into(),
            flux_normalizer: "10000000".into(),
            geomag_scale: "1000000".into(),
            transfer_fee_percent: "0.005".into(),
            fee_distribution: FeeDistribution {
                devs: "0.25".into(),
                orbital: "0.25".into(),
                validator: "0.50".into(),
            },
            allowed_assets: vec!["ARGH".into()],
            native_asset: "ARGH".into(),
            min_stake: Amount::from_whole(1000),
            slot_duration: 60,
            oracle: OracleConfig {
                pubkeys: vec![],
                threshold: 1,
            },
        }
    }

    #[test]
    fn compute_balances_reflects_genesis_mint() {
        let p = protocol();
        let action = Action::Mint {
            asset: Asset::new("ARGH"),
            amount: Amount::from_whole(550_000),
            to: p.treasury,
        };
        let txid = argh_core::compute_txid(&action, 0, 1);
        let tx = Transaction {
            txid,
            sender: p.treasury,
            action,
            nonce: 0,
            chain_id: 1,
            timestamp: 0,
            signature: None,
        };
        let block = Block::new(0, "0".repeat(64), Address::ZERO, 0, vec![tx], None, Some(p.clone()));
        let mut chain = Chain::new();
        chain.push(block);

        let balances = chain.compute_balances();
        assert_eq!(
            balances.get(p.treasury, &p.native_asset).to_decimal_string(),
            "550000"
        );
    }
}
