//! In-process node query/submission surface, standing in for the
//! out-of-scope HTTP/JSON query API: an embedder links against `argh_node`
//! directly and calls these instead of issuing RPC requests over a wire.

use std::sync::Arc;

use argh_consensus::Chain;
use argh_core::Transaction;
use argh_crypto::NodeKey;
use argh_p2p::Network;
use argh_state::{Balances, Mempool};

use crate::error::NodeError;

#[derive(Clone)]
pub struct NodeHandle {
    pub(crate) network: Network,
    pub(crate) mempool: Arc<Mempool>,
    pub(crate) node_key: Arc<NodeKey>,
}

impl NodeHandle {
    pub fn new(network: Network, mempool: Arc<Mempool>, node_key: Arc<NodeKey>) -> Self {
        Self {
            network,
            mempool,
            node_key,
        }
    }

    /// Balances derived by replaying the full local chain.
    pub async fn balances(&self) -> Balances {
        self.network.chain_snapshot().await.compute_balances()
    }

    /// A clone of the locally held chain.
    pub async fn chain_snapshot(&self) -> Chain {
        self.network.chain_snapshot().await
    }

    /// Adds `tx` to the local mempool and gossips it to peers. Rejects a
    /// duplicate `txid` silently, matching [`Mempool::add`]'s semantics.
    pub async fn submit_transaction(&self, tx: Transaction) -> Result<bool, NodeError> {
        let mempool = self.mempool.clone();
        let node_key = self.node_key.clone();
        let tx_for_add = tx.clone();
        let added = tokio::task::spawn_blocking(move || mempool.add(&node_key, tx_for_add))
            .await
            .map_err(|err| NodeError::Config(format!("mempool task panicked: {err}")))??;
        if added {
            self.network.broadcast_tx(&tx).await;
        }
        Ok(added)
    }
}
