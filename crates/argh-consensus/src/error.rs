use thiserror::Error;

/// Block-level rejection reasons (§4.5, §7 `InvalidBlock`). Distinct from
/// `argh_state::TxEngineError`, which covers individual transactions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockValidationError {
    #[error("genesis block missing protocol parameters")]
    GenesisMissingProtocol,
    #[error("no protocol parameters found in the chain prefix")]
    MissingProtocolState,
    #[error("genesis prev_hash is not 64 zero characters")]
    GenesisBadPrevHash,
    #[error("genesis slot must be 0")]
    GenesisBadSlot,
    #[error("genesis block must carry no signature")]
    GenesisHasSignature,
    #[error("genesis producer_id must be the zero address")]
    GenesisBadProducer,

    #[error("block.index is not prev.index + 1")]
    BadIndex,
    #[error("block.prev_hash does not match predecessor's hash")]
    BadPrevHash,
    #[error("block.slot does not strictly follow the predecessor's slot")]
    BadSlot,
    #[error("recomputed block hash does not match the stored hash")]
    BadHash,
    #[error("producer_id does not match select_leader for this slot")]
    UnauthorizedProducer,
    #[error("block signature missing")]
    MissingSignature,
    #[error("block signature does not verify against the producer's pubkey")]
    InvalidSignature,
    #[error("producer pubkey not found in the validator set")]
    UnknownProducer,

    #[error("more than one flare_reveal transaction in block")]
    MultipleFlareReveals,
    #[error("flare_reveal sender is not the predecessor's producer")]
    RevealSenderMismatch,
    #[error("flare_reveal payload hash does not match the predecessor's commit")]
    RevealCommitMismatch,
    #[error("flare_reveal payload slot does not match the predecessor's slot")]
    RevealSlotMismatch,
    #[error("oracle signature does not verify against threshold pubkeys")]
    InvalidOracleSignature,

    #[error("block carries a system mint/burn tx but no flare_reveal justifies one")]
    UnexpectedSystemTx,
    #[error("block is missing the system mint/burn tx its flare_reveal implies")]
    MissingSystemTx,
    #[error("more than one system mint/burn tx in block")]
    MultipleSystemTxs,
    #[error("system tx action does not match the treasury engine's expected action")]
    WrongSystemAction,
    #[error("system tx amount does not match the treasury engine's expected delta")]
    WrongSystemAmount,

    #[error("transaction {index} rejected: {source}")]
    TxRejected {
        index: usize,
        #[source]
        source: argh_state::TxEngineError,
    },
    #[error("applying transaction {index} failed: {source}")]
    ApplyFailed {
        index: usize,
        #[source]
        source: argh_core::CoreError,
    },

    #[error("equivocation: producer {producer} already signed a different block for slot {slot}")]
    Equivocation { producer: String, slot: u64 },
}
