use thiserror::Error;

/// Transaction/state-engine errors (§7 `InvalidTx`). Every variant maps to a
/// rejected transaction; none of these should ever panic on attacker input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxEngineError {
    #[error("missing sender")]
    MissingSender,
    #[error("invalid amount")]
    InvalidAmount,
    #[error("amount not canonical (max 8 decimals)")]
    AmountNotCanonical,
    #[error("invalid chainId")]
    InvalidChainId,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },
    #[error("unsupported asset")]
    UnsupportedAsset,
    #[error("insufficient native balance including fee")]
    InsufficientNativeBalanceForFee,
    #[error("insufficient asset balance")]
    InsufficientAssetBalance,
    #[error("missing recipient")]
    MissingRecipient,
    #[error("unauthorized bridge mint issuer")]
    UnauthorizedBridgeMintIssuer,
    #[error("asset ineligible for bridge mint")]
    AssetIneligibleForBridgeMint,
    #[error("only native asset can be system minted")]
    OnlyNativeCanBeSystemMinted,
    #[error("unauthorized burn")]
    UnauthorizedBurn,
    #[error("missing liquidity assets")]
    MissingLiquidityAssets,
    #[error("insufficient balance for liquidity asset")]
    InsufficientLiquidityBalance,
    #[error("reward must be a system transaction")]
    RewardMustBeSystem,
    #[error("reward missing recipient")]
    RewardMissingRecipient,
    #[error("mint must be a system transaction")]
    MintMustBeSystem,
    #[error("burn must be a system transaction")]
    BurnMustBeSystem,
    #[error("flare_reveal is non-economic and must carry no amount")]
    FlareRevealNotEconomic,
}
