use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpportunityError {
    #[error("malformed user staking id `{0}`: expected `<accountId>*<stakingId>`")]
    MalformedUserStakingId(String),

    #[error("malformed asset id `{0}`")]
    MalformedAssetId(String),

    #[error("invalid decimal amount `{0}`")]
    InvalidAmount(String),

    #[error("a position carries at most 2 reward amounts, got {0}")]
    TooManyRewards(usize),

    #[error("user staking `{user_staking_id}` has {actual} reward amounts but its opportunity declares {expected} reward assets")]
    RewardArityMismatch {
        user_staking_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
