//! Error types

use {
    solana_client::client_error::ClientError, solana_pubkey::Pubkey,
    solana_transaction_error::TransactionError, thiserror::Error,
};

/// Errors returned by the Tokadapt client SDK.
#[derive(Debug, Error)]
pub enum TokadaptError {
    /// The requested account does not exist on chain. Call sites that must
    /// tolerate absence use `try_data`/`try_reload` instead of hitting this.
    #[error("account {0} not found")]
    NotFound(Pubkey),

    /// An explicitly supplied admin key does not match the on-chain record.
    #[error("expected admin {expected}")]
    AdminMismatch {
        /// The admin authority recorded on chain.
        expected: Pubkey,
    },

    /// The proposer is not an owner of the smart wallet it would propose to.
    /// Raised at middleware construction, before any instruction is built.
    #[error("unknown proposer {proposer} for smart wallet {smart_wallet}")]
    UnauthorizedProposer {
        /// The rejected proposer key.
        proposer: Pubkey,
        /// The smart wallet whose owner set was consulted.
        smart_wallet: Pubkey,
    },

    /// The on-chain program rejected an instruction at simulate or confirm
    /// time. Carries the program's own error and log output verbatim.
    #[error("program error: {error}")]
    ChainProgramError {
        /// The transaction error reported by the chain.
        error: TransactionError,
        /// Program log output, when the RPC node returned any.
        logs: Vec<String>,
    },

    /// The account exists but its data does not decode as the expected type.
    #[error("invalid account data for {0}")]
    InvalidAccountData(Pubkey),

    /// A caller supplied an unusable combination of arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A signature was required from a key the envelope has no signer for.
    #[error("missing signer for transaction: {0}")]
    MissingSigner(String),

    /// Transport-level RPC failure. Propagated as-is; no retries.
    #[error(transparent)]
    Client(#[from] Box<ClientError>),
}

impl From<ClientError> for TokadaptError {
    fn from(err: ClientError) -> Self {
        // Submission failures that carry an on-chain error are surfaced as
        // program errors rather than generic transport errors.
        match err.get_transaction_error() {
            Some(error) => Self::ChainProgramError {
                error,
                logs: Vec::new(),
            },
            None => Self::Client(Box::new(err)),
        }
    }
}
