//! Middleware for authorities owned by the SPL Governance program.
//!
//! Governance proposals are assembled in external tooling, so instead of
//! creating anything on chain this strategy prints the gated instructions
//! base64-encoded for manual entry and removes them from the submitted
//! envelope.

use {
    crate::{
        envelope::TransactionEnvelope,
        error::TokadaptError,
        middleware::{encode_instruction_base64, find_gated_index, Middleware},
    },
    log::info,
    solana_pubkey::Pubkey,
};

const PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("GovER5Lthms3bLBqWub97yVrMmEogzX7xNjdXpPPCVZw");

/// Prints governance-gated instructions instead of executing them.
pub struct SplGovDataMiddleware {
    governance: Pubkey,
    community: bool,
}

impl SplGovDataMiddleware {
    /// The SPL Governance program this strategy recognizes.
    pub fn program_id() -> Pubkey {
        PROGRAM_ID
    }

    /// Binds the strategy to a governance authority account.
    pub fn new(governance: Pubkey, community: bool) -> Self {
        Self {
            governance,
            community,
        }
    }
}

impl Middleware for SplGovDataMiddleware {
    fn program_id(&self) -> Pubkey {
        PROGRAM_ID
    }

    fn signing_by(&self) -> Pubkey {
        self.governance
    }

    fn apply(
        &mut self,
        mut tx: TransactionEnvelope,
    ) -> Result<TransactionEnvelope, TokadaptError> {
        let Some(start) = find_gated_index(&tx, &self.governance) else {
            return Ok(tx);
        };
        let inner = tx.split_off(start);
        let track = if self.community { "community" } else { "council" };
        info!(
            "governance {} ({track} track): {} instruction(s) for a proposal",
            self.governance,
            inner.len()
        );
        for instruction in &inner {
            println!("{}", encode_instruction_base64(instruction));
        }
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        solana_client::nonblocking::rpc_client::RpcClient,
        solana_instruction::{AccountMeta, Instruction},
        solana_keypair::Keypair,
        std::sync::Arc,
    };

    #[test]
    fn gated_tail_is_removed_from_the_envelope() {
        let governance = Pubkey::new_unique();
        let mut middleware = SplGovDataMiddleware::new(governance, false);

        let rpc_client = Arc::new(RpcClient::new("http://127.0.0.1:8899".to_string()));
        let mut tx =
            TransactionEnvelope::new(rpc_client, Arc::new(Keypair::new()));
        let plain = Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![],
            data: vec![1],
        };
        tx.append(plain.clone());
        tx.append(Instruction {
            program_id: crate::id(),
            accounts: vec![AccountMeta::new_readonly(governance, true)],
            data: vec![2],
        });

        let out = middleware.apply(tx).unwrap();
        assert_eq!(out.instructions(), std::slice::from_ref(&plain));
    }
}
