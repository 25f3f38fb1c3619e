//! Client for the Goki smart-wallet program, and the middleware that
//! routes admin-gated instructions through it.
//!
//! The smart wallet is treated as an opaque service: this module only
//! decodes its wallet account and builds `create_transaction` proposals.
//! Approval and execution happen out of band, by the wallet's owners.

use {
    crate::{
        anchor::{account_discriminator, sighash},
        envelope::TransactionEnvelope,
        error::TokadaptError,
        middleware::{encode_instruction_base64, find_gated_index, Middleware},
    },
    borsh::{BorshDeserialize, BorshSerialize},
    log::info,
    solana_client::nonblocking::rpc_client::RpcClient,
    solana_instruction::{AccountMeta, Instruction},
    solana_pubkey::Pubkey,
    solana_signer::Signer,
    std::sync::Arc,
};

solana_pubkey::declare_id!("GokivDYuQXPZCWRkwMhdH2h91KpDQXBEmpgBgs55bnpH");

const TRANSACTION_SEED: &[u8] = b"GokiTransaction";

/// Goki smart-wallet account: an M-of-N owner set plus a running count of
/// proposed transactions.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug)]
pub struct SmartWallet {
    /// Base key the wallet address is derived from.
    pub base: Pubkey,
    /// Bump seed of the wallet PDA.
    pub bump: u8,
    /// Number of owner approvals required to execute a proposal.
    pub threshold: u64,
    /// Minimum delay between proposal and execution, seconds.
    pub minimum_delay: i64,
    /// Grace period after the ETA during which execution is allowed.
    pub grace_period: i64,
    /// Incremented whenever the owner set changes, invalidating stale
    /// proposals.
    pub owner_set_seqno: u32,
    /// Total number of transactions ever proposed; the next proposal index.
    pub num_transactions: u64,
    /// The owner keys allowed to propose and approve.
    pub owners: Vec<Pubkey>,
}

impl SmartWallet {
    /// Decode a smart-wallet record from raw account data.
    pub fn unpack(address: &Pubkey, data: &[u8]) -> Result<Self, TokadaptError> {
        if data.len() < 8 || data[..8] != account_discriminator("SmartWallet") {
            return Err(TokadaptError::InvalidAccountData(*address));
        }
        // Trailing reserved bytes are ignored.
        Self::deserialize(&mut &data[8..])
            .map_err(|_| TokadaptError::InvalidAccountData(*address))
    }
}

/// One account reference inside a proposed instruction.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxAccountMeta {
    /// The referenced account.
    pub pubkey: Pubkey,
    /// Whether the account must sign when the proposal executes.
    pub is_signer: bool,
    /// Whether the account may be written when the proposal executes.
    pub is_writable: bool,
}

/// One proposed instruction, as recorded inside a smart-wallet
/// transaction account.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxInstruction {
    /// Target program.
    pub program_id: Pubkey,
    /// Accounts passed to the program.
    pub keys: Vec<TxAccountMeta>,
    /// Opaque instruction payload.
    pub data: Vec<u8>,
}

impl From<&Instruction> for TxInstruction {
    fn from(instruction: &Instruction) -> Self {
        Self {
            program_id: instruction.program_id,
            keys: instruction
                .accounts
                .iter()
                .map(|meta| TxAccountMeta {
                    pubkey: meta.pubkey,
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
                .collect(),
            data: instruction.data.clone(),
        }
    }
}

impl From<&TxInstruction> for Instruction {
    fn from(instruction: &TxInstruction) -> Self {
        Self {
            program_id: instruction.program_id,
            accounts: instruction
                .keys
                .iter()
                .map(|meta| AccountMeta {
                    pubkey: meta.pubkey,
                    is_signer: meta.is_signer,
                    is_writable: meta.is_writable,
                })
                .collect(),
            data: instruction.data.clone(),
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize)]
pub(crate) struct CreateTransactionArgs {
    pub(crate) bump: u8,
    pub(crate) instructions: Vec<TxInstruction>,
}

/// Derive the transaction (proposal) PDA of a smart wallet at `index`.
pub fn get_transaction_address_with_bump(smart_wallet: &Pubkey, index: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[
            TRANSACTION_SEED,
            smart_wallet.as_ref(),
            &index.to_le_bytes(),
        ],
        &id(),
    )
}

/// Creates a `create_transaction` instruction recording `instructions` as
/// a pending proposal at `index`.
pub fn create_transaction(
    smart_wallet: &Pubkey,
    index: u64,
    proposer: &Pubkey,
    payer: &Pubkey,
    instructions: &[Instruction],
) -> (Instruction, Pubkey) {
    let (transaction, bump) = get_transaction_address_with_bump(smart_wallet, index);
    let mut data = sighash("global", "create_transaction").to_vec();
    let args = CreateTransactionArgs {
        bump,
        instructions: instructions.iter().map(TxInstruction::from).collect(),
    };
    args.serialize(&mut data)
        .expect("instruction serialization is infallible");
    let instruction = Instruction {
        program_id: id(),
        accounts: vec![
            AccountMeta::new(*smart_wallet, false),
            AccountMeta::new(transaction, false),
            AccountMeta::new_readonly(*proposer, true),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(solana_system_interface::program::id(), false),
        ],
        data,
    };
    (instruction, transaction)
}

/// Middleware that wraps admin-gated instructions into a Goki proposal.
///
/// Bound to one smart-wallet account acting as authority. The proposer
/// must be one of the wallet's owners; that is verified at construction so
/// an unexecutable proposal is never created.
pub struct GokiMiddleware {
    smart_wallet: Pubkey,
    data: SmartWallet,
    proposer: Arc<dyn Signer>,
    rent_payer: Arc<dyn Signer>,
    next_index: u64,
    log_only: bool,
}

impl GokiMiddleware {
    /// Binds the middleware to already-fetched smart-wallet data.
    ///
    /// Fails with [`TokadaptError::UnauthorizedProposer`] when the
    /// proposer is not in the wallet's owner set, before any instruction
    /// is built.
    pub fn new(
        smart_wallet: Pubkey,
        data: SmartWallet,
        proposer: Arc<dyn Signer>,
        rent_payer: Arc<dyn Signer>,
        log_only: bool,
    ) -> Result<Self, TokadaptError> {
        if !data.owners.contains(&proposer.pubkey()) {
            return Err(TokadaptError::UnauthorizedProposer {
                proposer: proposer.pubkey(),
                smart_wallet,
            });
        }
        info!("using GOKI smart wallet {smart_wallet}");
        let next_index = data.num_transactions;
        Ok(Self {
            smart_wallet,
            data,
            proposer,
            rent_payer,
            next_index,
            log_only,
        })
    }

    /// Fetches and decodes the smart-wallet account, then binds.
    pub async fn load(
        rpc_client: Arc<RpcClient>,
        smart_wallet: Pubkey,
        proposer: Arc<dyn Signer>,
        rent_payer: Arc<dyn Signer>,
        log_only: bool,
    ) -> Result<Self, TokadaptError> {
        let account = rpc_client
            .get_account_with_commitment(&smart_wallet, rpc_client.commitment())
            .await?
            .value
            .ok_or(TokadaptError::NotFound(smart_wallet))?;
        let data = SmartWallet::unpack(&smart_wallet, &account.data);
        Self::new(smart_wallet, data?, proposer, rent_payer, log_only)
    }

    /// The decoded wallet configuration this middleware was bound to.
    pub fn data(&self) -> &SmartWallet {
        &self.data
    }
}

impl Middleware for GokiMiddleware {
    fn program_id(&self) -> Pubkey {
        id()
    }

    fn signing_by(&self) -> Pubkey {
        self.smart_wallet
    }

    fn apply(
        &mut self,
        mut tx: TransactionEnvelope,
    ) -> Result<TransactionEnvelope, TokadaptError> {
        let Some(start) = find_gated_index(&tx, &self.smart_wallet) else {
            return Ok(tx);
        };
        // Everything from the first gated instruction onward goes into the
        // proposal: later instructions may depend on its effects, so the
        // cut is tail-inclusive.
        let inner = tx.split_off(start);

        if self.log_only {
            for instruction in &inner {
                println!("{}", encode_instruction_base64(instruction));
            }
            return Ok(tx);
        }

        let index = self.next_index;
        let (instruction, transaction_key) = create_transaction(
            &self.smart_wallet,
            index,
            &self.proposer.pubkey(),
            &self.rent_payer.pubkey(),
            &inner,
        );
        self.next_index = index.saturating_add(1);
        info!("creating GOKI tx #{index}: {transaction_key}");

        tx.append(instruction);
        tx.add_signers([self.proposer.clone(), self.rent_payer.clone()]);
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        solana_client::nonblocking::rpc_client::RpcClient,
        solana_keypair::Keypair,
    };

    fn smart_wallet_with_owners(owners: Vec<Pubkey>) -> SmartWallet {
        SmartWallet {
            base: Pubkey::new_unique(),
            bump: 255,
            threshold: 2,
            minimum_delay: 0,
            grace_period: 0,
            owner_set_seqno: 0,
            num_transactions: 7,
            owners,
        }
    }

    fn test_envelope() -> TransactionEnvelope {
        let rpc_client = Arc::new(RpcClient::new("http://127.0.0.1:8899".to_string()));
        TransactionEnvelope::new(rpc_client, Arc::new(Keypair::new()))
    }

    fn instruction_signed_by(authority: &Pubkey) -> Instruction {
        Instruction {
            program_id: crate::id(),
            accounts: vec![
                AccountMeta::new(Pubkey::new_unique(), false),
                AccountMeta::new_readonly(*authority, true),
            ],
            data: vec![9; 12],
        }
    }

    fn unrelated_instruction() -> Instruction {
        Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new(Pubkey::new_unique(), false)],
            data: vec![1],
        }
    }

    fn middleware(owners_include_proposer: bool) -> (GokiMiddleware, Pubkey) {
        let smart_wallet = Pubkey::new_unique();
        let proposer = Arc::new(Keypair::new());
        let mut owners = vec![Pubkey::new_unique(), Pubkey::new_unique()];
        if owners_include_proposer {
            owners.push(proposer.pubkey());
        }
        let result = GokiMiddleware::new(
            smart_wallet,
            smart_wallet_with_owners(owners),
            proposer,
            Arc::new(Keypair::new()),
            false,
        );
        (result.unwrap(), smart_wallet)
    }

    #[test]
    fn rejects_unknown_proposer() {
        let smart_wallet = Pubkey::new_unique();
        let proposer = Arc::new(Keypair::new());
        let err = GokiMiddleware::new(
            smart_wallet,
            smart_wallet_with_owners(vec![Pubkey::new_unique()]),
            proposer.clone(),
            Arc::new(Keypair::new()),
            false,
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            TokadaptError::UnauthorizedProposer { proposer: p, smart_wallet: w }
                if p == proposer.pubkey() && w == smart_wallet
        ));
    }

    #[test]
    fn apply_is_noop_without_gated_instruction() {
        let (mut middleware, _) = middleware(true);
        let mut tx = test_envelope();
        let instructions = vec![unrelated_instruction(), unrelated_instruction()];
        for ix in &instructions {
            tx.append(ix.clone());
        }
        let out = middleware.apply(tx).unwrap();
        assert_eq!(out.instructions(), instructions.as_slice());
        assert!(out.signers().is_empty());
    }

    #[test]
    fn apply_is_noop_when_authority_is_not_a_signer() {
        let (mut middleware, smart_wallet) = middleware(true);
        let mut tx = test_envelope();
        // Names the wallet, but not as a signer.
        tx.append(Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new_readonly(smart_wallet, false)],
            data: vec![],
        });
        let out = middleware.apply(tx).unwrap();
        assert_eq!(out.instructions().len(), 1);
        assert_ne!(out.instructions()[0].program_id, id());
    }

    #[test]
    fn apply_wraps_tail_into_one_proposal() {
        let (mut middleware, smart_wallet) = middleware(true);
        let proposer_key = middleware.proposer.pubkey();
        let expected_index = middleware.data().num_transactions;

        let prefix_ix = unrelated_instruction();
        let gated_ix = instruction_signed_by(&smart_wallet);
        let trailing_ix = unrelated_instruction();

        let mut tx = test_envelope();
        tx.append(prefix_ix.clone());
        tx.append(gated_ix.clone());
        tx.append(trailing_ix.clone());

        let out = middleware.apply(tx).unwrap();

        // Untouched prefix, then a single proposal-creation instruction.
        assert_eq!(out.instructions().len(), 2);
        assert_eq!(out.instructions()[0], prefix_ix);
        let proposal_ix = &out.instructions()[1];
        assert_eq!(proposal_ix.program_id, id());

        let (expected_transaction, _) =
            get_transaction_address_with_bump(&smart_wallet, expected_index);
        assert_eq!(proposal_ix.accounts[0].pubkey, smart_wallet);
        assert_eq!(proposal_ix.accounts[1].pubkey, expected_transaction);
        assert_eq!(proposal_ix.accounts[2].pubkey, proposer_key);
        assert!(proposal_ix.accounts[2].is_signer);
        assert!(proposal_ix.accounts[3].is_signer);

        // The recorded payload reconstructs the removed tail exactly.
        let args = CreateTransactionArgs::try_from_slice(&proposal_ix.data[8..]).unwrap();
        let recorded: Vec<Instruction> =
            args.instructions.iter().map(Instruction::from).collect();
        assert_eq!(recorded, vec![gated_ix, trailing_ix]);

        // Proposer and rent payer sign the outer transaction.
        let signer_keys: Vec<Pubkey> = out.signers().iter().map(|s| s.pubkey()).collect();
        assert!(signer_keys.contains(&proposer_key));
        assert_eq!(signer_keys.len(), 2);
    }

    #[test]
    fn chained_applications_use_monotonic_indexes() {
        let (mut middleware, smart_wallet) = middleware(true);
        let first_index = middleware.data().num_transactions;

        for expected_index in [first_index, first_index + 1] {
            let mut tx = test_envelope();
            tx.append(instruction_signed_by(&smart_wallet));
            let out = middleware.apply(tx).unwrap();
            let (expected_transaction, _) =
                get_transaction_address_with_bump(&smart_wallet, expected_index);
            assert_eq!(out.instructions()[0].accounts[1].pubkey, expected_transaction);
        }
    }

    #[test]
    fn log_only_drops_the_tail() {
        let smart_wallet = Pubkey::new_unique();
        let proposer = Arc::new(Keypair::new());
        let mut middleware = GokiMiddleware::new(
            smart_wallet,
            smart_wallet_with_owners(vec![proposer.pubkey()]),
            proposer,
            Arc::new(Keypair::new()),
            true,
        )
        .unwrap();

        let prefix_ix = unrelated_instruction();
        let mut tx = test_envelope();
        tx.append(prefix_ix.clone());
        tx.append(instruction_signed_by(&smart_wallet));
        let out = middleware.apply(tx).unwrap();
        assert_eq!(out.instructions(), std::slice::from_ref(&prefix_ix));
    }

    #[test]
    fn smart_wallet_unpack_checks_discriminator() {
        let wallet = smart_wallet_with_owners(vec![Pubkey::new_unique()]);
        let mut data = account_discriminator("SmartWallet").to_vec();
        wallet.serialize(&mut data).unwrap();
        // Reserved tail, present on chain.
        data.extend_from_slice(&[0u8; 128]);

        let address = Pubkey::new_unique();
        let unpacked = SmartWallet::unpack(&address, &data).unwrap();
        assert_eq!(unpacked.owners, wallet.owners);
        assert_eq!(unpacked.num_transactions, wallet.num_transactions);

        data[3] ^= 0x55;
        assert!(SmartWallet::unpack(&address, &data).is_err());
    }
}
