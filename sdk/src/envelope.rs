//! Atomic, composable unit of instructions and signers prior to submission.

use {
    crate::error::TokadaptError,
    solana_client::{nonblocking::rpc_client::RpcClient, rpc_response::RpcSimulateTransactionResult},
    solana_hash::Hash,
    solana_instruction::Instruction,
    solana_message::Message,
    solana_pubkey::Pubkey,
    solana_signature::Signature,
    solana_signer::Signer,
    solana_transaction::Transaction,
    std::sync::Arc,
};

/// An ordered list of instructions plus the signers required to submit
/// them as one atomic transaction.
///
/// Order is significant: later instructions may depend on state written by
/// earlier ones within the same commit. An envelope with zero instructions
/// is a legal no-op; callers skip submission in that case.
pub struct TransactionEnvelope {
    rpc_client: Arc<RpcClient>,
    payer: Arc<dyn Signer>,
    instructions: Vec<Instruction>,
    signers: Vec<Arc<dyn Signer>>,
}

impl TransactionEnvelope {
    /// Creates an empty envelope paid for and fee-signed by `payer`.
    pub fn new(rpc_client: Arc<RpcClient>, payer: Arc<dyn Signer>) -> Self {
        Self {
            rpc_client,
            payer,
            instructions: Vec::new(),
            signers: Vec::new(),
        }
    }

    /// The RPC client transactions are submitted through.
    pub fn rpc_client(&self) -> &Arc<RpcClient> {
        &self.rpc_client
    }

    /// The fee payer.
    pub fn payer(&self) -> &Arc<dyn Signer> {
        &self.payer
    }

    /// The instruction sequence in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// The deduplicated non-payer signer set.
    pub fn signers(&self) -> &[Arc<dyn Signer>] {
        &self.signers
    }

    /// True when there is nothing to submit.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Adds an instruction to the tail.
    pub fn append(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Adds a required signer. Adding the same identity twice is a no-op:
    /// each key signs exactly once at submission.
    pub fn add_signer(&mut self, signer: Arc<dyn Signer>) {
        if self.payer.pubkey() != signer.pubkey()
            && !self.signers.iter().any(|s| s.pubkey() == signer.pubkey())
        {
            self.signers.push(signer);
        }
    }

    /// Adds several required signers, deduplicating each.
    pub fn add_signers(&mut self, signers: impl IntoIterator<Item = Arc<dyn Signer>>) {
        for signer in signers {
            self.add_signer(signer);
        }
    }

    /// Concatenates `other` onto `self`: instruction order of each side is
    /// preserved, signer sets are unioned.
    pub fn combine(mut self, other: TransactionEnvelope) -> Self {
        self.instructions.extend(other.instructions);
        self.add_signers(other.signers);
        self
    }

    /// Removes and returns the instructions from `at` to the end, leaving
    /// the signer set untouched.
    pub fn split_off(&mut self, at: usize) -> Vec<Instruction> {
        self.instructions.split_off(at)
    }

    fn to_transaction(&self, blockhash: Hash) -> Result<Transaction, TokadaptError> {
        let message = Message::new(&self.instructions, Some(&self.payer.pubkey()));
        let required = usize::from(message.header.num_required_signatures);
        let required_keys: Vec<Pubkey> = message.account_keys[..required].to_vec();

        let mut signing: Vec<&dyn Signer> = Vec::with_capacity(required);
        for key in &required_keys {
            if *key == self.payer.pubkey() {
                signing.push(self.payer.as_ref());
            } else if let Some(signer) = self.signers.iter().find(|s| s.pubkey() == *key) {
                signing.push(signer.as_ref());
            } else {
                return Err(TokadaptError::MissingSigner(key.to_string()));
            }
        }

        let mut transaction = Transaction::new_unsigned(message);
        transaction
            .try_sign(&signing, blockhash)
            .map_err(|e| TokadaptError::MissingSigner(e.to_string()))?;
        Ok(transaction)
    }

    /// Dry-runs the envelope without mutating chain state, returning the
    /// projected logs and error.
    pub async fn simulate(&self) -> Result<RpcSimulateTransactionResult, TokadaptError> {
        let blockhash = self.rpc_client.get_latest_blockhash().await?;
        let transaction = self.to_transaction(blockhash)?;
        let response = self.rpc_client.simulate_transaction(&transaction).await?;
        Ok(response.value)
    }

    /// Signs with every required signer, submits, and blocks until the
    /// chain reports finality or a definitive failure.
    pub async fn confirm(&self) -> Result<Signature, TokadaptError> {
        let blockhash = self.rpc_client.get_latest_blockhash().await?;
        let transaction = self.to_transaction(blockhash)?;
        let signature = self
            .rpc_client
            .send_and_confirm_transaction_with_spinner(&transaction)
            .await?;
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        solana_instruction::AccountMeta,
        solana_keypair::Keypair,
    };

    fn test_envelope() -> TransactionEnvelope {
        let rpc_client = Arc::new(RpcClient::new("http://127.0.0.1:8899".to_string()));
        TransactionEnvelope::new(rpc_client, Arc::new(Keypair::new()))
    }

    fn noop_instruction(program_id: Pubkey) -> Instruction {
        Instruction {
            program_id,
            accounts: vec![AccountMeta::new_readonly(Pubkey::new_unique(), false)],
            data: vec![1, 2, 3],
        }
    }

    #[test]
    fn combine_preserves_order_and_unions_signers() {
        let shared = Arc::new(Keypair::new());
        let only_b = Arc::new(Keypair::new());

        let mut a = test_envelope();
        let a_ix: Vec<Instruction> = (0..3).map(|_| noop_instruction(Pubkey::new_unique())).collect();
        for ix in &a_ix {
            a.append(ix.clone());
        }
        a.add_signer(shared.clone());

        let mut b = test_envelope();
        let b_ix: Vec<Instruction> = (0..2).map(|_| noop_instruction(Pubkey::new_unique())).collect();
        for ix in &b_ix {
            b.append(ix.clone());
        }
        b.add_signer(shared.clone());
        b.add_signer(only_b.clone());

        let combined = a.combine(b);
        let expected: Vec<Instruction> = a_ix.into_iter().chain(b_ix).collect();
        assert_eq!(combined.instructions(), expected.as_slice());

        let signer_keys: Vec<Pubkey> = combined.signers().iter().map(|s| s.pubkey()).collect();
        assert_eq!(signer_keys, vec![shared.pubkey(), only_b.pubkey()]);
    }

    #[test]
    fn add_signer_is_idempotent() {
        let mut tx = test_envelope();
        let signer = Arc::new(Keypair::new());
        tx.add_signer(signer.clone());
        tx.add_signer(signer.clone());
        tx.add_signers([signer.clone() as Arc<dyn Signer>]);
        assert_eq!(tx.signers().len(), 1);
    }

    #[test]
    fn payer_is_not_duplicated_into_signer_set() {
        let mut tx = test_envelope();
        let payer = tx.payer().clone();
        tx.add_signer(payer);
        assert!(tx.signers().is_empty());
    }

    #[test]
    fn split_off_keeps_prefix_and_signers() {
        let mut tx = test_envelope();
        let instructions: Vec<Instruction> =
            (0..4).map(|_| noop_instruction(Pubkey::new_unique())).collect();
        for ix in &instructions {
            tx.append(ix.clone());
        }
        tx.add_signer(Arc::new(Keypair::new()));

        let tail = tx.split_off(1);
        assert_eq!(tx.instructions(), &instructions[..1]);
        assert_eq!(tail, instructions[1..].to_vec());
        assert_eq!(tx.signers().len(), 1);
    }

    #[test]
    fn empty_envelope_is_a_noop() {
        let tx = test_envelope();
        assert!(tx.is_empty());
    }

    #[test]
    fn signing_fails_without_required_signer() {
        let mut tx = test_envelope();
        let missing = Pubkey::new_unique();
        tx.append(Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new_readonly(missing, true)],
            data: vec![],
        });
        let err = tx.to_transaction(Hash::default()).unwrap_err();
        assert!(matches!(err, TokadaptError::MissingSigner(_)));
    }

    #[test]
    fn signing_succeeds_with_all_signers_present() {
        let mut tx = test_envelope();
        let extra = Arc::new(Keypair::new());
        tx.append(Instruction {
            program_id: Pubkey::new_unique(),
            accounts: vec![AccountMeta::new_readonly(extra.pubkey(), true)],
            data: vec![],
        });
        tx.add_signer(extra);
        let transaction = tx.to_transaction(Hash::default()).unwrap();
        assert_eq!(transaction.signatures.len(), 2);
    }
}
