//! Authority-delegation middleware.
//!
//! A privileged Tokadapt instruction names the deployment's admin
//! authority as a signer. When that authority is a plain key the operator
//! holds, the transaction is submitted directly. When it is a multisig
//! wallet account, the gated part of the transaction must instead be
//! recorded as a proposal for the multisig's owners to approve. This
//! module classifies the authority once, up front, and yields the matching
//! strategy.

pub mod goki;
mod spl_gov;

pub use spl_gov::SplGovDataMiddleware;

use {
    crate::{envelope::TransactionEnvelope, error::TokadaptError},
    base64::Engine,
    log::{info, warn},
    solana_client::nonblocking::rpc_client::RpcClient,
    solana_instruction::Instruction,
    solana_pubkey::Pubkey,
    solana_signer::Signer,
    std::sync::Arc,
};

/// A strategy that rewrites a transaction envelope so an instruction gated
/// on a delegated authority becomes submittable.
///
/// Constructed fresh per command invocation from currently fetched account
/// ownership data; never persisted.
pub trait Middleware {
    /// The program owning the authority account this strategy serves.
    fn program_id(&self) -> Pubkey;

    /// The authority account whose signature the strategy provides for.
    fn signing_by(&self) -> Pubkey;

    /// Rewrites the envelope. When no instruction requires the bound
    /// authority's signature this is a no-op.
    fn apply(&mut self, tx: TransactionEnvelope)
        -> Result<TransactionEnvelope, TokadaptError>;
}

/// Result of classifying an authority account: either it signs directly or
/// exactly one middleware strategy stands in for it.
pub enum MiddlewareStack {
    /// Plain key (or unrecognized program); the caller signs directly.
    None,
    /// A single strategy rewrites the envelope.
    Single(Box<dyn Middleware>),
}

impl MiddlewareStack {
    /// Applies the stack to an envelope.
    pub fn apply(
        &mut self,
        tx: TransactionEnvelope,
    ) -> Result<TransactionEnvelope, TokadaptError> {
        match self {
            MiddlewareStack::None => Ok(tx),
            MiddlewareStack::Single(middleware) => middleware.apply(tx),
        }
    }
}

/// Options shared by every middleware strategy.
#[derive(Default)]
pub struct MiddlewareOptions {
    /// Creates multisig proposals; defaults to the operator's wallet.
    pub proposer: Option<Arc<dyn Signer>>,
    /// Pays rent for proposal accounts; defaults to the operator's wallet.
    pub rent_payer: Option<Arc<dyn Signer>>,
    /// Print the gated instructions instead of creating a proposal.
    pub log_only: bool,
    /// Address the community proposal track rather than the council one.
    pub community: bool,
}

/// Classifies `address` (nominally an authority) and instantiates the
/// matching middleware strategy.
///
/// A missing account is a plain externally-owned key: no middleware, the
/// authority signs directly. An account owned by a registered multisig
/// program yields that program's strategy. An account owned by any other
/// program is treated as directly signable too, which may be wrong for
/// exotic setups, so the fallback is logged loudly rather than silent.
pub async fn install_multisig_middleware(
    rpc_client: Arc<RpcClient>,
    payer: Arc<dyn Signer>,
    address: Pubkey,
    options: MiddlewareOptions,
) -> Result<MiddlewareStack, TokadaptError> {
    let account = rpc_client
        .get_account_with_commitment(&address, rpc_client.commitment())
        .await?
        .value;

    let Some(account) = account else {
        info!("authority {address} is a plain key; signing directly");
        return Ok(MiddlewareStack::None);
    };

    if account.owner == goki::id() {
        let proposer = options.proposer.unwrap_or_else(|| payer.clone());
        let rent_payer = options.rent_payer.unwrap_or_else(|| payer.clone());
        let middleware = goki::GokiMiddleware::load(
            rpc_client,
            address,
            proposer,
            rent_payer,
            options.log_only,
        )
        .await?;
        return Ok(MiddlewareStack::Single(Box::new(middleware)));
    }

    if account.owner == SplGovDataMiddleware::program_id() {
        return Ok(MiddlewareStack::Single(Box::new(
            SplGovDataMiddleware::new(address, options.community),
        )));
    }

    warn!(
        "authority {address} is owned by unrecognized program {}; \
         assuming a direct signature is sufficient",
        account.owner
    );
    Ok(MiddlewareStack::None)
}

/// Index of the first instruction that names `signing_by` as a required
/// signer, if any.
pub(crate) fn find_gated_index(tx: &TransactionEnvelope, signing_by: &Pubkey) -> Option<usize> {
    tx.instructions().iter().position(|ix| {
        ix.accounts
            .iter()
            .any(|meta| meta.pubkey == *signing_by && meta.is_signer)
    })
}

/// Base64 rendering of an instruction, for pasting into governance
/// tooling.
pub(crate) fn encode_instruction_base64(instruction: &Instruction) -> String {
    let data = borsh::to_vec(&goki::TxInstruction::from(instruction))
        .expect("instruction serialization is infallible");
    base64::engine::general_purpose::STANDARD.encode(data)
}
