//! Lazy-loading accessor over one Tokadapt state account, plus the
//! envelope builders for every operation against it.

use {
    crate::{
        envelope::TransactionEnvelope,
        error::TokadaptError,
        get_output_storage_authority_with_bump, instruction,
        state::State,
    },
    solana_client::nonblocking::rpc_client::RpcClient,
    solana_program_pack::Pack,
    solana_pubkey::Pubkey,
    solana_signer::Signer,
    spl_associated_token_account_client::{
        address::get_associated_token_address_with_program_id,
        instruction::create_associated_token_account,
    },
    std::sync::Arc,
};

/// Either a bare account reference or a signer the caller holds the key
/// for. Mirrors the places where an account may be supplied ready-made or
/// created on the fly.
#[derive(Clone)]
pub enum PubkeyOrSigner {
    /// An existing account; no signature available.
    Pubkey(Pubkey),
    /// A keypair that will sign for the account's creation.
    Signer(Arc<dyn Signer + Send + Sync>),
}

impl std::fmt::Debug for PubkeyOrSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PubkeyOrSigner::Pubkey(pubkey) => f.debug_tuple("Pubkey").field(pubkey).finish(),
            PubkeyOrSigner::Signer(signer) => {
                f.debug_tuple("Signer").field(&signer.pubkey()).finish()
            }
        }
    }
}

impl PubkeyOrSigner {
    /// The referenced address in either form.
    pub fn pubkey(&self) -> Pubkey {
        match self {
            PubkeyOrSigner::Pubkey(pubkey) => *pubkey,
            PubkeyOrSigner::Signer(signer) => signer.pubkey(),
        }
    }
}

/// Parameters for [`TokadaptStateWrapper::create`].
pub struct CreateParams {
    /// Keypair of the state account to create.
    pub state: Arc<dyn Signer>,
    /// Admin authority; defaults to the wrapper's payer.
    pub admin: Option<Pubkey>,
    /// Mint of the token burned on swap.
    pub input_mint: Pubkey,
    /// Output storage: an existing token account, or a keypair to create
    /// one under. When omitted, the storage-authority ATA on
    /// `output_mint` is created.
    pub output_storage: Option<PubkeyOrSigner>,
    /// Mint of the output token; required unless `output_storage` is an
    /// existing account.
    pub output_mint: Option<Pubkey>,
    /// Pays rent for created accounts; defaults to the payer.
    pub rent_payer: Option<Arc<dyn Signer>>,
}

/// Parameters for [`TokadaptStateWrapper::swap`].
#[derive(Default)]
pub struct SwapParams {
    /// Amount to swap in raw token units; `None` swaps the entire
    /// available balance.
    pub amount: Option<u64>,
    /// Owner or delegate of the input account; defaults to the payer.
    pub input_signer: Option<Arc<dyn Signer>>,
    /// Input token account; defaults to the input authority's ATA.
    pub input: Option<Pubkey>,
    /// Owner of the output token account; defaults to the payer.
    pub output_authority: Option<Pubkey>,
    /// Output token account; defaults to the output authority's ATA,
    /// created when missing.
    pub output: Option<Pubkey>,
    /// Pays rent for a created output ATA; defaults to the payer.
    pub rent_payer: Option<Arc<dyn Signer>>,
}

/// Parameters for [`TokadaptStateWrapper::close`].
#[derive(Default)]
pub struct CloseParams {
    /// Admin authority expected to sign; defaults to the on-chain record.
    pub admin: Option<Pubkey>,
    /// Receives the reclaimed rent lamports; defaults to the payer.
    pub rent_collector: Option<Pubkey>,
    /// Receives the drained storage balance; defaults to the rent
    /// collector's ATA on the output mint.
    pub token_collector: Option<Pubkey>,
    /// Force or suppress token-collector creation; probed when `None`.
    pub create_token_collector: Option<bool>,
    /// Pays rent for a created token collector; defaults to the payer.
    pub rent_payer: Option<Arc<dyn Signer>>,
}

/// Wraps a single on-chain state account with lazily cached data and
/// derived addresses.
///
/// Caches are private to this instance: two wrappers of the same address
/// do not share state, and callers reload explicitly after operations
/// known to mutate the account.
pub struct TokadaptStateWrapper {
    rpc_client: Arc<RpcClient>,
    payer: Arc<dyn Signer>,
    address: Pubkey,
    data: Option<State>,
    output_mint: Option<Pubkey>,
    output_storage_authority: Option<(Pubkey, u8)>,
}

impl TokadaptStateWrapper {
    /// Binds a wrapper to an existing (or about to exist) state address.
    pub fn new(rpc_client: Arc<RpcClient>, payer: Arc<dyn Signer>, address: Pubkey) -> Self {
        Self {
            rpc_client,
            payer,
            address,
            data: None,
            output_mint: None,
            output_storage_authority: None,
        }
    }

    /// The wrapped state address.
    pub fn address(&self) -> Pubkey {
        self.address
    }

    async fn fetch(&self) -> Result<Option<State>, TokadaptError> {
        let account = self
            .rpc_client
            .get_account_with_commitment(&self.address, self.rpc_client.commitment())
            .await?
            .value;
        account
            .map(|account| State::unpack(&self.address, &account.data))
            .transpose()
    }

    /// Force-refetches the state, failing with [`TokadaptError::NotFound`]
    /// if the account has been closed.
    pub async fn reload(&mut self) -> Result<&State, TokadaptError> {
        match self.fetch().await? {
            Some(state) => {
                self.data = Some(state);
                Ok(self.data.as_ref().expect("just set"))
            }
            None => {
                self.data = None;
                Err(TokadaptError::NotFound(self.address))
            }
        }
    }

    /// Force-refetches the state, returning `None` instead of failing when
    /// the account does not exist.
    pub async fn try_reload(&mut self) -> Result<Option<&State>, TokadaptError> {
        self.data = self.fetch().await?;
        Ok(self.data.as_ref())
    }

    /// Returns the cached state, fetching on first call.
    pub async fn data(&mut self) -> Result<&State, TokadaptError> {
        if self.data.is_none() {
            self.reload().await?;
        }
        Ok(self.data.as_ref().expect("cached"))
    }

    /// Like [`Self::data`] but tolerates a missing account.
    pub async fn try_data(&mut self) -> Result<Option<&State>, TokadaptError> {
        if self.data.is_none() {
            return self.try_reload().await;
        }
        Ok(self.data.as_ref())
    }

    /// Seeds the cache, for callers that already hold fresh data.
    pub fn set_data(&mut self, data: State) {
        self.data = Some(data);
    }

    /// Mint of the output token, read from the storage token account and
    /// cached.
    pub async fn output_mint(&mut self) -> Result<Pubkey, TokadaptError> {
        if let Some(mint) = self.output_mint {
            return Ok(mint);
        }
        let output_storage = self.data().await?.output_storage;
        let account = self
            .rpc_client
            .get_account_with_commitment(&output_storage, self.rpc_client.commitment())
            .await?
            .value
            .ok_or(TokadaptError::NotFound(output_storage))?;
        let token_account = spl_token::state::Account::unpack(&account.data)
            .map_err(|_| TokadaptError::InvalidAccountData(output_storage))?;
        self.output_mint = Some(token_account.mint);
        Ok(token_account.mint)
    }

    /// Seeds the output-mint cache.
    pub fn set_output_mint(&mut self, output_mint: Pubkey) {
        self.output_mint = Some(output_mint);
    }

    /// Storage-authority PDA with bump, derived once and cached: the
    /// derivation is deterministic and expensive.
    pub fn output_storage_authority_with_bump(&mut self) -> (Pubkey, u8) {
        *self
            .output_storage_authority
            .get_or_insert_with(|| get_output_storage_authority_with_bump(&self.address))
    }

    /// Storage-authority PDA for this state account.
    pub fn output_storage_authority(&mut self) -> Pubkey {
        self.output_storage_authority_with_bump().0
    }

    fn empty_envelope(&self) -> TransactionEnvelope {
        TransactionEnvelope::new(self.rpc_client.clone(), self.payer.clone())
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, TokadaptError> {
        Ok(self
            .rpc_client
            .get_account_with_commitment(address, self.rpc_client.commitment())
            .await?
            .value
            .is_some())
    }

    /// Builds the fund-then-initialize envelope for a new deployment and
    /// returns the wrapper bound to it.
    pub async fn create(
        rpc_client: Arc<RpcClient>,
        payer: Arc<dyn Signer>,
        params: CreateParams,
    ) -> Result<(Self, TransactionEnvelope), TokadaptError> {
        let mut wrapper = Self::new(rpc_client, payer, params.state.pubkey());

        let rent_payer_key = params
            .rent_payer
            .as_ref()
            .map(|s| s.pubkey())
            .unwrap_or_else(|| wrapper.payer.pubkey());
        let lamports = wrapper
            .rpc_client
            .get_minimum_balance_for_rent_exemption(State::SPACE)
            .await?;

        let mut tx = wrapper.empty_envelope();
        tx.append(solana_system_interface::instruction::create_account(
            &rent_payer_key,
            &wrapper.address,
            lamports,
            State::SPACE as u64,
            &crate::id(),
        ));
        tx.add_signer(params.state.clone());
        if let Some(rent_payer) = &params.rent_payer {
            tx.add_signer(rent_payer.clone());
        }

        let init = wrapper
            .init(
                params.admin,
                params.input_mint,
                params.output_storage,
                params.output_mint,
                params.rent_payer,
            )
            .await?;
        Ok((wrapper, tx.combine(init)))
    }

    /// Builds the initialize envelope, creating the output storage account
    /// first when the caller did not supply an existing one.
    pub async fn init(
        &mut self,
        admin: Option<Pubkey>,
        input_mint: Pubkey,
        output_storage: Option<PubkeyOrSigner>,
        output_mint: Option<Pubkey>,
        rent_payer: Option<Arc<dyn Signer>>,
    ) -> Result<TransactionEnvelope, TokadaptError> {
        let admin = admin.unwrap_or_else(|| self.payer.pubkey());
        let rent_payer_key = rent_payer
            .as_ref()
            .map(|s| s.pubkey())
            .unwrap_or_else(|| self.payer.pubkey());
        let output_storage_authority = self.output_storage_authority();

        let mut tx = self.empty_envelope();
        let output_storage = match output_storage {
            None => {
                let output_mint = output_mint.ok_or_else(|| {
                    TokadaptError::InvalidArguments(
                        "one of output-storage or output-mint must be set".to_string(),
                    )
                })?;
                let storage = get_associated_token_address_with_program_id(
                    &output_storage_authority,
                    &output_mint,
                    &spl_token::id(),
                );
                tx.append(create_associated_token_account(
                    &rent_payer_key,
                    &output_storage_authority,
                    &output_mint,
                    &spl_token::id(),
                ));
                if let Some(rent_payer) = &rent_payer {
                    tx.add_signer(rent_payer.clone());
                }
                storage
            }
            Some(PubkeyOrSigner::Signer(storage)) => {
                let output_mint = output_mint.ok_or_else(|| {
                    TokadaptError::InvalidArguments(
                        "for creating output-storage, output-mint must be set".to_string(),
                    )
                })?;
                let lamports = self
                    .rpc_client
                    .get_minimum_balance_for_rent_exemption(spl_token::state::Account::LEN)
                    .await?;
                tx.append(solana_system_interface::instruction::create_account(
                    &rent_payer_key,
                    &storage.pubkey(),
                    lamports,
                    spl_token::state::Account::LEN as u64,
                    &spl_token::id(),
                ));
                tx.add_signer(storage.clone());
                if let Some(rent_payer) = &rent_payer {
                    tx.add_signer(rent_payer.clone());
                }
                tx.append(
                    spl_token::instruction::initialize_account(
                        &spl_token::id(),
                        &storage.pubkey(),
                        &output_mint,
                        &output_storage_authority,
                    )
                    .map_err(|e| TokadaptError::InvalidArguments(e.to_string()))?,
                );
                storage.pubkey()
            }
            Some(PubkeyOrSigner::Pubkey(storage)) => storage,
        };

        tx.append(instruction::initialize(
            &self.address,
            &output_storage,
            &admin,
            &input_mint,
        ));
        Ok(tx)
    }

    /// Builds the swap envelope, creating the output ATA on demand.
    pub async fn swap(
        &mut self,
        params: SwapParams,
    ) -> Result<TransactionEnvelope, TokadaptError> {
        let amount = params.amount.unwrap_or(u64::MAX);
        let input_authority = params
            .input_signer
            .as_ref()
            .map(|s| s.pubkey())
            .unwrap_or_else(|| self.payer.pubkey());
        let output_mint = self.output_mint().await?;
        let input_mint = self.data().await?.input_mint;
        let input = params.input.unwrap_or_else(|| {
            get_associated_token_address_with_program_id(
                &input_authority,
                &input_mint,
                &spl_token::id(),
            )
        });
        let output_storage = self.data().await?.output_storage;
        let output_authority = params
            .output_authority
            .unwrap_or_else(|| self.payer.pubkey());

        let mut tx = self.empty_envelope();
        let output = match params.output {
            Some(output) => output,
            None => {
                let output = get_associated_token_address_with_program_id(
                    &output_authority,
                    &output_mint,
                    &spl_token::id(),
                );
                if !self.account_exists(&output).await? {
                    let rent_payer_key = params
                        .rent_payer
                        .as_ref()
                        .map(|s| s.pubkey())
                        .unwrap_or_else(|| self.payer.pubkey());
                    tx.append(create_associated_token_account(
                        &rent_payer_key,
                        &output_authority,
                        &output_mint,
                        &spl_token::id(),
                    ));
                    if let Some(rent_payer) = &params.rent_payer {
                        tx.add_signer(rent_payer.clone());
                    }
                }
                output
            }
        };

        let output_storage_authority = self.output_storage_authority();
        tx.append(instruction::swap(
            &self.address,
            &input,
            &input_authority,
            &input_mint,
            &output_storage,
            &output_storage_authority,
            &output,
            amount,
        ));
        if let Some(input_signer) = params.input_signer {
            tx.add_signer(input_signer);
        }
        Ok(tx)
    }

    /// Validates an explicitly supplied admin key against the on-chain
    /// record, before any envelope is built. Returns the recorded admin
    /// authority.
    pub async fn verify_admin(
        &mut self,
        admin: Option<Pubkey>,
    ) -> Result<Pubkey, TokadaptError> {
        let expected = self.data().await?.admin_authority;
        match admin {
            Some(admin) if admin != expected => {
                Err(TokadaptError::AdminMismatch { expected })
            }
            _ => Ok(expected),
        }
    }

    /// Builds the set-admin envelope. The admin signature itself is added
    /// by the caller, which may instead route it through a multisig.
    pub async fn set_admin(
        &mut self,
        admin: Option<Pubkey>,
        new_admin: Pubkey,
    ) -> Result<TransactionEnvelope, TokadaptError> {
        let admin = match admin {
            Some(admin) => admin,
            None => self.data().await?.admin_authority,
        };
        let mut tx = self.empty_envelope();
        tx.append(instruction::set_admin(&self.address, &admin, &new_admin));
        Ok(tx)
    }

    /// Builds the close envelope: drain the storage into a token collector
    /// (created on demand) and reclaim rent.
    pub async fn close(
        &mut self,
        params: CloseParams,
    ) -> Result<TransactionEnvelope, TokadaptError> {
        let admin = match params.admin {
            Some(admin) => admin,
            None => self.data().await?.admin_authority,
        };
        let output_storage = self.data().await?.output_storage;
        let rent_collector = params
            .rent_collector
            .unwrap_or_else(|| self.payer.pubkey());

        let mut tx = self.empty_envelope();
        let token_collector = match params.token_collector {
            Some(token_collector) => token_collector,
            None => {
                let output_mint = self.output_mint().await?;
                get_associated_token_address_with_program_id(
                    &rent_collector,
                    &output_mint,
                    &spl_token::id(),
                )
            }
        };

        let create_token_collector = match params.create_token_collector {
            Some(create) => create,
            None => !self.account_exists(&token_collector).await?,
        };
        if create_token_collector {
            let output_mint = self.output_mint().await?;
            let rent_payer_key = params
                .rent_payer
                .as_ref()
                .map(|s| s.pubkey())
                .unwrap_or_else(|| self.payer.pubkey());
            tx.append(create_associated_token_account(
                &rent_payer_key,
                &rent_collector,
                &output_mint,
                &spl_token::id(),
            ));
            if let Some(rent_payer) = &params.rent_payer {
                tx.add_signer(rent_payer.clone());
            }
        }

        let output_storage_authority = self.output_storage_authority();
        tx.append(instruction::close(
            &self.address,
            &admin,
            &output_storage,
            &output_storage_authority,
            &token_collector,
            &rent_collector,
        ));
        Ok(tx)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, solana_keypair::Keypair};

    fn test_wrapper() -> TokadaptStateWrapper {
        let rpc_client = Arc::new(RpcClient::new("http://127.0.0.1:8899".to_string()));
        TokadaptStateWrapper::new(rpc_client, Arc::new(Keypair::new()), Pubkey::new_unique())
    }

    #[test]
    fn storage_authority_is_cached_and_stable() {
        let mut wrapper = test_wrapper();
        let first = wrapper.output_storage_authority_with_bump();
        let second = wrapper.output_storage_authority_with_bump();
        assert_eq!(first, second);
        assert_eq!(
            first,
            crate::get_output_storage_authority_with_bump(&wrapper.address())
        );
    }

    #[tokio::test]
    async fn set_data_skips_fetching() {
        let mut wrapper = test_wrapper();
        let state = State {
            admin_authority: Pubkey::new_unique(),
            input_mint: Pubkey::new_unique(),
            output_storage: Pubkey::new_unique(),
            output_storage_authority_bump: 255,
        };
        wrapper.set_data(state.clone());
        // No RPC server is running; this only passes because the cache hits.
        assert_eq!(wrapper.data().await.unwrap(), &state);
    }

    #[tokio::test]
    async fn verify_admin_rejects_mismatched_key() {
        let mut wrapper = test_wrapper();
        let admin = Pubkey::new_unique();
        wrapper.set_data(State {
            admin_authority: admin,
            input_mint: Pubkey::new_unique(),
            output_storage: Pubkey::new_unique(),
            output_storage_authority_bump: 255,
        });

        let err = wrapper
            .verify_admin(Some(Pubkey::new_unique()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TokadaptError::AdminMismatch { expected } if expected == admin
        ));

        assert_eq!(wrapper.verify_admin(Some(admin)).await.unwrap(), admin);
        assert_eq!(wrapper.verify_admin(None).await.unwrap(), admin);
    }

    #[tokio::test]
    async fn set_admin_names_cached_admin_as_signer() {
        let mut wrapper = test_wrapper();
        let admin = Pubkey::new_unique();
        wrapper.set_data(State {
            admin_authority: admin,
            input_mint: Pubkey::new_unique(),
            output_storage: Pubkey::new_unique(),
            output_storage_authority_bump: 255,
        });
        let tx = wrapper.set_admin(None, Pubkey::new_unique()).await.unwrap();
        assert_eq!(tx.instructions().len(), 1);
        let meta = &tx.instructions()[0].accounts[1];
        assert_eq!(meta.pubkey, admin);
        assert!(meta.is_signer);
    }
}
