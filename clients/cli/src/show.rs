use {
    crate::{common::parse_pubkey, config::Config, CommandResult, Error},
    clap::Args,
    serde_derive::{Deserialize, Serialize},
    serde_with::{serde_as, DisplayFromStr},
    solana_cli_output::{QuietDisplay, VerboseDisplay},
    solana_program_pack::Pack,
    solana_pubkey::Pubkey,
    solana_signer::{null_signer::NullSigner, Signer},
    std::{
        fmt::{Display, Formatter},
        sync::Arc,
    },
    tokadapt_sdk::accessor::TokadaptStateWrapper,
};

#[derive(Clone, Debug, Args)]
#[clap(about = "Prints a Tokadapt state account in human readable form")]
pub struct ShowArgs {
    /// Tokadapt state address
    #[clap(
        long,
        value_parser = parse_pubkey,
        default_value = "taspunvVUXLG82PrsCCtQeknWrGHNHWcZmVQYNcQBDg"
    )]
    pub tokadapt: Pubkey,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowOutput {
    #[serde_as(as = "DisplayFromStr")]
    pub tokadapt: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub admin: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub input_mint: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub output_mint: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub output_storage: Pubkey,

    pub output_storage_balance: f64,
}

impl Display for ShowOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The `Tokadapt <address>` header is a stable interface consumed
        // by operational tooling; do not reword it.
        writeln!(f, "Tokadapt {}", self.tokadapt)?;
        writeln!(f, "  admin: {}", self.admin)?;
        writeln!(f, "  input mint: {}", self.input_mint)?;
        writeln!(f, "  output mint: {}", self.output_mint)?;
        writeln!(f, "  output storage: {}", self.output_storage)?;
        writeln!(f, "  output storage balance: {}", self.output_storage_balance)?;
        Ok(())
    }
}

impl QuietDisplay for ShowOutput {
    fn write_str(&self, _: &mut dyn std::fmt::Write) -> std::fmt::Result {
        Ok(())
    }
}
impl VerboseDisplay for ShowOutput {}

async fn get_token_account(
    config: &Config,
    address: &Pubkey,
) -> Result<spl_token::state::Account, Error> {
    let account = config.rpc_client.get_account(address).await?;
    Ok(spl_token::state::Account::unpack(&account.data)
        .map_err(|e| format!("Invalid token account {}: {}", address, e))?)
}

pub async fn command_show(config: &Config, args: ShowArgs) -> CommandResult {
    // Read-only: no transaction is built, so a missing fee payer is fine.
    let payer = config
        .fee_payer
        .clone()
        .unwrap_or_else(|| -> Arc<dyn Signer> {
            Arc::new(NullSigner::new(&Pubkey::default()))
        });
    let mut wrapper =
        TokadaptStateWrapper::new(config.rpc_client.clone(), payer, args.tokadapt);
    let state = wrapper.data().await?.clone();

    let storage = get_token_account(config, &state.output_storage).await?;
    let mint_account = config.rpc_client.get_account(&storage.mint).await?;
    let mint = spl_token::state::Mint::unpack(&mint_account.data)
        .map_err(|e| format!("Invalid mint {}: {}", storage.mint, e))?;

    Ok(crate::output::format_output(
        config,
        ShowOutput {
            tokadapt: args.tokadapt,
            admin: state.admin_authority,
            input_mint: state.input_mint,
            output_mint: storage.mint,
            output_storage: state.output_storage,
            output_storage_balance: spl_token::amount_to_ui_amount(
                storage.amount,
                mint.decimals,
            ),
        },
    ))
}
