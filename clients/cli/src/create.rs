use {
    crate::{
        common::{parse_keypair, parse_pubkey, parse_pubkey_or_keypair, process_envelope},
        config::Config,
        output::{format_output, println_display},
        CommandResult,
    },
    clap::Args,
    serde_derive::{Deserialize, Serialize},
    serde_with::{serde_as, DisplayFromStr},
    solana_cli_output::{display::writeln_name_value, QuietDisplay, VerboseDisplay},
    solana_keypair::Keypair,
    solana_pubkey::Pubkey,
    solana_signature::Signature,
    solana_signer::Signer,
    std::{
        fmt::{Display, Formatter},
        sync::Arc,
    },
    tokadapt_sdk::accessor::{CreateParams, PubkeyOrSigner, TokadaptStateWrapper},
};

#[derive(Clone, Debug, Args)]
#[clap(about = "Creates and initializes a new Tokadapt state account")]
pub struct CreateArgs {
    /// Keypair file of the state account to create; generated when omitted
    #[clap(long, value_parser = parse_keypair)]
    pub tokadapt: Option<Arc<Keypair>>,

    /// The admin authority of the new deployment; defaults to the fee payer
    #[clap(long, value_parser = parse_pubkey)]
    pub admin: Option<Pubkey>,

    /// The mint of the token burned on swap
    #[clap(long, value_parser = parse_pubkey)]
    pub input_mint: Pubkey,

    /// The output storage: address of an existing token account, or a
    /// keypair file for a token account to create
    #[clap(long, value_parser = parse_pubkey_or_keypair)]
    pub output_storage: Option<PubkeyOrSigner>,

    /// The mint of the output token; required unless --output-storage
    /// names an existing account
    #[clap(long, value_parser = parse_pubkey)]
    pub output_mint: Option<Pubkey>,

    /// Pays rent for the created accounts; defaults to the fee payer
    #[clap(long, value_parser = parse_keypair)]
    pub rent_payer: Option<Arc<Keypair>>,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutput {
    #[serde_as(as = "DisplayFromStr")]
    pub tokadapt: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub admin: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub input_mint: Pubkey,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub signature: Option<Signature>,
}

impl Display for CreateOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln_name_value(f, "Tokadapt State Address:", &self.tokadapt.to_string())?;
        writeln_name_value(f, "Admin Authority:", &self.admin.to_string())?;
        writeln_name_value(f, "Input Mint:", &self.input_mint.to_string())?;
        if let Some(signature) = self.signature {
            writeln_name_value(f, "Signature:", &signature.to_string())?;
        }
        Ok(())
    }
}

impl QuietDisplay for CreateOutput {
    fn write_str(&self, _: &mut dyn std::fmt::Write) -> std::fmt::Result {
        Ok(())
    }
}
impl VerboseDisplay for CreateOutput {}

pub async fn command_create(config: &Config, args: CreateArgs) -> CommandResult {
    let payer = config.fee_payer()?;
    let state: Arc<Keypair> = args.tokadapt.unwrap_or_else(|| Arc::new(Keypair::new()));
    let admin = args.admin.unwrap_or_else(|| payer.pubkey());

    println_display(config, format!("Create tokadapt {}", state.pubkey()));

    let (wrapper, tx) = TokadaptStateWrapper::create(
        config.rpc_client.clone(),
        payer,
        CreateParams {
            state,
            admin: Some(admin),
            input_mint: args.input_mint,
            output_storage: args.output_storage,
            output_mint: args.output_mint,
            rent_payer: args.rent_payer.map(|k| -> Arc<dyn Signer> { k }),
        },
    )
    .await?;

    let signature = process_envelope(config, &tx).await?;

    Ok(format_output(
        config,
        CreateOutput {
            tokadapt: wrapper.address(),
            admin,
            input_mint: args.input_mint,
            signature,
        },
    ))
}
