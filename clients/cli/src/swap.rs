use {
    crate::{
        common::{parse_keypair, parse_pubkey, process_envelope},
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
    tokadapt_sdk::accessor::{SwapParams, TokadaptStateWrapper},
};

#[derive(Clone, Debug, Args)]
#[clap(about = "Burns input tokens in exchange for output tokens from the storage")]
pub struct SwapArgs {
    /// Tokadapt state address
    #[clap(
        long,
        value_parser = parse_pubkey,
        default_value = "taspunvVUXLG82PrsCCtQeknWrGHNHWcZmVQYNcQBDg"
    )]
    pub tokadapt: Pubkey,

    /// Amount to swap in raw token units; the entire available balance
    /// when omitted
    #[clap(long)]
    pub amount: Option<u64>,

    /// Owner or delegate of the input token account; defaults to the fee
    /// payer
    #[clap(long, value_parser = parse_keypair)]
    pub input_signer: Option<Arc<Keypair>>,

    /// Input token account; defaults to the input authority's associated
    /// token account
    #[clap(long, value_parser = parse_pubkey)]
    pub input: Option<Pubkey>,

    /// Owner of the output token account; defaults to the fee payer
    #[clap(long, value_parser = parse_pubkey)]
    pub output_authority: Option<Pubkey>,

    /// Output token account; defaults to the output authority's associated
    /// token account, created when missing
    #[clap(long, value_parser = parse_pubkey)]
    pub output: Option<Pubkey>,

    /// Pays rent for a created output account; defaults to the fee payer
    #[clap(long, value_parser = parse_keypair)]
    pub rent_payer: Option<Arc<Keypair>>,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOutput {
    #[serde_as(as = "DisplayFromStr")]
    pub tokadapt: Pubkey,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub signature: Option<Signature>,
}

impl Display for SwapOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln_name_value(f, "Tokadapt State Address:", &self.tokadapt.to_string())?;
        if let Some(signature) = self.signature {
            writeln_name_value(f, "Signature:", &signature.to_string())?;
        }
        Ok(())
    }
}

impl QuietDisplay for SwapOutput {
    fn write_str(&self, _: &mut dyn std::fmt::Write) -> std::fmt::Result {
        Ok(())
    }
}
impl VerboseDisplay for SwapOutput {}

pub async fn command_swap(config: &Config, args: SwapArgs) -> CommandResult {
    let payer = config.fee_payer()?;
    let mut wrapper =
        TokadaptStateWrapper::new(config.rpc_client.clone(), payer, args.tokadapt);

    println_display(config, format!("Swap against tokadapt {}", args.tokadapt));

    let tx = wrapper
        .swap(SwapParams {
            amount: args.amount,
            input_signer: args.input_signer.map(|k| -> Arc<dyn Signer> { k }),
            input: args.input,
            output_authority: args.output_authority,
            output: args.output,
            rent_payer: args.rent_payer.map(|k| -> Arc<dyn Signer> { k }),
        })
        .await?;

    let signature = process_envelope(config, &tx).await?;

    Ok(format_output(
        config,
        SwapOutput {
            tokadapt: args.tokadapt,
            signature,
        },
    ))
}
