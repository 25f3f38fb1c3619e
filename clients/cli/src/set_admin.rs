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
    tokadapt_sdk::{
        accessor::TokadaptStateWrapper,
        middleware::{install_multisig_middleware, MiddlewareOptions},
    },
};

#[derive(Clone, Debug, Args)]
#[clap(about = "Rotates the admin authority of a Tokadapt deployment")]
pub struct SetAdminArgs {
    /// Tokadapt state address
    #[clap(
        long,
        value_parser = parse_pubkey,
        default_value = "taspunvVUXLG82PrsCCtQeknWrGHNHWcZmVQYNcQBDg"
    )]
    pub tokadapt: Pubkey,

    /// Keypair of the current admin authority; defaults to the fee payer
    #[clap(long, value_parser = parse_keypair)]
    pub admin: Option<Arc<Keypair>>,

    /// The new admin authority
    #[clap(long, value_parser = parse_pubkey)]
    pub new_admin: Pubkey,

    /// Proposes to the multisig when the admin authority is one; defaults
    /// to the fee payer
    #[clap(long, value_parser = parse_keypair)]
    pub proposer: Option<Arc<Keypair>>,

    /// Pays rent for a created proposal account; defaults to the fee payer
    #[clap(long, value_parser = parse_keypair)]
    pub rent_payer: Option<Arc<Keypair>>,

    /// Prints the gated instructions base64 encoded instead of creating a
    /// proposal
    #[clap(long)]
    pub log_only: bool,

    /// Targets the community governance track rather than the council one
    #[clap(long)]
    pub community: bool,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAdminOutput {
    #[serde_as(as = "DisplayFromStr")]
    pub tokadapt: Pubkey,

    #[serde_as(as = "DisplayFromStr")]
    pub new_admin: Pubkey,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub signature: Option<Signature>,
}

impl Display for SetAdminOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln_name_value(f, "Tokadapt State Address:", &self.tokadapt.to_string())?;
        writeln_name_value(f, "New Admin Authority:", &self.new_admin.to_string())?;
        if let Some(signature) = self.signature {
            writeln_name_value(f, "Signature:", &signature.to_string())?;
        }
        Ok(())
    }
}

impl QuietDisplay for SetAdminOutput {
    fn write_str(&self, _: &mut dyn std::fmt::Write) -> std::fmt::Result {
        Ok(())
    }
}
impl VerboseDisplay for SetAdminOutput {}

pub async fn command_set_admin(config: &Config, args: SetAdminArgs) -> CommandResult {
    let payer = config.fee_payer()?;
    let mut wrapper =
        TokadaptStateWrapper::new(config.rpc_client.clone(), payer.clone(), args.tokadapt);

    let expected = wrapper
        .verify_admin(args.admin.as_ref().map(|k| k.pubkey()))
        .await?;

    println_display(
        config,
        format!(
            "Set admin of tokadapt {} to {}",
            args.tokadapt, args.new_admin
        ),
    );

    let mut middleware = install_multisig_middleware(
        config.rpc_client.clone(),
        payer,
        expected,
        MiddlewareOptions {
            proposer: args.proposer.map(|k| -> Arc<dyn Signer> { k }),
            rent_payer: args.rent_payer.map(|k| -> Arc<dyn Signer> { k }),
            log_only: args.log_only,
            community: args.community,
        },
    )
    .await?;

    let mut tx = wrapper.set_admin(Some(expected), args.new_admin).await?;
    tx = middleware.apply(tx)?;
    if let Some(admin) = args.admin {
        tx.add_signer(admin);
    }

    // In log-only mode the middleware may have drained the envelope; there
    // is nothing left to submit.
    let signature = if tx.instructions().is_empty() {
        None
    } else {
        process_envelope(config, &tx).await?
    };

    Ok(format_output(
        config,
        SetAdminOutput {
            tokadapt: args.tokadapt,
            new_admin: args.new_admin,
            signature,
        },
    ))
}
