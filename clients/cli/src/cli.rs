use {
    crate::{
        close::{command_close, CloseArgs},
        config::Config,
        create::{command_create, CreateArgs},
        output::parse_output_format,
        set_admin::{command_set_admin, SetAdminArgs},
        show::{command_show, ShowArgs},
        swap::{command_swap, SwapArgs},
        CommandResult,
    },
    clap::{
        builder::{PossibleValuesParser, TypedValueParser},
        Parser, Subcommand,
    },
    solana_clap_v3_utils::input_parsers::{
        parse_url_or_moniker,
        signer::{SignerSource, SignerSourceParserBuilder},
    },
    solana_cli_output::OutputFormat,
};

#[derive(Parser, Debug, Clone)]
#[clap(
    author,
    version,
    about = "A command line tool for administering the Tokadapt token-swap program"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,

    /// Configuration file to use
    #[clap(global(true), short = 'C', long = "config", id = "PATH")]
    pub config_file: Option<String>,

    /// Simulate transaction instead of executing
    #[clap(global(true), short = 's', long, alias = "dry-run")]
    pub simulate: bool,

    /// URL for Solana JSON `RPC` or moniker (or their first letter):
    /// [`mainnet-beta`, `testnet`, `devnet`, `localhost`].
    /// Default from the configuration file.
    #[clap(
        global(true),
        short = 'u',
        long = "url",
        id = "URL_OR_MONIKER",
        value_parser = parse_url_or_moniker,
    )]
    pub json_rpc_url: Option<String>,

    /// Specify the fee-payer account. This may be a keypair file, the ASK
    /// keyword or the pubkey of an offline signer, provided an appropriate
    /// --signer argument is also passed. Defaults to the client keypair.
    #[clap(
        global(true),
        long,
        id = "PAYER_KEYPAIR",
        value_parser = SignerSourceParserBuilder::default().allow_all().build(),
    )]
    pub fee_payer: Option<SignerSource>,

    /// Show additional information
    #[clap(global(true), short, long)]
    pub verbose: bool,

    /// Return information in specified output format
    #[clap(
        global(true),
        long = "output",
        id = "FORMAT",
        conflicts_with = "verbose",
        value_parser = PossibleValuesParser::new([
            "display",
            "json",
            "json-compact",
            "quiet",
            "verbose"
        ]).map(|o| parse_output_format(&o)),
    )]
    pub output_format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create and initialize a new Tokadapt state account
    Create(CreateArgs),
    /// Print a state account in human readable form
    Show(ShowArgs),
    /// Burn input tokens in exchange for output tokens from the storage
    Swap(SwapArgs),
    /// Replace the admin authority of a state account
    SetAdmin(SetAdminArgs),
    /// Close a state account, draining its storage and rent
    Close(CloseArgs),
}

impl Command {
    pub async fn execute(self, config: &Config) -> CommandResult {
        match self {
            Command::Create(args) => command_create(config, args).await,
            Command::Show(args) => command_show(config, args).await,
            Command::Swap(args) => command_swap(config, args).await,
            Command::SetAdmin(args) => command_set_admin(config, args).await,
            Command::Close(args) => command_close(config, args).await,
        }
    }
}
