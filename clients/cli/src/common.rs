use {
    crate::{config::Config, output::println_display, Error},
    solana_keypair::{read_keypair_file, Keypair},
    solana_pubkey::Pubkey,
    solana_signature::Signature,
    solana_signer::Signer,
    std::{str::FromStr, sync::Arc},
    tokadapt_sdk::{
        accessor::PubkeyOrSigner, envelope::TransactionEnvelope, error::TokadaptError,
    },
};

/// Parse a base58 public key, falling back to reading a keypair file at
/// the given path and taking its public key.
pub fn parse_pubkey(value: &str) -> Result<Pubkey, String> {
    if let Ok(pubkey) = Pubkey::from_str(value) {
        return Ok(pubkey);
    }
    parse_keypair(value).map(|keypair| keypair.pubkey())
}

/// Parse a keypair from a JSON keypair file.
pub fn parse_keypair(path: &str) -> Result<Arc<Keypair>, String> {
    read_keypair_file(path)
        .map(Arc::new)
        .map_err(|e| format!("Failed to load keypair at {}: {}", path, e))
}

/// Accepts either an address of an existing account or a keypair file for
/// an account to be created.
pub fn parse_pubkey_or_keypair(value: &str) -> Result<PubkeyOrSigner, String> {
    if let Ok(pubkey) = Pubkey::from_str(value) {
        return Ok(PubkeyOrSigner::Pubkey(pubkey));
    }
    parse_keypair(value).map(|keypair| PubkeyOrSigner::Signer(keypair))
}

/// Simulates the envelope, aborting on any program error before a costly
/// on-chain submission is attempted, then submits it unless the global
/// simulate flag is set.
pub async fn process_envelope(
    config: &Config,
    tx: &TransactionEnvelope,
) -> Result<Option<Signature>, Error> {
    let simulation = tx.simulate().await?;
    if let Some(err) = simulation.err {
        if let Some(logs) = &simulation.logs {
            for log in logs {
                eprintln!("    {}", log);
            }
        }
        return Err(TokadaptError::ChainProgramError {
            error: err,
            logs: simulation.logs.unwrap_or_default(),
        }
        .into());
    }

    if config.verbose() {
        if let Some(logs) = simulation.logs {
            for log in logs {
                println!("    {}", log);
            }
        }
        if let Some(units) = simulation.units_consumed {
            println!("\nSimulation succeeded, consumed {} compute units", units);
        }
    }

    if config.simulate {
        println_display(config, "Simulation succeeded".to_string());
        Ok(None)
    } else {
        Ok(Some(tx.confirm().await?))
    }
}
