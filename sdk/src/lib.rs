//! Client SDK for the Tokadapt token-swap program.
//!
//! Tokadapt lets holders of an input token burn it in exchange for an
//! output token held in a program-controlled storage account. This crate
//! provides the account decoders, instruction builders, transaction
//! envelope and multisig middleware used to administer a deployment; the
//! on-chain program itself lives elsewhere.
#![forbid(unsafe_code)]

pub mod accessor;
pub mod envelope;
pub mod error;
pub mod instruction;
pub mod middleware;
pub mod state;

pub(crate) mod anchor;

use solana_pubkey::Pubkey;

solana_pubkey::declare_id!("tokdh9ZbWPxkFzqsKqeAwLDk6J6a8NBZtQanVuuENxa");

const OUTPUT_STORAGE_AUTHORITY_SEED: &[u8] = b"storage";

pub(crate) fn get_output_storage_authority_seeds(state: &Pubkey) -> [&[u8]; 2] {
    [OUTPUT_STORAGE_AUTHORITY_SEED, state.as_ref()]
}

/// Derive the storage-authority PDA allowed to move tokens out of the
/// output storage of the given state account, along with its bump seed.
pub fn get_output_storage_authority_with_bump(state: &Pubkey) -> (Pubkey, u8) {
    get_output_storage_authority_with_bump_for_program(state, &id())
}

/// Same as [`get_output_storage_authority_with_bump`] for a specific
/// Tokadapt program deployment.
pub fn get_output_storage_authority_with_bump_for_program(
    state: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(&get_output_storage_authority_seeds(state), program_id)
}

/// Derive the storage-authority PDA for the given state account.
pub fn get_output_storage_authority(state: &Pubkey) -> Pubkey {
    get_output_storage_authority_with_bump(state).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_authority_derivation_is_deterministic() {
        let state = Pubkey::new_unique();
        let (authority, bump) = get_output_storage_authority_with_bump(&state);
        let (expected, expected_bump) =
            Pubkey::find_program_address(&[b"storage", state.as_ref()], &id());
        assert_eq!(authority, expected);
        assert_eq!(bump, expected_bump);
        assert_eq!(get_output_storage_authority(&state), expected);
    }

    #[test]
    fn distinct_states_get_distinct_authorities() {
        let a = get_output_storage_authority(&Pubkey::new_unique());
        let b = get_output_storage_authority(&Pubkey::new_unique());
        assert_ne!(a, b);
    }
}
