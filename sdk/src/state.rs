//! Program state

use {
    crate::{anchor::account_discriminator, error::TokadaptError},
    borsh::{BorshDeserialize, BorshSerialize},
    solana_pubkey::Pubkey,
};

/// The persisted record of one Tokadapt deployment.
///
/// Stored as an Anchor account: an 8-byte discriminator followed by the
/// Borsh-encoded fields, padded with reserved bytes up to [`State::SPACE`].
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct State {
    /// The entity allowed to mutate governance fields and close the state.
    pub admin_authority: Pubkey,
    /// Mint of the token burned on swap.
    pub input_mint: Pubkey,
    /// Escrow token account holding the withdrawable output tokens.
    pub output_storage: Pubkey,
    /// Bump seed of the storage-authority PDA, fixed at initialization.
    pub output_storage_authority_bump: u8,
}

impl State {
    /// Allocation size of the state account; larger than the current field
    /// set to leave room for upgrades.
    pub const SPACE: usize = 150;

    /// Anchor discriminator of the state account.
    pub fn discriminator() -> [u8; 8] {
        account_discriminator("State")
    }

    /// Decode a state record from raw account data, validating the
    /// discriminator. Trailing reserved bytes are ignored.
    pub fn unpack(address: &Pubkey, data: &[u8]) -> Result<Self, TokadaptError> {
        if data.len() < 8 || data[..8] != Self::discriminator() {
            return Err(TokadaptError::InvalidAccountData(*address));
        }
        Self::deserialize(&mut &data[8..])
            .map_err(|_| TokadaptError::InvalidAccountData(*address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> State {
        State {
            admin_authority: Pubkey::new_unique(),
            input_mint: Pubkey::new_unique(),
            output_storage: Pubkey::new_unique(),
            output_storage_authority_bump: 254,
        }
    }

    fn pack(state: &State) -> Vec<u8> {
        let mut data = State::discriminator().to_vec();
        state.serialize(&mut data).unwrap();
        data
    }

    #[test]
    fn unpack_roundtrip() {
        let state = sample_state();
        let address = Pubkey::new_unique();
        let unpacked = State::unpack(&address, &pack(&state)).unwrap();
        assert_eq!(unpacked, state);
    }

    #[test]
    fn unpack_tolerates_reserved_tail() {
        let state = sample_state();
        let mut data = pack(&state);
        data.resize(State::SPACE, 0);
        let unpacked = State::unpack(&Pubkey::new_unique(), &data).unwrap();
        assert_eq!(unpacked, state);
    }

    #[test]
    fn unpack_rejects_wrong_discriminator() {
        let state = sample_state();
        let mut data = pack(&state);
        data[0] ^= 0xff;
        let address = Pubkey::new_unique();
        assert!(matches!(
            State::unpack(&address, &data),
            Err(TokadaptError::InvalidAccountData(a)) if a == address
        ));
    }

    #[test]
    fn unpack_rejects_truncated_data() {
        let data = pack(&sample_state());
        assert!(State::unpack(&Pubkey::new_unique(), &data[..40]).is_err());
    }
}
