//! Program instructions

use {
    crate::anchor::sighash,
    borsh::{BorshDeserialize, BorshSerialize},
    solana_instruction::{AccountMeta, Instruction},
    solana_pubkey::Pubkey,
};

/// Instructions supported by the Tokadapt program.
///
/// The program is Anchor-based: every instruction is framed as an 8-byte
/// method discriminator followed by Borsh-encoded arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokadaptInstruction {
    /// Initialize a pre-funded state account.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0. `[w]` State account, allocated with [`crate::state::State::SPACE`]
    ///    bytes and owned by the Tokadapt program
    /// 1. `[]` Output storage token account, owned by
    ///    `get_output_storage_authority(state)`
    Initialize {
        /// Entity allowed to administer the new deployment.
        admin_authority: Pubkey,
        /// Mint of the token burned on swap.
        input_mint: Pubkey,
    },

    /// Burn input tokens and transfer the same amount of output tokens from
    /// the storage to the target account.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0. `[]` State account
    /// 1. `[w]` Input token account to burn from
    /// 2. `[s]` Input authority (owner or delegate of the input account)
    /// 3. `[]` Input mint
    /// 4. `[w]` Output storage token account
    /// 5. `[]` Output storage authority PDA
    /// 6. `[w]` Target token account receiving output tokens
    /// 7. `[]` SPL Token program
    Swap {
        /// Amount to swap; `u64::MAX` swaps the entire available balance.
        amount: u64,
    },

    /// Replace the admin authority.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0. `[w]` State account
    /// 1. `[s]` Current admin authority
    SetAdmin {
        /// The new admin authority.
        new_admin_authority: Pubkey,
    },

    /// Close the state account, draining the output storage to a token
    /// target and all rent lamports to a rent collector.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0. `[w]` State account
    /// 1. `[s]` Admin authority
    /// 2. `[w]` Output storage token account
    /// 3. `[]` Output storage authority PDA
    /// 4. `[w]` Token account receiving the storage balance; must differ
    ///    from the storage itself
    /// 5. `[w]` System account receiving the reclaimed rent
    /// 6. `[]` SPL Token program
    Close,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct InitializeArgs {
    admin_authority: Pubkey,
    input_mint: Pubkey,
}

impl TokadaptInstruction {
    /// Packs the instruction into its on-the-wire representation.
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            TokadaptInstruction::Initialize {
                admin_authority,
                input_mint,
            } => {
                buf.extend_from_slice(&sighash("global", "initialize"));
                buf.extend_from_slice(admin_authority.as_ref());
                buf.extend_from_slice(input_mint.as_ref());
            }
            TokadaptInstruction::Swap { amount } => {
                buf.extend_from_slice(&sighash("global", "swap"));
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            TokadaptInstruction::SetAdmin {
                new_admin_authority,
            } => {
                buf.extend_from_slice(&sighash("global", "set_admin"));
                buf.extend_from_slice(new_admin_authority.as_ref());
            }
            TokadaptInstruction::Close => {
                buf.extend_from_slice(&sighash("global", "close"));
            }
        }
        buf
    }

    /// Unpacks an instruction from its on-the-wire representation.
    pub fn unpack(input: &[u8]) -> Option<Self> {
        let (discriminator, rest) = input.split_first_chunk::<8>()?;
        if *discriminator == sighash("global", "initialize") {
            let args = InitializeArgs::try_from_slice(rest).ok()?;
            Some(TokadaptInstruction::Initialize {
                admin_authority: args.admin_authority,
                input_mint: args.input_mint,
            })
        } else if *discriminator == sighash("global", "swap") {
            let amount = u64::from_le_bytes(rest.try_into().ok()?);
            Some(TokadaptInstruction::Swap { amount })
        } else if *discriminator == sighash("global", "set_admin") {
            let new_admin_authority = Pubkey::try_from_slice(rest).ok()?;
            Some(TokadaptInstruction::SetAdmin {
                new_admin_authority,
            })
        } else if *discriminator == sighash("global", "close") && rest.is_empty() {
            Some(TokadaptInstruction::Close)
        } else {
            None
        }
    }
}

/// Creates an `Initialize` instruction.
pub fn initialize(
    state: &Pubkey,
    output_storage: &Pubkey,
    admin_authority: &Pubkey,
    input_mint: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: crate::id(),
        accounts: vec![
            AccountMeta::new(*state, false),
            AccountMeta::new_readonly(*output_storage, false),
        ],
        data: TokadaptInstruction::Initialize {
            admin_authority: *admin_authority,
            input_mint: *input_mint,
        }
        .pack(),
    }
}

/// Creates a `Swap` instruction.
#[allow(clippy::too_many_arguments)]
pub fn swap(
    state: &Pubkey,
    input: &Pubkey,
    input_authority: &Pubkey,
    input_mint: &Pubkey,
    output_storage: &Pubkey,
    output_storage_authority: &Pubkey,
    target: &Pubkey,
    amount: u64,
) -> Instruction {
    Instruction {
        program_id: crate::id(),
        accounts: vec![
            AccountMeta::new_readonly(*state, false),
            AccountMeta::new(*input, false),
            AccountMeta::new_readonly(*input_authority, true),
            AccountMeta::new_readonly(*input_mint, false),
            AccountMeta::new(*output_storage, false),
            AccountMeta::new_readonly(*output_storage_authority, false),
            AccountMeta::new(*target, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: TokadaptInstruction::Swap { amount }.pack(),
    }
}

/// Creates a `SetAdmin` instruction.
pub fn set_admin(
    state: &Pubkey,
    admin_authority: &Pubkey,
    new_admin_authority: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: crate::id(),
        accounts: vec![
            AccountMeta::new(*state, false),
            AccountMeta::new_readonly(*admin_authority, true),
        ],
        data: TokadaptInstruction::SetAdmin {
            new_admin_authority: *new_admin_authority,
        }
        .pack(),
    }
}

/// Creates a `Close` instruction.
pub fn close(
    state: &Pubkey,
    admin_authority: &Pubkey,
    output_storage: &Pubkey,
    output_storage_authority: &Pubkey,
    token_target: &Pubkey,
    rent_collector: &Pubkey,
) -> Instruction {
    Instruction {
        program_id: crate::id(),
        accounts: vec![
            AccountMeta::new(*state, false),
            AccountMeta::new_readonly(*admin_authority, true),
            AccountMeta::new(*output_storage, false),
            AccountMeta::new_readonly(*output_storage_authority, false),
            AccountMeta::new(*token_target, false),
            AccountMeta::new(*rent_collector, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data: TokadaptInstruction::Close.pack(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let cases = [
            TokadaptInstruction::Initialize {
                admin_authority: Pubkey::new_unique(),
                input_mint: Pubkey::new_unique(),
            },
            TokadaptInstruction::Swap { amount: 42 },
            TokadaptInstruction::Swap { amount: u64::MAX },
            TokadaptInstruction::SetAdmin {
                new_admin_authority: Pubkey::new_unique(),
            },
            TokadaptInstruction::Close,
        ];
        for case in cases {
            assert_eq!(TokadaptInstruction::unpack(&case.pack()), Some(case));
        }
    }

    #[test]
    fn unpack_rejects_unknown_discriminator() {
        assert_eq!(TokadaptInstruction::unpack(&[0u8; 8]), None);
        assert_eq!(TokadaptInstruction::unpack(&[]), None);
    }

    #[test]
    fn set_admin_marks_authority_as_signer() {
        let state = Pubkey::new_unique();
        let admin = Pubkey::new_unique();
        let instruction = set_admin(&state, &admin, &Pubkey::new_unique());
        assert_eq!(instruction.program_id, crate::id());
        assert_eq!(instruction.accounts[0].pubkey, state);
        assert!(instruction.accounts[0].is_writable);
        assert_eq!(instruction.accounts[1].pubkey, admin);
        assert!(instruction.accounts[1].is_signer);
        assert!(!instruction.accounts[1].is_writable);
    }

    #[test]
    fn close_account_order_matches_program() {
        let state = Pubkey::new_unique();
        let admin = Pubkey::new_unique();
        let storage = Pubkey::new_unique();
        let authority = crate::get_output_storage_authority(&state);
        let target = Pubkey::new_unique();
        let collector = Pubkey::new_unique();
        let instruction = close(&state, &admin, &storage, &authority, &target, &collector);
        let keys: Vec<_> = instruction.accounts.iter().map(|a| a.pubkey).collect();
        assert_eq!(
            keys,
            vec![state, admin, storage, authority, target, collector, spl_token::id()]
        );
        assert!(instruction.accounts[1].is_signer);
        assert!(instruction.accounts[5].is_writable);
    }
}
