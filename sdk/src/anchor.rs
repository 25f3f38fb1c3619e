//! Helpers for the Anchor account and instruction framing used by the
//! Tokadapt and Goki programs.

use solana_sha256_hasher::hash;

/// Eight-byte discriminator prefixing an Anchor instruction, derived from
/// the instruction's namespaced name.
pub(crate) fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let preimage = format!("{namespace}:{name}");
    let digest = hash(preimage.as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.to_bytes()[..8]);
    out
}

/// Eight-byte discriminator prefixing an Anchor account, derived from the
/// account struct's name.
pub(crate) fn account_discriminator(name: &str) -> [u8; 8] {
    sighash("account", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sighash_is_stable_and_name_sensitive() {
        assert_eq!(
            sighash("global", "initialize"),
            sighash("global", "initialize")
        );
        assert_ne!(sighash("global", "initialize"), sighash("global", "close"));
        assert_ne!(
            sighash("global", "state"),
            account_discriminator("state")
        );
    }
}
