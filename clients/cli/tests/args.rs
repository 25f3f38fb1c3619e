//! Argument-validation tests running the built binary. No network access:
//! every invocation here fails or prints help before any RPC call is made.

use std::process::Command;

fn tokadapt() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tokadapt"))
}

#[test]
fn help_lists_all_subcommands() {
    let output = tokadapt().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for subcommand in ["create", "show", "swap", "set-admin", "close"] {
        assert!(
            stdout.contains(subcommand),
            "help output misses {}: {}",
            subcommand,
            stdout
        );
    }
}

#[test]
fn create_requires_input_mint() {
    let output = tokadapt().arg("create").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("--input-mint"), "stderr: {}", stderr);
}

#[test]
fn set_admin_requires_new_admin() {
    let output = tokadapt().arg("set-admin").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("--new-admin"), "stderr: {}", stderr);
}

#[test]
fn show_does_not_require_a_fee_payer() {
    // Read-only command against an unreachable RPC endpoint: it must get
    // past signer resolution and fail (if at all) on the network instead.
    let output = tokadapt()
        .env_remove("HOME")
        .args(["show", "--url", "http://127.0.0.1:1"])
        .output()
        .unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(
        !stderr.contains("fee payer is required"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn rejects_malformed_state_address() {
    let output = tokadapt()
        .args(["show", "--tokadapt", "not-a-pubkey-or-file"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn verbose_conflicts_with_output_format() {
    let output = tokadapt()
        .args(["show", "--verbose", "--output", "json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
