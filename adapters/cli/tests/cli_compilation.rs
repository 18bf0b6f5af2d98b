use std::process::Command;

#[test]
fn delve_binary_type_checks() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "delve"])
        .status()
        .expect("failed to invoke cargo check for the delve binary");

    assert!(status.success(), "cargo check --bin delve should succeed");
}
