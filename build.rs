use std::process::Command;

// Stamp the source revision into the binary so the startup log can tie a
// running engine back to a commit. `describe --always --dirty` collapses
// the hash and working-tree state into one token; builds outside a git
// checkout fall back to "unknown".
fn main() {
    let rev = Command::new("git")
        .args(["describe", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=PAYOUT_ENGINE_REV={}", rev);
    println!("cargo:rerun-if-changed=.git/HEAD");
}
