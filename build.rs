use std::process::Command;

/// バイナリに埋め込むバージョン文字列
///
/// git のタグ/コミットから作る。git が使えない環境（ソース tarball など）
/// では Cargo のパッケージバージョンにフォールバックする。
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let described = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty=+"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty());

    let version = match described {
        Some(git) => format!("{} ({})", pkg, git),
        None => pkg,
    };
    println!("cargo:rustc-env=GIT_VERSION={}", version);
}
