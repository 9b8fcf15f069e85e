fn main() {
    // Release builds stamp VERSION; local builds fall back to the package version.
    let version = std::env::var("VERSION")
        .unwrap_or_else(|_| format!("v{}", env!("CARGO_PKG_VERSION")));
    println!("cargo:rerun-if-env-changed=VERSION");
    println!("cargo:rustc-env=VERSION={}", version);
}
