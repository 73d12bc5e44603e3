use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=NE2001_LIB_DIR");
    if env::var_os("CARGO_FEATURE_NE2001").is_some() {
        if let Ok(dir) = env::var("NE2001_LIB_DIR") {
            println!("cargo:rustc-link-search=native={}", dir);
        }
    }
}
