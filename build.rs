// build.rs

use std::env;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-env-changed=VEXLIFT_LIBVEX_DIR");
    println!("cargo:rerun-if-env-changed=VEXLIFT_LIBVEX_NAME");

    // Only the native backend needs link directives.
    if env::var("CARGO_FEATURE_LIBVEX").is_err() {
        return;
    }

    if let Ok(dir) = env::var("VEXLIFT_LIBVEX_DIR") {
        if !Path::new(&dir).is_dir() {
            println!("cargo:warning=VEXLIFT_LIBVEX_DIR={} is not a directory", dir);
        }
        println!("cargo:rustc-link-search=native={}", dir);
    }

    let name = env::var("VEXLIFT_LIBVEX_NAME").unwrap_or_else(|_| "pyvex".to_string());
    println!("cargo:rustc-link-lib=dylib={}", name);
}
