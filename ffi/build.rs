//! Generates `include/pixel_ffi.h` from the `extern "C"` surface.
//! Header generation failures are reported as warnings so the library
//! itself still builds.

use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let Ok(crate_dir) = std::env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let include = PathBuf::from(&crate_dir).join("include");
    if let Err(e) = std::fs::create_dir_all(&include) {
        println!("cargo:warning=cannot create {}: {e}", include.display());
        return;
    }

    let bindings = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("PIXEL_FFI_H")
        .with_pragma_once(false)
        .generate();
    match bindings {
        Ok(bindings) => {
            bindings.write_to_file(include.join("pixel_ffi.h"));
        }
        Err(e) => println!("cargo:warning=cbindgen failed: {e}"),
    }
}
