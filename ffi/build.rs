use std::path::PathBuf;

fn main() {
    let crate_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap());
    let include_dir = crate_dir.join("include");
    std::fs::create_dir_all(&include_dir).unwrap();

    println!("cargo:rerun-if-changed=src");

    cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("GUACAMOLE_FFI_H")
        .generate()
        .expect("unable to generate C bindings")
        .write_to_file(include_dir.join("guacamole_ffi.h"));
}
