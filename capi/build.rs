use std::env;

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => dir,
        Err(err) => panic!("{}", err),
    };

    match cbindgen::generate(crate_dir) {
        Ok(header) => {
            header.write_to_file("include/rure.h");
        }
        Err(err) => {
            panic!("{}", err)
        }
    }
}
