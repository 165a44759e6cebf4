#[cfg(not(windows))]
fn main() {
    if let Err(e) = pkg_config::probe_library("portaudio-2.0") {
        panic!("{}", e);
    }
}

#[cfg(windows)]
fn main() {
    // Assume the library is in the correct path
    println!("cargo:rustc-link-lib=portaudio");
}
