// Generate Kotlin/Swift bindings from the compiled library:
//
//   cargo run -p qrshare-mobile --features gen-bindings --bin uniffi-bindgen -- \
//       generate --library target/release/libqrshare_mobile.so --language kotlin --out-dir out

#[cfg(feature = "gen-bindings")]
fn main() {
    uniffi::uniffi_bindgen_main()
}

#[cfg(not(feature = "gen-bindings"))]
fn main() {}
