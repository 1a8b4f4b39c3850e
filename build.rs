fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // ESP-IDF link arguments are only needed for the firmware build; host
    // builds (tests, rain-peer) skip embuild entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
