fn main() {
    uniffi::generate_scaffolding("src/fitpro.udl").unwrap();
}
