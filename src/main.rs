fn main() {
    std::process::exit(semcon_harness::cli::run());
}
