fn main() {
    if let Err(e) = convex_build::run_from_env() {
        convex_build::report(&e);
        std::process::exit(1);
    }
}
