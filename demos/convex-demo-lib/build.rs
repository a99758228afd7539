fn main() {
    // Only publish the manifest; the application crate generates the registry.
    let result = convex_build::Builder::from_env().and_then(|builder| builder.generate_registry(false).run());
    if let Err(e) = result {
        convex_build::report(&e);
        std::process::exit(1);
    }
}
