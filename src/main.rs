fn main() {
    if let Err(e) = decker::cli::main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
