fn main() {
    if let Err(err) = forensics_cli::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
