fn main() {
    if let Err(err) = csv_normalize::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
