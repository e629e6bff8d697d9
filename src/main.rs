fn main() {
    if let Err(err) = toposvg::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
