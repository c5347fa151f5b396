fn main() {
    if let Err(err) = showplan_renderer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
