fn main() {
    if let Err(err) = relation_chart::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
