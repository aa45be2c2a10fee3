fn main() {
    let args: Vec<String> = std::env::args().collect();
    if let Err(err) = chores_core::run(args) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
