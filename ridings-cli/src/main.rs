//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init();
    if let Err(err) = ridings_cli::run() {
        eprintln!("ridings: {err}");
        std::process::exit(1);
    }
}
