fn main() {
    if let Err(error) = lazytree_cli::run() {
        // run() installs the subscriber right after argument parsing.
        tracing::error!(error = ?error, "CLI execution failed");
        std::process::exit(1);
    }
}
