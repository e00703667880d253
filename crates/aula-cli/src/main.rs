//! `aula` binary entrypoint.

#[tokio::main]
async fn main() {
    std::process::exit(aula_cli::run().await);
}
