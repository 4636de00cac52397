mod cli;
mod server;

#[tokio::main]
async fn main() {
    let exit_code = cli::run_from_env().await;
    std::process::exit(exit_code);
}
