#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = cvmagent::run_cli().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
