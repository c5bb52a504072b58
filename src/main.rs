#[tokio::main]
async fn main() {
    let code = mqlistener::app::startup::startup().await;
    std::process::exit(code);
}
