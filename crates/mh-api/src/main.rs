#[tokio::main]
async fn main() {
    if let Err(err) = mh_api::run().await {
        tracing::error!(error = %err, "mh-api failed");
        std::process::exit(1);
    }
}
