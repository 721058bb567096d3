#[tokio::main]
async fn main() -> anyhow::Result<()> {
    spectralink_server::run().await
}
