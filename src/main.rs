#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mamanbebe_lib::run().await
}
