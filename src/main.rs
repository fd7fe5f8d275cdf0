use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    uitestgen::cli::run().await
}
