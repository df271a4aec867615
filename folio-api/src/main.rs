use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    folio_api::start_server().await
}
