#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clinic_portal::bootstrapper::run().await
}
