#[tokio::main]
async fn main() -> anyhow::Result<()> {
    photoshelf_lib::run(std::env::args().collect()).await
}
