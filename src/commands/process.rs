use std::path::Path;

pub async fn run(input: &Path) -> anyhow::Result<()> {
    if !tokio::fs::try_exists(input).await.unwrap_or(false) {
        anyhow::bail!("{} does not exist", input.display());
    }
    tracing::debug!("[process] requested for {}", input.display());
    println!(
        "Video processing is not available in this build; {} was left unchanged.",
        input.display()
    );
    Ok(())
}
