fn setup_environment() {
    // A host Python environment leaking into yt-dlp breaks its imports.
    std::env::remove_var("PYTHONHOME");
    std::env::remove_var("PYTHONPATH");
}

#[tokio::main]
async fn main() {
    setup_environment();
    vidgrab_lib::run().await
}
