/// Smoke-test for `BrowserRenderer`.
///
/// Launches a headless Chromium, opens <https://example.com>, scrolls once,
/// and verifies the snapshot contains the expected `<h1>`.
///
/// Run with:
///   cargo run --example browser_smoke --features browser
use trawl_client::BrowserRenderer;
use trawl_core::traits::Renderer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Launching headless browser…");
    let mut renderer = BrowserRenderer::launch().await?;

    let url = "https://example.com";
    println!("Opening {url} …");
    let result = async {
        renderer.open(url).await?;
        renderer.trigger_lazy_load().await?;
        renderer.snapshot().await
    }
    .await;
    renderer.close().await;
    // Second close must be a no-op.
    renderer.close().await;

    let html = result?;
    assert!(
        html.contains("<h1>Example Domain</h1>"),
        "Expected <h1> not found in rendered HTML"
    );

    println!("OK — got {} bytes of rendered HTML", html.len());
    Ok(())
}
