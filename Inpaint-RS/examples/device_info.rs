//! Report which compute device the inpainting service is running on.
//!
//! Requires a running inpainting service at http://127.0.0.1:8000
//! (override with `INPAINT_ENDPOINT`).
//!
//! ```sh
//! cargo run --example device_info
//! ```

use inpaint_rs::{InpaintClient, InpaintConfig};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let endpoint =
        std::env::var("INPAINT_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:8000".into());
    let client = InpaintClient::new(InpaintConfig::with_endpoint(endpoint));

    if !client.health().await? {
        eprintln!("Inpainting service at {} is not responding", client.endpoint());
        return Ok(());
    }

    let info = client.device_info().await?;
    println!("{}", info.describe());

    let jobs = client.list_jobs().await?;
    println!("{} job(s) known to the service", jobs.len());
    for id in jobs {
        println!("  {}", id);
    }

    Ok(())
}
