//! Mask a region of an image, submit it, and watch the job until it ends.
//!
//! Requires a running inpainting service at http://127.0.0.1:8000.
//!
//! ```sh
//! RUST_LOG=info cargo run --example inpaint_job -- photo.png "a wooden bench"
//! ```

use inpaint_rs::{InpaintClient, InpaintConfig, InpaintSession, PollState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "photo.png".into());
    let prompt = args.next().unwrap_or_else(|| "a wooden bench".into());

    let client = Arc::new(InpaintClient::new(InpaintConfig::default()));
    let mut session = InpaintSession::new(client);

    if let Some(info) = session.refresh_device_info().await {
        println!("{}", info.describe());
    }

    session.load_image(std::fs::read(&input)?)?;
    let (w, h) = session.source().map(|s| s.dimensions()).unwrap_or_default();

    // Mark the centre quarter of the image for regeneration
    session.set_brush_size(60.0);
    session.pointer_down(w as f32 * 0.4, h as f32 * 0.4);
    session.pointer_move(w as f32 * 0.6, h as f32 * 0.4);
    session.pointer_move(w as f32 * 0.6, h as f32 * 0.6);
    session.pointer_move(w as f32 * 0.4, h as f32 * 0.6);
    session.pointer_up()?;

    let params = session.params_mut();
    params.prompt = prompt;
    params.negative_prompt = "blurry, low quality".into();
    params.set_steps(30);
    params.randomize_seed();
    println!("Seed: {}", params.seed);

    let job = session.submit().await?;
    println!("Submitted job {}", job.id);

    if let Some(handle) = session.poll_handle() {
        let mut updates = handle.subscribe();
        loop {
            let state = updates.borrow_and_update().clone();
            if state.is_terminal() {
                break;
            }
            if let PollState::Polling { attempts, .. } = state {
                println!("  still processing ({} checks)", attempts);
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    }

    match session.wait_for_results().await {
        Ok(images) => {
            println!("Done! {} image(s)", images.len());
            for (i, img) in images.iter().enumerate() {
                let path = format!("inpaint_{}_{}.png", i, img.seed);
                session.download_result(i, &path).await?;
                println!("Saved: {}", path);
            }
        }
        Err(e) => eprintln!("Inpainting failed: {}", e),
    }

    Ok(())
}
