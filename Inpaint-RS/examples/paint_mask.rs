//! Paint a mask offline and save it as PNG. No service needed.
//!
//! ```sh
//! cargo run --example paint_mask -- photo.png mask.png
//! ```

use inpaint_rs::{BrushController, DisplayRect, MaskBuffer, SourceImage};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input = args.next().unwrap_or_else(|| "photo.png".into());
    let output = args.next().unwrap_or_else(|| "mask.png".into());

    let source = SourceImage::open(&input)?;
    let (w, h) = source.dimensions();
    println!("{}: {}x{} {}", input, w, h, source.mime_type());

    let mut mask = MaskBuffer::new(w, h);
    let mut brush = BrushController::new();
    brush.set_brush_size(40.0);

    // Pretend the canvas is shown at half size.
    let display = DisplayRect::sized(w as f32 / 2.0, h as f32 / 2.0);

    // A diagonal stroke across the middle of the canvas
    let (dw, dh) = (display.width, display.height);
    brush.pointer_down(&mut mask, &display, dw * 0.25, dh * 0.25);
    for i in 1..=20 {
        let t = 0.25 + 0.5 * i as f32 / 20.0;
        brush.pointer_move(&mut mask, &display, dw * t, dh * t);
    }

    if let Some(finished) = brush.pointer_up(&mask)? {
        std::fs::write(&output, &finished.mask_png)?;
        println!(
            "Saved {} ({} stamps, {} pixels to regenerate)",
            output,
            finished.stroke.points.len(),
            mask.regenerate_count()
        );
    }

    Ok(())
}
