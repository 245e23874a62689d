//! End-to-end session with the synthetic camera: countdown, capture with an
//! in-memory frame overlay, and download into a temp directory.
//!
//! `RUST_LOG=debug cargo run --example booth`

use image::{Rgba, RgbaImage};
use photobooth::{
    init_logging, BoothConfig, BoothEvent, CaptureDevice, LogTarget, OutputSize, Photobooth,
    PhotoboothResult, SyntheticCamera,
};

fn kana_frame(width: u32, height: u32) -> RgbaImage {
    let border = height / 12;
    RgbaImage::from_fn(width, height, |x, y| {
        let edge = x < border || y < border || x >= width - border || y >= height - border;
        if edge {
            Rgba([230, 40, 90, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

#[tokio::main]
async fn main() -> PhotoboothResult<()> {
    init_logging(LogTarget::Stderr)?;

    let config = BoothConfig {
        countdown_secs: 3,
        output: OutputSize::Vga,
        ..BoothConfig::default()
    };
    let (width, height) = config.output.dimensions();

    let camera = SyntheticCamera::new()
        .with_device(CaptureDevice::new("cam0", "Built-in Camera"), 1280, 720);
    let mut booth = Photobooth::new(camera, config)?;
    booth
        .overlays_mut()
        .register("kana-frame.png", kana_frame(width, height));

    let device = booth.open_camera(None)?;
    println!("Camera: {} ({})", device.label, device.id);

    booth.start_countdown()?;
    while let Some(event) = booth.next_event().await {
        match event {
            BoothEvent::CountdownTick { remaining } => println!("{}...", remaining),
            BoothEvent::Captured { capture } => {
                println!("{}", serde_json::to_string_pretty(&capture)?);
                break;
            },
            BoothEvent::CaptureFailed { message } => {
                eprintln!("{}", message);
                break;
            },
        }
    }

    let out_dir = std::env::temp_dir().join("photobooth-demo");
    if booth.captured().is_some() {
        let path = booth.download(Some(&out_dir))?;
        println!("Saved to {}", path.display());
    }

    booth.shutdown();
    Ok(())
}
