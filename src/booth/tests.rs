use std::time::Duration;

use image::{Rgba, RgbaImage};

use super::*;
use crate::camera::{CaptureDevice, PermissionStatus, SyntheticCamera};
use crate::compositor::OutputSize;

const PINK: Rgba<u8> = Rgba([230, 40, 90, 255]);

/// Opaque border, transparent window.
fn window_frame(width: u32, height: u32, border: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let inside = x >= border && y >= border && x < width - border && y < height - border;
        if inside {
            Rgba([0, 0, 0, 0])
        } else {
            color
        }
    })
}

fn camera() -> SyntheticCamera {
    SyntheticCamera::new()
        .with_frame(
            CaptureDevice::new("front", "Front Camera"),
            RgbaImage::from_pixel(48, 36, Rgba([10, 200, 10, 255])),
        )
        .with_device(CaptureDevice::new("back", "Back Camera"), 64, 36)
}

fn small_config() -> BoothConfig {
    BoothConfig {
        countdown_secs: 3,
        output: OutputSize::Custom {
            width: 64,
            height: 36,
        },
        overlays: vec![
            "kana-frame.png".to_string(),
            "sakura-frame.png".to_string(),
            "missing-frame.png".to_string(),
        ],
        asset_dir: "no-such-asset-dir".to_string(),
        ..BoothConfig::default()
    }
}

fn booth(config: BoothConfig) -> Photobooth<SyntheticCamera> {
    let (width, height) = config.output.dimensions();
    let mut booth = Photobooth::new(camera(), config).unwrap();
    booth
        .overlays_mut()
        .register("kana-frame.png", window_frame(width, height, 4, PINK));
    booth.overlays_mut().register(
        "sakura-frame.png",
        window_frame(width, height, 6, Rgba([250, 200, 220, 255])),
    );
    booth
}

/// Drive events until the run ends; returns the ticks seen and the final event.
async fn run_to_capture(booth: &mut Photobooth<SyntheticCamera>) -> (Vec<u32>, BoothEvent) {
    let mut ticks = Vec::new();
    loop {
        match booth.next_event().await.unwrap() {
            BoothEvent::CountdownTick { remaining } => ticks.push(remaining),
            other => return (ticks, other),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_five_second_capture_with_kana_frame() {
    let config = BoothConfig {
        countdown_secs: 5,
        output: OutputSize::FullHd,
        ..small_config()
    };
    let mut booth = booth(config);
    booth.open_camera(None).unwrap();
    assert_eq!(booth.state().selected_device(), Some("front"));
    assert_eq!(booth.state().catalog().selected(), "kana-frame.png");

    booth.start_countdown().unwrap();
    assert_eq!(booth.state().countdown(), 5);

    let (ticks, event) = run_to_capture(&mut booth).await;
    assert_eq!(ticks, vec![5, 4, 3, 2, 1]);
    let BoothEvent::Captured { capture } = event else {
        panic!("expected capture, got {:?}", event);
    };
    assert_eq!((capture.width, capture.height), (1920, 1080));
    assert_eq!(capture.overlay_id, "kana-frame.png");
    assert_eq!(booth.state().countdown(), 0);
    assert_eq!(booth.state().phase(), BoothPhase::Idle);

    let captured = booth.captured().unwrap();
    assert_eq!(captured.digest(), capture.digest);
    let pixels = captured.image().decode().unwrap();
    assert_eq!(pixels.dimensions(), (1920, 1080));
    // Overlay border on top
    assert_eq!(pixels.get_pixel(0, 0), &PINK);
    // 4:3 frame pillarboxed to 1440 px wide, centered
    assert_eq!(pixels.get_pixel(960, 540), &Rgba([10, 200, 10, 255]));
    assert_eq!(pixels.get_pixel(100, 540).0[3], 0);
    assert_eq!(pixels.get_pixel(1820, 540).0[3], 0);
}

#[tokio::test(start_paused = true)]
async fn test_restart_mid_countdown_captures_once() {
    let mut booth = booth(small_config());
    booth.open_camera(None).unwrap();

    booth.start_countdown().unwrap();
    assert_eq!(
        booth.next_event().await,
        Some(BoothEvent::CountdownTick { remaining: 3 })
    );
    assert_eq!(
        booth.next_event().await,
        Some(BoothEvent::CountdownTick { remaining: 2 })
    );

    booth.start_countdown().unwrap();
    let (ticks, event) = run_to_capture(&mut booth).await;
    assert_eq!(ticks, vec![3, 2, 1]);
    assert!(matches!(event, BoothEvent::Captured { .. }));

    // Nothing else arrives, even after the old run would have elapsed
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(booth.next_event().await, None);
    assert_eq!(booth.state().phase(), BoothPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_countdown_never_captures() {
    let mut booth = booth(small_config());
    booth.open_camera(None).unwrap();
    booth.start_countdown().unwrap();
    assert_eq!(
        booth.next_event().await,
        Some(BoothEvent::CountdownTick { remaining: 3 })
    );

    booth.cancel_countdown();
    assert_eq!(booth.state().phase(), BoothPhase::Idle);

    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(booth.next_event().await, None);
    assert!(booth.captured().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_next_event_returns_none_when_idle() {
    let mut booth = booth(small_config());
    booth.open_camera(None).unwrap();

    let idle = tokio::time::timeout(Duration::from_secs(3600), booth.next_event()).await;
    assert!(matches!(idle, Ok(None)));

    // Looping until the stream of events ends terminates after the capture
    booth.start_countdown().unwrap();
    let mut events = Vec::new();
    while let Some(event) = booth.next_event().await {
        events.push(event);
    }
    assert_eq!(events.len(), 4);
    assert!(matches!(events[3], BoothEvent::Captured { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_zero_countdown_captures_immediately() {
    let config = BoothConfig {
        countdown_secs: 0,
        ..small_config()
    };
    let mut booth = booth(config);
    booth.open_camera(None).unwrap();
    booth.start_countdown().unwrap();

    let (ticks, event) = run_to_capture(&mut booth).await;
    assert!(ticks.is_empty());
    assert!(matches!(event, BoothEvent::Captured { .. }));
}

#[tokio::test]
async fn test_countdown_requires_camera() {
    let mut booth = booth(small_config());
    assert!(matches!(
        booth.start_countdown(),
        Err(PhotoboothError::NoActiveStream)
    ));
    assert!(matches!(
        booth.capture_now().await,
        Err(PhotoboothError::NoActiveStream)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_missing_overlay_fails_capture() {
    let mut booth = booth(small_config());
    booth.open_camera(None).unwrap();
    booth.select_overlay("missing-frame.png").unwrap();
    booth.start_countdown().unwrap();

    let (_, event) = run_to_capture(&mut booth).await;
    let BoothEvent::CaptureFailed { message } = event else {
        panic!("expected failure, got {:?}", event);
    };
    assert!(message.contains("missing-frame.png"));
    assert!(booth.captured().is_none());
    assert_eq!(booth.state().last_error(), Some(message.as_str()));
    assert_eq!(booth.state().phase(), BoothPhase::Idle);
}

#[tokio::test]
async fn test_only_latest_capture_is_kept() {
    let mut booth = booth(small_config());
    booth.open_camera(None).unwrap();

    let first = booth.capture_now().await.unwrap();
    assert_eq!(booth.next_overlay(), "sakura-frame.png");
    let second = booth.capture_now().await.unwrap();

    assert_ne!(first.id, second.id);
    assert_ne!(first.digest, second.digest);
    assert_eq!(booth.captured().unwrap().id(), second.id);
    assert_eq!(booth.captured().unwrap().overlay_id(), "sakura-frame.png");

    // A failed shot keeps the previous photo
    booth.next_overlay();
    assert!(booth.capture_now().await.is_err());
    assert_eq!(booth.captured().unwrap().id(), second.id);
    assert!(booth.state().last_error().is_some());
}

#[tokio::test]
async fn test_same_frame_and_overlay_is_deterministic() {
    let mut booth = booth(small_config());
    booth.open_camera(None).unwrap();
    let a = booth.capture_now().await.unwrap();
    let b = booth.capture_now().await.unwrap();
    assert_eq!(a.digest, b.digest);
    assert_ne!(a.id, b.id);
}

#[tokio::test]
async fn test_switch_camera_stops_previous_tracks() {
    let mut booth = booth(small_config());
    booth.open_camera(Some("front")).unwrap();
    let front_tracks = booth.media().active().unwrap().tracks().to_vec();

    let device = booth.switch_camera("back").unwrap();
    assert_eq!(device.id, "back");
    assert_eq!(booth.state().selected_device(), Some("back"));
    assert!(front_tracks.iter().all(|t| !t.is_live()));
    assert_eq!(booth.media().backend().live_sources(), 1);

    // Captures now come from the new camera
    let capture = booth.capture_now().await.unwrap();
    assert_eq!((capture.width, capture.height), (64, 36));

    booth.shutdown();
    assert!(booth.media().active().is_none());
    assert_eq!(booth.media().backend().live_sources(), 0);
}

#[test]
fn test_failed_switch_clears_selected_device() {
    let camera = camera().with_failing_device("back");
    let mut booth = Photobooth::new(camera, small_config()).unwrap();
    booth.open_camera(Some("front")).unwrap();
    assert_eq!(booth.state().selected_device(), Some("front"));

    assert!(booth.switch_camera("back").is_err());
    assert!(booth.media().active().is_none());
    assert_eq!(booth.state().selected_device(), None);
    assert!(booth.state().last_error().is_some());
    assert_eq!(booth.media().backend().live_sources(), 0);
}

#[test]
fn test_denied_permission_reports_alert() {
    let camera = camera().with_permission(PermissionStatus::Denied);
    let mut booth = Photobooth::new(camera, small_config()).unwrap();

    let err = booth.open_camera(None).unwrap_err();
    assert!(err.is_camera_error());
    let alert = booth.state().last_error().unwrap();
    assert!(alert.contains("blocked"));
    assert!(booth.media().active().is_none());
}

#[test]
fn test_failing_device_reports_alert() {
    let camera = camera().with_failing_device("front");
    let mut booth = Photobooth::new(camera, small_config()).unwrap();
    assert!(booth.open_camera(Some("front")).is_err());
    assert!(booth
        .state()
        .last_error()
        .unwrap()
        .contains("Unable to access the camera"));

    // Recovering on another device clears the alert
    booth.open_camera(Some("back")).unwrap();
    assert!(booth.state().last_error().is_none());
}

#[tokio::test]
async fn test_preview_and_download() {
    let mut booth = booth(small_config());
    let dir = tempfile::tempdir().unwrap();
    assert!(booth.preview_source().is_none());
    assert!(matches!(
        booth.download(Some(dir.path())),
        Err(PhotoboothError::NothingCaptured)
    ));

    booth.open_camera(None).unwrap();
    booth.capture_now().await.unwrap();

    let preview = booth.preview_source().unwrap();
    assert!(preview.starts_with("data:image/png;base64,"));

    let path = booth.download(Some(dir.path())).unwrap();
    assert_eq!(path.file_name().unwrap(), "captured-photo.png");
    assert_eq!(
        std::fs::read(&path).unwrap(),
        booth.captured().unwrap().image().png
    );
}

#[test]
fn test_event_serialization() {
    let json = serde_json::to_value(BoothEvent::CountdownTick { remaining: 4 }).unwrap();
    assert_eq!(json["type"], "countdownTick");
    assert_eq!(json["remaining"], 4);

    let json = serde_json::to_value(BoothEvent::CaptureFailed {
        message: "nope".to_string(),
    })
    .unwrap();
    assert_eq!(json["type"], "captureFailed");
}
