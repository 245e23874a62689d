use photobooth::{CameraBackend, MediaSource, NativeCamera};

fn main() {
    println!("=== Camera Permission ===\n");

    let mut media = MediaSource::new(NativeCamera::new());
    println!("  status: {:?}", media.backend().permission_status());

    println!("\n=== Video Input Devices (nokhwa) ===\n");

    match media.devices() {
        Ok(devices) if devices.is_empty() => println!("No cameras detected"),
        Ok(devices) => {
            for (i, device) in devices.iter().enumerate() {
                println!("Device {}:", i);
                println!("  id: {}", device.id);
                println!("  label: {}", device.label);
                if let Some(description) = &device.description {
                    println!("  description: {}", description);
                }
                println!();
            }
        },
        Err(e) => println!("{}", e.user_message()),
    }
}
