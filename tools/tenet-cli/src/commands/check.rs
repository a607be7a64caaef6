//! Check system capabilities.

use tenet_capture_engine::capabilities::{
    all_required_available, check_capabilities, print_capability_report,
};
use tenet_capture_engine::pipeline::detect_video_devices;
use tenet_common::config::AppConfig;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Tenet System Check");
    println!("{}", "=".repeat(50));

    let devices = detect_video_devices();
    println!("{}", device_status_line(devices.len()));
    for device in &devices {
        println!("     {} {}", device.path, device.name);
    }

    let recording = &config.recording;
    let capabilities = check_capabilities(&recording.fourcc, &recording.container_extension);
    println!();
    print_capability_report(&capabilities);

    println!();
    if all_required_available(&capabilities) {
        println!("All required capabilities are available. Tenet is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}

fn device_status_line(count: usize) -> String {
    let status = if count == 0 { "MISSING" } else { "OK" };
    format!("[{status}] Video devices detected: {count}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_devices_is_reported_missing() {
        assert_eq!(device_status_line(0), "[MISSING] Video devices detected: 0");
        assert_eq!(device_status_line(2), "[OK] Video devices detected: 2");
    }
}
