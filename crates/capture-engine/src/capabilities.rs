//! Runtime capability detection and guidance.
//!
//! Recording needs GStreamer, a handful of plugins, and a camera. The
//! live preview additionally needs a display.

use crate::pipeline::{
    detect_video_devices, element_available, init_gstreamer, muxer_for_extension, VideoCodec,
};

/// Elements every session uses, independent of codec and container.
const CORE_ELEMENTS: &[&str] = &["appsrc", "appsink", "videoconvert", "filesink", "queue"];

const PREVIEW_ELEMENTS: &[&str] = &["autovideosink", "textoverlay"];

/// A system capability that recording may need.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

/// Check all capabilities for the given codec tag and container extension.
pub fn check_capabilities(fourcc: &str, extension: &str) -> Vec<Capability> {
    let gstreamer = check_gstreamer();
    if !gstreamer.available {
        return vec![gstreamer];
    }

    vec![
        gstreamer,
        check_elements("Core Elements", "Frame transfer and conversion", CORE_ELEMENTS, true),
        check_encoder(fourcc, extension),
        check_elements(
            "Preview Elements",
            "Live preview window with caption overlay",
            PREVIEW_ELEMENTS,
            false,
        ),
        check_camera_source(),
        check_webcam_access(),
        check_display(),
    ]
}

fn check_gstreamer() -> Capability {
    let result = init_gstreamer();
    Capability {
        name: "GStreamer".to_string(),
        description: "Multimedia framework for capture, preview, and encoding".to_string(),
        available: result.is_ok(),
        required: true,
        fix_instructions: result.err().map(|e| {
            format!("{e}. Install GStreamer: sudo apt install gstreamer1.0-tools gstreamer1.0-plugins-base")
        }),
    }
}

fn check_elements(name: &str, description: &str, elements: &[&str], required: bool) -> Capability {
    let missing: Vec<&str> = elements
        .iter()
        .copied()
        .filter(|element| !element_available(element))
        .collect();

    Capability {
        name: name.to_string(),
        description: format!("{description} ({})", elements.join(", ")),
        available: missing.is_empty(),
        required,
        fix_instructions: if missing.is_empty() {
            None
        } else {
            Some(format!(
                "Missing {}. Install gstreamer1.0-plugins-base and gstreamer1.0-plugins-good",
                missing.join(", ")
            ))
        },
    }
}

fn check_encoder(fourcc: &str, extension: &str) -> Capability {
    let name = format!("{} Encoder", fourcc.to_ascii_uppercase());
    let codec = match VideoCodec::from_fourcc(fourcc) {
        Ok(codec) => codec,
        Err(e) => {
            return Capability {
                name,
                description: "Output video codec".to_string(),
                available: false,
                required: true,
                fix_instructions: Some(e.to_string()),
            }
        }
    };
    let muxer = match muxer_for_extension(extension) {
        Ok(muxer) => muxer,
        Err(e) => {
            return Capability {
                name,
                description: "Output container".to_string(),
                available: false,
                required: true,
                fix_instructions: Some(e.to_string()),
            }
        }
    };

    let mut elements = codec.element_names().to_vec();
    elements.push(muxer);
    let mut capability = check_elements(
        &name,
        &format!("Output codec and .{} container", extension.trim_start_matches('.')),
        &elements,
        true,
    );
    if !capability.available {
        capability.fix_instructions = Some(
            "Install encoders: sudo apt install gstreamer1.0-libav gstreamer1.0-plugins-good gstreamer1.0-plugins-ugly"
                .to_string(),
        );
    }
    capability
}

fn check_camera_source() -> Capability {
    let source = if cfg!(target_os = "linux") {
        "v4l2src"
    } else if cfg!(target_os = "macos") {
        "avfvideosrc"
    } else if cfg!(target_os = "windows") {
        "mfvideosrc"
    } else {
        "autovideosrc"
    };
    let mut capability = check_elements("Camera Source", "Platform camera element", &[source], true);
    if !capability.available {
        capability.fix_instructions =
            Some(format!("Install the GStreamer plugin providing {source}"));
    }
    capability
}

/// Check if a webcam device is available.
fn check_webcam_access() -> Capability {
    if !cfg!(target_os = "linux") {
        return Capability {
            name: "Webcam Device".to_string(),
            description: "Camera enumeration is only performed on Linux".to_string(),
            available: true,
            required: true,
            fix_instructions: None,
        };
    }

    let devices = detect_video_devices();
    let description = if devices.is_empty() {
        "Video4Linux capture device".to_string()
    } else {
        devices
            .iter()
            .map(|device| match device.name.as_str() {
                "" => device.path.clone(),
                name => format!("{} ({name})", device.path),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    Capability {
        name: "Webcam Device".to_string(),
        description,
        available: !devices.is_empty(),
        required: true,
        fix_instructions: if devices.is_empty() {
            Some(
                "Connect a webcam and verify /dev/video* exists (v4l2-ctl --list-devices), or use --synthetic"
                    .to_string(),
            )
        } else {
            None
        },
    }
}

fn check_display() -> Capability {
    let available = !cfg!(target_os = "linux")
        || std::env::var("WAYLAND_DISPLAY").is_ok()
        || std::env::var("DISPLAY").is_ok();

    Capability {
        name: "Display".to_string(),
        description: "Graphical session for the preview windows".to_string(),
        available,
        required: false,
        fix_instructions: if available {
            None
        } else {
            Some("Run inside a graphical session, or pass --no-preview".to_string())
        },
    }
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("Tenet System Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}

/// Whether every required capability is present.
pub fn all_required_available(capabilities: &[Capability]) -> bool {
    capabilities
        .iter()
        .all(|cap| cap.available || !cap.required)
}
