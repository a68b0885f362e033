//! # VAVDP Probe
//!
//! Opens the X display, brings up the VDPAU backend and prints what a VA-API
//! client would see from this driver, as JSON.
//!
//! ## Usage
//! ```bash
//! vavdp-probe
//!
//! # Alternate libvdpau, debug logging
//! VAVDP_LIBVDPAU=/opt/vdpau/libvdpau.so.1 RUST_LOG=vavdp=debug vavdp-probe
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::io;
use tracing::{info, warn};
use vavdp_core::va::*;
use vavdp_core::vdpau::VdpauBackend;
use vavdp_core::x11::XlibDisplay;
use vavdp_core::{Driver, DriverLimits, DriverOptions};

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Serialize)]
struct Report {
    vendor: String,
    version: &'static str,
    backend: String,
    options: DriverOptions,
    limits: DriverLimits,
    profiles: Vec<ProfileReport>,
    image_formats: Vec<ImageFormatReport>,
}

#[derive(Debug, Serialize)]
struct ProfileReport {
    profile: VAProfile,
    name: &'static str,
    entrypoints: Vec<VAEntrypoint>,
    max_width: u32,
    max_height: u32,
    surface_attributes: Vec<SurfaceAttributeReport>,
}

#[derive(Debug, Serialize)]
struct ImageFormatReport {
    fourcc: String,
    bits_per_pixel: u32,
}

#[derive(Debug, Serialize)]
struct SurfaceAttributeReport {
    attrib_type: i32,
    gettable: bool,
    settable: bool,
    value: u32,
}

fn profile_name(profile: VAProfile) -> &'static str {
    match profile {
        VA_PROFILE_H264_CONSTRAINED_BASELINE => "H264ConstrainedBaseline",
        VA_PROFILE_H264_MAIN => "H264Main",
        VA_PROFILE_H264_HIGH => "H264High",
        _ => "Unknown",
    }
}

fn fourcc_string(fourcc: u32) -> String {
    fourcc.to_le_bytes().iter().map(|&b| b as char).collect()
}

fn probe_profile(driver: &mut Driver, profile: VAProfile) -> Result<ProfileReport> {
    let entrypoints = driver.query_config_entrypoints(profile)?;
    let config = driver.create_config(profile, VA_ENTRYPOINT_VLD, &[])?;

    let count = driver.query_surface_attributes(config, None)?;
    let mut attribs = vec![VASurfaceAttrib::default(); count];
    driver.query_surface_attributes(config, Some(&mut attribs))?;

    let find = |kind| attribs.iter().find(|a| a.attrib_type == kind).map_or(0, |a| a.value);
    let (max_width, max_height) = (find(VA_SURFACE_ATTRIB_MAX_WIDTH), find(VA_SURFACE_ATTRIB_MAX_HEIGHT));

    let surface_attributes = attribs
        .iter()
        .map(|a| SurfaceAttributeReport {
            attrib_type: a.attrib_type,
            gettable: a.flags & VA_SURFACE_ATTRIB_GETTABLE != 0,
            settable: a.flags & VA_SURFACE_ATTRIB_SETTABLE != 0,
            value: a.value,
        })
        .collect();

    driver.destroy_config(config)?;
    Ok(ProfileReport {
        profile,
        name: profile_name(profile),
        entrypoints,
        max_width,
        max_height,
        surface_attributes,
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vavdp=info")),
        )
        .with_writer(io::stderr)
        .init();

    info!("VAVDP Probe v{} starting...", vavdp_core::VERSION);

    let options = DriverOptions::from_env();
    let display = XlibDisplay::open(None).context("X display unavailable")?;

    // SAFETY: the display moves into the driver after the backend, so it is
    // closed only after the device is destroyed.
    let backend = unsafe { VdpauBackend::open_x11(&options.vdpau_library, display.raw(), display.screen()) }
        .with_context(|| format!("Cannot open VDPAU through {}", options.vdpau_library))?;

    let mut driver = Driver::new(Box::new(backend), Box::new(display), options);

    let mut profiles = Vec::new();
    for profile in driver.query_config_profiles()? {
        match probe_profile(&mut driver, profile) {
            Ok(report) => profiles.push(report),
            Err(e) => warn!("Profile {} ({}) skipped: {:#}", profile, profile_name(profile), e),
        }
    }

    let report = Report {
        vendor: driver.vendor().to_string(),
        version: vavdp_core::VERSION,
        backend: driver.backend_information(),
        options: driver.options().clone(),
        limits: driver.limits(),
        profiles,
        image_formats: driver
            .query_image_formats()
            .iter()
            .map(|f| ImageFormatReport {
                fourcc: fourcc_string(f.fourcc),
                bits_per_pixel: f.bits_per_pixel,
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    driver.terminate()?;
    Ok(())
}
