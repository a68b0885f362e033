// CAPS - Capability & Format Translation
//
// Static mapping between the VA vocabulary (profiles, entrypoints, RT formats,
// fourccs) and the VDPAU one. Everything here is a pure lookup; hardware
// limits are asked of the backend by the driver, not here.

use crate::backend::*;
use crate::error::VaError;
use crate::va::*;

pub const COMMERCIAL_NAME: &str = "VAVDP";
pub const VENDOR: &str = "VAVDP Project";

/// Upper bound of the reference list handed to the hardware decoder.
pub const MAX_REFERENCE_FRAMES: u32 = 16;

/// H.264 profiles the driver can expose, in reporting order.
pub const H264_PROFILES: [VAProfile; 3] = [
    VA_PROFILE_H264_CONSTRAINED_BASELINE,
    VA_PROFILE_H264_MAIN,
    VA_PROFILE_H264_HIGH,
];

// ============================================================================
// Profiles / Entrypoints
// ============================================================================

pub fn vdp_decoder_profile(profile: VAProfile) -> Result<VdpDecoderProfile, VaError> {
    match profile {
        VA_PROFILE_H264_CONSTRAINED_BASELINE => Ok(VDP_DECODER_PROFILE_H264_BASELINE),
        VA_PROFILE_H264_MAIN => Ok(VDP_DECODER_PROFILE_H264_MAIN),
        VA_PROFILE_H264_HIGH => Ok(VDP_DECODER_PROFILE_H264_HIGH),
        _ => Err(VaError::UnsupportedProfile),
    }
}

pub fn supported_profiles() -> &'static [VAProfile] {
    &H264_PROFILES
}

pub fn check_entrypoint(entrypoint: VAEntrypoint) -> Result<(), VaError> {
    if entrypoint == VA_ENTRYPOINT_VLD {
        Ok(())
    } else {
        Err(VaError::UnsupportedEntrypoint)
    }
}

/// Entrypoints reported for `profile`. Empty for anything that is not H.264.
pub fn entrypoints_for(profile: VAProfile) -> Vec<VAEntrypoint> {
    if vdp_decoder_profile(profile).is_ok() {
        vec![VA_ENTRYPOINT_VLD]
    } else {
        Vec::new()
    }
}

// ============================================================================
// Formats
// ============================================================================

pub fn vdp_chroma_type(rt_format: u32) -> Result<VdpChromaType, VaError> {
    match rt_format {
        VA_RT_FORMAT_YUV420 => Ok(VDP_CHROMA_TYPE_420),
        _ => Err(VaError::UnsupportedRtFormat),
    }
}

pub fn vdp_ycbcr_format(fourcc: u32) -> Result<VdpYCbCrFormat, VaError> {
    match fourcc {
        VA_FOURCC_NV12 => Ok(VDP_YCBCR_FORMAT_NV12),
        _ => Err(VaError::InvalidImageFormat),
    }
}

pub fn nv12_image_format() -> VAImageFormat {
    VAImageFormat {
        fourcc: VA_FOURCC_NV12,
        byte_order: VA_LSB_FIRST,
        bits_per_pixel: 12,
        ..Default::default()
    }
}

pub fn supported_image_formats() -> Vec<VAImageFormat> {
    vec![nv12_image_format()]
}

/// Value of a config attribute as reported by GetConfigAttributes
pub fn config_attribute_value(attrib_type: i32) -> u32 {
    match attrib_type {
        VA_CONFIG_ATTRIB_RT_FORMAT => VA_RT_FORMAT_YUV420,
        _ => VA_ATTRIB_NOT_SUPPORTED,
    }
}

// ============================================================================
// Vendor
// ============================================================================

pub fn vendor_string() -> String {
    format!(
        "{} ({}) - {}.{}.{}",
        COMMERCIAL_NAME,
        VENDOR,
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    )
}
