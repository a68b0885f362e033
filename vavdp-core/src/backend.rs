// BACKEND - Decode/Present Library Contract
//
// The driver never talks to VDPAU directly. Every GPU-side operation goes
// through the `Backend` trait, and the only windowing query goes through
// `DrawableProvider`. The production implementations live in vdpau.rs and
// x11.rs; tests plug in mock.rs.
//
// Handles returned by a backend are opaque u32 values passed through
// unchanged, mirroring VDPAU's own object model.

use bytes::Bytes;
use libc::c_ulong;
use thiserror::Error;

// ============================================================================
// VDPAU Types (from vdpau/vdpau.h)
// ============================================================================

pub type VdpStatus = u32;
pub type VdpChromaType = u32;
pub type VdpDecoderProfile = u32;
pub type VdpYCbCrFormat = u32;
pub type VdpRGBAFormat = u32;
pub type VdpVideoSurface = u32;
pub type VdpOutputSurface = u32;
pub type VdpDecoder = u32;
pub type VdpVideoMixer = u32;
pub type VdpPresentationQueue = u32;
pub type VdpPresentationQueueTarget = u32;
pub type VdpBool = i32;

/// X11 window id.
pub type Drawable = c_ulong;

pub const VDP_STATUS_OK: VdpStatus = 0;
pub const VDP_STATUS_ERROR: VdpStatus = 25;
pub const VDP_INVALID_HANDLE: u32 = 0xffff_ffff;

pub const VDP_CHROMA_TYPE_420: VdpChromaType = 0;
pub const VDP_CHROMA_TYPE_422: VdpChromaType = 1;
pub const VDP_CHROMA_TYPE_444: VdpChromaType = 2;

pub const VDP_DECODER_PROFILE_H264_BASELINE: VdpDecoderProfile = 6;
pub const VDP_DECODER_PROFILE_H264_MAIN: VdpDecoderProfile = 7;
pub const VDP_DECODER_PROFILE_H264_HIGH: VdpDecoderProfile = 8;

pub const VDP_YCBCR_FORMAT_NV12: VdpYCbCrFormat = 0;
pub const VDP_YCBCR_FORMAT_YV12: VdpYCbCrFormat = 1;

pub const VDP_RGBA_FORMAT_B8G8R8A8: VdpRGBAFormat = 0;

/// `VdpRect`: x1/y1 are exclusive.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VdpRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl VdpRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x + width,
            y1: y + height,
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Zeroable)]
pub struct VdpReferenceFrameH264 {
    pub surface: VdpVideoSurface,
    pub is_long_term: VdpBool,
    pub top_is_reference: VdpBool,
    pub bottom_is_reference: VdpBool,
    pub field_order_cnt: [i32; 2],
    pub frame_idx: u16,
}

impl VdpReferenceFrameH264 {
    pub fn unused() -> Self {
        Self {
            surface: VDP_INVALID_HANDLE,
            ..bytemuck::Zeroable::zeroed()
        }
    }
}

/// `VdpPictureInfoH264`, the accumulated per-picture decode parameters.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Zeroable)]
pub struct VdpPictureInfoH264 {
    pub slice_count: u32,
    pub field_order_cnt: [i32; 2],
    pub is_reference: VdpBool,
    pub frame_num: u16,
    pub field_pic_flag: u8,
    pub bottom_field_flag: u8,
    pub num_ref_frames: u8,
    pub mb_adaptive_frame_field_flag: u8,
    pub constrained_intra_pred_flag: u8,
    pub weighted_pred_flag: u8,
    pub weighted_bipred_idc: u8,
    pub frame_mbs_only_flag: u8,
    pub transform_8x8_mode_flag: u8,
    pub chroma_qp_index_offset: i8,
    pub second_chroma_qp_index_offset: i8,
    pub pic_init_qp_minus26: i8,
    pub num_ref_idx_l0_active_minus1: u8,
    pub num_ref_idx_l1_active_minus1: u8,
    pub log2_max_frame_num_minus4: u8,
    pub pic_order_cnt_type: u8,
    pub log2_max_pic_order_cnt_lsb_minus4: u8,
    pub delta_pic_order_always_zero_flag: u8,
    pub direct_8x8_inference_flag: u8,
    pub entropy_coding_mode_flag: u8,
    pub pic_order_present_flag: u8,
    pub deblocking_filter_control_present_flag: u8,
    pub redundant_pic_cnt_present_flag: u8,
    pub scaling_lists_4x4: [[u8; 16]; 6],
    pub scaling_lists_8x8: [[u8; 64]; 2],
    pub reference_frames: [VdpReferenceFrameH264; 16],
}

impl Default for VdpPictureInfoH264 {
    fn default() -> Self {
        Self {
            reference_frames: [VdpReferenceFrameH264::unused(); 16],
            ..bytemuck::Zeroable::zeroed()
        }
    }
}

/// Decoder limits reported by the hardware for one profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DecoderCaps {
    pub supported: bool,
    pub max_level: u32,
    pub max_macroblocks: u32,
    pub max_width: u32,
    pub max_height: u32,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("{call} failed with VdpStatus {status}")]
    Call { call: &'static str, status: VdpStatus },
    #[error("{0} is not available on this device")]
    Missing(&'static str),
    #[error("drawable {0:#x} has no geometry")]
    NoGeometry(Drawable),
}

impl BackendError {
    pub fn call(call: &'static str, status: VdpStatus) -> Self {
        Self::Call { call, status }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

// ============================================================================
// Traits
// ============================================================================

/// GPU decode and presentation operations the driver needs.
pub trait Backend: Send {
    fn information_string(&self) -> String;

    fn decoder_query_capabilities(&self, profile: VdpDecoderProfile) -> BackendResult<DecoderCaps>;
    fn decoder_create(
        &self,
        profile: VdpDecoderProfile,
        width: u32,
        height: u32,
        max_references: u32,
    ) -> BackendResult<VdpDecoder>;
    fn decoder_destroy(&self, decoder: VdpDecoder) -> BackendResult<()>;
    fn decoder_render(
        &self,
        decoder: VdpDecoder,
        target: VdpVideoSurface,
        info: &VdpPictureInfoH264,
        bitstream: &[Bytes],
    ) -> BackendResult<()>;

    fn video_surface_create(&self, chroma: VdpChromaType, width: u32, height: u32) -> BackendResult<VdpVideoSurface>;
    fn video_surface_destroy(&self, surface: VdpVideoSurface) -> BackendResult<()>;
    /// Read back the surface as YCbCr planes, one destination slice per plane.
    fn video_surface_get_bits(
        &self,
        surface: VdpVideoSurface,
        format: VdpYCbCrFormat,
        planes: &mut [&mut [u8]],
        pitches: &[u32],
    ) -> BackendResult<()>;

    fn video_mixer_create(&self, width: u32, height: u32, chroma: VdpChromaType) -> BackendResult<VdpVideoMixer>;
    fn video_mixer_destroy(&self, mixer: VdpVideoMixer) -> BackendResult<()>;
    fn video_mixer_render(
        &self,
        mixer: VdpVideoMixer,
        source: VdpVideoSurface,
        source_rect: Option<VdpRect>,
        destination: VdpOutputSurface,
        destination_rect: Option<VdpRect>,
    ) -> BackendResult<()>;

    fn output_surface_create(&self, format: VdpRGBAFormat, width: u32, height: u32) -> BackendResult<VdpOutputSurface>;
    fn output_surface_destroy(&self, surface: VdpOutputSurface) -> BackendResult<()>;

    fn presentation_queue_target_create(&self, drawable: Drawable) -> BackendResult<VdpPresentationQueueTarget>;
    fn presentation_queue_target_destroy(&self, target: VdpPresentationQueueTarget) -> BackendResult<()>;
    fn presentation_queue_create(&self, target: VdpPresentationQueueTarget) -> BackendResult<VdpPresentationQueue>;
    fn presentation_queue_destroy(&self, queue: VdpPresentationQueue) -> BackendResult<()>;
    fn presentation_queue_display(
        &self,
        queue: VdpPresentationQueue,
        surface: VdpOutputSurface,
        clip_width: u32,
        clip_height: u32,
    ) -> BackendResult<()>;
    /// Blocks until `surface` is no longer queued or on screen.
    fn presentation_queue_block_until_idle(
        &self,
        queue: VdpPresentationQueue,
        surface: VdpOutputSurface,
    ) -> BackendResult<()>;
}

/// Window-system oracle for drawable geometry.
pub trait DrawableProvider: Send {
    fn drawable_size(&self, drawable: Drawable) -> BackendResult<(u32, u32)>;
}
