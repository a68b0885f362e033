// VA - Front-end ABI types (from va/va.h)
//
// Everything the VA-API caller hands us, as it appears in memory: status codes,
// profile/entrypoint/buffer-type enums, surface attribute tags, and the H.264
// parameter buffer layouts. Parameter buffers arrive as raw bytes and are
// viewed through the `Pod` structs below, so every struct here carries its
// C padding as explicit fields.

use bytemuck::{Pod, Zeroable};
use libc::{c_int, c_uint};

// ============================================================================
// Scalar Types
// ============================================================================

pub type VAStatus = c_int;
pub type VAProfile = c_int;
pub type VAEntrypoint = c_int;
pub type VABufferType = c_int;
pub type VAGenericID = c_uint;

pub const VA_INVALID_ID: VAGenericID = 0xffff_ffff;
pub const VA_INVALID_SURFACE: VAGenericID = VA_INVALID_ID;

// ============================================================================
// Status Codes
// ============================================================================

pub const VA_STATUS_SUCCESS: VAStatus = 0x00;
pub const VA_STATUS_ERROR_OPERATION_FAILED: VAStatus = 0x01;
pub const VA_STATUS_ERROR_ALLOCATION_FAILED: VAStatus = 0x02;
pub const VA_STATUS_ERROR_INVALID_DISPLAY: VAStatus = 0x03;
pub const VA_STATUS_ERROR_INVALID_CONFIG: VAStatus = 0x04;
pub const VA_STATUS_ERROR_INVALID_CONTEXT: VAStatus = 0x05;
pub const VA_STATUS_ERROR_INVALID_SURFACE: VAStatus = 0x06;
pub const VA_STATUS_ERROR_INVALID_BUFFER: VAStatus = 0x07;
pub const VA_STATUS_ERROR_INVALID_IMAGE: VAStatus = 0x08;
pub const VA_STATUS_ERROR_INVALID_SUBPICTURE: VAStatus = 0x09;
pub const VA_STATUS_ERROR_ATTR_NOT_SUPPORTED: VAStatus = 0x0a;
pub const VA_STATUS_ERROR_MAX_NUM_EXCEEDED: VAStatus = 0x0b;
pub const VA_STATUS_ERROR_UNSUPPORTED_PROFILE: VAStatus = 0x0c;
pub const VA_STATUS_ERROR_UNSUPPORTED_ENTRYPOINT: VAStatus = 0x0d;
pub const VA_STATUS_ERROR_UNSUPPORTED_RT_FORMAT: VAStatus = 0x0e;
pub const VA_STATUS_ERROR_UNSUPPORTED_BUFFERTYPE: VAStatus = 0x0f;
pub const VA_STATUS_ERROR_SURFACE_BUSY: VAStatus = 0x10;
pub const VA_STATUS_ERROR_FLAG_NOT_SUPPORTED: VAStatus = 0x11;
pub const VA_STATUS_ERROR_INVALID_PARAMETER: VAStatus = 0x12;
pub const VA_STATUS_ERROR_RESOLUTION_NOT_SUPPORTED: VAStatus = 0x13;
pub const VA_STATUS_ERROR_UNIMPLEMENTED: VAStatus = 0x14;
pub const VA_STATUS_ERROR_SURFACE_IN_DISPLAYING: VAStatus = 0x15;
pub const VA_STATUS_ERROR_INVALID_IMAGE_FORMAT: VAStatus = 0x16;
pub const VA_STATUS_ERROR_DECODING_ERROR: VAStatus = 0x17;
pub const VA_STATUS_ERROR_INVALID_VALUE: VAStatus = 0x19;
pub const VA_STATUS_ERROR_UNKNOWN: VAStatus = -1; // 0xFFFFFFFF

// ============================================================================
// Profiles / Entrypoints
// ============================================================================

pub const VA_PROFILE_NONE: VAProfile = -1;
pub const VA_PROFILE_MPEG2_SIMPLE: VAProfile = 0;
pub const VA_PROFILE_MPEG2_MAIN: VAProfile = 1;
pub const VA_PROFILE_MPEG4_SIMPLE: VAProfile = 2;
pub const VA_PROFILE_H264_BASELINE: VAProfile = 5; // deprecated upstream
pub const VA_PROFILE_H264_MAIN: VAProfile = 6;
pub const VA_PROFILE_H264_HIGH: VAProfile = 7;
pub const VA_PROFILE_VC1_ADVANCED: VAProfile = 10;
pub const VA_PROFILE_JPEG_BASELINE: VAProfile = 12;
pub const VA_PROFILE_H264_CONSTRAINED_BASELINE: VAProfile = 13;
pub const VA_PROFILE_VP8_VERSION0_3: VAProfile = 14;
pub const VA_PROFILE_H264_MULTIVIEW_HIGH: VAProfile = 15;
pub const VA_PROFILE_H264_STEREO_HIGH: VAProfile = 16;
pub const VA_PROFILE_HEVC_MAIN: VAProfile = 17;
pub const VA_PROFILE_HEVC_MAIN10: VAProfile = 18;
pub const VA_PROFILE_VP9_PROFILE0: VAProfile = 19;
pub const VA_PROFILE_AV1_PROFILE0: VAProfile = 32;

pub const VA_ENTRYPOINT_VLD: VAEntrypoint = 1;
pub const VA_ENTRYPOINT_IZZ: VAEntrypoint = 2;
pub const VA_ENTRYPOINT_IDCT: VAEntrypoint = 3;
pub const VA_ENTRYPOINT_MO_COMP: VAEntrypoint = 4;
pub const VA_ENTRYPOINT_DEBLOCKING: VAEntrypoint = 5;
pub const VA_ENTRYPOINT_ENC_SLICE: VAEntrypoint = 6;
pub const VA_ENTRYPOINT_ENC_PICTURE: VAEntrypoint = 7;
pub const VA_ENTRYPOINT_ENC_SLICE_LP: VAEntrypoint = 8;
pub const VA_ENTRYPOINT_VIDEO_PROC: VAEntrypoint = 10;

// ============================================================================
// Config Attributes / RT Formats
// ============================================================================

pub const VA_CONFIG_ATTRIB_RT_FORMAT: c_int = 0;
pub const VA_CONFIG_ATTRIB_DECODER_SLICE_MODE: c_int = 6;
pub const VA_ATTRIB_NOT_SUPPORTED: c_uint = 0x8000_0000;

pub const VA_RT_FORMAT_YUV420: c_uint = 0x0000_0001;
pub const VA_RT_FORMAT_YUV422: c_uint = 0x0000_0002;
pub const VA_RT_FORMAT_YUV444: c_uint = 0x0000_0004;
pub const VA_RT_FORMAT_YUV400: c_uint = 0x0000_0010;
pub const VA_RT_FORMAT_YUV420_10: c_uint = 0x0000_0100;
pub const VA_RT_FORMAT_RGB32: c_uint = 0x0002_0000;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VAConfigAttrib {
    pub attrib_type: c_int,
    pub value: c_uint,
}

impl VAConfigAttrib {
    pub fn new(attrib_type: c_int, value: c_uint) -> Self {
        Self { attrib_type, value }
    }
}

// ============================================================================
// Surface Attributes
// ============================================================================

pub const VA_SURFACE_ATTRIB_NONE: c_int = 0;
pub const VA_SURFACE_ATTRIB_PIXEL_FORMAT: c_int = 1;
pub const VA_SURFACE_ATTRIB_MIN_WIDTH: c_int = 2;
pub const VA_SURFACE_ATTRIB_MAX_WIDTH: c_int = 3;
pub const VA_SURFACE_ATTRIB_MIN_HEIGHT: c_int = 4;
pub const VA_SURFACE_ATTRIB_MAX_HEIGHT: c_int = 5;
pub const VA_SURFACE_ATTRIB_MEMORY_TYPE: c_int = 6;
pub const VA_SURFACE_ATTRIB_EXTERNAL_BUFFER_DESCRIPTOR: c_int = 7;
pub const VA_SURFACE_ATTRIB_USAGE_HINT: c_int = 8;

pub const VA_SURFACE_ATTRIB_NOT_SUPPORTED: c_uint = 0x0000_0000;
pub const VA_SURFACE_ATTRIB_GETTABLE: c_uint = 0x0000_0001;
pub const VA_SURFACE_ATTRIB_SETTABLE: c_uint = 0x0000_0002;

pub const VA_SURFACE_ATTRIB_MEM_TYPE_VA: u32 = 0x0000_0001;

/// Simplified `VASurfaceAttrib`: the generic value is always an integer here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VASurfaceAttrib {
    pub attrib_type: c_int,
    pub flags: c_uint,
    pub value: u32,
}

impl VASurfaceAttrib {
    pub fn request(attrib_type: c_int) -> Self {
        Self { attrib_type, flags: 0, value: 0 }
    }

    pub fn set(attrib_type: c_int, value: u32) -> Self {
        Self {
            attrib_type,
            flags: VA_SURFACE_ATTRIB_SETTABLE,
            value,
        }
    }
}

// ============================================================================
// Buffer Types
// ============================================================================

pub const VA_PICTURE_PARAMETER_BUFFER_TYPE: VABufferType = 0;
pub const VA_IQ_MATRIX_BUFFER_TYPE: VABufferType = 1;
pub const VA_BIT_PLANE_BUFFER_TYPE: VABufferType = 2;
pub const VA_SLICE_GROUP_MAP_BUFFER_TYPE: VABufferType = 3;
pub const VA_SLICE_PARAMETER_BUFFER_TYPE: VABufferType = 4;
pub const VA_SLICE_DATA_BUFFER_TYPE: VABufferType = 5;
pub const VA_MACROBLOCK_PARAMETER_BUFFER_TYPE: VABufferType = 6;
pub const VA_RESIDUAL_DATA_BUFFER_TYPE: VABufferType = 7;
pub const VA_DEBLOCKING_PARAMETER_BUFFER_TYPE: VABufferType = 8;
pub const VA_IMAGE_BUFFER_TYPE: VABufferType = 9;
pub const VA_PROTECTED_SLICE_DATA_BUFFER_TYPE: VABufferType = 10;
pub const VA_QMATRIX_BUFFER_TYPE: VABufferType = 11;
pub const VA_HUFFMAN_TABLE_BUFFER_TYPE: VABufferType = 12;
pub const VA_PROBABILITY_BUFFER_TYPE: VABufferType = 13;

// ============================================================================
// PutSurface Flags
// ============================================================================

pub const VA_FRAME_PICTURE: c_uint = 0x0000_0000;
pub const VA_TOP_FIELD: c_uint = 0x0000_0001;
pub const VA_BOTTOM_FIELD: c_uint = 0x0000_0002;

// ============================================================================
// Image Formats
// ============================================================================

pub const VA_FOURCC_NV12: u32 = 0x3231_564E; // 'NV12'
pub const VA_FOURCC_YV12: u32 = 0x3231_5659; // 'YV12'
pub const VA_FOURCC_I420: u32 = 0x3032_3449; // 'I420'
pub const VA_FOURCC_P010: u32 = 0x3031_3050; // 'P010'

pub const VA_LSB_FIRST: u32 = 1;
pub const VA_MSB_FIRST: u32 = 2;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VAImageFormat {
    pub fourcc: u32,
    pub byte_order: u32,
    pub bits_per_pixel: u32,
    pub depth: u32,
    pub red_mask: u32,
    pub green_mask: u32,
    pub blue_mask: u32,
    pub alpha_mask: u32,
}

/// Image description handed back by CreateImage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VAImage {
    pub image_id: VAGenericID,
    pub format: VAImageFormat,
    pub buf: VAGenericID,
    pub width: u16,
    pub height: u16,
    pub data_size: u32,
    pub num_planes: u32,
    pub pitches: [u32; 3],
    pub offsets: [u32; 3],
}

/// Source / destination rectangle of PutSurface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VARectangle {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl VARectangle {
    pub fn new(x: i16, y: i16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }
}

// ============================================================================
// H.264 Parameter Buffers (va/va_dec_h264.h)
// ============================================================================

pub const VA_PICTURE_H264_INVALID: u32 = 0x0000_0001;
pub const VA_PICTURE_H264_TOP_FIELD: u32 = 0x0000_0002;
pub const VA_PICTURE_H264_BOTTOM_FIELD: u32 = 0x0000_0004;
pub const VA_PICTURE_H264_SHORT_TERM_REFERENCE: u32 = 0x0000_0008;
pub const VA_PICTURE_H264_LONG_TERM_REFERENCE: u32 = 0x0000_0010;

pub const VA_SLICE_DATA_FLAG_ALL: u32 = 0x00;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[allow(non_snake_case)]
pub struct VAPictureH264 {
    pub picture_id: VAGenericID,
    pub frame_idx: u32,
    pub flags: u32,
    pub TopFieldOrderCnt: i32,
    pub BottomFieldOrderCnt: i32,
    pub va_reserved: [u32; 4],
}

impl VAPictureH264 {
    /// An unused reference slot.
    pub fn invalid() -> Self {
        Self {
            picture_id: VA_INVALID_SURFACE,
            flags: VA_PICTURE_H264_INVALID,
            ..Zeroable::zeroed()
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.picture_id == VA_INVALID_SURFACE || self.flags & VA_PICTURE_H264_INVALID != 0
    }
}

/// `seq_fields` bitfield of the picture parameter buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeqFields(pub u32);

impl SeqFields {
    fn bits(&self, shift: u32, width: u32) -> u8 {
        ((self.0 >> shift) & ((1 << width) - 1)) as u8
    }

    pub fn chroma_format_idc(&self) -> u8 { self.bits(0, 2) }
    pub fn residual_colour_transform_flag(&self) -> u8 { self.bits(2, 1) }
    pub fn gaps_in_frame_num_value_allowed_flag(&self) -> u8 { self.bits(3, 1) }
    pub fn frame_mbs_only_flag(&self) -> u8 { self.bits(4, 1) }
    pub fn mb_adaptive_frame_field_flag(&self) -> u8 { self.bits(5, 1) }
    pub fn direct_8x8_inference_flag(&self) -> u8 { self.bits(6, 1) }
    pub fn min_luma_bi_pred_size8x8(&self) -> u8 { self.bits(7, 1) }
    pub fn log2_max_frame_num_minus4(&self) -> u8 { self.bits(8, 4) }
    pub fn pic_order_cnt_type(&self) -> u8 { self.bits(12, 2) }
    pub fn log2_max_pic_order_cnt_lsb_minus4(&self) -> u8 { self.bits(14, 4) }
    pub fn delta_pic_order_always_zero_flag(&self) -> u8 { self.bits(18, 1) }
}

/// `pic_fields` bitfield of the picture parameter buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PicFields(pub u32);

impl PicFields {
    fn bits(&self, shift: u32, width: u32) -> u8 {
        ((self.0 >> shift) & ((1 << width) - 1)) as u8
    }

    pub fn entropy_coding_mode_flag(&self) -> u8 { self.bits(0, 1) }
    pub fn weighted_pred_flag(&self) -> u8 { self.bits(1, 1) }
    pub fn weighted_bipred_idc(&self) -> u8 { self.bits(2, 2) }
    pub fn transform_8x8_mode_flag(&self) -> u8 { self.bits(4, 1) }
    pub fn field_pic_flag(&self) -> u8 { self.bits(5, 1) }
    pub fn constrained_intra_pred_flag(&self) -> u8 { self.bits(6, 1) }
    pub fn pic_order_present_flag(&self) -> u8 { self.bits(7, 1) }
    pub fn deblocking_filter_control_present_flag(&self) -> u8 { self.bits(8, 1) }
    pub fn redundant_pic_cnt_present_flag(&self) -> u8 { self.bits(9, 1) }
    pub fn reference_pic_flag(&self) -> u8 { self.bits(10, 1) }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[allow(non_snake_case)]
pub struct VAPictureParameterBufferH264 {
    pub CurrPic: VAPictureH264,
    pub ReferenceFrames: [VAPictureH264; 16],
    pub picture_width_in_mbs_minus1: u16,
    pub picture_height_in_mbs_minus1: u16,
    pub bit_depth_luma_minus8: u8,
    pub bit_depth_chroma_minus8: u8,
    pub num_ref_frames: u8,
    pub _pad0: u8,
    pub seq_fields: u32,
    pub num_slice_groups_minus1: u8,
    pub slice_group_map_type: u8,
    pub slice_group_change_rate_minus1: u16,
    pub pic_init_qp_minus26: i8,
    pub pic_init_qs_minus26: i8,
    pub chroma_qp_index_offset: i8,
    pub second_chroma_qp_index_offset: i8,
    pub pic_fields: u32,
    pub frame_num: u16,
    pub _pad1: u16,
    pub va_reserved: [u32; 8],
}

impl VAPictureParameterBufferH264 {
    pub fn seq(&self) -> SeqFields {
        SeqFields(self.seq_fields)
    }

    pub fn pic(&self) -> PicFields {
        PicFields(self.pic_fields)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[allow(non_snake_case)]
pub struct VAIQMatrixBufferH264 {
    pub ScalingList4x4: [[u8; 16]; 6],
    pub ScalingList8x8: [[u8; 64]; 2],
    pub va_reserved: [u32; 4],
}

/// Leading fields of `VASliceParameterBufferH264`.
///
/// The full structure carries the reference lists and weight tables after
/// these; the translator only needs the header, so only the header is read.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct VASliceParameterHeaderH264 {
    pub slice_data_size: u32,
    pub slice_data_offset: u32,
    pub slice_data_flag: u32,
    pub slice_data_bit_offset: u16,
    pub first_mb_in_slice: u16,
    pub slice_type: u8,
    pub direct_spatial_mv_pred_flag: u8,
    pub num_ref_idx_l0_active_minus1: u8,
    pub num_ref_idx_l1_active_minus1: u8,
    pub cabac_init_idc: u8,
    pub slice_qp_delta: i8,
    pub disable_deblocking_filter_idc: u8,
    pub slice_alpha_c0_offset_div2: i8,
    pub slice_beta_offset_div2: i8,
    pub _pad0: [u8; 3],
}

/// Size of the complete `VASliceParameterBufferH264` on the C side.
pub const VA_SLICE_PARAMETER_BUFFER_H264_SIZE: usize = 3128;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_abi_sizes() {
        assert_eq!(size_of::<VAPictureH264>(), 36);
        assert_eq!(size_of::<VAPictureParameterBufferH264>(), 672);
        assert_eq!(size_of::<VAIQMatrixBufferH264>(), 240);
        assert_eq!(size_of::<VASliceParameterHeaderH264>(), 28);
    }

    #[test]
    fn test_bitfields() {
        // chroma_format_idc=1, frame_mbs_only=1, log2_max_frame_num_minus4=5
        let seq = SeqFields(0b01 | (1 << 4) | (5 << 8));
        assert_eq!(seq.chroma_format_idc(), 1);
        assert_eq!(seq.frame_mbs_only_flag(), 1);
        assert_eq!(seq.log2_max_frame_num_minus4(), 5);
        assert_eq!(seq.residual_colour_transform_flag(), 0);

        let pic = PicFields((1 << 0) | (2 << 2) | (1 << 10));
        assert_eq!(pic.entropy_coding_mode_flag(), 1);
        assert_eq!(pic.weighted_bipred_idc(), 2);
        assert_eq!(pic.reference_pic_flag(), 1);
        assert_eq!(pic.field_pic_flag(), 0);
    }

    #[test]
    fn test_invalid_picture() {
        assert!(VAPictureH264::invalid().is_invalid());
        let mut pic = VAPictureH264::invalid();
        pic.flags = 0;
        assert!(pic.is_invalid()); // id still invalid
        pic.picture_id = 7;
        assert!(!pic.is_invalid());
    }
}
