//! # H.264 Buffer Translation
//!
//! Folds the VA parameter buffers of one picture into a `VdpPictureInfoH264`
//! plus a list of bitstream chunks. Buffers arrive in caller order:
//!
//! ```text
//! PictureParameter  IQMatrix  (SliceParameter SliceData)+
//! ```
//!
//! The parameter buffers may come in any order relative to each other, but
//! every SliceData must immediately follow its SliceParameter. A SliceParameter
//! that does not follow a SliceData starts the slice list over.

use crate::backend::*;
use crate::bitstream::Bitstream;
use crate::error::VaError;
use crate::va::*;
use bytemuck::Pod;
use bytes::Bytes;
use std::mem::size_of;
use thiserror::Error;

/// Buffer types that carry decode input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeBuffer {
    PictureParameter,
    IqMatrix,
    SliceParameter,
    SliceData,
}

impl DecodeBuffer {
    pub fn from_va(buffer_type: VABufferType) -> Option<Self> {
        match buffer_type {
            VA_PICTURE_PARAMETER_BUFFER_TYPE => Some(Self::PictureParameter),
            VA_IQ_MATRIX_BUFFER_TYPE => Some(Self::IqMatrix),
            VA_SLICE_PARAMETER_BUFFER_TYPE => Some(Self::SliceParameter),
            VA_SLICE_DATA_BUFFER_TYPE => Some(Self::SliceData),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("{kind:?} payload is {got} bytes, need {needed}")]
    Truncated { kind: DecodeBuffer, needed: usize, got: usize },
    #[error("chroma_format_idc {0} is not 4:2:0")]
    UnsupportedChroma(u8),
    #[error("residual colour transform is not supported")]
    ResidualColourTransform,
    #[error("reference picture {0:#x} is not a known surface")]
    UnknownReference(VAGenericID),
    #[error("slice data without a preceding slice parameter")]
    OutOfOrderSliceData,
    #[error("slice [{offset}, +{size}) is outside a {len} byte buffer")]
    SliceOutOfRange { offset: u32, size: u32, len: usize },
}

impl From<TranslateError> for VaError {
    fn from(err: TranslateError) -> Self {
        match err {
            TranslateError::UnknownReference(_) => VaError::InvalidSurface,
            _ => VaError::UnsupportedBufferType,
        }
    }
}

fn read<T: Pod>(kind: DecodeBuffer, payload: &[u8]) -> Result<T, TranslateError> {
    let needed = size_of::<T>();
    if payload.len() < needed {
        return Err(TranslateError::Truncated {
            kind,
            needed,
            got: payload.len(),
        });
    }
    Ok(bytemuck::pod_read_unaligned(&payload[..needed]))
}

/// Decode input collected between BeginPicture and EndPicture.
#[derive(Debug, Clone, Default)]
pub struct PictureAccumulator {
    info: VdpPictureInfoH264,
    bitstream: Bitstream,
    last: Option<DecodeBuffer>,
    slice_offset: u32,
    slice_size: u32,
}

impl PictureAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> &VdpPictureInfoH264 {
        &self.info
    }

    pub fn bitstream(&self) -> &[Bytes] {
        self.bitstream.chunks()
    }

    pub fn last_buffer(&self) -> Option<DecodeBuffer> {
        self.last
    }

    /// Apply one buffer. `resolve` maps a VA surface id to its VDPAU surface.
    pub fn apply<F>(&mut self, kind: DecodeBuffer, payload: &[u8], resolve: F) -> Result<(), TranslateError>
    where
        F: Fn(VAGenericID) -> Option<VdpVideoSurface>,
    {
        let result = match kind {
            DecodeBuffer::PictureParameter => self.picture_parameter(payload, resolve),
            DecodeBuffer::IqMatrix => self.iq_matrix(payload),
            DecodeBuffer::SliceParameter => self.slice_parameter(payload),
            DecodeBuffer::SliceData => self.slice_data(payload),
        };
        self.last = Some(kind);
        result
    }

    fn picture_parameter<F>(&mut self, payload: &[u8], resolve: F) -> Result<(), TranslateError>
    where
        F: Fn(VAGenericID) -> Option<VdpVideoSurface>,
    {
        let pp: VAPictureParameterBufferH264 = read(DecodeBuffer::PictureParameter, payload)?;
        let seq = pp.seq();
        let pic = pp.pic();

        if seq.chroma_format_idc() != 1 {
            return Err(TranslateError::UnsupportedChroma(seq.chroma_format_idc()));
        }
        if seq.residual_colour_transform_flag() != 0 {
            return Err(TranslateError::ResidualColourTransform);
        }

        let mut references = [VdpReferenceFrameH264::unused(); 16];
        for (dst, src) in references.iter_mut().zip(pp.ReferenceFrames.iter()) {
            *dst = translate_reference(src, &resolve)?;
        }

        let field_pic = pic.field_pic_flag();
        let info = &mut self.info;
        info.field_order_cnt = [pp.CurrPic.TopFieldOrderCnt, pp.CurrPic.BottomFieldOrderCnt];
        info.is_reference = pic.reference_pic_flag() as VdpBool;
        info.frame_num = pp.frame_num;
        info.field_pic_flag = field_pic;
        info.bottom_field_flag =
            (field_pic != 0 && pp.CurrPic.flags & VA_PICTURE_H264_BOTTOM_FIELD != 0) as u8;
        info.num_ref_frames = pp.num_ref_frames;
        info.mb_adaptive_frame_field_flag = (seq.mb_adaptive_frame_field_flag() != 0 && field_pic == 0) as u8;
        info.constrained_intra_pred_flag = pic.constrained_intra_pred_flag();
        info.weighted_pred_flag = pic.weighted_pred_flag();
        info.weighted_bipred_idc = pic.weighted_bipred_idc();
        info.frame_mbs_only_flag = seq.frame_mbs_only_flag();
        info.transform_8x8_mode_flag = pic.transform_8x8_mode_flag();
        info.chroma_qp_index_offset = pp.chroma_qp_index_offset;
        info.second_chroma_qp_index_offset = pp.second_chroma_qp_index_offset;
        info.pic_init_qp_minus26 = pp.pic_init_qp_minus26;
        info.log2_max_frame_num_minus4 = seq.log2_max_frame_num_minus4();
        info.pic_order_cnt_type = seq.pic_order_cnt_type();
        info.log2_max_pic_order_cnt_lsb_minus4 = seq.log2_max_pic_order_cnt_lsb_minus4();
        info.delta_pic_order_always_zero_flag = seq.delta_pic_order_always_zero_flag();
        info.direct_8x8_inference_flag = seq.direct_8x8_inference_flag();
        info.entropy_coding_mode_flag = pic.entropy_coding_mode_flag();
        info.pic_order_present_flag = pic.pic_order_present_flag();
        info.deblocking_filter_control_present_flag = pic.deblocking_filter_control_present_flag();
        info.redundant_pic_cnt_present_flag = pic.redundant_pic_cnt_present_flag();
        info.reference_frames = references;
        Ok(())
    }

    fn iq_matrix(&mut self, payload: &[u8]) -> Result<(), TranslateError> {
        let iq: VAIQMatrixBufferH264 = read(DecodeBuffer::IqMatrix, payload)?;
        self.info.scaling_lists_4x4 = iq.ScalingList4x4;
        self.info.scaling_lists_8x8 = iq.ScalingList8x8;
        Ok(())
    }

    fn slice_parameter(&mut self, payload: &[u8]) -> Result<(), TranslateError> {
        let slice: VASliceParameterHeaderH264 = read(DecodeBuffer::SliceParameter, payload)?;

        if self.last != Some(DecodeBuffer::SliceData) {
            self.bitstream.clear();
            self.info.slice_count = 0;
        }

        self.info.num_ref_idx_l0_active_minus1 = slice.num_ref_idx_l0_active_minus1;
        self.info.num_ref_idx_l1_active_minus1 = slice.num_ref_idx_l1_active_minus1;
        self.info.slice_count += 1;
        self.slice_offset = slice.slice_data_offset;
        self.slice_size = slice.slice_data_size;
        Ok(())
    }

    fn slice_data(&mut self, payload: &[u8]) -> Result<(), TranslateError> {
        if self.last != Some(DecodeBuffer::SliceParameter) {
            return Err(TranslateError::OutOfOrderSliceData);
        }

        let out_of_range = TranslateError::SliceOutOfRange {
            offset: self.slice_offset,
            size: self.slice_size,
            len: payload.len(),
        };
        let start = self.slice_offset as usize;
        let end = start.checked_add(self.slice_size as usize).ok_or_else(|| out_of_range.clone())?;
        let slice = payload.get(start..end).ok_or(out_of_range)?;

        self.bitstream.push_slice(Bytes::copy_from_slice(slice));
        Ok(())
    }
}

fn translate_reference<F>(src: &VAPictureH264, resolve: &F) -> Result<VdpReferenceFrameH264, TranslateError>
where
    F: Fn(VAGenericID) -> Option<VdpVideoSurface>,
{
    if src.is_invalid() {
        return Ok(VdpReferenceFrameH264::unused());
    }

    let surface = resolve(src.picture_id).ok_or(TranslateError::UnknownReference(src.picture_id))?;
    let mut top = src.flags & VA_PICTURE_H264_TOP_FIELD != 0;
    let mut bottom = src.flags & VA_PICTURE_H264_BOTTOM_FIELD != 0;
    if !top && !bottom {
        top = true;
        bottom = true;
    }

    Ok(VdpReferenceFrameH264 {
        surface,
        is_long_term: (src.flags & VA_PICTURE_H264_LONG_TERM_REFERENCE != 0) as VdpBool,
        top_is_reference: top as VdpBool,
        bottom_is_reference: bottom as VdpBool,
        field_order_cnt: [src.TopFieldOrderCnt, src.BottomFieldOrderCnt],
        frame_idx: src.frame_idx as u16,
    })
}

// ============================================================================
// Test Payloads
// ============================================================================
