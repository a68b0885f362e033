// DECODE - Context Lifecycle and Picture State Machine
//
//   Idle --BeginPicture--> PictureOpen --RenderPicture*--> PictureOpen
//     ^                                                        |
//     +---------------------------EndPicture-------------------+
//
// EndPicture always lands in Idle, whether the hardware decode worked or not.
// A failed RenderPicture also drops the picture back to Idle so the caller can
// start over with a fresh BeginPicture.

use crate::backend::{Backend, VdpDecoder};
use crate::caps;
use crate::error::{backend_failure, keep_first, VaError};
use crate::h264::PictureAccumulator;
use crate::heap::{Handle, ObjectHeap};
use crate::objects::*;
use crate::present::release_presentation;
use crate::driver::Driver;
use crate::va::VAGenericID;

impl Driver {
    // ========================================================================
    // Contexts
    // ========================================================================

    pub fn create_context(
        &mut self,
        config: Handle,
        width: u32,
        height: u32,
        flags: i32,
        render_targets: &[Handle],
    ) -> Result<Handle, VaError> {
        let cfg = self.configs.get(config).ok_or(VaError::InvalidConfig)?;
        if width > cfg.max_width || height > cfg.max_height {
            return Err(VaError::ResolutionNotSupported);
        }

        for &target in render_targets {
            let surface = self.surfaces.get(target).ok_or(VaError::InvalidSurface)?;
            if surface.context.is_some() {
                tracing::debug!("Surface {} already belongs to context {:?}", target, surface.context);
                return Err(VaError::InvalidSurface);
            }
        }

        let mut context = Context::new(config, width, height, flags);
        context.render_targets.extend(render_targets.iter().copied());
        let id = self.contexts.allocate(context)?;

        for &target in render_targets {
            if let Some(surface) = self.surfaces.get_mut(target) {
                surface.context = Some(id);
            }
        }

        tracing::info!(
            "Context {} created: {}x{}, {} render targets",
            id,
            width,
            height,
            render_targets.len()
        );
        Ok(id)
    }

    pub fn destroy_context(&mut self, context: Handle) -> Result<(), VaError> {
        let removed = self.contexts.free(context).ok_or(VaError::InvalidContext)?;
        self.release_context(context, removed)
    }

    /// Unbind surfaces and free every backend object a context holds.
    pub(crate) fn release_context(&mut self, id: Handle, mut context: Context) -> Result<(), VaError> {
        let mut first = None;

        for target in &context.render_targets {
            if let Some(surface) = self.surfaces.get_mut(*target) {
                if surface.context == Some(id) {
                    surface.context = None;
                }
            }
        }

        if let Some(decoder) = context.decoder.take() {
            let result = self.backend.decoder_destroy(decoder);
            keep_first(&mut first, result.map_err(|e| backend_failure(e, VaError::OperationFailed)));
        }
        if let Some(mixer) = context.mixer.take() {
            keep_first(&mut first, self.destroy_mixer(mixer));
        }
        keep_first(&mut first, release_presentation(self.backend.as_ref(), &mut context));

        tracing::debug!("Context {} released", id);
        first.map_or(Ok(()), Err)
    }

    // ========================================================================
    // Pictures
    // ========================================================================

    pub fn begin_picture(&mut self, context: Handle, target: Handle) -> Result<(), VaError> {
        let surface = self.surfaces.get(target).ok_or(VaError::InvalidSurface)?;
        if surface.context.is_some_and(|owner| owner != context) {
            return Err(VaError::InvalidSurface);
        }

        let ctx = self.contexts.get_mut(context).ok_or(VaError::InvalidContext)?;
        if ctx.state.is_open() {
            return Err(VaError::InvalidContext);
        }

        ctx.render_targets.insert(target);
        ctx.state = DecodeState::PictureOpen {
            target,
            picture: Box::new(PictureAccumulator::new()),
        };
        if let Some(surface) = self.surfaces.get_mut(target) {
            surface.context = Some(context);
        }

        tracing::trace!("Context {}: picture opened on {}", context, target);
        Ok(())
    }

    pub fn render_picture(&mut self, context: Handle, buffers: &[Handle]) -> Result<(), VaError> {
        let ctx = self.contexts.get_mut(context).ok_or(VaError::InvalidContext)?;
        let DecodeState::PictureOpen { picture, .. } = &mut ctx.state else {
            return Err(VaError::InvalidContext);
        };

        // Unknown handles leave the open picture untouched
        if let Some(&missing) = buffers.iter().find(|&&id| self.buffers.get(id).is_none()) {
            tracing::debug!("Context {}: unknown buffer {}", context, missing);
            return Err(VaError::InvalidBuffer);
        }

        let result = apply_buffers(&self.buffers, &self.surfaces, picture, buffers);
        if let Err(e) = result {
            tracing::warn!("Context {}: picture dropped: {}", context, e);
            ctx.state = DecodeState::Idle;
        }
        result
    }

    pub fn end_picture(&mut self, context: Handle) -> Result<(), VaError> {
        let ctx = self.contexts.get_mut(context).ok_or(VaError::InvalidContext)?;
        let DecodeState::PictureOpen { target, picture } = std::mem::take(&mut ctx.state) else {
            return Err(VaError::InvalidContext);
        };

        let config = self.configs.get(ctx.config).ok_or(VaError::InvalidConfig)?;
        let surface = self.surfaces.get(target).ok_or(VaError::InvalidSurface)?;

        let decoder = match ctx.decoder {
            Some(decoder) => decoder,
            None => {
                let decoder = create_decoder(self.backend.as_ref(), config, ctx.width, ctx.height)?;
                ctx.decoder = Some(decoder);
                decoder
            }
        };

        self.backend
            .decoder_render(decoder, surface.vdp, picture.info(), picture.bitstream())
            .map_err(|e| backend_failure(e, VaError::DecodingError))?;

        tracing::trace!(
            "Context {}: decoded {} slices into {}",
            context,
            picture.info().slice_count,
            target
        );
        Ok(())
    }

    // ========================================================================
    // Synchronization
    // ========================================================================

    /// Decoding completes inside EndPicture, so there is nothing to wait for.
    pub fn sync_surface(&self, surface: Handle) -> Result<(), VaError> {
        let record = self.surfaces.get(surface).ok_or(VaError::InvalidSurface)?;
        if let Some(owner) = record.context {
            let ctx = self.contexts.get(owner).ok_or(VaError::InvalidContext)?;
            debug_assert!(
                ctx.state.target() != Some(surface),
                "sync on surface {} while its picture is still open",
                surface
            );
        }
        Ok(())
    }

    pub fn sync_surface2(&self, surface: Handle, _timeout_ns: u64) -> Result<(), VaError> {
        self.sync_surface(surface)
    }
}

fn create_decoder(backend: &dyn Backend, config: &Config, width: u32, height: u32) -> Result<VdpDecoder, VaError> {
    let profile = caps::vdp_decoder_profile(config.profile)?;
    let decoder = backend
        .decoder_create(profile, width, height, caps::MAX_REFERENCE_FRAMES)
        .map_err(|e| backend_failure(e, VaError::Unknown))?;
    tracing::info!("VDPAU decoder created for profile {} {}x{}", config.profile, width, height);
    Ok(decoder)
}

/// Check every buffer first, then fold them into the picture in order.
fn apply_buffers(
    buffers: &ObjectHeap<Buffer>,
    surfaces: &ObjectHeap<Surface>,
    picture: &mut PictureAccumulator,
    ids: &[Handle],
) -> Result<(), VaError> {
    let mut inputs = Vec::with_capacity(ids.len());
    for &id in ids {
        let buffer = buffers.get(id).ok_or(VaError::InvalidBuffer)?;
        let kind = buffer.kind.ok_or(VaError::UnsupportedBufferType)?;
        inputs.push((kind, buffer.data.as_slice()));
    }

    let resolve = |raw: VAGenericID| surfaces.get(Handle::from_raw(raw)).map(|s| s.vdp);
    for (kind, payload) in inputs {
        picture.apply(kind, payload, resolve)?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::*;
    use crate::driver::tests::driver;
    use crate::h264::fixtures;
    use crate::mock::{MockBackend, MockObject};
    use crate::va::*;

    struct Session {
        driver: Driver,
        backend: MockBackend,
        context: Handle,
        surfaces: Vec<Handle>,
    }

    fn session() -> Session {
        let (mut driver, backend) = driver();
        let config = driver.create_config(VA_PROFILE_H264_MAIN, VA_ENTRYPOINT_VLD, &[]).unwrap();
        let surfaces = driver.create_surfaces(VA_RT_FORMAT_YUV420, 1920, 1080, 2).unwrap();
        let context = driver.create_context(config, 1920, 1080, 0, &surfaces).unwrap();
        Session {
            driver,
            backend,
            context,
            surfaces,
        }
    }

    impl Session {
        fn buffer(&mut self, buffer_type: i32, data: &[u8]) -> Handle {
            self.driver
                .create_buffer(self.context, buffer_type, data.len() as u32, 1, Some(data))
                .unwrap()
        }

        /// Picture parameter, IQ matrix, slice parameter and slice data
        fn frame_buffers(&mut self) -> Vec<Handle> {
            let pp = fixtures::picture_parameter();
            let iq = fixtures::iq_matrix();
            let slice = [0x65, 0x88, 0x84, 0x00, 0x21];
            vec![
                self.buffer(VA_PICTURE_PARAMETER_BUFFER_TYPE, bytemuck::bytes_of(&pp)),
                self.buffer(VA_IQ_MATRIX_BUFFER_TYPE, bytemuck::bytes_of(&iq)),
                self.buffer(VA_SLICE_PARAMETER_BUFFER_TYPE, &fixtures::slice_parameter(0, slice.len() as u32)),
                self.buffer(VA_SLICE_DATA_BUFFER_TYPE, &slice),
            ]
        }
    }

    #[test]
    fn test_end_to_end_decode() {
        let mut s = session();
        let buffers = s.frame_buffers();

        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        s.driver.render_picture(s.context, &buffers).unwrap();
        s.driver.end_picture(s.context).unwrap();
        s.driver.sync_surface(s.surfaces[0]).unwrap();

        let renders = s.backend.renders();
        assert_eq!(renders.len(), 1);
        let render = &renders[0];
        assert_eq!(render.info.slice_count, 1);
        assert_eq!(render.info.frame_num, 3);
        assert_eq!(render.info.scaling_lists_4x4, [[16; 16]; 6]);
        assert_eq!(render.chunks.len(), 2);
        assert_eq!(&render.chunks[0][..], &[0x00, 0x00, 0x01]);
        assert_eq!(
            s.backend.object(render.decoder),
            Some(MockObject::Decoder {
                profile: VDP_DECODER_PROFILE_H264_MAIN,
                width: 1920,
                height: 1080
            })
        );

        s.driver.destroy_context(s.context).unwrap();
        for surface in &s.surfaces {
            assert_eq!(s.driver.surfaces.get(*surface).unwrap().context, None);
        }
        assert_eq!(s.backend.live_where(|o| matches!(o, MockObject::Decoder { .. })), 0);
    }

    #[test]
    fn test_decoder_created_once() {
        let mut s = session();
        for target in [s.surfaces[0], s.surfaces[1], s.surfaces[0]] {
            let buffers = s.frame_buffers();
            s.driver.begin_picture(s.context, target).unwrap();
            s.driver.render_picture(s.context, &buffers).unwrap();
            s.driver.end_picture(s.context).unwrap();
        }
        assert_eq!(s.backend.calls("decoder_create"), 1);
        assert_eq!(s.backend.renders().len(), 3);
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let mut s = session();
        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        assert_eq!(s.driver.begin_picture(s.context, s.surfaces[1]), Err(VaError::InvalidContext));

        s.driver.end_picture(s.context).unwrap();
        s.driver.begin_picture(s.context, s.surfaces[1]).unwrap();
    }

    #[test]
    fn test_render_and_end_require_open_picture() {
        let mut s = session();
        let buffers = s.frame_buffers();
        assert_eq!(s.driver.render_picture(s.context, &buffers), Err(VaError::InvalidContext));
        assert_eq!(s.driver.end_picture(s.context), Err(VaError::InvalidContext));

        let bogus = Handle::from_raw(0x0200_0033);
        assert_eq!(s.driver.begin_picture(bogus, s.surfaces[0]), Err(VaError::InvalidContext));
        assert_eq!(s.driver.render_picture(bogus, &buffers), Err(VaError::InvalidContext));
        assert_eq!(s.driver.end_picture(bogus), Err(VaError::InvalidContext));
    }

    #[test]
    fn test_unsupported_buffer_type_then_clean_cycle() {
        let mut s = session();
        let bit_plane = s.buffer(VA_BIT_PLANE_BUFFER_TYPE, &[0u8; 16]);
        let buffers = s.frame_buffers();

        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        assert_eq!(
            s.driver.render_picture(s.context, &[buffers[0], bit_plane]),
            Err(VaError::UnsupportedBufferType)
        );
        // The picture was dropped
        assert_eq!(s.driver.end_picture(s.context), Err(VaError::InvalidContext));

        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        s.driver.render_picture(s.context, &buffers).unwrap();
        s.driver.end_picture(s.context).unwrap();
        assert_eq!(s.backend.renders().len(), 1);
    }

    #[test]
    fn test_unknown_buffer_rejected() {
        let mut s = session();
        let buffers = s.frame_buffers();
        let stale = s.frame_buffers()[1];
        s.driver.destroy_buffer(stale).unwrap();

        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        assert_eq!(
            s.driver.render_picture(s.context, &[buffers[0], stale]),
            Err(VaError::InvalidBuffer)
        );
        // Nothing was applied and the picture stays open
        assert_eq!(
            s.driver.contexts.get(s.context).unwrap().state.target(),
            Some(s.surfaces[0])
        );

        s.driver.render_picture(s.context, &buffers).unwrap();
        s.driver.end_picture(s.context).unwrap();
        assert_eq!(s.backend.renders().len(), 1);
        assert_eq!(s.backend.renders()[0].info.slice_count, 1);
    }

    #[test]
    fn test_slice_data_needs_slice_parameter() {
        let mut s = session();
        let buffers = s.frame_buffers();

        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        assert_eq!(
            s.driver.render_picture(s.context, &[buffers[0], buffers[3]]),
            Err(VaError::UnsupportedBufferType)
        );

        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        s.driver.render_picture(s.context, &buffers[..3]).unwrap();
        // A second call continues the same picture
        s.driver.render_picture(s.context, &buffers[3..]).unwrap();
        s.driver.end_picture(s.context).unwrap();
        assert_eq!(s.backend.renders()[0].info.slice_count, 1);
    }

    #[test]
    fn test_unknown_reference_surface() {
        let mut s = session();
        let mut pp = fixtures::picture_parameter();
        pp.ReferenceFrames[0].picture_id = 0x0300_00ff;
        pp.ReferenceFrames[0].flags = VA_PICTURE_H264_SHORT_TERM_REFERENCE;
        let buffer = s.buffer(VA_PICTURE_PARAMETER_BUFFER_TYPE, bytemuck::bytes_of(&pp));

        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        assert_eq!(s.driver.render_picture(s.context, &[buffer]), Err(VaError::InvalidSurface));
    }

    #[test]
    fn test_reference_resolves_to_device_surface() {
        let mut s = session();
        let mut pp = fixtures::picture_parameter();
        pp.ReferenceFrames[0].picture_id = s.surfaces[1].raw();
        pp.ReferenceFrames[0].flags = VA_PICTURE_H264_SHORT_TERM_REFERENCE;
        let buffer = s.buffer(VA_PICTURE_PARAMETER_BUFFER_TYPE, bytemuck::bytes_of(&pp));

        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        s.driver.render_picture(s.context, &[buffer]).unwrap();
        s.driver.end_picture(s.context).unwrap();

        let vdp = s.driver.surfaces.get(s.surfaces[1]).unwrap().vdp;
        assert_eq!(s.backend.renders()[0].info.reference_frames[0].surface, vdp);
    }

    #[test]
    fn test_end_picture_failures_return_to_idle() {
        let mut s = session();
        let buffers = s.frame_buffers();

        s.backend.fail("decoder_create");
        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        s.driver.render_picture(s.context, &buffers).unwrap();
        assert_eq!(s.driver.end_picture(s.context), Err(VaError::Unknown));
        assert!(!s.driver.contexts.get(s.context).unwrap().state.is_open());

        s.backend.heal("decoder_create");
        s.backend.fail("decoder_render");
        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        assert_eq!(s.driver.end_picture(s.context), Err(VaError::DecodingError));

        s.backend.heal("decoder_render");
        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        s.driver.render_picture(s.context, &buffers).unwrap();
        s.driver.end_picture(s.context).unwrap();
    }

    #[test]
    fn test_create_context_validation() {
        let (mut driver, backend) = driver();
        backend.set_caps(
            VDP_DECODER_PROFILE_H264_HIGH,
            DecoderCaps {
                supported: true,
                max_width: 1920,
                max_height: 1088,
                ..DecoderCaps::default()
            },
        );
        let config = driver.create_config(VA_PROFILE_H264_HIGH, VA_ENTRYPOINT_VLD, &[]).unwrap();
        let surfaces = driver.create_surfaces(VA_RT_FORMAT_YUV420, 1920, 1080, 3).unwrap();

        assert_eq!(
            driver.create_context(Handle::from_raw(0x0100_0009), 1920, 1080, 0, &surfaces),
            Err(VaError::InvalidConfig)
        );
        assert_eq!(
            driver.create_context(config, 3840, 2160, 0, &surfaces),
            Err(VaError::ResolutionNotSupported)
        );

        let first = driver.create_context(config, 1920, 1080, 0, &surfaces[..1]).unwrap();
        // surfaces[0] is taken: nothing about the request may stick
        assert_eq!(
            driver.create_context(config, 1920, 1080, 0, &[surfaces[1], surfaces[0]]),
            Err(VaError::InvalidSurface)
        );
        assert_eq!(driver.surfaces.get(surfaces[1]).unwrap().context, None);
        assert_eq!(driver.contexts.len(), 1);

        let stale = Handle::from_raw(0x0300_0077);
        assert_eq!(
            driver.create_context(config, 1920, 1080, 0, &[stale]),
            Err(VaError::InvalidSurface)
        );

        let second = driver.create_context(config, 1920, 1080, 0, &surfaces[1..]).unwrap();
        assert_ne!(first, second);
        assert_eq!(driver.begin_picture(second, surfaces[0]), Err(VaError::InvalidSurface));
    }

    #[test]
    fn test_begin_binds_unowned_target() {
        let (mut driver, _) = driver();
        let config = driver.create_config(VA_PROFILE_H264_MAIN, VA_ENTRYPOINT_VLD, &[]).unwrap();
        let context = driver.create_context(config, 64, 64, 0, &[]).unwrap();
        let surface = driver.create_surfaces(VA_RT_FORMAT_YUV420, 64, 64, 1).unwrap()[0];

        driver.begin_picture(context, surface).unwrap();
        assert_eq!(driver.surfaces.get(surface).unwrap().context, Some(context));
        assert!(driver.contexts.get(context).unwrap().render_targets.contains(&surface));

        driver.end_picture(context).unwrap();
        driver.destroy_surfaces(&[surface]).unwrap();
        assert!(driver.contexts.get(context).unwrap().render_targets.is_empty());
    }

    #[test]
    fn test_sync_surface() {
        let mut s = session();
        let loose = s.driver.create_surfaces(VA_RT_FORMAT_YUV420, 64, 64, 1).unwrap()[0];

        s.driver.sync_surface(s.surfaces[1]).unwrap();
        s.driver.sync_surface2(loose, 1_000_000).unwrap();

        s.driver.destroy_surfaces(&[loose]).unwrap();
        assert_eq!(s.driver.sync_surface(loose), Err(VaError::InvalidSurface));
    }

    #[test]
    fn test_destroy_context_reports_backend_failure() {
        let mut s = session();
        let buffers = s.frame_buffers();
        s.driver.begin_picture(s.context, s.surfaces[0]).unwrap();
        s.driver.render_picture(s.context, &buffers).unwrap();
        s.driver.end_picture(s.context).unwrap();

        s.backend.fail("decoder_destroy");
        assert_eq!(s.driver.destroy_context(s.context), Err(VaError::OperationFailed));
        // Still gone, surfaces still unbound
        assert_eq!(s.driver.destroy_context(s.context), Err(VaError::InvalidContext));
        assert_eq!(s.driver.surfaces.get(s.surfaces[0]).unwrap().context, None);
    }
}
