// DRIVER - VA-API Entry Points over VDPAU
//
// One `Driver` per VA display. It owns every object heap plus the backend, and
// each VA entry point is a method returning `Result<_, VaError>`.
//
// This file holds driver lifetime, configs, surfaces, buffers and images.
// Contexts and the decode state machine are in decode.rs, PutSurface in
// present.rs, the stubbed entry points in unsupported.rs.

use crate::backend::*;
use crate::caps;
use crate::error::{backend_failure, keep_first, VaError};
use crate::heap::{Handle, ObjectHeap, ObjectKind};
use crate::objects::*;
use crate::options::DriverOptions;
use crate::va::*;
use serde::Serialize;

/// Array sizes libva allocates for list-returning queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverLimits {
    pub max_profiles: usize,
    pub max_entrypoints: usize,
    pub max_attributes: usize,
    pub max_image_formats: usize,
    pub max_subpic_formats: usize,
    pub max_display_attributes: usize,
}

// libva refuses to open a driver reporting zero image or subpicture formats
pub const LIMITS: DriverLimits = DriverLimits {
    max_profiles: 3,
    max_entrypoints: 1,
    max_attributes: 1,
    max_image_formats: 1,
    max_subpic_formats: 1,
    max_display_attributes: 0,
};

/// Attributes reported by QuerySurfaceAttributes.
pub const SURFACE_ATTRIBUTE_COUNT: usize = 4;

pub struct Driver {
    // Dropped before `drawables`: the device is bound to the display.
    pub(crate) backend: Box<dyn Backend>,
    pub(crate) drawables: Box<dyn DrawableProvider>,
    pub(crate) options: DriverOptions,
    pub(crate) configs: ObjectHeap<Config>,
    pub(crate) contexts: ObjectHeap<Context>,
    pub(crate) surfaces: ObjectHeap<Surface>,
    pub(crate) buffers: ObjectHeap<Buffer>,
    pub(crate) images: ObjectHeap<Image>,
    pub(crate) mixers: ObjectHeap<VideoMixer>,
    vendor: String,
    terminated: bool,
}

impl Driver {
    pub fn new(backend: Box<dyn Backend>, drawables: Box<dyn DrawableProvider>, options: DriverOptions) -> Self {
        let options = options.normalized();
        let capacity = options.max_objects_per_heap;
        let vendor = caps::vendor_string();
        tracing::info!("{} on {}", vendor, backend.information_string());

        Self {
            backend,
            drawables,
            options,
            configs: ObjectHeap::with_capacity(ObjectKind::Config, capacity),
            contexts: ObjectHeap::with_capacity(ObjectKind::Context, capacity),
            surfaces: ObjectHeap::with_capacity(ObjectKind::Surface, capacity),
            buffers: ObjectHeap::with_capacity(ObjectKind::Buffer, capacity),
            images: ObjectHeap::with_capacity(ObjectKind::Image, capacity),
            mixers: ObjectHeap::with_capacity(ObjectKind::VideoMixer, capacity),
            vendor,
            terminated: false,
        }
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn limits(&self) -> DriverLimits {
        LIMITS
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    pub fn backend_information(&self) -> String {
        self.backend.information_string()
    }

    /// Release everything and close the device.
    pub fn terminate(mut self) -> Result<(), VaError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), VaError> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;

        let mut first = None;
        for (id, context) in self.contexts.clear() {
            keep_first(&mut first, self.release_context(id, context));
        }
        for (_, image) in self.images.clear() {
            self.buffers.free(image.buffer);
        }
        let buffers = self.buffers.clear().len();
        let surfaces = self.surfaces.clear();
        let surface_count = surfaces.len();
        for (_, surface) in surfaces {
            let result = self.backend.video_surface_destroy(surface.vdp);
            keep_first(&mut first, result.map_err(|e| backend_failure(e, VaError::OperationFailed)));
        }
        for (_, mixer) in self.mixers.clear() {
            let result = self.backend.video_mixer_destroy(mixer.vdp);
            keep_first(&mut first, result.map_err(|e| backend_failure(e, VaError::OperationFailed)));
        }
        self.configs.clear();

        tracing::info!(
            "Driver terminated ({} surfaces, {} buffers left by the client)",
            surface_count,
            buffers
        );
        first.map_or(Ok(()), Err)
    }

    // ========================================================================
    // Configs
    // ========================================================================

    pub fn query_config_profiles(&self) -> Result<Vec<VAProfile>, VaError> {
        let mut profiles = Vec::with_capacity(LIMITS.max_profiles);
        for &profile in caps::supported_profiles() {
            let vdp_profile = caps::vdp_decoder_profile(profile)?;
            let hw = self
                .backend
                .decoder_query_capabilities(vdp_profile)
                .map_err(|e| backend_failure(e, VaError::Unknown))?;
            if hw.supported {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }

    pub fn query_config_entrypoints(&self, profile: VAProfile) -> Result<Vec<VAEntrypoint>, VaError> {
        Ok(caps::entrypoints_for(profile))
    }

    pub fn get_config_attributes(
        &self,
        _profile: VAProfile,
        _entrypoint: VAEntrypoint,
        attribs: &mut [VAConfigAttrib],
    ) -> Result<(), VaError> {
        for attrib in attribs.iter_mut() {
            attrib.value = caps::config_attribute_value(attrib.attrib_type);
        }
        Ok(())
    }

    pub fn create_config(
        &mut self,
        profile: VAProfile,
        entrypoint: VAEntrypoint,
        attribs: &[VAConfigAttrib],
    ) -> Result<Handle, VaError> {
        let vdp_profile = caps::vdp_decoder_profile(profile)?;
        caps::check_entrypoint(entrypoint)?;

        let hw = self
            .backend
            .decoder_query_capabilities(vdp_profile)
            .map_err(|e| backend_failure(e, VaError::Unknown))?;
        if !hw.supported {
            tracing::debug!("Profile {} not supported by the device", profile);
            return Err(VaError::UnsupportedProfile);
        }

        let wrong_format = attribs
            .iter()
            .any(|a| a.attrib_type == VA_CONFIG_ATTRIB_RT_FORMAT && a.value != VA_RT_FORMAT_YUV420);
        if wrong_format {
            return Err(VaError::UnsupportedRtFormat);
        }

        let id = self.configs.allocate(Config {
            profile,
            entrypoint,
            max_width: hw.max_width,
            max_height: hw.max_height,
            attribs: vec![VAConfigAttrib::new(VA_CONFIG_ATTRIB_RT_FORMAT, VA_RT_FORMAT_YUV420)],
        })?;

        tracing::debug!(
            "Config {} created: profile {} up to {}x{}",
            id,
            profile,
            hw.max_width,
            hw.max_height
        );
        Ok(id)
    }

    pub fn destroy_config(&mut self, config: Handle) -> Result<(), VaError> {
        self.configs.free(config).map(|_| ()).ok_or(VaError::InvalidConfig)
    }

    pub fn query_config_attributes(
        &self,
        config: Handle,
    ) -> Result<(VAProfile, VAEntrypoint, Vec<VAConfigAttrib>), VaError> {
        let config = self.configs.get(config).ok_or(VaError::InvalidConfig)?;
        Ok((config.profile, config.entrypoint, config.attribs.clone()))
    }

    fn surface_attributes(config: &Config) -> [VASurfaceAttrib; SURFACE_ATTRIBUTE_COUNT] {
        let both = VA_SURFACE_ATTRIB_GETTABLE | VA_SURFACE_ATTRIB_SETTABLE;
        [
            VASurfaceAttrib { attrib_type: VA_SURFACE_ATTRIB_PIXEL_FORMAT, flags: both, value: VA_FOURCC_NV12 },
            VASurfaceAttrib {
                attrib_type: VA_SURFACE_ATTRIB_MAX_WIDTH,
                flags: VA_SURFACE_ATTRIB_GETTABLE,
                value: config.max_width,
            },
            VASurfaceAttrib {
                attrib_type: VA_SURFACE_ATTRIB_MAX_HEIGHT,
                flags: VA_SURFACE_ATTRIB_GETTABLE,
                value: config.max_height,
            },
            VASurfaceAttrib {
                attrib_type: VA_SURFACE_ATTRIB_MEMORY_TYPE,
                flags: both,
                value: VA_SURFACE_ATTRIB_MEM_TYPE_VA,
            },
        ]
    }

    /// With `out == None` only the attribute count is returned.
    pub fn query_surface_attributes(
        &self,
        config: Handle,
        out: Option<&mut [VASurfaceAttrib]>,
    ) -> Result<usize, VaError> {
        let config = self.configs.get(config).ok_or(VaError::InvalidConfig)?;
        let attribs = Self::surface_attributes(config);

        if let Some(out) = out {
            if out.len() < attribs.len() {
                return Err(VaError::MaxNumExceeded);
            }
            out[..attribs.len()].copy_from_slice(&attribs);
        }
        Ok(attribs.len())
    }

    /// Fill in each requested attribute type; unknown ones come back not supported.
    pub fn get_surface_attributes(&self, config: Handle, attribs: &mut [VASurfaceAttrib]) -> Result<(), VaError> {
        let config = self.configs.get(config).ok_or(VaError::InvalidConfig)?;
        let known = Self::surface_attributes(config);

        for attrib in attribs.iter_mut() {
            match known.iter().find(|k| k.attrib_type == attrib.attrib_type) {
                Some(k) => *attrib = *k,
                None => attrib.flags = VA_SURFACE_ATTRIB_NOT_SUPPORTED,
            }
        }
        Ok(())
    }

    // ========================================================================
    // Surfaces
    // ========================================================================

    pub fn create_surfaces(&mut self, format: u32, width: u32, height: u32, count: usize) -> Result<Vec<Handle>, VaError> {
        self.create_surfaces2(format, width, height, count, &[])
    }

    /// All or nothing: a failure destroys the surfaces already made.
    pub fn create_surfaces2(
        &mut self,
        format: u32,
        width: u32,
        height: u32,
        count: usize,
        attribs: &[VASurfaceAttrib],
    ) -> Result<Vec<Handle>, VaError> {
        let chroma = caps::vdp_chroma_type(format)?;
        if width == 0 || height == 0 {
            return Err(VaError::InvalidParameter);
        }

        for attrib in attribs.iter().filter(|a| a.flags & VA_SURFACE_ATTRIB_SETTABLE != 0) {
            let accepted = match attrib.attrib_type {
                VA_SURFACE_ATTRIB_PIXEL_FORMAT => attrib.value == VA_FOURCC_NV12,
                VA_SURFACE_ATTRIB_MEMORY_TYPE => attrib.value == VA_SURFACE_ATTRIB_MEM_TYPE_VA,
                _ => false,
            };
            if !accepted {
                tracing::debug!("Rejecting surface attribute {} = {:#x}", attrib.attrib_type, attrib.value);
                return Err(VaError::AttrNotSupported);
            }
        }

        let mut created = Vec::with_capacity(count);
        for _ in 0..count {
            match self.create_surface(chroma, format, width, height) {
                Ok(id) => created.push(id),
                Err(e) => {
                    tracing::warn!("Surface batch failed after {} of {}: {}", created.len(), count, e);
                    self.unwind_surfaces(&created);
                    return Err(e);
                }
            }
        }

        tracing::debug!("Created {} surfaces of {}x{}", count, width, height);
        Ok(created)
    }

    fn create_surface(&mut self, chroma: VdpChromaType, format: u32, width: u32, height: u32) -> Result<Handle, VaError> {
        let vdp = self
            .backend
            .video_surface_create(chroma, width, height)
            .map_err(|e| backend_failure(e, VaError::AllocationFailed))?;

        let surface = Surface {
            context: None,
            rt_format: format,
            width,
            height,
            vdp,
        };
        match self.surfaces.allocate(surface) {
            Ok(id) => Ok(id),
            Err(full) => {
                if let Err(e) = self.backend.video_surface_destroy(vdp) {
                    tracing::warn!("{}", e);
                }
                Err(full.into())
            }
        }
    }

    fn unwind_surfaces(&mut self, ids: &[Handle]) {
        for &id in ids {
            if let Some(surface) = self.surfaces.free(id) {
                if let Err(e) = self.backend.video_surface_destroy(surface.vdp) {
                    tracing::warn!("{}", e);
                }
            }
        }
    }

    /// Best effort: every entry is attempted, the first error is returned.
    pub fn destroy_surfaces(&mut self, surfaces: &[Handle]) -> Result<(), VaError> {
        let mut first = None;
        for &id in surfaces {
            keep_first(&mut first, self.destroy_surface(id));
        }
        first.map_or(Ok(()), Err)
    }

    fn destroy_surface(&mut self, id: Handle) -> Result<(), VaError> {
        let surface = self.surfaces.free(id).ok_or(VaError::InvalidSurface)?;

        if let Some(context) = surface.context.and_then(|c| self.contexts.get_mut(c)) {
            context.render_targets.remove(&id);
            if context.state.target() == Some(id) {
                tracing::warn!("Surface {} destroyed while being decoded into", id);
                context.state = DecodeState::Idle;
            }
        }

        self.backend
            .video_surface_destroy(surface.vdp)
            .map_err(|e| backend_failure(e, VaError::OperationFailed))
    }

    // ========================================================================
    // Buffers
    // ========================================================================

    /// `data` shorter than `size` is rejected; `None` gives a zeroed buffer.
    pub fn create_buffer(
        &mut self,
        context: Handle,
        buffer_type: VABufferType,
        size: u32,
        num_elements: u32,
        data: Option<&[u8]>,
    ) -> Result<Handle, VaError> {
        if !self.contexts.contains(context) {
            return Err(VaError::InvalidContext);
        }
        if num_elements != 1 || size == 0 {
            return Err(VaError::InvalidParameter);
        }

        let size = size as usize;
        let payload = match data {
            Some(data) => data.get(..size).ok_or(VaError::InvalidParameter)?.to_vec(),
            None => vec![0; size],
        };

        let id = self.buffers.allocate(Buffer::new(buffer_type, Some(context), payload))?;
        tracing::trace!("Buffer {} type {} ({} bytes)", id, buffer_type, size);
        Ok(id)
    }

    /// (type, size, element count)
    pub fn buffer_info(&self, buffer: Handle) -> Result<(VABufferType, u32, u32), VaError> {
        let buffer = self.buffers.get(buffer).ok_or(VaError::InvalidBuffer)?;
        Ok((buffer.buffer_type, buffer.size() as u32, buffer.num_elements))
    }

    pub fn map_buffer(&mut self, buffer: Handle) -> Result<&mut [u8], VaError> {
        let buffer = self.buffers.get_mut(buffer).ok_or(VaError::InvalidBuffer)?;
        buffer.mapped = true;
        Ok(&mut buffer.data)
    }

    pub fn unmap_buffer(&mut self, buffer: Handle) -> Result<(), VaError> {
        let buffer = self.buffers.get_mut(buffer).ok_or(VaError::InvalidBuffer)?;
        if !buffer.mapped {
            return Err(VaError::OperationFailed);
        }
        buffer.mapped = false;
        Ok(())
    }

    pub fn destroy_buffer(&mut self, buffer: Handle) -> Result<(), VaError> {
        self.buffers.free(buffer).map(|_| ()).ok_or(VaError::InvalidBuffer)
    }

    // ========================================================================
    // Images
    // ========================================================================

    pub fn query_image_formats(&self) -> Vec<VAImageFormat> {
        caps::supported_image_formats()
    }

    /// NV12 only. Planes are laid out for even-rounded dimensions.
    pub fn create_image(&mut self, format: &VAImageFormat, width: u32, height: u32) -> Result<VAImage, VaError> {
        caps::vdp_ycbcr_format(format.fourcc)?;
        if width == 0 || height == 0 || width > u16::MAX as u32 || height > u16::MAX as u32 {
            return Err(VaError::InvalidParameter);
        }

        let aligned_width = (width + 1) & !1;
        let aligned_height = (height + 1) & !1;
        let luma = aligned_width as u64 * aligned_height as u64;
        let data_size = u32::try_from(luma * 3 / 2).map_err(|_| VaError::InvalidParameter)?;
        let chroma_offset = luma as u32;

        let buffer = self
            .buffers
            .allocate(Buffer::new(VA_IMAGE_BUFFER_TYPE, None, vec![0; data_size as usize]))?;

        let image = Image {
            format: caps::nv12_image_format(),
            width,
            height,
            num_planes: 2,
            pitches: [aligned_width, aligned_width, 0],
            offsets: [0, chroma_offset, 0],
            data_size,
            buffer,
        };
        let va_image = VAImage {
            image_id: VA_INVALID_ID,
            format: image.format,
            buf: buffer.raw(),
            width: width as u16,
            height: height as u16,
            data_size,
            num_planes: image.num_planes,
            pitches: image.pitches,
            offsets: image.offsets,
        };

        match self.images.allocate(image) {
            Ok(id) => {
                tracing::debug!("Image {} created: NV12 {}x{}", id, width, height);
                Ok(VAImage {
                    image_id: id.raw(),
                    ..va_image
                })
            }
            Err(full) => {
                self.buffers.free(buffer);
                Err(full.into())
            }
        }
    }

    pub fn destroy_image(&mut self, image: Handle) -> Result<(), VaError> {
        let image = self.images.free(image).ok_or(VaError::InvalidImage)?;
        self.buffers.free(image.buffer);
        Ok(())
    }

    /// Read back a whole decoded surface into an image of the same size.
    pub fn get_image(
        &mut self,
        surface: Handle,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        image: Handle,
    ) -> Result<(), VaError> {
        let surface = self.surfaces.get(surface).ok_or(VaError::InvalidSurface)?;
        let image = self.images.get(image).ok_or(VaError::InvalidImage)?;

        if x != 0 || y != 0 || width != surface.width || height != surface.height {
            return Err(VaError::InvalidParameter);
        }
        if image.width != width || image.height != height {
            return Err(VaError::InvalidParameter);
        }

        let format = caps::vdp_ycbcr_format(image.format.fourcc)?;
        let buffer = self.buffers.get_mut(image.buffer).ok_or(VaError::InvalidBuffer)?;
        let chroma_offset = image.offsets[1] as usize;
        if chroma_offset > buffer.data.len() {
            return Err(VaError::OperationFailed);
        }

        let (luma, chroma) = buffer.data.split_at_mut(chroma_offset);
        self.backend
            .video_surface_get_bits(surface.vdp, format, &mut [luma, chroma], &image.pitches[..2])
            .map_err(|e| backend_failure(e, VaError::OperationFailed))
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!("Driver teardown incomplete: {}", e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
