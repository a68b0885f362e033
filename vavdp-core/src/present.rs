// PRESENT - PutSurface over VDPAU Presentation Queues
//
// Pipeline, per call:
// 1. Reject field rendering
// 2. Ensure the context's video mixer matches the surface
// 3. Ensure a presentation queue for the drawable
// 4. Allocate the output ring on first use, sized to the drawable
// 5. Wait for the next ring surface, mix into it, queue it for display
//
// The ring is sized once per context. Resizing the window later does not
// resize it; frames keep the first drawable's output size.
//
// Negative rectangle origins are clamped to zero.

use crate::backend::*;
use crate::caps;
use crate::driver::Driver;
use crate::error::{backend_failure, keep_first, VaError};
use crate::heap::Handle;
use crate::objects::*;
use crate::va::*;

fn to_vdp_rect(rect: &VARectangle) -> VdpRect {
    if rect.x < 0 || rect.y < 0 {
        tracing::debug!("Clamping rectangle origin ({}, {}) to the surface", rect.x, rect.y);
    }
    VdpRect::new(rect.x.max(0) as u32, rect.y.max(0) as u32, rect.width as u32, rect.height as u32)
}

impl Driver {
    pub fn put_surface(
        &mut self,
        surface: Handle,
        drawable: Drawable,
        src: VARectangle,
        dst: VARectangle,
        flags: u32,
    ) -> Result<(), VaError> {
        if flags & (VA_TOP_FIELD | VA_BOTTOM_FIELD) != 0 {
            return Err(VaError::FlagNotSupported);
        }

        let record = self.surfaces.get(surface).ok_or(VaError::InvalidSurface)?;
        let (source, width, height, rt_format) = (record.vdp, record.width, record.height, record.rt_format);
        let context = record.context.ok_or(VaError::InvalidContext)?;
        if !self.contexts.contains(context) {
            return Err(VaError::InvalidContext);
        }

        let chroma = caps::vdp_chroma_type(rt_format)?;
        let mixer = self.ensure_mixer(context, width, height, chroma)?;

        let ctx = self.contexts.get_mut(context).ok_or(VaError::InvalidContext)?;
        let backend = self.backend.as_ref();
        let queue = ensure_queue(backend, ctx, drawable)?;

        if ctx.ring.is_none() {
            let (w, h) = self
                .drawables
                .drawable_size(drawable)
                .map_err(|e| backend_failure(e, VaError::OperationFailed))?;
            ctx.ring = Some(create_ring(backend, w, h, self.options.output_surfaces)?);
        }
        let Some(ring) = ctx.ring.as_mut() else {
            return Err(VaError::Unknown);
        };

        let output = ring.current();
        let shown = backend
            .presentation_queue_block_until_idle(queue.queue, output)
            .and_then(|_| {
                backend.video_mixer_render(mixer, source, Some(to_vdp_rect(&src)), output, Some(to_vdp_rect(&dst)))
            })
            .and_then(|_| backend.presentation_queue_display(queue.queue, output, dst.width as u32, dst.height as u32));
        shown.map_err(|e| backend_failure(e, VaError::SurfaceInDisplaying))?;

        ring.advance();
        tracing::trace!("Surface {} shown on drawable {:#x}", surface, drawable);
        Ok(())
    }

    /// Reuse the context's mixer if it fits the surface, otherwise replace it.
    fn ensure_mixer(
        &mut self,
        context: Handle,
        width: u32,
        height: u32,
        chroma: VdpChromaType,
    ) -> Result<VdpVideoMixer, VaError> {
        let current = self.contexts.get(context).and_then(|c| c.mixer);

        if let Some(handle) = current {
            if let Some(mixer) = self.mixers.get(handle).filter(|m| m.matches(width, height, chroma)) {
                return Ok(mixer.vdp);
            }
            tracing::debug!("Replacing video mixer {} for {}x{}", handle, width, height);
            if let Err(e) = self.destroy_mixer(handle) {
                tracing::warn!("Old video mixer {} not released: {}", handle, e);
            }
            if let Some(ctx) = self.contexts.get_mut(context) {
                ctx.mixer = None;
            }
        }

        let vdp = self
            .backend
            .video_mixer_create(width, height, chroma)
            .map_err(|e| backend_failure(e, VaError::Unknown))?;

        let record = VideoMixer {
            context,
            width,
            height,
            chroma,
            vdp,
        };
        let handle = match self.mixers.allocate(record) {
            Ok(handle) => handle,
            Err(full) => {
                tracing::warn!("{}", full);
                if let Err(e) = self.backend.video_mixer_destroy(vdp) {
                    tracing::warn!("{}", e);
                }
                return Err(VaError::Unknown);
            }
        };

        if let Some(ctx) = self.contexts.get_mut(context) {
            ctx.mixer = Some(handle);
        }
        tracing::debug!("Video mixer {} created for {}x{}", handle, width, height);
        Ok(vdp)
    }

    pub(crate) fn destroy_mixer(&mut self, handle: Handle) -> Result<(), VaError> {
        let mixer = self.mixers.free(handle).ok_or(VaError::OperationFailed)?;
        self.backend
            .video_mixer_destroy(mixer.vdp)
            .map_err(|e| backend_failure(e, VaError::OperationFailed))
    }
}

fn ensure_queue(backend: &dyn Backend, ctx: &mut Context, drawable: Drawable) -> Result<PresentationQueueEntry, VaError> {
    if let Some(entry) = ctx.queues.get(&drawable) {
        return Ok(*entry);
    }

    let target = backend
        .presentation_queue_target_create(drawable)
        .map_err(|e| backend_failure(e, VaError::OperationFailed))?;
    let queue = match backend.presentation_queue_create(target) {
        Ok(queue) => queue,
        Err(e) => {
            if let Err(cleanup) = backend.presentation_queue_target_destroy(target) {
                tracing::warn!("{}", cleanup);
            }
            return Err(backend_failure(e, VaError::OperationFailed));
        }
    };

    let entry = PresentationQueueEntry {
        drawable,
        queue,
        target,
    };
    ctx.queues.insert(drawable, entry);
    tracing::debug!("Presentation queue created for drawable {:#x}", drawable);
    Ok(entry)
}

fn create_ring(backend: &dyn Backend, width: u32, height: u32, count: usize) -> Result<OutputRing, VaError> {
    let mut surfaces = Vec::with_capacity(count);
    for _ in 0..count {
        match backend.output_surface_create(VDP_RGBA_FORMAT_B8G8R8A8, width, height) {
            Ok(surface) => surfaces.push(surface),
            Err(e) => {
                for surface in surfaces {
                    if let Err(cleanup) = backend.output_surface_destroy(surface) {
                        tracing::warn!("{}", cleanup);
                    }
                }
                return Err(backend_failure(e, VaError::AllocationFailed));
            }
        }
    }

    tracing::debug!("Output ring of {} surfaces at {}x{}", count, width, height);
    Ok(OutputRing {
        width,
        height,
        surfaces,
        next: 0,
    })
}

/// Destroy the output ring and every presentation queue of a context.
pub(crate) fn release_presentation(backend: &dyn Backend, ctx: &mut Context) -> Result<(), VaError> {
    let mut first = None;

    if let Some(ring) = ctx.ring.take() {
        for surface in ring.surfaces {
            let result = backend.output_surface_destroy(surface);
            keep_first(&mut first, result.map_err(|e| backend_failure(e, VaError::OperationFailed)));
        }
    }

    for (_, entry) in ctx.queues.drain() {
        let result = backend.presentation_queue_destroy(entry.queue);
        keep_first(&mut first, result.map_err(|e| backend_failure(e, VaError::OperationFailed)));
        let result = backend.presentation_queue_target_destroy(entry.target);
        keep_first(&mut first, result.map_err(|e| backend_failure(e, VaError::OperationFailed)));
    }

    first.map_or(Ok(()), Err)
}
