//! In-memory backend for driver tests.
//!
//! Tracks every live VDPAU object so tests can assert that teardown paths
//! release everything, and lets a test make any call fail on demand.

use crate::backend::*;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockObject {
    Decoder { profile: VdpDecoderProfile, width: u32, height: u32 },
    VideoSurface { width: u32, height: u32 },
    VideoMixer { width: u32, height: u32 },
    OutputSurface { width: u32, height: u32 },
    QueueTarget(Drawable),
    Queue(VdpPresentationQueueTarget),
}

#[derive(Debug, Clone)]
pub struct RenderCall {
    pub decoder: VdpDecoder,
    pub target: VdpVideoSurface,
    pub info: VdpPictureInfoH264,
    pub chunks: Vec<Bytes>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixCall {
    pub mixer: VdpVideoMixer,
    pub source: VdpVideoSurface,
    pub destination: VdpOutputSurface,
}

#[derive(Default)]
struct MockState {
    next_handle: u32,
    objects: HashMap<u32, MockObject>,
    caps: HashMap<VdpDecoderProfile, DecoderCaps>,
    /// call name -> successful calls left before it starts failing
    failures: HashMap<&'static str, usize>,
    calls: HashMap<&'static str, usize>,
    renders: Vec<RenderCall>,
    mixes: Vec<MixCall>,
    displays: Vec<(VdpPresentationQueue, VdpOutputSurface)>,
}

impl MockState {
    fn check(&mut self, call: &'static str) -> BackendResult<()> {
        *self.calls.entry(call).or_insert(0) += 1;
        match self.failures.get_mut(call) {
            Some(0) => Err(BackendError::call(call, VDP_STATUS_ERROR)),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn create(&mut self, call: &'static str, object: MockObject) -> BackendResult<u32> {
        self.check(call)?;
        self.next_handle += 1;
        self.objects.insert(self.next_handle, object);
        Ok(self.next_handle)
    }

    fn expect<F>(&self, call: &'static str, handle: u32, is_kind: F) -> BackendResult<MockObject>
    where
        F: Fn(&MockObject) -> bool,
    {
        match self.objects.get(&handle) {
            Some(object) if is_kind(object) => Ok(*object),
            _ => Err(BackendError::call(call, VDP_STATUS_ERROR)),
        }
    }

    fn destroy<F>(&mut self, call: &'static str, handle: u32, is_kind: F) -> BackendResult<()>
    where
        F: Fn(&MockObject) -> bool,
    {
        self.check(call)?;
        self.expect(call, handle, is_kind)?;
        self.objects.remove(&handle);
        Ok(())
    }
}

/// Cloning shares state, so a test keeps a handle after moving one into a driver.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        let caps = DecoderCaps {
            supported: true,
            max_level: 51,
            max_macroblocks: 65536,
            max_width: 4096,
            max_height: 4096,
        };
        let mut state = MockState::default();
        for profile in [
            VDP_DECODER_PROFILE_H264_BASELINE,
            VDP_DECODER_PROFILE_H264_MAIN,
            VDP_DECODER_PROFILE_H264_HIGH,
        ] {
            state.caps.insert(profile, caps);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set_caps(&self, profile: VdpDecoderProfile, caps: DecoderCaps) {
        self.state.lock().caps.insert(profile, caps);
    }

    /// Make every following `call` fail.
    pub fn fail(&self, call: &'static str) {
        self.fail_after(call, 0);
    }

    /// Let `call` succeed `successes` more times, then fail.
    pub fn fail_after(&self, call: &'static str, successes: usize) {
        self.state.lock().failures.insert(call, successes);
    }

    pub fn heal(&self, call: &'static str) {
        self.state.lock().failures.remove(call);
    }

    pub fn calls(&self, call: &str) -> usize {
        self.state.lock().calls.get(call).copied().unwrap_or(0)
    }

    pub fn live(&self) -> usize {
        self.state.lock().objects.len()
    }

    pub fn live_where<F>(&self, f: F) -> usize
    where
        F: Fn(&MockObject) -> bool,
    {
        self.state.lock().objects.values().filter(|o| f(o)).count()
    }

    pub fn object(&self, handle: u32) -> Option<MockObject> {
        self.state.lock().objects.get(&handle).copied()
    }

    pub fn renders(&self) -> Vec<RenderCall> {
        self.state.lock().renders.clone()
    }

    pub fn mixes(&self) -> Vec<MixCall> {
        self.state.lock().mixes.clone()
    }

    pub fn displays(&self) -> Vec<(VdpPresentationQueue, VdpOutputSurface)> {
        self.state.lock().displays.clone()
    }
}

fn is_decoder(o: &MockObject) -> bool {
    matches!(o, MockObject::Decoder { .. })
}

fn is_video_surface(o: &MockObject) -> bool {
    matches!(o, MockObject::VideoSurface { .. })
}

fn is_mixer(o: &MockObject) -> bool {
    matches!(o, MockObject::VideoMixer { .. })
}

fn is_output_surface(o: &MockObject) -> bool {
    matches!(o, MockObject::OutputSurface { .. })
}

fn is_target(o: &MockObject) -> bool {
    matches!(o, MockObject::QueueTarget(_))
}

fn is_queue(o: &MockObject) -> bool {
    matches!(o, MockObject::Queue(_))
}

impl Backend for MockBackend {
    fn information_string(&self) -> String {
        "mock VDPAU device".to_string()
    }

    fn decoder_query_capabilities(&self, profile: VdpDecoderProfile) -> BackendResult<DecoderCaps> {
        let mut state = self.state.lock();
        state.check("decoder_query_capabilities")?;
        Ok(state.caps.get(&profile).copied().unwrap_or_default())
    }

    fn decoder_create(&self, profile: VdpDecoderProfile, width: u32, height: u32, _max_references: u32) -> BackendResult<VdpDecoder> {
        self.state
            .lock()
            .create("decoder_create", MockObject::Decoder { profile, width, height })
    }

    fn decoder_destroy(&self, decoder: VdpDecoder) -> BackendResult<()> {
        self.state.lock().destroy("decoder_destroy", decoder, is_decoder)
    }

    fn decoder_render(
        &self,
        decoder: VdpDecoder,
        target: VdpVideoSurface,
        info: &VdpPictureInfoH264,
        bitstream: &[Bytes],
    ) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.check("decoder_render")?;
        state.expect("decoder_render", decoder, is_decoder)?;
        state.expect("decoder_render", target, is_video_surface)?;
        state.renders.push(RenderCall {
            decoder,
            target,
            info: *info,
            chunks: bitstream.to_vec(),
        });
        Ok(())
    }

    fn video_surface_create(&self, _chroma: VdpChromaType, width: u32, height: u32) -> BackendResult<VdpVideoSurface> {
        self.state
            .lock()
            .create("video_surface_create", MockObject::VideoSurface { width, height })
    }

    fn video_surface_destroy(&self, surface: VdpVideoSurface) -> BackendResult<()> {
        self.state.lock().destroy("video_surface_destroy", surface, is_video_surface)
    }

    fn video_surface_get_bits(
        &self,
        surface: VdpVideoSurface,
        _format: VdpYCbCrFormat,
        planes: &mut [&mut [u8]],
        _pitches: &[u32],
    ) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.check("video_surface_get_bits")?;
        state.expect("video_surface_get_bits", surface, is_video_surface)?;
        // Luma black, chroma neutral
        for (index, plane) in planes.iter_mut().enumerate() {
            plane.fill(if index == 0 { 0x10 } else { 0x80 });
        }
        Ok(())
    }

    fn video_mixer_create(&self, width: u32, height: u32, _chroma: VdpChromaType) -> BackendResult<VdpVideoMixer> {
        self.state
            .lock()
            .create("video_mixer_create", MockObject::VideoMixer { width, height })
    }

    fn video_mixer_destroy(&self, mixer: VdpVideoMixer) -> BackendResult<()> {
        self.state.lock().destroy("video_mixer_destroy", mixer, is_mixer)
    }

    fn video_mixer_render(
        &self,
        mixer: VdpVideoMixer,
        source: VdpVideoSurface,
        _source_rect: Option<VdpRect>,
        destination: VdpOutputSurface,
        _destination_rect: Option<VdpRect>,
    ) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.check("video_mixer_render")?;
        state.expect("video_mixer_render", mixer, is_mixer)?;
        state.expect("video_mixer_render", source, is_video_surface)?;
        state.expect("video_mixer_render", destination, is_output_surface)?;
        state.mixes.push(MixCall {
            mixer,
            source,
            destination,
        });
        Ok(())
    }

    fn output_surface_create(&self, _format: VdpRGBAFormat, width: u32, height: u32) -> BackendResult<VdpOutputSurface> {
        self.state
            .lock()
            .create("output_surface_create", MockObject::OutputSurface { width, height })
    }

    fn output_surface_destroy(&self, surface: VdpOutputSurface) -> BackendResult<()> {
        self.state.lock().destroy("output_surface_destroy", surface, is_output_surface)
    }

    fn presentation_queue_target_create(&self, drawable: Drawable) -> BackendResult<VdpPresentationQueueTarget> {
        self.state
            .lock()
            .create("presentation_queue_target_create", MockObject::QueueTarget(drawable))
    }

    fn presentation_queue_target_destroy(&self, target: VdpPresentationQueueTarget) -> BackendResult<()> {
        self.state.lock().destroy("presentation_queue_target_destroy", target, is_target)
    }

    fn presentation_queue_create(&self, target: VdpPresentationQueueTarget) -> BackendResult<VdpPresentationQueue> {
        let mut state = self.state.lock();
        state.expect("presentation_queue_create", target, is_target)?;
        state.create("presentation_queue_create", MockObject::Queue(target))
    }

    fn presentation_queue_destroy(&self, queue: VdpPresentationQueue) -> BackendResult<()> {
        self.state.lock().destroy("presentation_queue_destroy", queue, is_queue)
    }

    fn presentation_queue_display(
        &self,
        queue: VdpPresentationQueue,
        surface: VdpOutputSurface,
        _clip_width: u32,
        _clip_height: u32,
    ) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.check("presentation_queue_display")?;
        state.expect("presentation_queue_display", queue, is_queue)?;
        state.expect("presentation_queue_display", surface, is_output_surface)?;
        state.displays.push((queue, surface));
        Ok(())
    }

    fn presentation_queue_block_until_idle(
        &self,
        queue: VdpPresentationQueue,
        surface: VdpOutputSurface,
    ) -> BackendResult<()> {
        let mut state = self.state.lock();
        state.check("presentation_queue_block_until_idle")?;
        state.expect("presentation_queue_block_until_idle", queue, is_queue)?;
        state.expect("presentation_queue_block_until_idle", surface, is_output_surface)?;
        Ok(())
    }
}

/// Drawable sizes keyed by window id. Unknown windows have no geometry.
#[derive(Clone, Default)]
pub struct MockDisplay {
    sizes: Arc<Mutex<HashMap<Drawable, (u32, u32)>>>,
    queries: Arc<Mutex<usize>>,
}

impl MockDisplay {
    pub fn with_window(drawable: Drawable, width: u32, height: u32) -> Self {
        let display = Self::default();
        display.add_window(drawable, width, height);
        display
    }

    pub fn add_window(&self, drawable: Drawable, width: u32, height: u32) {
        self.sizes.lock().insert(drawable, (width, height));
    }

    pub fn queries(&self) -> usize {
        *self.queries.lock()
    }
}

impl DrawableProvider for MockDisplay {
    fn drawable_size(&self, drawable: Drawable) -> BackendResult<(u32, u32)> {
        *self.queries.lock() += 1;
        self.sizes
            .lock()
            .get(&drawable)
            .copied()
            .ok_or(BackendError::NoGeometry(drawable))
    }
}
