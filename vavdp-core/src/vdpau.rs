// VDPAU - Production Backend over libvdpau
//
// Loads libvdpau.so.1 at runtime - no compile-time dependency.
//
// Bring-up:
// 1. Load the library and resolve vdp_device_create_x11
// 2. Create a device on the caller's X display
// 3. Resolve every entry point through VdpGetProcAddress
//
// The device is destroyed on drop. The X display must outlive the backend.

use crate::backend::*;
use bytes::Bytes;
use std::ffi::{c_void, CStr};
use libc::{c_char, c_int};
use std::ptr;
use thiserror::Error;

// ============================================================================
// VDPAU Function IDs (from vdpau/vdpau.h)
// ============================================================================

type VdpDevice = u32;
type VdpFuncId = u32;

const VDP_FUNC_ID_GET_ERROR_STRING: VdpFuncId = 0;
const VDP_FUNC_ID_GET_API_VERSION: VdpFuncId = 2;
const VDP_FUNC_ID_GET_INFORMATION_STRING: VdpFuncId = 4;
const VDP_FUNC_ID_DEVICE_DESTROY: VdpFuncId = 5;
const VDP_FUNC_ID_VIDEO_SURFACE_CREATE: VdpFuncId = 9;
const VDP_FUNC_ID_VIDEO_SURFACE_DESTROY: VdpFuncId = 10;
const VDP_FUNC_ID_VIDEO_SURFACE_GET_BITS_Y_CB_CR: VdpFuncId = 12;
const VDP_FUNC_ID_OUTPUT_SURFACE_CREATE: VdpFuncId = 18;
const VDP_FUNC_ID_OUTPUT_SURFACE_DESTROY: VdpFuncId = 19;
const VDP_FUNC_ID_DECODER_QUERY_CAPABILITIES: VdpFuncId = 36;
const VDP_FUNC_ID_DECODER_CREATE: VdpFuncId = 37;
const VDP_FUNC_ID_DECODER_DESTROY: VdpFuncId = 38;
const VDP_FUNC_ID_DECODER_RENDER: VdpFuncId = 40;
const VDP_FUNC_ID_VIDEO_MIXER_CREATE: VdpFuncId = 46;
const VDP_FUNC_ID_VIDEO_MIXER_DESTROY: VdpFuncId = 53;
const VDP_FUNC_ID_VIDEO_MIXER_RENDER: VdpFuncId = 54;
const VDP_FUNC_ID_PRESENTATION_QUEUE_TARGET_DESTROY: VdpFuncId = 55;
const VDP_FUNC_ID_PRESENTATION_QUEUE_CREATE: VdpFuncId = 56;
const VDP_FUNC_ID_PRESENTATION_QUEUE_DESTROY: VdpFuncId = 57;
const VDP_FUNC_ID_PRESENTATION_QUEUE_DISPLAY: VdpFuncId = 63;
const VDP_FUNC_ID_PRESENTATION_QUEUE_BLOCK_UNTIL_SURFACE_IDLE: VdpFuncId = 64;
const VDP_FUNC_ID_BASE_WINSYS: VdpFuncId = 0x1000;
const VDP_FUNC_ID_PRESENTATION_QUEUE_TARGET_CREATE_X11: VdpFuncId = VDP_FUNC_ID_BASE_WINSYS;

const VDP_VIDEO_MIXER_PARAMETER_VIDEO_SURFACE_WIDTH: u32 = 0;
const VDP_VIDEO_MIXER_PARAMETER_VIDEO_SURFACE_HEIGHT: u32 = 1;
const VDP_VIDEO_MIXER_PARAMETER_CHROMA_TYPE: u32 = 2;
const VDP_VIDEO_MIXER_PICTURE_STRUCTURE_TOP_FIELD: u32 = 0;
const VDP_VIDEO_MIXER_PICTURE_STRUCTURE_BOTTOM_FIELD: u32 = 1;
const VDP_VIDEO_MIXER_PICTURE_STRUCTURE_FRAME: u32 = 2;

const VDP_BITSTREAM_BUFFER_VERSION: u32 = 0;

#[repr(C)]
struct VdpBitstreamBuffer {
    struct_version: u32,
    bitstream: *const c_void,
    bitstream_bytes: u32,
}

// ============================================================================
// Function Pointer Types
// ============================================================================

type VdpGetProcAddressFn = unsafe extern "C" fn(VdpDevice, VdpFuncId, *mut *mut c_void) -> VdpStatus;
type VdpDeviceCreateX11Fn =
    unsafe extern "C" fn(*mut c_void, c_int, *mut VdpDevice, *mut Option<VdpGetProcAddressFn>) -> VdpStatus;

type GetErrorStringFn = unsafe extern "C" fn(VdpStatus) -> *const c_char;
type GetApiVersionFn = unsafe extern "C" fn(*mut u32) -> VdpStatus;
type GetInformationStringFn = unsafe extern "C" fn(*mut *const c_char) -> VdpStatus;
type DeviceDestroyFn = unsafe extern "C" fn(VdpDevice) -> VdpStatus;
type VideoSurfaceCreateFn =
    unsafe extern "C" fn(VdpDevice, VdpChromaType, u32, u32, *mut VdpVideoSurface) -> VdpStatus;
type VideoSurfaceDestroyFn = unsafe extern "C" fn(VdpVideoSurface) -> VdpStatus;
type VideoSurfaceGetBitsFn =
    unsafe extern "C" fn(VdpVideoSurface, VdpYCbCrFormat, *const *mut c_void, *const u32) -> VdpStatus;
type OutputSurfaceCreateFn =
    unsafe extern "C" fn(VdpDevice, VdpRGBAFormat, u32, u32, *mut VdpOutputSurface) -> VdpStatus;
type OutputSurfaceDestroyFn = unsafe extern "C" fn(VdpOutputSurface) -> VdpStatus;
type DecoderQueryCapabilitiesFn = unsafe extern "C" fn(
    VdpDevice,
    VdpDecoderProfile,
    *mut VdpBool,
    *mut u32,
    *mut u32,
    *mut u32,
    *mut u32,
) -> VdpStatus;
type DecoderCreateFn =
    unsafe extern "C" fn(VdpDevice, VdpDecoderProfile, u32, u32, u32, *mut VdpDecoder) -> VdpStatus;
type DecoderDestroyFn = unsafe extern "C" fn(VdpDecoder) -> VdpStatus;
type DecoderRenderFn =
    unsafe extern "C" fn(VdpDecoder, VdpVideoSurface, *const c_void, u32, *const VdpBitstreamBuffer) -> VdpStatus;
type VideoMixerCreateFn = unsafe extern "C" fn(
    VdpDevice,
    u32,
    *const u32,
    u32,
    *const u32,
    *const *const c_void,
    *mut VdpVideoMixer,
) -> VdpStatus;
type VideoMixerDestroyFn = unsafe extern "C" fn(VdpVideoMixer) -> VdpStatus;
type VideoMixerRenderFn = unsafe extern "C" fn(
    VdpVideoMixer,
    VdpOutputSurface,
    *const VdpRect,
    u32,
    u32,
    *const VdpVideoSurface,
    VdpVideoSurface,
    u32,
    *const VdpVideoSurface,
    *const VdpRect,
    VdpOutputSurface,
    *const VdpRect,
    *const VdpRect,
    u32,
    *const c_void,
) -> VdpStatus;
type QueueTargetCreateX11Fn = unsafe extern "C" fn(VdpDevice, Drawable, *mut VdpPresentationQueueTarget) -> VdpStatus;
type QueueTargetDestroyFn = unsafe extern "C" fn(VdpPresentationQueueTarget) -> VdpStatus;
type QueueCreateFn =
    unsafe extern "C" fn(VdpDevice, VdpPresentationQueueTarget, *mut VdpPresentationQueue) -> VdpStatus;
type QueueDestroyFn = unsafe extern "C" fn(VdpPresentationQueue) -> VdpStatus;
type QueueDisplayFn = unsafe extern "C" fn(VdpPresentationQueue, VdpOutputSurface, u32, u32, u64) -> VdpStatus;
type QueueBlockUntilIdleFn = unsafe extern "C" fn(VdpPresentationQueue, VdpOutputSurface, *mut u64) -> VdpStatus;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to load {path}: {source}")]
    Library {
        path: String,
        #[source]
        source: libloading::Error,
    },
    #[error("vdp_device_create_x11 not exported: {0}")]
    Symbol(#[source] libloading::Error),
    #[error("VDPAU device creation failed with VdpStatus {0}")]
    Device(VdpStatus),
    #[error("VDPAU function {name} unavailable (VdpStatus {status})")]
    Function { name: &'static str, status: VdpStatus },
}

// ============================================================================
// Loaded Functions Container
// ============================================================================

struct VdpauFunctions {
    get_error_string: GetErrorStringFn,
    get_api_version: GetApiVersionFn,
    get_information_string: GetInformationStringFn,
    device_destroy: DeviceDestroyFn,
    video_surface_create: VideoSurfaceCreateFn,
    video_surface_destroy: VideoSurfaceDestroyFn,
    video_surface_get_bits: VideoSurfaceGetBitsFn,
    output_surface_create: OutputSurfaceCreateFn,
    output_surface_destroy: OutputSurfaceDestroyFn,
    decoder_query_capabilities: DecoderQueryCapabilitiesFn,
    decoder_create: DecoderCreateFn,
    decoder_destroy: DecoderDestroyFn,
    decoder_render: DecoderRenderFn,
    video_mixer_create: VideoMixerCreateFn,
    video_mixer_destroy: VideoMixerDestroyFn,
    video_mixer_render: VideoMixerRenderFn,
    queue_target_create_x11: QueueTargetCreateX11Fn,
    queue_target_destroy: QueueTargetDestroyFn,
    queue_create: QueueCreateFn,
    queue_destroy: QueueDestroyFn,
    queue_display: QueueDisplayFn,
    queue_block_until_idle: QueueBlockUntilIdleFn,
}

/// Fetch one entry point and reinterpret it as its typed signature.
///
/// # Safety
/// `T` must be the function pointer type VDPAU documents for `id`.
unsafe fn resolve<T: Copy>(
    get_proc_address: VdpGetProcAddressFn,
    device: VdpDevice,
    id: VdpFuncId,
    name: &'static str,
) -> Result<T, LoadError> {
    debug_assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<*mut c_void>());
    let mut func: *mut c_void = ptr::null_mut();
    let status = get_proc_address(device, id, &mut func);
    if status != VDP_STATUS_OK || func.is_null() {
        return Err(LoadError::Function { name, status });
    }
    Ok(std::mem::transmute_copy::<*mut c_void, T>(&func))
}

impl VdpauFunctions {
    unsafe fn load(get: VdpGetProcAddressFn, device: VdpDevice) -> Result<Self, LoadError> {
        Ok(Self {
            get_error_string: resolve(get, device, VDP_FUNC_ID_GET_ERROR_STRING, "GetErrorString")?,
            get_api_version: resolve(get, device, VDP_FUNC_ID_GET_API_VERSION, "GetApiVersion")?,
            get_information_string: resolve(get, device, VDP_FUNC_ID_GET_INFORMATION_STRING, "GetInformationString")?,
            device_destroy: resolve(get, device, VDP_FUNC_ID_DEVICE_DESTROY, "DeviceDestroy")?,
            video_surface_create: resolve(get, device, VDP_FUNC_ID_VIDEO_SURFACE_CREATE, "VideoSurfaceCreate")?,
            video_surface_destroy: resolve(get, device, VDP_FUNC_ID_VIDEO_SURFACE_DESTROY, "VideoSurfaceDestroy")?,
            video_surface_get_bits: resolve(
                get,
                device,
                VDP_FUNC_ID_VIDEO_SURFACE_GET_BITS_Y_CB_CR,
                "VideoSurfaceGetBitsYCbCr",
            )?,
            output_surface_create: resolve(get, device, VDP_FUNC_ID_OUTPUT_SURFACE_CREATE, "OutputSurfaceCreate")?,
            output_surface_destroy: resolve(get, device, VDP_FUNC_ID_OUTPUT_SURFACE_DESTROY, "OutputSurfaceDestroy")?,
            decoder_query_capabilities: resolve(
                get,
                device,
                VDP_FUNC_ID_DECODER_QUERY_CAPABILITIES,
                "DecoderQueryCapabilities",
            )?,
            decoder_create: resolve(get, device, VDP_FUNC_ID_DECODER_CREATE, "DecoderCreate")?,
            decoder_destroy: resolve(get, device, VDP_FUNC_ID_DECODER_DESTROY, "DecoderDestroy")?,
            decoder_render: resolve(get, device, VDP_FUNC_ID_DECODER_RENDER, "DecoderRender")?,
            video_mixer_create: resolve(get, device, VDP_FUNC_ID_VIDEO_MIXER_CREATE, "VideoMixerCreate")?,
            video_mixer_destroy: resolve(get, device, VDP_FUNC_ID_VIDEO_MIXER_DESTROY, "VideoMixerDestroy")?,
            video_mixer_render: resolve(get, device, VDP_FUNC_ID_VIDEO_MIXER_RENDER, "VideoMixerRender")?,
            queue_target_create_x11: resolve(
                get,
                device,
                VDP_FUNC_ID_PRESENTATION_QUEUE_TARGET_CREATE_X11,
                "PresentationQueueTargetCreateX11",
            )?,
            queue_target_destroy: resolve(
                get,
                device,
                VDP_FUNC_ID_PRESENTATION_QUEUE_TARGET_DESTROY,
                "PresentationQueueTargetDestroy",
            )?,
            queue_create: resolve(get, device, VDP_FUNC_ID_PRESENTATION_QUEUE_CREATE, "PresentationQueueCreate")?,
            queue_destroy: resolve(get, device, VDP_FUNC_ID_PRESENTATION_QUEUE_DESTROY, "PresentationQueueDestroy")?,
            queue_display: resolve(get, device, VDP_FUNC_ID_PRESENTATION_QUEUE_DISPLAY, "PresentationQueueDisplay")?,
            queue_block_until_idle: resolve(
                get,
                device,
                VDP_FUNC_ID_PRESENTATION_QUEUE_BLOCK_UNTIL_SURFACE_IDLE,
                "PresentationQueueBlockUntilSurfaceIdle",
            )?,
        })
    }
}

// ============================================================================
// Backend
// ============================================================================

pub struct VdpauBackend {
    device: VdpDevice,
    api_version: u32,
    funcs: VdpauFunctions,
    _lib: libloading::Library,
}

impl VdpauBackend {
    /// Load `library` and create a device on an open X display.
    ///
    /// # Safety
    /// `display` must be a live Xlib `Display*` that outlives the backend.
    pub unsafe fn open_x11(library: &str, display: *mut c_void, screen: c_int) -> Result<Self, LoadError> {
        let lib = libloading::Library::new(library).map_err(|source| LoadError::Library {
            path: library.to_string(),
            source,
        })?;
        let device_create: VdpDeviceCreateX11Fn = *lib.get(b"vdp_device_create_x11\0").map_err(LoadError::Symbol)?;

        let mut device: VdpDevice = VDP_INVALID_HANDLE;
        let mut get_proc_address: Option<VdpGetProcAddressFn> = None;
        let status = device_create(display, screen, &mut device, &mut get_proc_address);
        let get_proc_address = match get_proc_address {
            Some(get) if status == VDP_STATUS_OK => get,
            _ => return Err(LoadError::Device(status)),
        };

        let funcs = match VdpauFunctions::load(get_proc_address, device) {
            Ok(funcs) => funcs,
            Err(e) => {
                // Release the device through the one entry point we may still reach
                if let Ok(destroy) = resolve::<DeviceDestroyFn>(
                    get_proc_address,
                    device,
                    VDP_FUNC_ID_DEVICE_DESTROY,
                    "DeviceDestroy",
                ) {
                    destroy(device);
                }
                return Err(e);
            }
        };

        let mut api_version = 0;
        if (funcs.get_api_version)(&mut api_version) != VDP_STATUS_OK {
            tracing::warn!("VDPAU API version unavailable");
        }

        let backend = Self {
            device,
            api_version,
            funcs,
            _lib: lib,
        };
        tracing::info!(
            "VDPAU device {} opened (API {}): {}",
            device,
            api_version,
            backend.information_string()
        );
        Ok(backend)
    }

    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    fn error_string(&self, status: VdpStatus) -> String {
        // SAFETY: GetErrorString returns a static string or null.
        unsafe {
            let s = (self.funcs.get_error_string)(status);
            if s.is_null() {
                return format!("status {}", status);
            }
            CStr::from_ptr(s).to_string_lossy().into_owned()
        }
    }

    fn check(&self, call: &'static str, status: VdpStatus) -> BackendResult<()> {
        if status == VDP_STATUS_OK {
            return Ok(());
        }
        tracing::debug!("{}: {}", call, self.error_string(status));
        Err(BackendError::call(call, status))
    }
}

impl Drop for VdpauBackend {
    fn drop(&mut self) {
        // SAFETY: the device was created by open_x11 and is destroyed once.
        let status = unsafe { (self.funcs.device_destroy)(self.device) };
        if status != VDP_STATUS_OK {
            tracing::warn!("VDPAU device destroy failed: {}", self.error_string(status));
        }
    }
}

// Every call below passes handles the driver got from this device and
// pointers that live for the duration of the call.
impl Backend for VdpauBackend {
    fn information_string(&self) -> String {
        let mut info: *const c_char = ptr::null();
        let status = unsafe { (self.funcs.get_information_string)(&mut info) };
        if status != VDP_STATUS_OK || info.is_null() {
            return String::from("unknown VDPAU implementation");
        }
        unsafe { CStr::from_ptr(info) }.to_string_lossy().into_owned()
    }

    fn decoder_query_capabilities(&self, profile: VdpDecoderProfile) -> BackendResult<DecoderCaps> {
        let mut supported: VdpBool = 0;
        let mut caps = DecoderCaps::default();
        let status = unsafe {
            (self.funcs.decoder_query_capabilities)(
                self.device,
                profile,
                &mut supported,
                &mut caps.max_level,
                &mut caps.max_macroblocks,
                &mut caps.max_width,
                &mut caps.max_height,
            )
        };
        self.check("decoder_query_capabilities", status)?;
        caps.supported = supported != 0;
        Ok(caps)
    }

    fn decoder_create(
        &self,
        profile: VdpDecoderProfile,
        width: u32,
        height: u32,
        max_references: u32,
    ) -> BackendResult<VdpDecoder> {
        let mut decoder = VDP_INVALID_HANDLE;
        let status =
            unsafe { (self.funcs.decoder_create)(self.device, profile, width, height, max_references, &mut decoder) };
        self.check("decoder_create", status)?;
        Ok(decoder)
    }

    fn decoder_destroy(&self, decoder: VdpDecoder) -> BackendResult<()> {
        let status = unsafe { (self.funcs.decoder_destroy)(decoder) };
        self.check("decoder_destroy", status)
    }

    fn decoder_render(
        &self,
        decoder: VdpDecoder,
        target: VdpVideoSurface,
        info: &VdpPictureInfoH264,
        bitstream: &[Bytes],
    ) -> BackendResult<()> {
        let buffers: Vec<VdpBitstreamBuffer> = bitstream
            .iter()
            .map(|chunk| VdpBitstreamBuffer {
                struct_version: VDP_BITSTREAM_BUFFER_VERSION,
                bitstream: chunk.as_ptr().cast(),
                bitstream_bytes: chunk.len() as u32,
            })
            .collect();

        let status = unsafe {
            (self.funcs.decoder_render)(
                decoder,
                target,
                (info as *const VdpPictureInfoH264).cast(),
                buffers.len() as u32,
                buffers.as_ptr(),
            )
        };
        self.check("decoder_render", status)
    }

    fn video_surface_create(&self, chroma: VdpChromaType, width: u32, height: u32) -> BackendResult<VdpVideoSurface> {
        let mut surface = VDP_INVALID_HANDLE;
        let status = unsafe { (self.funcs.video_surface_create)(self.device, chroma, width, height, &mut surface) };
        self.check("video_surface_create", status)?;
        Ok(surface)
    }

    fn video_surface_destroy(&self, surface: VdpVideoSurface) -> BackendResult<()> {
        let status = unsafe { (self.funcs.video_surface_destroy)(surface) };
        self.check("video_surface_destroy", status)
    }

    fn video_surface_get_bits(
        &self,
        surface: VdpVideoSurface,
        format: VdpYCbCrFormat,
        planes: &mut [&mut [u8]],
        pitches: &[u32],
    ) -> BackendResult<()> {
        if planes.len() != pitches.len() {
            return Err(BackendError::call("video_surface_get_bits", VDP_STATUS_ERROR));
        }
        let pointers: Vec<*mut c_void> = planes.iter_mut().map(|plane| plane.as_mut_ptr().cast()).collect();
        let status =
            unsafe { (self.funcs.video_surface_get_bits)(surface, format, pointers.as_ptr(), pitches.as_ptr()) };
        self.check("video_surface_get_bits", status)
    }

    fn video_mixer_create(&self, width: u32, height: u32, chroma: VdpChromaType) -> BackendResult<VdpVideoMixer> {
        let parameters = [
            VDP_VIDEO_MIXER_PARAMETER_VIDEO_SURFACE_WIDTH,
            VDP_VIDEO_MIXER_PARAMETER_VIDEO_SURFACE_HEIGHT,
            VDP_VIDEO_MIXER_PARAMETER_CHROMA_TYPE,
        ];
        let values: [*const c_void; 3] = [
            (&width as *const u32).cast(),
            (&height as *const u32).cast(),
            (&chroma as *const u32).cast(),
        ];

        let mut mixer = VDP_INVALID_HANDLE;
        let status = unsafe {
            (self.funcs.video_mixer_create)(
                self.device,
                0,
                ptr::null(),
                parameters.len() as u32,
                parameters.as_ptr(),
                values.as_ptr(),
                &mut mixer,
            )
        };
        self.check("video_mixer_create", status)?;
        Ok(mixer)
    }

    fn video_mixer_destroy(&self, mixer: VdpVideoMixer) -> BackendResult<()> {
        let status = unsafe { (self.funcs.video_mixer_destroy)(mixer) };
        self.check("video_mixer_destroy", status)
    }

    fn video_mixer_render(
        &self,
        mixer: VdpVideoMixer,
        source: VdpVideoSurface,
        source_rect: Option<VdpRect>,
        destination: VdpOutputSurface,
        destination_rect: Option<VdpRect>,
    ) -> BackendResult<()> {
        let rect_ptr = |rect: &Option<VdpRect>| rect.as_ref().map_or(ptr::null(), |r| r as *const VdpRect);
        let status = unsafe {
            (self.funcs.video_mixer_render)(
                mixer,
                VDP_INVALID_HANDLE,
                ptr::null(),
                VDP_VIDEO_MIXER_PICTURE_STRUCTURE_FRAME,
                0,
                ptr::null(),
                source,
                0,
                ptr::null(),
                rect_ptr(&source_rect),
                destination,
                rect_ptr(&destination_rect),
                rect_ptr(&destination_rect),
                0,
                ptr::null(),
            )
        };
        self.check("video_mixer_render", status)
    }

    fn output_surface_create(&self, format: VdpRGBAFormat, width: u32, height: u32) -> BackendResult<VdpOutputSurface> {
        let mut surface = VDP_INVALID_HANDLE;
        let status = unsafe { (self.funcs.output_surface_create)(self.device, format, width, height, &mut surface) };
        self.check("output_surface_create", status)?;
        Ok(surface)
    }

    fn output_surface_destroy(&self, surface: VdpOutputSurface) -> BackendResult<()> {
        let status = unsafe { (self.funcs.output_surface_destroy)(surface) };
        self.check("output_surface_destroy", status)
    }

    fn presentation_queue_target_create(&self, drawable: Drawable) -> BackendResult<VdpPresentationQueueTarget> {
        let mut target = VDP_INVALID_HANDLE;
        let status = unsafe { (self.funcs.queue_target_create_x11)(self.device, drawable, &mut target) };
        self.check("presentation_queue_target_create", status)?;
        Ok(target)
    }

    fn presentation_queue_target_destroy(&self, target: VdpPresentationQueueTarget) -> BackendResult<()> {
        let status = unsafe { (self.funcs.queue_target_destroy)(target) };
        self.check("presentation_queue_target_destroy", status)
    }

    fn presentation_queue_create(&self, target: VdpPresentationQueueTarget) -> BackendResult<VdpPresentationQueue> {
        let mut queue = VDP_INVALID_HANDLE;
        let status = unsafe { (self.funcs.queue_create)(self.device, target, &mut queue) };
        self.check("presentation_queue_create", status)?;
        Ok(queue)
    }

    fn presentation_queue_destroy(&self, queue: VdpPresentationQueue) -> BackendResult<()> {
        let status = unsafe { (self.funcs.queue_destroy)(queue) };
        self.check("presentation_queue_destroy", status)
    }

    fn presentation_queue_display(
        &self,
        queue: VdpPresentationQueue,
        surface: VdpOutputSurface,
        clip_width: u32,
        clip_height: u32,
    ) -> BackendResult<()> {
        // earliest_presentation_time 0: show as soon as possible
        let status = unsafe { (self.funcs.queue_display)(queue, surface, clip_width, clip_height, 0) };
        self.check("presentation_queue_display", status)
    }

    fn presentation_queue_block_until_idle(
        &self,
        queue: VdpPresentationQueue,
        surface: VdpOutputSurface,
    ) -> BackendResult<()> {
        let mut first_presentation_time = 0u64;
        let status = unsafe { (self.funcs.queue_block_until_idle)(queue, surface, &mut first_presentation_time) };
        self.check("presentation_queue_block_until_idle", status)
    }
}
