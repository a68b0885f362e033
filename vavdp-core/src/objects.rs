// OBJECTS - Driver Resource Records
//
// Plain data stored in the object heaps. Cross-references between objects are
// heap handles; back-end resources are the raw VDPAU handles they wrap.

use crate::backend::*;
use crate::h264::{DecodeBuffer, PictureAccumulator};
use crate::heap::Handle;
use crate::va::*;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct Config {
    pub profile: VAProfile,
    pub entrypoint: VAEntrypoint,
    pub max_width: u32,
    pub max_height: u32,
    pub attribs: Vec<VAConfigAttrib>,
}

/// Per-context decode state.
#[derive(Debug, Default)]
pub enum DecodeState {
    #[default]
    Idle,
    PictureOpen {
        target: Handle,
        picture: Box<PictureAccumulator>,
    },
}

impl DecodeState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::PictureOpen { .. })
    }

    pub fn target(&self) -> Option<Handle> {
        match self {
            Self::Idle => None,
            Self::PictureOpen { target, .. } => Some(*target),
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub config: Handle,
    pub width: u32,
    pub height: u32,
    pub flags: i32,
    pub render_targets: BTreeSet<Handle>,
    pub state: DecodeState,
    pub decoder: Option<VdpDecoder>,
    pub mixer: Option<Handle>,
    pub queues: HashMap<Drawable, PresentationQueueEntry>,
    pub ring: Option<OutputRing>,
}

impl Context {
    pub fn new(config: Handle, width: u32, height: u32, flags: i32) -> Self {
        Self {
            config,
            width,
            height,
            flags,
            render_targets: BTreeSet::new(),
            state: DecodeState::Idle,
            decoder: None,
            mixer: None,
            queues: HashMap::new(),
            ring: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Surface {
    pub context: Option<Handle>,
    pub rt_format: u32,
    pub width: u32,
    pub height: u32,
    pub vdp: VdpVideoSurface,
}

#[derive(Debug, Clone)]
pub struct Buffer {
    pub buffer_type: VABufferType,
    pub kind: Option<DecodeBuffer>,
    pub context: Option<Handle>,
    pub data: Vec<u8>,
    pub num_elements: u32,
    pub mapped: bool,
}

impl Buffer {
    pub fn new(buffer_type: VABufferType, context: Option<Handle>, data: Vec<u8>) -> Self {
        Self {
            buffer_type,
            kind: DecodeBuffer::from_va(buffer_type),
            context,
            data,
            num_elements: 1,
            mapped: false,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub format: VAImageFormat,
    pub width: u32,
    pub height: u32,
    pub num_planes: u32,
    pub pitches: [u32; 3],
    pub offsets: [u32; 3],
    pub data_size: u32,
    pub buffer: Handle,
}

#[derive(Debug, Clone)]
pub struct VideoMixer {
    pub context: Handle,
    pub width: u32,
    pub height: u32,
    pub chroma: VdpChromaType,
    pub vdp: VdpVideoMixer,
}

impl VideoMixer {
    pub fn matches(&self, width: u32, height: u32, chroma: VdpChromaType) -> bool {
        self.width == width && self.height == height && self.chroma == chroma
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PresentationQueueEntry {
    pub drawable: Drawable,
    pub queue: VdpPresentationQueue,
    pub target: VdpPresentationQueueTarget,
}

/// Output surfaces displayed round-robin by PutSurface.
#[derive(Debug, Clone)]
pub struct OutputRing {
    pub width: u32,
    pub height: u32,
    pub surfaces: Vec<VdpOutputSurface>,
    pub next: usize,
}

impl OutputRing {
    pub fn current(&self) -> VdpOutputSurface {
        self.surfaces[self.next]
    }

    pub fn advance(&mut self) {
        self.next = (self.next + 1) % self.surfaces.len();
    }
}
