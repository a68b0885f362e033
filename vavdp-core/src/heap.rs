//! # Object Heap
//!
//! Slot allocator backing every VA object type. Each heap hands out 32-bit
//! handles laid out as:
//!
//! ```text
//!  31      24 23      16 15                0
//! +----------+----------+-------------------+
//! |   kind   |   gen    |       slot        |
//! +----------+----------+-------------------+
//! ```
//!
//! The kind byte keeps ids of different object types apart, so a surface id
//! handed to the config heap never resolves. The generation byte is bumped on
//! every free, so a stale id stops resolving once its slot is reused (until
//! the counter wraps after 256 reuses of the same slot).

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Largest slot count a heap can address.
pub const MAX_SLOTS: usize = 1 << 16;

const KIND_SHIFT: u32 = 24;
const GEN_SHIFT: u32 = 16;
const SLOT_MASK: u32 = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Config = 1,
    Context = 2,
    Surface = 3,
    Buffer = 4,
    Image = 5,
    VideoMixer = 6,
}

impl ObjectKind {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Config),
            2 => Some(Self::Context),
            3 => Some(Self::Surface),
            4 => Some(Self::Buffer),
            5 => Some(Self::Image),
            6 => Some(Self::VideoMixer),
            _ => None,
        }
    }
}

/// Opaque, kind-tagged object id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    fn new(kind: ObjectKind, generation: u8, slot: u16) -> Self {
        Self(((kind as u32) << KIND_SHIFT) | ((generation as u32) << GEN_SHIFT) | slot as u32)
    }

    /// Wrap an id received from the caller. Validity is only checked on lookup.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn kind(&self) -> Option<ObjectKind> {
        ObjectKind::from_tag((self.0 >> KIND_SHIFT) as u8)
    }

    pub fn generation(&self) -> u8 {
        (self.0 >> GEN_SHIFT) as u8
    }

    pub fn slot(&self) -> usize {
        (self.0 & SLOT_MASK) as usize
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind:?} heap exhausted ({capacity} slots)")]
pub struct HeapFull {
    pub kind: ObjectKind,
    pub capacity: usize,
}

struct Slot<T> {
    generation: u8,
    object: Option<T>,
}

pub struct ObjectHeap<T> {
    kind: ObjectKind,
    slots: Vec<Slot<T>>,
    free: BTreeSet<u16>,
    capacity: usize,
    live: usize,
}

impl<T> ObjectHeap<T> {
    pub fn new(kind: ObjectKind) -> Self {
        Self::with_capacity(kind, MAX_SLOTS)
    }

    pub fn with_capacity(kind: ObjectKind, capacity: usize) -> Self {
        Self {
            kind,
            slots: Vec::new(),
            free: BTreeSet::new(),
            capacity: capacity.clamp(1, MAX_SLOTS),
            live: 0,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Store `object` in the lowest free slot.
    pub fn allocate(&mut self, object: T) -> Result<Handle, HeapFull> {
        let index = match self.free.pop_first() {
            Some(index) => index as usize,
            None if self.slots.len() < self.capacity => {
                self.slots.push(Slot { generation: 0, object: None });
                self.slots.len() - 1
            }
            None => {
                return Err(HeapFull {
                    kind: self.kind,
                    capacity: self.capacity,
                })
            }
        };

        let slot = &mut self.slots[index];
        debug_assert!(slot.object.is_none());
        slot.object = Some(object);
        self.live += 1;
        Ok(Handle::new(self.kind, slot.generation, index as u16))
    }

    fn slot_of(&self, handle: Handle) -> Option<usize> {
        if handle.kind() != Some(self.kind) {
            return None;
        }
        let index = handle.slot();
        let slot = self.slots.get(index)?;
        (slot.generation == handle.generation() && slot.object.is_some()).then_some(index)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.slot_of(handle).is_some()
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        let index = self.slot_of(handle)?;
        self.slots[index].object.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        let index = self.slot_of(handle)?;
        self.slots[index].object.as_mut()
    }

    /// Release the slot and hand the object back to the caller.
    pub fn free(&mut self, handle: Handle) -> Option<T> {
        let index = self.slot_of(handle)?;
        let slot = &mut self.slots[index];
        let object = slot.object.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.insert(index as u16);
        self.live -= 1;
        object
    }

    /// Release every live slot, returning the objects in slot order.
    pub fn clear(&mut self) -> Vec<(Handle, T)> {
        let handles = self.handles();
        handles
            .into_iter()
            .filter_map(|handle| self.free(handle).map(|object| (handle, object)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> + '_ {
        let kind = self.kind;
        self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.object
                .as_ref()
                .map(|object| (Handle::new(kind, slot.generation, index as u16), object))
        })
    }

    pub fn handles(&self) -> Vec<Handle> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
