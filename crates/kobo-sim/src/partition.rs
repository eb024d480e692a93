//! Spatial partition index.
//!
//! The playfield is cut into a fixed square grid of partitions. Each live
//! actor is listed in the partition containing its (wrapped) position.
//! Because an actor extends at most `MAX_ACTOR_SIZE` right and down from its
//! position, a rectangle query only has to look one partition further left
//! or up when the rectangle starts within that distance of a partition edge.

use glam::I16Vec2;

use kobo_core::constants::MAX_ACTOR_SIZE;
use kobo_core::types::{Playfield, Rect};

use crate::arena::ActorId;

/// Where an actor is listed: partition index and position in its member list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSlot {
    pub cell: usize,
    pub index: usize,
}

pub struct Partition {
    /// Area whose positions belong to this partition.
    pub bounds: Rect,
    /// `bounds` grown by the largest actor size on every side.
    pub extended_bounds: Rect,
    members: Vec<ActorId>,
}

impl Partition {
    pub fn members(&self) -> &[ActorId] {
        &self.members
    }
}

/// Inclusive range of (unwrapped) grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionRange {
    pub x1: i32,
    pub x2: i32,
    pub y1: i32,
    pub y2: i32,
    count: i32,
}

impl PartitionRange {
    pub fn empty() -> Self {
        Self {
            x1: 0,
            x2: -1,
            y1: 0,
            y2: -1,
            count: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x1 > self.x2 || self.y1 > self.y2
    }

    /// Partition indices covered by the range, grid coordinates wrapped.
    pub fn cells(&self) -> impl Iterator<Item = usize> + '_ {
        let mask = self.count - 1;
        let count = self.count;
        (self.y1..=self.y2).flat_map(move |y| {
            (self.x1..=self.x2).map(move |x| ((x & mask) + (y & mask) * count) as usize)
        })
    }
}

pub struct PartitionGrid {
    partitions: Vec<Partition>,
    count: usize,
    cell_size: I16Vec2,
    playfield: Playfield,
}

impl PartitionGrid {
    /// `count` partitions per side; must be a power of two dividing the playfield.
    pub fn new(playfield: Playfield, count: usize) -> Self {
        debug_assert!(count.is_power_of_two(), "partition count {count} not a power of two");
        let cell_size = playfield.size() / count as i16;
        let mut partitions = Vec::with_capacity(count * count);
        for y in 0..count {
            for x in 0..count {
                let bounds = Rect::from_origin_size(
                    I16Vec2::new(x as i16 * cell_size.x, y as i16 * cell_size.y),
                    cell_size,
                );
                partitions.push(Partition {
                    bounds,
                    extended_bounds: bounds.inflate(MAX_ACTOR_SIZE),
                    members: Vec::new(),
                });
            }
        }
        Self {
            partitions,
            count,
            cell_size,
            playfield,
        }
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn partition(&self, cell: usize) -> &Partition {
        &self.partitions[cell]
    }

    pub fn members(&self, cell: usize) -> &[ActorId] {
        &self.partitions[cell].members
    }

    /// Partition owning a position. The position is wrapped first.
    pub fn index_of(&self, position: I16Vec2) -> usize {
        let p = self.playfield.wrap(position);
        let x = (p.x / self.cell_size.x) as usize;
        let y = (p.y / self.cell_size.y) as usize;
        x + y * self.count
    }

    /// Partitions that may hold an actor overlapping `rect`.
    pub fn range(&self, rect: &Rect) -> PartitionRange {
        if !rect.is_valid() {
            return PartitionRange::empty();
        }
        let count = self.count as i32;
        let axis = |start: i32, end: i32, size: i32| {
            let mut first = start.div_euclid(size);
            let last = (end - 1).div_euclid(size);
            if start.rem_euclid(size) < MAX_ACTOR_SIZE as i32 {
                first -= 1;
            }
            (first, last.min(first + count - 1))
        };
        let (x1, x2) = axis(rect.left(), rect.right(), self.cell_size.x as i32);
        let (y1, y2) = axis(rect.top(), rect.bottom(), self.cell_size.y as i32);
        PartitionRange {
            x1,
            x2,
            y1,
            y2,
            count,
        }
    }

    pub fn insert(&mut self, cell: usize, id: ActorId) -> PartitionSlot {
        let members = &mut self.partitions[cell].members;
        members.push(id);
        PartitionSlot {
            cell,
            index: members.len() - 1,
        }
    }

    /// Drop the member at `slot`. Returns the actor that was moved into the
    /// vacated index, whose own slot must be updated by the caller.
    pub fn remove(&mut self, slot: PartitionSlot) -> Option<ActorId> {
        let members = &mut self.partitions[slot.cell].members;
        debug_assert!(slot.index < members.len(), "stale partition slot {slot:?}");
        if slot.index >= members.len() {
            return None;
        }
        members.swap_remove(slot.index);
        members.get(slot.index).copied()
    }
}
