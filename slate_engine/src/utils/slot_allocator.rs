/// Bounded allocator of reusable `u32` slot ids
///
/// Ids are handed out from `0..capacity`. Freed ids go back to a free list
/// and are reused before any fresh id, most recently freed first.
///
/// # Example
///
/// ```ignore
/// let mut slots = SlotAllocator::new("shaders", 2);
/// let a = slots.alloc()?;   // 0
/// let b = slots.alloc()?;   // 1
/// assert!(slots.alloc().is_err());
/// slots.free(a);
/// let c = slots.alloc()?;   // 0 (recycled)
/// ```

use crate::error::{Error, Result};

pub struct SlotAllocator {
    /// Name reported in `CapacityExceeded`
    what: &'static str,
    capacity: u32,
    free_list: Vec<u32>,
    allocated: Vec<bool>,
    len: u32,
}

impl SlotAllocator {
    pub fn new(what: &'static str, capacity: u32) -> Self {
        Self {
            what,
            capacity,
            free_list: Vec::new(),
            allocated: Vec::new(),
            len: 0,
        }
    }

    /// Take a free id, failing once all `capacity` ids are in use
    pub fn alloc(&mut self) -> Result<u32> {
        if self.len == self.capacity {
            crate::engine_warn!("slate::SlotAllocator", "No free {} slot (capacity {})", self.what, self.capacity);
            return Err(Error::CapacityExceeded {
                what: self.what,
                capacity: self.capacity as usize,
            });
        }
        let id = match self.free_list.pop() {
            Some(id) => id,
            None => {
                self.allocated.push(false);
                self.allocated.len() as u32 - 1
            }
        };
        self.allocated[id as usize] = true;
        self.len += 1;
        Ok(id)
    }

    /// Return `id` to the pool; `false` if it was not allocated
    pub fn free(&mut self, id: u32) -> bool {
        match self.allocated.get_mut(id as usize) {
            Some(slot) if *slot => {
                *slot = false;
                self.len -= 1;
                self.free_list.push(id);
                true
            }
            _ => false,
        }
    }

    pub fn is_allocated(&self, id: u32) -> bool {
        self.allocated.get(id as usize).copied().unwrap_or(false)
    }

    /// Highest id ever handed out + 1
    pub fn high_water_mark(&self) -> u32 {
        self.allocated.len() as u32
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of ids currently in use
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }
}

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
