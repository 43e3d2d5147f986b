use crate::handles::Handle;

/// Append-only arena.
///
/// Engine objects outlive their attachment to a map, so slots are never
/// freed and handles never go stale.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    values: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: T) -> Handle {
        let index = self.values.len() as u32;
        self.values.push(value);
        Handle::new(index)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.values.get(handle.index() as usize)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.values.get_mut(handle.index() as usize)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        (handle.index() as usize) < self.values.len()
    }
}
