/// Index of a value in an [`Arena`](crate::arena::Arena).
///
/// Arenas never free slots, so a handle stays valid for the arena's lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

impl Handle {
    pub fn new(index: u32) -> Self {
        Handle(index)
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Opaque handle into a rendering engine's layer tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerHandle(pub Handle);

/// Identifies the leaf data source underneath a layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub Handle);

impl std::fmt::Display for LayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0.index())
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "source#{}", self.0.index())
    }
}
