use slotmap::new_key_type;

new_key_type! {
    /// Opaque entity handle (index + generation)
    ///
    /// A destroyed entity's handle never becomes valid again: the slot may
    /// be reused, but with a bumped generation.
    pub struct Entity;
}
