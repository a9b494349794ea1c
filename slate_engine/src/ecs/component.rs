/// Marker trait for data attached to entities
///
/// Components are plain data. `Clone` is required so entities can be
/// duplicated.
pub trait Component: Clone + 'static {
    /// At most one instance is expected to act as "the" instance
    /// (ambient light, directional light). Extra instances are allowed but
    /// reported.
    const UNIQUE: bool = false;
}

/// Short type name used in log and error messages
pub(crate) fn component_name<T: 'static>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
