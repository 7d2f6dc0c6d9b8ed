use uuid::Uuid;

pub type Id = String;

/// Reserved namespace for client-supplied placeholder tokens. Anything under
/// this prefix is a placeholder handle, never a real identifier, and must be
/// resolved before persistence.
pub const PLACEHOLDER_PREFIX: &str = "tmp-";

pub fn is_placeholder(value: &str) -> bool {
    value.starts_with(PLACEHOLDER_PREFIX)
}

/// Generate a new real identifier. UUID v4 keeps generated ids outside the
/// placeholder namespace and collision-free across the life of the system.
pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}
