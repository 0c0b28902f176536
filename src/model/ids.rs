//! Opaque record identifiers.

use uuid::Uuid;

/// Generate a fresh identifier of the form `<prefix>-<32 hex digits>`.
///
/// # Example
///
/// ```
/// use kanban::model::generate_id;
///
/// let id = generate_id("board");
/// assert!(id.starts_with("board-"));
/// assert_eq!(id.len(), "board-".len() + 32);
/// ```
#[must_use]
pub fn generate_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id("col")).collect();
        assert_eq!(ids.len(), 1000);
    }
}
