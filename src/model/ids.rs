//! Agency-scoped entity identifiers.

use std::fmt;

/// Identifier for a schedule entity (vehicle, group, trip, stop), scoped to
/// the agency that owns it.
///
/// Feeds from multiple agencies may use colliding raw ids, so every id in
/// the engine carries its agency qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    agency: String,
    id: String,
}

impl EntityId {
    /// Create a new entity id.
    pub fn new(agency: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
            id: id.into(),
        }
    }

    /// The agency qualifier.
    pub fn agency(&self) -> &str {
        &self.agency
    }

    /// The agency-local id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.agency, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_display() {
        let id = EntityId::new("metro", "4012");
        assert_eq!(id.to_string(), "metro_4012");
    }

    #[test]
    fn test_entity_id_equality_and_hash() {
        use std::collections::HashSet;

        let a = EntityId::new("metro", "4012");
        let b = EntityId::new("metro", "4012");
        let c = EntityId::new("sound", "4012");
        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
        assert!(!set.contains(&c));
    }
}
