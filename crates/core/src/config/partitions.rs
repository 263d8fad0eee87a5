//! Partition naming derived from a single version token.

use serde::{Deserialize, Serialize};

/// Names of the two partitions owned by the running version.
///
/// Both names are derived from the same prefix and version, so the stale
/// check and the names themselves cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionNames {
    static_name: String,
    dynamic_name: String,
}

impl PartitionNames {
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            static_name: format!("{prefix}-static-{version}"),
            dynamic_name: format!("{prefix}-dynamic-{version}"),
        }
    }

    pub fn static_name(&self) -> &str {
        &self.static_name
    }

    pub fn dynamic_name(&self) -> &str {
        &self.dynamic_name
    }

    /// Lookup order for cache-first reads: dynamic overrides static.
    pub fn lookup_order(&self) -> [&str; 2] {
        [&self.dynamic_name, &self.static_name]
    }

    /// A partition is stale when it is neither of the current names.
    pub fn is_stale(&self, name: &str) -> bool {
        name != self.static_name && name != self.dynamic_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let names = PartitionNames::new("offgrid", "v1.0.0");
        assert_eq!(names.static_name(), "offgrid-static-v1.0.0");
        assert_eq!(names.dynamic_name(), "offgrid-dynamic-v1.0.0");
        assert_eq!(names.lookup_order(), ["offgrid-dynamic-v1.0.0", "offgrid-static-v1.0.0"]);
    }

    #[test]
    fn test_is_stale() {
        let names = PartitionNames::new("offgrid", "v2");
        assert!(!names.is_stale("offgrid-static-v2"));
        assert!(!names.is_stale("offgrid-dynamic-v2"));
        assert!(names.is_stale("offgrid-static-v1"));
        assert!(names.is_stale("offgrid-v2"));
        assert!(names.is_stale("someone-else"));
    }
}
