use std::fmt;

/// Case-insensitive identity of a relation.
///
/// Every component is lower-cased on construction, so two relations that
/// differ only in declared casing produce equal keys. Use the originating
/// relation for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceKey {
    database: String,
    schema: String,
    identifier: String,
}

impl ReferenceKey {
    pub fn new(database: &str, schema: &str, identifier: &str) -> Self {
        Self {
            database: database.to_lowercase(),
            schema: schema.to_lowercase(),
            identifier: identifier.to_lowercase(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn schema_key(&self) -> SchemaKey {
        SchemaKey {
            database: self.database.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.identifier)
    }
}

/// Case-insensitive identity of a (database, schema) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaKey {
    database: String,
    schema: String,
}

impl SchemaKey {
    pub fn new(database: &str, schema: &str) -> Self {
        Self {
            database: database.to_lowercase(),
            schema: schema.to_lowercase(),
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }
}

impl fmt::Display for SchemaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_ignores_case() {
        assert_eq!(
            ReferenceKey::new("DB", "Sch", "Tbl"),
            ReferenceKey::new("db", "sch", "tbl")
        );
        assert_ne!(
            ReferenceKey::new("db", "sch", "tbl"),
            ReferenceKey::new("db", "sch", "tbl2")
        );
    }

    #[test]
    fn hashes_consistently() {
        let mut seen = HashSet::new();
        assert!(seen.insert(ReferenceKey::new("Analytics", "PUBLIC", "Orders")));
        assert!(!seen.insert(ReferenceKey::new("analytics", "public", "orders")));
    }

    #[test]
    fn schema_key_of_reference_key() {
        let key = ReferenceKey::new("DB", "Sch", "Tbl");
        assert_eq!(key.schema_key(), SchemaKey::new("db", "SCH"));
        assert_eq!(key.to_string(), "db.sch.tbl");
    }
}
