use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preparer {
    pub id: i64,
    pub name: String,
}

/// A tax filing assistant. Same shape as [`Preparer`], kept as its own type so
/// ids from the two tables can't be mixed up at call sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    pub id: i64,
    pub name: String,
}
