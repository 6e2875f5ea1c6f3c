use serde::{Deserialize, Serialize};

/// Sort direction. Parses case-insensitively; anything but `desc` is ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl From<&str> for SortOrder {
    fn from(direction: &str) -> Self {
        if direction.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

impl From<String> for SortOrder {
    fn from(direction: String) -> Self {
        SortOrder::from(direction.as_str())
    }
}

impl From<SortOrder> for String {
    fn from(order: SortOrder) -> Self {
        order.to_sql().to_string()
    }
}

/// One ORDER BY key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub key: String,
    #[serde(default)]
    pub direction: SortOrder,
}

impl OrderBy {
    pub fn new(key: &str, direction: SortOrder) -> Self {
        Self {
            key: key.to_string(),
            direction,
        }
    }

    pub fn asc(key: &str) -> Self {
        Self::new(key, SortOrder::Asc)
    }

    pub fn desc(key: &str) -> Self {
        Self::new(key, SortOrder::Desc)
    }
}
