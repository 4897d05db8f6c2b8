//! Query builder utilities
//!
//! This module provides sort direction handling.

use bson::Bson;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Map an ascending flag onto a direction
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    /// Direction value used in sort and index key documents
    pub fn to_direction(&self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }

    pub fn to_bson(&self) -> Bson {
        Bson::Int32(self.to_direction())
    }
}
