//! Query builder utilities
//!
//! This module provides filter construction for document queries.

use bson::Bson;

/// Query condition operators
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Eq,        // literal value
    Ne,        // $ne
    Gt,        // $gt
    Gte,       // $gte
    Lt,        // $lt
    Lte,       // $lte
    In,        // $in
    NotIn,     // $nin
    Exists,    // $exists
    Mod,       // $mod [divisor, remainder]
    IsNull,    // field: null
    IsNotNull, // $ne: null
}

impl QueryOperator {
    /// Operator key used inside an operator object, `None` for plain equality
    pub fn to_key(&self) -> Option<&'static str> {
        match self {
            QueryOperator::Eq | QueryOperator::IsNull => None,
            QueryOperator::Ne | QueryOperator::IsNotNull => Some("$ne"),
            QueryOperator::Gt => Some("$gt"),
            QueryOperator::Gte => Some("$gte"),
            QueryOperator::Lt => Some("$lt"),
            QueryOperator::Lte => Some("$lte"),
            QueryOperator::In => Some("$in"),
            QueryOperator::NotIn => Some("$nin"),
            QueryOperator::Exists => Some("$exists"),
            QueryOperator::Mod => Some("$mod"),
        }
    }
}

/// Single condition on one field
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<Bson>, // None for IsNull/IsNotNull
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
}

impl QueryFilter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, value: Option<Bson>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    /// Create AND group
    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// Create OR group
    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    /// Equal condition
    pub fn eq(field: &str, value: impl Into<Bson>) -> Self {
        Self::condition(field, QueryOperator::Eq, Some(value.into()))
    }

    /// Not equal condition
    pub fn ne(field: &str, value: impl Into<Bson>) -> Self {
        Self::condition(field, QueryOperator::Ne, Some(value.into()))
    }

    /// Greater than condition
    pub fn gt(field: &str, value: impl Into<Bson>) -> Self {
        Self::condition(field, QueryOperator::Gt, Some(value.into()))
    }

    /// Greater than or equal condition
    pub fn gte(field: &str, value: impl Into<Bson>) -> Self {
        Self::condition(field, QueryOperator::Gte, Some(value.into()))
    }

    /// Less than condition
    pub fn lt(field: &str, value: impl Into<Bson>) -> Self {
        Self::condition(field, QueryOperator::Lt, Some(value.into()))
    }

    /// Less than or equal condition
    pub fn lte(field: &str, value: impl Into<Bson>) -> Self {
        Self::condition(field, QueryOperator::Lte, Some(value.into()))
    }

    /// IN condition
    pub fn in_values(field: &str, values: Vec<Bson>) -> Self {
        Self::condition(field, QueryOperator::In, Some(Bson::Array(values)))
    }

    /// NOT IN condition
    pub fn not_in_values(field: &str, values: Vec<Bson>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(Bson::Array(values)))
    }

    /// Field presence condition
    pub fn exists(field: &str, present: bool) -> Self {
        Self::condition(field, QueryOperator::Exists, Some(Bson::Boolean(present)))
    }

    /// Modulo condition: `field % divisor == remainder`
    pub fn modulo(field: &str, divisor: i64, remainder: i64) -> Self {
        Self::condition(
            field,
            QueryOperator::Mod,
            Some(Bson::Array(vec![
                Bson::Int64(divisor),
                Bson::Int64(remainder),
            ])),
        )
    }

    /// Null (or missing) condition
    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    /// Not null condition
    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }
}
