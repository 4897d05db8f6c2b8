use bson::{Bson, Document};

/// Represents group accumulator functions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateFunction {
    /// `{$sum: 1}`
    Count,
    /// `{$sum: "$field"}`
    Sum,
    /// `{$avg: "$field"}`
    Avg,
    /// `{$min: "$field"}`
    Min,
    /// `{$max: "$field"}`
    Max,
}

impl AggregateFunction {
    /// Accumulator operator key
    pub fn to_operator(&self) -> &'static str {
        match self {
            AggregateFunction::Count | AggregateFunction::Sum => "$sum",
            AggregateFunction::Avg => "$avg",
            AggregateFunction::Min => "$min",
            AggregateFunction::Max => "$max",
        }
    }

    fn default_prefix(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }
}

/// Computed value inside a pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Field path, rendered as `"$field"`
    Field(String),
    /// Constant value
    Literal(Bson),
    Add(Vec<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Vec<Expression>),
    /// Truncating remainder, sign follows the dividend
    Mod(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn field(field: impl Into<String>) -> Self {
        Expression::Field(field.into())
    }

    pub fn literal(value: impl Into<Bson>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn add(terms: Vec<Expression>) -> Self {
        Expression::Add(terms)
    }

    pub fn subtract(minuend: Expression, subtrahend: Expression) -> Self {
        Expression::Subtract(Box::new(minuend), Box::new(subtrahend))
    }

    pub fn multiply(factors: Vec<Expression>) -> Self {
        Expression::Multiply(factors)
    }

    pub fn modulo(dividend: Expression, divisor: Expression) -> Self {
        Expression::Mod(Box::new(dividend), Box::new(divisor))
    }

    /// `field - (field mod step)`: rounds a non-negative integer field down to a multiple of `step`
    pub fn floor_to_multiple(field: &str, step: i32) -> Self {
        Self::subtract(
            Self::field(field),
            Self::modulo(Self::field(field), Self::literal(step)),
        )
    }

    /// Wire form of the expression
    pub fn to_bson(&self) -> Bson {
        match self {
            Expression::Field(field) => Bson::String(format!("${}", field)),
            Expression::Literal(Bson::String(s)) if s.starts_with('$') => {
                let mut literal = Document::new();
                literal.insert("$literal", s.clone());
                Bson::Document(literal)
            }
            Expression::Literal(value) => value.clone(),
            Expression::Add(terms) => operator_doc("$add", terms),
            Expression::Subtract(a, b) => {
                operator_doc("$subtract", &[a.as_ref().clone(), b.as_ref().clone()])
            }
            Expression::Multiply(factors) => operator_doc("$multiply", factors),
            Expression::Mod(a, b) => operator_doc("$mod", &[a.as_ref().clone(), b.as_ref().clone()]),
        }
    }
}

fn operator_doc(operator: &str, operands: &[Expression]) -> Bson {
    let mut doc = Document::new();
    doc.insert(
        operator,
        Bson::Array(operands.iter().map(Expression::to_bson).collect()),
    );
    Bson::Document(doc)
}

/// Named accumulator inside a `$group` stage
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator {
    pub function: AggregateFunction,
    pub field: Option<String>, // None for Count
    pub alias: Option<String>,
}

impl Accumulator {
    /// Count records per group
    pub fn count() -> Self {
        Self {
            function: AggregateFunction::Count,
            field: None,
            alias: None,
        }
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::over(AggregateFunction::Sum, field)
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::over(AggregateFunction::Avg, field)
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::over(AggregateFunction::Min, field)
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::over(AggregateFunction::Max, field)
    }

    fn over(function: AggregateFunction, field: impl Into<String>) -> Self {
        Self {
            function,
            field: Some(field.into()),
            alias: None,
        }
    }

    /// Name the output field
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Output field name, `avg_price` style when no alias was given
    pub fn output_name(&self) -> String {
        match (&self.alias, &self.field) {
            (Some(alias), _) => alias.clone(),
            (None, Some(field)) => format!("{}_{}", self.function.default_prefix(), field),
            (None, None) => self.function.default_prefix().to_string(),
        }
    }

    /// Operator document, e.g. `{$avg: "$price"}`
    pub fn to_document(&self) -> Document {
        let operand = match (&self.function, &self.field) {
            (AggregateFunction::Count, _) | (_, None) => Bson::Int32(1),
            (_, Some(field)) => Expression::field(field.as_str()).to_bson(),
        };
        let mut doc = Document::new();
        doc.insert(self.function.to_operator(), operand);
        doc
    }
}
