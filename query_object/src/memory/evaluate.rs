//! Evaluation of rendered filter, update, projection and pipeline documents
//! over in-memory records.
//!
//! Only the operators and stages this crate emits are understood. Anything
//! else is reported as [`QueryObjectError::MalformedDescriptor`].

use crate::errors::QueryObjectError;
use bson::{Bson, Document};
use std::cmp::Ordering;

type Result<T> = std::result::Result<T, QueryObjectError>;

fn malformed(message: impl Into<String>) -> QueryObjectError {
    QueryObjectError::MalformedDescriptor(message.into())
}

// ---------------------------------------------------------------------------
// Value ordering
// ---------------------------------------------------------------------------

/// Rank of a value in the engine's cross-type sort order.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

pub(crate) fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Compare two values: type rank first, then value.
pub fn compare_values(a: &Bson, b: &Bson) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::Array(x), Bson::Array(y)) => {
            for (ex, ey) in x.iter().zip(y.iter()) {
                match compare_values(ex, ey) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Bson::Document(x), Bson::Document(y)) => {
            for ((kx, vx), (ky, vy)) in x.iter().zip(y.iter()) {
                let ordering = kx.cmp(ky).then_with(|| compare_values(vx, vy));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
    }
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    type_rank(a) == type_rank(b) && compare_values(a, b) == Ordering::Equal
}

/// Get a nested field using dot notation.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Check whether a record matches a filter document.
pub fn matches_filter(doc: &Document, filter: &Document) -> Result<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in logical_clauses(key, condition)? {
                    if !matches_filter(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for clause in logical_clauses(key, condition)? {
                    if matches_filter(doc, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$nor" => {
                let mut none = true;
                for clause in logical_clauses(key, condition)? {
                    if matches_filter(doc, clause)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            op if op.starts_with('$') => {
                return Err(malformed(format!("unsupported top-level operator {}", op)))
            }
            field => match_field(get_path(doc, field), condition)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn logical_clauses<'a>(key: &str, condition: &'a Bson) -> Result<Vec<&'a Document>> {
    let Bson::Array(items) = condition else {
        return Err(malformed(format!("{} expects an array", key)));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => Ok(clause),
            _ => Err(malformed(format!("{} clauses must be documents", key))),
        })
        .collect()
}

fn match_field(value: Option<&Bson>, condition: &Bson) -> Result<bool> {
    match condition {
        Bson::Document(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
            for (op, operand) in ops {
                if !match_operator(value, op, operand)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        literal => Ok(equals(value, literal)),
    }
}

// A missing field equals null; an array field equals any of its elements
fn equals(value: Option<&Bson>, operand: &Bson) -> bool {
    match value {
        None => matches!(operand, Bson::Null),
        Some(Bson::Array(items)) if !matches!(operand, Bson::Array(_)) => {
            items.iter().any(|item| values_equal(item, operand))
        }
        Some(v) => values_equal(v, operand),
    }
}

fn compare_with(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    value.is_some_and(|v| type_rank(v) == type_rank(operand) && accept(compare_values(v, operand)))
}

fn match_operator(value: Option<&Bson>, op: &str, operand: &Bson) -> Result<bool> {
    let matched = match op {
        "$eq" => equals(value, operand),
        "$ne" => !equals(value, operand),
        "$gt" => compare_with(value, operand, |o| o == Ordering::Greater),
        "$gte" => compare_with(value, operand, |o| o != Ordering::Less),
        "$lt" => compare_with(value, operand, |o| o == Ordering::Less),
        "$lte" => compare_with(value, operand, |o| o != Ordering::Greater),
        "$in" | "$nin" => {
            let Bson::Array(candidates) = operand else {
                return Err(malformed(format!("{} expects an array", op)));
            };
            let found = candidates.iter().any(|candidate| equals(value, candidate));
            if op == "$in" {
                found
            } else {
                !found
            }
        }
        "$exists" => {
            let should_exist = match operand {
                Bson::Boolean(flag) => *flag,
                other => as_f64(other).is_some_and(|n| n != 0.0),
            };
            value.is_some() == should_exist
        }
        "$mod" => {
            let (divisor, remainder) = match operand {
                Bson::Array(pair) if pair.len() == 2 => (as_f64(&pair[0]), as_f64(&pair[1])),
                _ => return Err(malformed("$mod expects [divisor, remainder]")),
            };
            let (Some(divisor), Some(remainder)) = (divisor, remainder) else {
                return Err(malformed("$mod operands must be numbers"));
            };
            let divisor = divisor.trunc() as i64;
            if divisor == 0 {
                return Err(malformed("$mod divisor cannot be zero"));
            }
            value
                .and_then(as_f64)
                .is_some_and(|n| (n.trunc() as i64).wrapping_rem(divisor) == remainder.trunc() as i64)
        }
        other => return Err(malformed(format!("unsupported query operator {}", other))),
    };
    Ok(matched)
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Numeric result that keeps integer results integral.
#[derive(Clone, Copy)]
enum Number {
    Int32(i32),
    Int64(i64),
    Double(f64),
}

impl Number {
    fn from_bson(value: &Bson) -> Option<Self> {
        match value {
            Bson::Int32(n) => Some(Number::Int32(*n)),
            Bson::Int64(n) => Some(Number::Int64(*n)),
            Bson::Double(n) => Some(Number::Double(*n)),
            _ => None,
        }
    }

    fn as_i64(self) -> Option<i64> {
        match self {
            Number::Int32(n) => Some(i64::from(n)),
            Number::Int64(n) => Some(n),
            Number::Double(_) => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int32(n) => f64::from(n),
            Number::Int64(n) => n as f64,
            Number::Double(n) => n,
        }
    }

    fn combine(
        self,
        other: Number,
        int_op: fn(i64, i64) -> Option<i64>,
        float_op: fn(f64, f64) -> f64,
    ) -> Number {
        match (self.as_i64(), other.as_i64()) {
            (Some(a), Some(b)) => match int_op(a, b) {
                Some(result) => {
                    let both_int32 =
                        matches!(self, Number::Int32(_)) && matches!(other, Number::Int32(_));
                    match i32::try_from(result) {
                        Ok(small) if both_int32 => Number::Int32(small),
                        _ => Number::Int64(result),
                    }
                }
                None => Number::Double(float_op(self.as_f64(), other.as_f64())),
            },
            _ => Number::Double(float_op(self.as_f64(), other.as_f64())),
        }
    }

    fn into_bson(self) -> Bson {
        match self {
            Number::Int32(n) => Bson::Int32(n),
            Number::Int64(n) => Bson::Int64(n),
            Number::Double(n) => Bson::Double(n),
        }
    }
}

/// Evaluate an aggregation expression against a record.
pub fn evaluate_expression(doc: &Document, expression: &Bson) -> Result<Bson> {
    match expression {
        Bson::String(s) if s.starts_with('$') => {
            Ok(get_path(doc, &s[1..]).cloned().unwrap_or(Bson::Null))
        }
        Bson::Document(inner) if inner.len() == 1 && inner.keys().all(|k| k.starts_with('$')) => {
            let (op, operand) = inner.iter().next().ok_or_else(|| malformed("empty expression"))?;
            evaluate_operator(doc, op, operand)
        }
        Bson::Document(inner) => {
            let mut out = Document::new();
            for (key, value) in inner {
                out.insert(key.clone(), evaluate_expression(doc, value)?);
            }
            Ok(Bson::Document(out))
        }
        literal => Ok(literal.clone()),
    }
}

fn evaluate_operator(doc: &Document, op: &str, operand: &Bson) -> Result<Bson> {
    if op == "$literal" {
        return Ok(operand.clone());
    }

    let Bson::Array(args) = operand else {
        return Err(malformed(format!("{} expects an array of operands", op)));
    };
    let values = args
        .iter()
        .map(|arg| evaluate_expression(doc, arg))
        .collect::<Result<Vec<_>>>()?;

    // Null or missing operands make the whole result null
    if values.iter().any(|v| matches!(v, Bson::Null)) {
        return Ok(Bson::Null);
    }
    let numbers = values
        .iter()
        .map(|v| Number::from_bson(v).ok_or_else(|| malformed(format!("{} only accepts numbers", op))))
        .collect::<Result<Vec<_>>>()?;

    let result = match (op, numbers.as_slice()) {
        ("$add", [first, rest @ ..]) => rest
            .iter()
            .fold(*first, |acc, n| acc.combine(*n, i64::checked_add, |a, b| a + b)),
        ("$add", []) => Number::Int32(0),
        ("$multiply", [first, rest @ ..]) => rest
            .iter()
            .fold(*first, |acc, n| acc.combine(*n, i64::checked_mul, |a, b| a * b)),
        ("$multiply", []) => Number::Int32(1),
        ("$subtract", [a, b]) => a.combine(*b, i64::checked_sub, |x, y| x - y),
        ("$mod", [a, b]) => {
            if b.as_f64() == 0.0 {
                return Err(malformed("$mod divisor cannot be zero"));
            }
            a.combine(*b, i64::checked_rem, |x, y| x % y)
        }
        ("$subtract" | "$mod", _) => {
            return Err(malformed(format!("{} expects exactly two operands", op)))
        }
        (other, _) => return Err(malformed(format!("unsupported expression operator {}", other))),
    };
    Ok(result.into_bson())
}

// ---------------------------------------------------------------------------
// Sorting and projection
// ---------------------------------------------------------------------------

/// Stable sort by a sort document; missing fields sort as null.
pub fn sort_documents(docs: &mut [Document], sort: &Document) -> Result<()> {
    let mut keys = Vec::with_capacity(sort.len());
    for (field, direction) in sort {
        let descending = match as_f64(direction) {
            Some(d) if d == 1.0 => false,
            Some(d) if d == -1.0 => true,
            _ => return Err(malformed(format!("sort direction for {} must be 1 or -1", field))),
        };
        keys.push((field.as_str(), descending));
    }

    docs.sort_by(|a, b| {
        for (field, descending) in &keys {
            let va = get_path(a, field).unwrap_or(&Bson::Null);
            let vb = get_path(b, field).unwrap_or(&Bson::Null);
            let ordering = compare_values(va, vb);
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

enum ProjectionEntry<'a> {
    Include,
    Exclude,
    Computed(&'a Bson),
}

fn classify(value: &Bson) -> ProjectionEntry<'_> {
    match value {
        Bson::Boolean(flag) => {
            if *flag {
                ProjectionEntry::Include
            } else {
                ProjectionEntry::Exclude
            }
        }
        other => match as_f64(other) {
            Some(n) if n == 0.0 => ProjectionEntry::Exclude,
            Some(_) => ProjectionEntry::Include,
            None => ProjectionEntry::Computed(other),
        },
    }
}

/// Apply a projection document to a record.
pub fn apply_projection(doc: &Document, projection: &Document) -> Result<Document> {
    let mut includes = Vec::new();
    let mut excludes = Vec::new();
    let mut computed = Vec::new();
    let mut keep_id = true;

    for (field, value) in projection {
        match (field.as_str(), classify(value)) {
            ("_id", ProjectionEntry::Exclude) => keep_id = false,
            ("_id", ProjectionEntry::Include) => keep_id = true,
            (_, ProjectionEntry::Include) => includes.push(field.as_str()),
            (_, ProjectionEntry::Exclude) => excludes.push(field.as_str()),
            (_, ProjectionEntry::Computed(expression)) => computed.push((field, expression)),
        }
    }

    let inclusion_mode = !includes.is_empty() || !computed.is_empty();
    if inclusion_mode && !excludes.is_empty() {
        return Err(malformed("projection cannot mix inclusion and exclusion"));
    }

    if !inclusion_mode {
        let mut out = doc.clone();
        for field in excludes {
            out.remove(field);
        }
        if !keep_id {
            out.remove("_id");
        }
        return Ok(out);
    }

    let mut out = Document::new();
    if keep_id {
        if let Some(id) = doc.get("_id") {
            out.insert("_id", id.clone());
        }
    }
    for (field, value) in doc {
        if includes.contains(&field.as_str()) {
            out.insert(field.clone(), value.clone());
        }
    }
    for (field, expression) in computed {
        out.insert(field.clone(), evaluate_expression(doc, expression)?);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

/// Apply an operator update to a record, returning whether it changed.
pub fn apply_update(doc: &mut Document, update: &Document) -> Result<bool> {
    if update.is_empty() || !update.keys().all(|k| k.starts_with('$')) {
        return Err(malformed("update must contain only update operators"));
    }

    let before = doc.clone();
    for (op, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(malformed(format!("{} expects a document", op)));
        };
        for (field, operand) in fields {
            if field.contains('.') {
                return Err(malformed(format!("nested update path {} is not supported", field)));
            }
            match op.as_str() {
                "$set" => {
                    doc.insert(field.clone(), operand.clone());
                }
                "$unset" => {
                    doc.remove(field);
                }
                "$inc" | "$mul" => {
                    let operand_number = Number::from_bson(operand)
                        .ok_or_else(|| malformed(format!("{} operand must be a number", op)))?;
                    let current = match doc.get(field) {
                        None => None,
                        Some(value) => Some(Number::from_bson(value).ok_or_else(|| {
                            malformed(format!("{} applied to non-numeric field {}", op, field))
                        })?),
                    };
                    let result = match (op.as_str(), current) {
                        ("$inc", None) => operand_number,
                        ("$inc", Some(n)) => n.combine(operand_number, i64::checked_add, |a, b| a + b),
                        (_, None) => operand_number.combine(Number::Int32(0), i64::checked_mul, |a, b| a * b),
                        (_, Some(n)) => n.combine(operand_number, i64::checked_mul, |a, b| a * b),
                    };
                    doc.insert(field.clone(), result.into_bson());
                }
                other => return Err(malformed(format!("unsupported update operator {}", other))),
            }
        }
    }
    Ok(*doc != before)
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

fn stage_count(value: &Bson, stage: &str) -> Result<usize> {
    match value {
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => {
            let n = as_f64(value).unwrap_or(-1.0);
            if n < 0.0 || (stage == "$limit" && n == 0.0) {
                Err(malformed(format!("{} must be positive, got {}", stage, n)))
            } else {
                Ok(n as usize)
            }
        }
        _ => Err(malformed(format!("{} expects a number", stage))),
    }
}

/// Run an ordered pipeline over a set of records.
pub fn run_pipeline(mut docs: Vec<Document>, pipeline: &[Document]) -> Result<Vec<Document>> {
    for stage in pipeline {
        let mut entries = stage.iter();
        let (Some((name, body)), None) = (entries.next(), entries.next()) else {
            return Err(malformed("each stage must have exactly one key"));
        };

        docs = match (name.as_str(), body) {
            ("$match", Bson::Document(filter)) => {
                let mut kept = Vec::with_capacity(docs.len());
                for doc in docs {
                    if matches_filter(&doc, filter)? {
                        kept.push(doc);
                    }
                }
                kept
            }
            ("$group", Bson::Document(group)) => group_documents(&docs, group)?,
            ("$sort", Bson::Document(sort)) => {
                sort_documents(&mut docs, sort)?;
                docs
            }
            ("$limit", value) => {
                let n = stage_count(value, "$limit")?;
                docs.truncate(n);
                docs
            }
            ("$skip", value) => {
                let n = stage_count(value, "$skip")?;
                docs.into_iter().skip(n).collect()
            }
            ("$project", Bson::Document(projection)) => docs
                .iter()
                .map(|doc| apply_projection(doc, projection))
                .collect::<Result<Vec<_>>>()?,
            ("$count", Bson::String(field)) => {
                if docs.is_empty() {
                    Vec::new()
                } else {
                    let mut out = Document::new();
                    match i32::try_from(docs.len()) {
                        Ok(n) => out.insert(field.clone(), n),
                        Err(_) => out.insert(field.clone(), docs.len() as i64),
                    };
                    vec![out]
                }
            }
            (other, _) => return Err(malformed(format!("unsupported or malformed stage {}", other))),
        };
    }
    Ok(docs)
}

enum AccumulatorState {
    Sum(Option<Number>),
    Avg { total: f64, count: u64 },
    Min(Option<Bson>),
    Max(Option<Bson>),
}

impl AccumulatorState {
    fn new(op: &str) -> Result<Self> {
        Ok(match op {
            "$sum" => AccumulatorState::Sum(None),
            "$avg" => AccumulatorState::Avg { total: 0.0, count: 0 },
            "$min" => AccumulatorState::Min(None),
            "$max" => AccumulatorState::Max(None),
            other => return Err(malformed(format!("unsupported accumulator {}", other))),
        })
    }

    fn add(&mut self, value: Bson) {
        let is_min = matches!(self, AccumulatorState::Min(_));
        match self {
            AccumulatorState::Sum(total) => {
                // Non-numeric values are ignored by $sum
                if let Some(n) = Number::from_bson(&value) {
                    *total = Some(match total {
                        Some(t) => t.combine(n, i64::checked_add, |a, b| a + b),
                        None => n,
                    });
                }
            }
            AccumulatorState::Avg { total, count } => {
                if let Some(n) = as_f64(&value) {
                    *total += n;
                    *count += 1;
                }
            }
            AccumulatorState::Min(current) | AccumulatorState::Max(current) => {
                if matches!(value, Bson::Null) {
                    return;
                }
                let replace = match current {
                    None => true,
                    Some(existing) => {
                        let ordering = compare_values(&value, existing);
                        if is_min {
                            ordering == Ordering::Less
                        } else {
                            ordering == Ordering::Greater
                        }
                    }
                };
                if replace {
                    *current = Some(value);
                }
            }
        }
    }

    fn finish(self) -> Bson {
        match self {
            AccumulatorState::Sum(total) => total.map(Number::into_bson).unwrap_or(Bson::Int32(0)),
            AccumulatorState::Avg { total, count } => {
                if count == 0 {
                    Bson::Null
                } else {
                    Bson::Double(total / count as f64)
                }
            }
            AccumulatorState::Min(value) | AccumulatorState::Max(value) => value.unwrap_or(Bson::Null),
        }
    }
}

// Groups come out in order of first appearance
fn group_documents(docs: &[Document], group: &Document) -> Result<Vec<Document>> {
    let key_expression = group
        .get("_id")
        .ok_or_else(|| malformed("$group requires an _id"))?;

    let mut accumulators = Vec::new();
    for (field, body) in group.iter().filter(|(k, _)| k.as_str() != "_id") {
        let Bson::Document(body) = body else {
            return Err(malformed(format!("accumulator {} must be a document", field)));
        };
        let mut ops = body.iter();
        let (Some((op, operand)), None) = (ops.next(), ops.next()) else {
            return Err(malformed(format!("accumulator {} must have one operator", field)));
        };
        AccumulatorState::new(op)?;
        accumulators.push((field, op.as_str(), operand));
    }

    let mut groups: Vec<(Bson, Vec<AccumulatorState>)> = Vec::new();
    for doc in docs {
        let key = evaluate_expression(doc, key_expression)?;
        let position = match groups.iter().position(|(k, _)| values_equal(k, &key)) {
            Some(position) => position,
            None => {
                let states = accumulators
                    .iter()
                    .map(|(_, op, _)| AccumulatorState::new(op))
                    .collect::<Result<Vec<_>>>()?;
                groups.push((key, states));
                groups.len() - 1
            }
        };
        for (state, (_, _, operand)) in groups[position].1.iter_mut().zip(&accumulators) {
            state.add(evaluate_expression(doc, operand)?);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, states)| {
            let mut out = Document::new();
            out.insert("_id", key);
            for (state, (field, _, _)) in states.into_iter().zip(&accumulators) {
                out.insert((*field).clone(), state.finish());
            }
            out
        })
        .collect())
}
