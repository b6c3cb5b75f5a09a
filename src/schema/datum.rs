//! Typed values carried in rows

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::types::DatumType;

/// A single typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Datum>),
}

/// One row: a fixed-arity sequence of datums
pub type Row = Vec<Datum>;

impl Datum {
    /// Returns true for SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Returns true if this datum may be stored in a column of type `typ`.
    ///
    /// NULL fits every type. Ints are accepted in float columns.
    pub fn fits(&self, typ: &DatumType) -> bool {
        match (self, typ) {
            (Datum::Null, _) => true,
            (Datum::Bool(_), DatumType::Bool) => true,
            (Datum::Int(_), DatumType::Int | DatumType::Float) => true,
            (Datum::Float(_), DatumType::Float) => true,
            (Datum::String(_), DatumType::String) => true,
            (Datum::Bytes(_), DatumType::Bytes) => true,
            (Datum::Array(items), DatumType::Array(elem)) => items.iter().all(|d| d.fits(elem)),
            _ => false,
        }
    }

    /// Estimated heap footprint, used for sort memory accounting.
    pub fn size_bytes(&self) -> usize {
        let inline = std::mem::size_of::<Datum>();
        match self {
            Datum::String(s) => inline + s.len(),
            Datum::Bytes(b) => inline + b.len(),
            Datum::Array(items) => inline + items.iter().map(Datum::size_bytes).sum::<usize>(),
            _ => inline,
        }
    }

    /// Total order over datums.
    ///
    /// Ordering rules:
    /// - NULL sorts before every non-NULL value
    /// - int and float compare exactly by numeric value, with no rounding
    /// - values of unrelated types compare by type rank
    ///   (bool < number < string < bytes < array)
    pub fn compare(&self, other: &Datum) -> Ordering {
        match (self, other) {
            (Datum::Null, Datum::Null) => Ordering::Equal,
            (Datum::Null, _) => Ordering::Less,
            (_, Datum::Null) => Ordering::Greater,
            (Datum::Bool(a), Datum::Bool(b)) => a.cmp(b),
            (Datum::Int(a), Datum::Int(b)) => a.cmp(b),
            (Datum::Float(a), Datum::Float(b)) => compare_floats(*a, *b),
            (Datum::Int(a), Datum::Float(b)) => compare_int_float(*a, *b),
            (Datum::Float(a), Datum::Int(b)) => compare_int_float(*b, *a).reverse(),
            (Datum::String(a), Datum::String(b)) => a.cmp(b),
            (Datum::Bytes(a), Datum::Bytes(b)) => a.cmp(b),
            (Datum::Array(a), Datum::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let c = x.compare(y);
                    if c != Ordering::Equal {
                        return c;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            Datum::Null => 0,
            Datum::Bool(_) => 1,
            Datum::Int(_) | Datum::Float(_) => 2,
            Datum::String(_) => 3,
            Datum::Bytes(_) => 4,
            Datum::Array(_) => 5,
        }
    }

    /// Decodes a JSON value as a datum of the given column type.
    pub fn from_json(value: &Value, typ: &DatumType) -> Result<Datum, String> {
        match (value, typ) {
            (Value::Null, _) => Ok(Datum::Null),
            (Value::Bool(b), DatumType::Bool) => Ok(Datum::Bool(*b)),
            (Value::Number(n), DatumType::Int) => n
                .as_i64()
                .map(Datum::Int)
                .ok_or_else(|| format!("{} is not a 64-bit integer", n)),
            (Value::Number(n), DatumType::Float) => n
                .as_f64()
                .map(Datum::Float)
                .ok_or_else(|| format!("{} is not a float", n)),
            (Value::String(s), DatumType::String) => Ok(Datum::String(s.clone())),
            (Value::String(s), DatumType::Bytes) => Ok(Datum::Bytes(s.as_bytes().to_vec())),
            (Value::Array(items), DatumType::Array(elem)) => items
                .iter()
                .map(|v| Datum::from_json(v, elem))
                .collect::<Result<Vec<_>, _>>()
                .map(Datum::Array),
            (v, t) => Err(format!("value {} does not match column type {}", v, t)),
        }
    }

    /// Encodes this datum as JSON
    pub fn to_json(&self) -> Value {
        match self {
            Datum::Null => Value::Null,
            Datum::Bool(b) => Value::Bool(*b),
            Datum::Int(i) => Value::from(*i),
            Datum::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Datum::String(s) => Value::String(s.clone()),
            Datum::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
            Datum::Array(items) => Value::Array(items.iter().map(Datum::to_json).collect()),
        }
    }
}

/// -0.0 and 0.0 are equal; NaN sorts after +inf (before -inf if negative).
fn compare_floats(a: f64, b: f64) -> Ordering {
    if a == b {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Compares an int against a float without rounding the int through f64.
fn compare_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float above i64::MAX
    const I64_END: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= I64_END {
        return Ordering::Less;
    }
    if f < -I64_END {
        return Ordering::Greater;
    }
    let floor = f.floor();
    // -2^63 <= floor < 2^63, so the cast is exact.
    match i.cmp(&(floor as i64)) {
        Ordering::Equal if f > floor => Ordering::Less,
        other => other,
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => write!(f, "NULL"),
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Int(i) => write!(f, "{}", i),
            Datum::Float(x) => write!(f, "{}", x),
            Datum::String(s) => write!(f, "'{}'", s),
            Datum::Bytes(b) => write!(f, "b'{}'", String::from_utf8_lossy(b)),
            Datum::Array(items) => {
                write!(f, "ARRAY[")?;
                for (i, d) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", d)?;
                }
                write!(f, "]")
            }
        }
    }
}
