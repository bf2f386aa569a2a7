use indexmap::IndexMap;
use rust_decimal::Decimal;

/// A document wire value used throughout the translation engine.
///
/// This type represents the tree of string-keyed maps, arrays, and scalars
/// that the wire-protocol layer embeds into server commands. It is richer
/// than plain JSON: integers carry their width, high-precision decimals and
/// points in time are first-class, and regular expressions are a scalar of
/// their own.
///
/// # Type Preservation
///
/// The wire format distinguishes `Int32`, `Int64`, `Double` and `Decimal`
/// because the server does; serializers rely on the distinction to keep a
/// field's wire type stable across queries.
///
/// # Examples
///
/// ```
/// use mace::Value;
///
/// // Scalar values
/// let null = Value::Null;
/// let boolean = Value::Boolean(true);
/// let int = Value::Int32(42);
/// let string = Value::String("hello".to_string());
///
/// // Collections
/// let array = Value::Array(vec![Value::Int32(1), Value::Int32(2)]);
/// let object = Value::document([("key", Value::Int32(1))]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Document null
    Null,

    /// Boolean (true/false)
    Boolean(bool),

    /// 32-bit integer
    Int32(i32),

    /// 64-bit integer
    Int64(i64),

    /// Double-precision floating point number
    Double(f64),

    /// High-precision decimal number
    Decimal(Decimal),

    /// UTF-8 string
    String(String),

    /// Point in time, milliseconds since the Unix epoch
    DateTime(i64),

    /// Regular expression with server option flags (e.g. `"i"`, `"im"`)
    Regex { pattern: String, options: String },

    /// Array of values
    Array(Vec<Value>),

    /// Document with insertion-ordered string keys
    ///
    /// Key order is preserved because rendered operator documents are
    /// order-sensitive on the wire.
    Document(IndexMap<String, Value>),
}

/// The tag of a wire value, used by serializers to describe field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Int32,
    Int64,
    Double,
    Decimal,
    String,
    DateTime,
    Regex,
    Array,
    Document,
}

impl ValueKind {
    /// Human-readable name, used in error messages
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Double => "double",
            ValueKind::Decimal => "decimal",
            ValueKind::String => "string",
            ValueKind::DateTime => "datetime",
            ValueKind::Regex => "regex",
            ValueKind::Array => "array",
            ValueKind::Document => "document",
        }
    }
}

impl Value {
    /// The kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Double(_) => ValueKind::Double,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::String(_) => ValueKind::String,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Regex { .. } => ValueKind::Regex,
            Value::Array(_) => ValueKind::Array,
            Value::Document(_) => ValueKind::Document,
        }
    }

    /// Build a document from an ordered sequence of entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use mace::Value;
    ///
    /// let doc = Value::document([("Age", Value::Int32(30))]);
    /// assert_eq!(doc.kind().name(), "document");
    /// ```
    pub fn document<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Document(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Get as i64, widening Int32
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int32(n) => Some(*n as i64),
            Value::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as f64 (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int32(n) => Some(*n as f64),
            Value::Int64(n) => Some(*n as f64),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as &str
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON value into a wire value.
    ///
    /// Whole numbers become `Int64`, everything else numeric becomes
    /// `Double`. Objects keep the order the JSON parser yields.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else {
                    Value::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Document(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert a wire value into a JSON value.
    ///
    /// The non-JSON scalars use extended forms: `DateTime` becomes
    /// `{"$date": millis}`, `Regex` becomes `{"$regex": ..., "$options":
    /// ...}`, and `Decimal` becomes `{"$decimal": "..."}`.
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => json!(b),
            Value::Int32(n) => json!(n),
            Value::Int64(n) => json!(n),
            Value::Double(n) => json!(n),
            Value::Decimal(d) => json!({"$decimal": d.to_string()}),
            Value::String(s) => json!(s),
            Value::DateTime(millis) => json!({"$date": millis}),
            Value::Regex { pattern, options } => {
                json!({"$regex": pattern, "$options": options})
            }
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json_value).collect())
            }
            Value::Document(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int64(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}
