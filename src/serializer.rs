use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::{Value, ValueKind};

/// Errors raised while converting between host literals and wire values.
#[derive(Debug, Clone)]
pub enum SerializerError {
    /// The value's kind does not match the serializer's wire type
    TypeMismatch { expected: ValueKind, actual: ValueKind },

    /// The value is the right kind but outside the representable range
    OutOfRange(String),
}

impl std::fmt::Display for SerializerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializerError::TypeMismatch { expected, actual } => write!(
                f,
                "Type mismatch: expected {}, got {}",
                expected.name(),
                actual.name()
            ),
            SerializerError::OutOfRange(msg) => write!(f, "Value out of range: {}", msg),
        }
    }
}

impl std::error::Error for SerializerError {}

/// A bidirectional converter between a host runtime value and its wire
/// representation.
///
/// Serializers are attached to symbols and aggregation expressions so that
/// every literal a filter compares against is encoded the way the field it
/// is compared to is encoded. Document serializers additionally expose
/// their members via [`Serializer::member`], and array serializers expose
/// their element serializer via [`Serializer::element`].
pub trait Serializer: std::fmt::Debug + Send + Sync {
    /// The wire kind this serializer produces
    fn kind(&self) -> ValueKind;

    /// Convert a host literal into its wire form
    fn serialize(&self, value: &Value) -> Result<Value, SerializerError>;

    /// Decode a wire value back into its host form
    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError>;

    /// Member lookup for document serializers
    fn member(&self, _name: &str) -> Option<&FieldInfo> {
        None
    }

    /// Element serializer for array serializers
    fn element(&self) -> Option<&Arc<dyn Serializer>> {
        None
    }
}

/// Serialization info for one document member: the wire element name and
/// the serializer for the member's values.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub element_name: String,
    pub serializer: Arc<dyn Serializer>,
}

fn mismatch(expected: ValueKind, actual: &Value) -> SerializerError {
    SerializerError::TypeMismatch {
        expected,
        actual: actual.kind(),
    }
}

/// Boolean pass-through serializer.
#[derive(Debug)]
pub struct BooleanSerializer;

impl Serializer for BooleanSerializer {
    fn kind(&self) -> ValueKind {
        ValueKind::Boolean
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::Boolean(_) => Ok(value.clone()),
            other => Err(mismatch(ValueKind::Boolean, other)),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        self.serialize(wire)
    }
}

/// 32-bit integer serializer; narrows in-range 64-bit literals.
#[derive(Debug)]
pub struct Int32Serializer;

impl Serializer for Int32Serializer {
    fn kind(&self) -> ValueKind {
        ValueKind::Int32
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::Int32(_) => Ok(value.clone()),
            Value::Int64(n) => i32::try_from(*n)
                .map(Value::Int32)
                .map_err(|_| SerializerError::OutOfRange(format!("{} does not fit in int32", n))),
            other => Err(mismatch(ValueKind::Int32, other)),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        self.serialize(wire)
    }
}

/// 64-bit integer serializer; widens 32-bit literals.
#[derive(Debug)]
pub struct Int64Serializer;

impl Serializer for Int64Serializer {
    fn kind(&self) -> ValueKind {
        ValueKind::Int64
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::Int64(_) => Ok(value.clone()),
            Value::Int32(n) => Ok(Value::Int64(*n as i64)),
            other => Err(mismatch(ValueKind::Int64, other)),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        self.serialize(wire)
    }
}

/// Double serializer; integer literals widen.
#[derive(Debug)]
pub struct DoubleSerializer;

impl Serializer for DoubleSerializer {
    fn kind(&self) -> ValueKind {
        ValueKind::Double
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::Double(_) => Ok(value.clone()),
            Value::Int32(n) => Ok(Value::Double(*n as f64)),
            Value::Int64(n) => Ok(Value::Double(*n as f64)),
            other => Err(mismatch(ValueKind::Double, other)),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        self.serialize(wire)
    }
}

/// High-precision decimal serializer.
#[derive(Debug)]
pub struct DecimalSerializer;

impl Serializer for DecimalSerializer {
    fn kind(&self) -> ValueKind {
        ValueKind::Decimal
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::Decimal(_) => Ok(value.clone()),
            Value::Int32(n) => Ok(Value::Decimal((*n).into())),
            Value::Int64(n) => Ok(Value::Decimal((*n).into())),
            other => Err(mismatch(ValueKind::Decimal, other)),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        self.serialize(wire)
    }
}

/// String pass-through serializer.
#[derive(Debug)]
pub struct StringSerializer;

impl Serializer for StringSerializer {
    fn kind(&self) -> ValueKind {
        ValueKind::String
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::String(_) => Ok(value.clone()),
            other => Err(mismatch(ValueKind::String, other)),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        self.serialize(wire)
    }
}

/// Point-in-time serializer (millis since epoch on the wire).
#[derive(Debug)]
pub struct DateTimeSerializer;

impl Serializer for DateTimeSerializer {
    fn kind(&self) -> ValueKind {
        ValueKind::DateTime
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::DateTime(_) => Ok(value.clone()),
            other => Err(mismatch(ValueKind::DateTime, other)),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        self.serialize(wire)
    }
}

/// Wraps another serializer and additionally admits `Null`.
#[derive(Debug)]
pub struct NullableSerializer {
    inner: Arc<dyn Serializer>,
}

impl NullableSerializer {
    pub fn new(inner: Arc<dyn Serializer>) -> Self {
        NullableSerializer { inner }
    }
}

impl Serializer for NullableSerializer {
    fn kind(&self) -> ValueKind {
        self.inner.kind()
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::Null => Ok(Value::Null),
            other => self.inner.serialize(other),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        match wire {
            Value::Null => Ok(Value::Null),
            other => self.inner.deserialize(other),
        }
    }

    fn member(&self, name: &str) -> Option<&FieldInfo> {
        self.inner.member(name)
    }

    fn element(&self) -> Option<&Arc<dyn Serializer>> {
        self.inner.element()
    }
}

/// Array serializer carrying the element serializer.
#[derive(Debug)]
pub struct ArraySerializer {
    element: Arc<dyn Serializer>,
}

impl ArraySerializer {
    pub fn new(element: Arc<dyn Serializer>) -> Self {
        ArraySerializer { element }
    }
}

impl Serializer for ArraySerializer {
    fn kind(&self) -> ValueKind {
        ValueKind::Array
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::Array(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.element.serialize(item))
                    .collect::<Result<_, _>>()?,
            )),
            other => Err(mismatch(ValueKind::Array, other)),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        match wire {
            Value::Array(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.element.deserialize(item))
                    .collect::<Result<_, _>>()?,
            )),
            other => Err(mismatch(ValueKind::Array, other)),
        }
    }

    fn element(&self) -> Option<&Arc<dyn Serializer>> {
        Some(&self.element)
    }
}

/// Document serializer with an ordered member table.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mace::serializer::{DocumentSerializer, Int32Serializer, Serializer, StringSerializer};
///
/// let person = DocumentSerializer::new()
///     .field("Age", Arc::new(Int32Serializer))
///     .field("Name", Arc::new(StringSerializer));
/// assert!(person.member("Age").is_some());
/// ```
#[derive(Debug, Default)]
pub struct DocumentSerializer {
    fields: IndexMap<String, FieldInfo>,
}

impl DocumentSerializer {
    pub fn new() -> Self {
        DocumentSerializer::default()
    }

    /// Add a member whose wire element name equals the member name.
    pub fn field(self, name: impl Into<String>, serializer: Arc<dyn Serializer>) -> Self {
        let name = name.into();
        let element_name = name.clone();
        self.field_named(name, element_name, serializer)
    }

    /// Add a member with an explicit wire element name.
    pub fn field_named(
        mut self,
        name: impl Into<String>,
        element_name: impl Into<String>,
        serializer: Arc<dyn Serializer>,
    ) -> Self {
        self.fields.insert(
            name.into(),
            FieldInfo {
                element_name: element_name.into(),
                serializer,
            },
        );
        self
    }

    fn lookup(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }
}

impl Serializer for DocumentSerializer {
    fn kind(&self) -> ValueKind {
        ValueKind::Document
    }

    fn serialize(&self, value: &Value) -> Result<Value, SerializerError> {
        match value {
            Value::Document(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (key, field_value) in map {
                    match self.lookup(key) {
                        Some(info) => {
                            out.insert(
                                info.element_name.clone(),
                                info.serializer.serialize(field_value)?,
                            );
                        }
                        // Unknown members pass through untouched
                        None => {
                            out.insert(key.clone(), field_value.clone());
                        }
                    }
                }
                Ok(Value::Document(out))
            }
            other => Err(mismatch(ValueKind::Document, other)),
        }
    }

    fn deserialize(&self, wire: &Value) -> Result<Value, SerializerError> {
        match wire {
            Value::Document(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (element_name, wire_value) in map {
                    let known = self
                        .fields
                        .iter()
                        .find(|(_, info)| info.element_name == *element_name);
                    match known {
                        Some((name, info)) => {
                            out.insert(name.clone(), info.serializer.deserialize(wire_value)?);
                        }
                        None => {
                            out.insert(element_name.clone(), wire_value.clone());
                        }
                    }
                }
                Ok(Value::Document(out))
            }
            other => Err(mismatch(ValueKind::Document, other)),
        }
    }

    fn member(&self, name: &str) -> Option<&FieldInfo> {
        self.lookup(name)
    }
}

/// Maps runtime value kinds to default serializers.
///
/// The translation engine consults this registry when a literal appears
/// without field context. The defaults cover the scalar kinds; callers
/// with custom wire mappings register their own.
#[derive(Debug)]
pub struct SerializerRegistry {
    defaults: HashMap<ValueKind, Arc<dyn Serializer>>,
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        let mut defaults: HashMap<ValueKind, Arc<dyn Serializer>> = HashMap::new();
        defaults.insert(ValueKind::Boolean, Arc::new(BooleanSerializer));
        defaults.insert(ValueKind::Int32, Arc::new(Int32Serializer));
        defaults.insert(ValueKind::Int64, Arc::new(Int64Serializer));
        defaults.insert(ValueKind::Double, Arc::new(DoubleSerializer));
        defaults.insert(ValueKind::Decimal, Arc::new(DecimalSerializer));
        defaults.insert(ValueKind::String, Arc::new(StringSerializer));
        defaults.insert(ValueKind::DateTime, Arc::new(DateTimeSerializer));
        SerializerRegistry { defaults }
    }
}

impl SerializerRegistry {
    pub fn new() -> Self {
        SerializerRegistry::default()
    }

    /// Default serializer for a wire kind, if one is registered
    pub fn for_kind(&self, kind: ValueKind) -> Option<Arc<dyn Serializer>> {
        self.defaults.get(&kind).cloned()
    }

    /// Default serializer for a literal value (`None` for null and
    /// aggregate literals without a registered default)
    pub fn for_value(&self, value: &Value) -> Option<Arc<dyn Serializer>> {
        self.for_kind(value.kind())
    }

    /// Register or replace the default serializer for a kind
    pub fn register(&mut self, kind: ValueKind, serializer: Arc<dyn Serializer>) {
        self.defaults.insert(kind, serializer);
    }
}
