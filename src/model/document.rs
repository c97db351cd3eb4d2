use serde_json::{Map, Value};

/// A schemaless document plus whether it has been written yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    fields: Map<String, Value>,
    is_new: bool,
}

impl Document {
    /// A document that has never been saved.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            is_new: true,
        }
    }

    /// A document read back from storage.
    pub fn loaded(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            is_new: false,
        }
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Integer value of `field`, if present and integral.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub(crate) fn mark_saved(&mut self) {
        self.is_new = false;
    }
}

/// Builds a new document from a JSON object. Non-object values are handed back.
impl TryFrom<Value> for Document {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Document::new(fields)),
            other => Err(other),
        }
    }
}
