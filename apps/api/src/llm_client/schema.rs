use serde::Serialize;
use serde_json::{json, Map, Value};

// ────────────────────────────────────────────────────────────────────────────
// Output schema
// ────────────────────────────────────────────────────────────────────────────

/// Shape of a single declared field. Drives the default injected when the
/// model omits the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    List,
}

#[derive(Debug, Clone)]
pub struct SchemaField {
    pub name: String,
    pub kind: FieldKind,
    pub hint: String,
}

/// Advisory output schema: an ordered list of field names with a type hint.
///
/// The schema is rendered into the prompt text. Nothing enforces it on the
/// model side, so every parsed object is re-shaped against it afterwards.
#[derive(Debug, Clone, Default)]
pub struct OutputSchema {
    fields: Vec<SchemaField>,
}

impl OutputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, name: &str, hint: &str) -> Self {
        self.fields.push(SchemaField {
            name: name.to_string(),
            kind: FieldKind::Scalar,
            hint: hint.to_string(),
        });
        self
    }

    pub fn list(mut self, name: &str, hint: &str) -> Self {
        self.fields.push(SchemaField {
            name: name.to_string(),
            kind: FieldKind::List,
            hint: hint.to_string(),
        });
        self
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// JSON rendering used in prompts: scalars map to their hint, lists to a
    /// one-element array holding the hint.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for field in &self.fields {
            let value = match field.kind {
                FieldKind::Scalar => Value::String(field.hint.clone()),
                FieldKind::List => json!([field.hint]),
            };
            map.insert(field.name.clone(), value);
        }
        Value::Object(map)
    }

    pub fn describe(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn default_value(kind: FieldKind) -> Value {
        match kind {
            FieldKind::Scalar => Value::String(String::new()),
            FieldKind::List => Value::Array(Vec::new()),
        }
    }

    /// Every declared field set to its empty default.
    pub fn default_object(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), Self::default_value(f.kind)))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Result quality
// ────────────────────────────────────────────────────────────────────────────

/// How a structured response was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionStatus {
    /// Parsed object carried every declared field.
    Complete,
    /// Parsed, but the listed fields were injected with defaults.
    Patched { missing: Vec<String> },
    /// No usable response; every field is a default.
    Degraded { reason: String },
}

/// Coarse data-quality marker threaded from the gateway up to the reports.
/// Ordered so that merging two markers keeps the worse one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    #[default]
    Complete,
    Partial,
    Degraded,
}

impl DataQuality {
    pub fn merge(self, other: DataQuality) -> DataQuality {
        self.max(other)
    }

    pub fn is_degraded(self) -> bool {
        self == DataQuality::Degraded
    }
}

impl From<&CompletionStatus> for DataQuality {
    fn from(status: &CompletionStatus) -> Self {
        match status {
            CompletionStatus::Complete => DataQuality::Complete,
            CompletionStatus::Patched { .. } => DataQuality::Partial,
            CompletionStatus::Degraded { .. } => DataQuality::Degraded,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Structured response
// ────────────────────────────────────────────────────────────────────────────

/// A parsed model response guaranteed to hold every schema key.
#[derive(Debug, Clone)]
pub struct StructuredResponse {
    pub fields: Map<String, Value>,
    pub status: CompletionStatus,
}

impl StructuredResponse {
    /// Fills in every schema key missing from `object` with its default.
    pub fn from_object(mut object: Map<String, Value>, schema: &OutputSchema) -> Self {
        let mut missing = Vec::new();
        for field in schema.fields() {
            if !object.contains_key(&field.name) {
                object.insert(field.name.clone(), OutputSchema::default_value(field.kind));
                missing.push(field.name.clone());
            }
        }
        let status = if missing.is_empty() {
            CompletionStatus::Complete
        } else {
            CompletionStatus::Patched { missing }
        };
        Self {
            fields: object,
            status,
        }
    }

    pub fn degraded(schema: &OutputSchema, reason: impl Into<String>) -> Self {
        Self {
            fields: schema.default_object(),
            status: CompletionStatus::Degraded {
                reason: reason.into(),
            },
        }
    }

    pub fn quality(&self) -> DataQuality {
        DataQuality::from(&self.status)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, CompletionStatus::Degraded { .. })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of `key`. Numbers and booleans are rendered; anything
    /// else becomes an empty string.
    pub fn text(&self, key: &str) -> String {
        match self.fields.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// List of strings under `key`. Non-string elements are rendered as
    /// compact JSON; a bare string becomes a one-element list.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    Value::String(_) | Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }

    /// Numeric value of `key`, accepting numeric strings such as "85" or "85%".
    /// Missing or non-numeric values read as 0.
    pub fn number(&self, key: &str) -> f64 {
        match self.fields.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s
                .trim()
                .trim_end_matches('%')
                .trim()
                .parse::<f64>()
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        match self.fields.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes"),
            _ => false,
        }
    }
}
