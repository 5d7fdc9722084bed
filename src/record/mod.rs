//! Product record schema.
//!
//! Records come from untrusted JSON. Every field is optional and a field of
//! the wrong type is dropped instead of failing the whole record, so that
//! downstream code only ever sees the coerced shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One entry of a record's `images` list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ImageRef {
    Plain(String),
    Object { url: String },
}

impl ImageRef {
    pub fn url(&self) -> &str {
        match self {
            ImageRef::Plain(url) => url,
            ImageRef::Object { url } => url,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(ImageRef::Plain(s.clone())),
            Value::Object(map) => match map.get("url") {
                Some(Value::String(url)) => Some(ImageRef::Object { url: url.clone() }),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Record {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Text of a `title` given as a number or `true`. Shown and sorted like
    /// a title, never matched by search.
    #[serde(skip)]
    pub coerced_title: Option<String>,
}

impl Record {
    /// Builds a record from any JSON value. Non-object values yield an empty
    /// record.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        Self {
            title: string_field(map, "title"),
            price: number_field(map, "price"),
            slug: string_field(map, "slug"),
            images: images_field(map),
            image: string_field(map, "image"),
            thumbnail: string_field(map, "thumbnail"),
            coerced_title: scalar_text_field(map, "title"),
        }
    }

    /// Price used for sorting and display: missing and `NaN` both read as 0.
    pub fn price_or_zero(&self) -> f64 {
        match self.price {
            Some(p) if !p.is_nan() => p,
            _ => 0.0,
        }
    }

    /// Title used for display and sorting: the string title, else the text
    /// of a scalar title, else `""`.
    pub fn title_or_empty(&self) -> &str {
        self.title
            .as_deref()
            .or(self.coerced_title.as_deref())
            .unwrap_or("")
    }

    pub fn slug_or_empty(&self) -> &str {
        self.slug.as_deref().unwrap_or("")
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Record::from_value(&value))
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

// Zero, `false` and `null` read as no title at all.
fn scalar_text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() => (f != 0.0).then(|| f.to_string()),
            _ => (n.as_i64() != Some(0)).then(|| n.to_string()),
        },
        Some(Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    }
}

fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn images_field(map: &Map<String, Value>) -> Vec<ImageRef> {
    match map.get("images") {
        Some(Value::Array(items)) => items.iter().filter_map(ImageRef::from_value).collect(),
        _ => Vec::new(),
    }
}
