//! Core domain types for Stockroom

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Result, StockroomError};

/// Category assigned to parts stored without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Minimum-stock threshold assigned to parts stored without one.
pub const DEFAULT_MIN_STOCK: u32 = 5;

/// Sentinel category meaning "no category filter".
pub const CATEGORY_ALL: &str = "Todas";

/// The authenticated session subject. At most one is present at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// A spare part held in inventory.
///
/// The identifier is backend-assigned and immutable once set. Timestamps
/// satisfy `updated_at >= created_at`; quantity and price are non-negative
/// once a draft passes validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub price: f64,
    pub category: String,
    pub min_stock: u32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Part {
    /// Whether the part sits at or below its own minimum-stock threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }

    /// Build a complete part from a validated draft plus the backend-assigned
    /// identifier. A single `now` is reused for both timestamps.
    pub fn from_draft(draft: PartDraft, id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            quantity: draft.quantity,
            price: draft.price,
            category: normalize_category(draft.category),
            min_stock: draft.min_stock,
            image_url: draft.image_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Map a stored document into the domain shape, applying the category and
    /// threshold defaults on read. Missing or unparseable timestamps fall back
    /// to "now", as the original data may predate those fields.
    pub fn from_document(id: String, fields: &Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: str_field(fields, "name"),
            description: str_field(fields, "description"),
            quantity: u32_field(fields, "quantity", 0),
            price: fields.get("price").and_then(Value::as_f64).unwrap_or(0.0),
            category: normalize_category(str_field(fields, "category")),
            min_stock: u32_field(fields, "min_stock", DEFAULT_MIN_STOCK),
            image_url: fields
                .get("image_url")
                .and_then(Value::as_str)
                .map(str::to_string),
            created_at: time_field(fields, "created_at", now),
            updated_at: time_field(fields, "updated_at", now),
        }
    }
}

/// Caller-supplied fields for creating a part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartDraft {
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub price: f64,
    pub category: String,
    pub min_stock: u32,
    pub image_url: Option<String>,
}

impl PartDraft {
    /// Reject drafts the remote would store in an invalid shape. Runs before
    /// any network call.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StockroomError::InvalidInput(
                "Name cannot be empty".to_string(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(StockroomError::InvalidInput(
                "Price must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    /// Server-shape record for insertion. Both timestamps carry the same
    /// `now`; an absent image is stored as an explicit null.
    pub fn fields(&self, now: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!(self.name));
        fields.insert("description".to_string(), json!(self.description));
        fields.insert("quantity".to_string(), json!(self.quantity));
        fields.insert("price".to_string(), json!(self.price));
        fields.insert(
            "category".to_string(),
            json!(normalize_category(self.category.clone())),
        );
        fields.insert("min_stock".to_string(), json!(self.min_stock));
        fields.insert("image_url".to_string(), json!(self.image_url));
        fields.insert("created_at".to_string(), json!(now.to_rfc3339()));
        fields.insert("updated_at".to_string(), json!(now.to_rfc3339()));
        fields
    }
}

/// Partial-field merge for updating a part. Absent fields are untouched;
/// `image_url` distinguishes "leave alone" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<u32>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub min_stock: Option<u32>,
    pub image_url: Option<Option<String>>,
}

impl PartPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the present fields into `part`. Timestamp stamping is the
    /// reducer's job, not the patch's.
    pub fn apply(&self, part: &mut Part) {
        if let Some(name) = &self.name {
            part.name = name.clone();
        }
        if let Some(description) = &self.description {
            part.description = description.clone();
        }
        if let Some(quantity) = self.quantity {
            part.quantity = quantity;
        }
        if let Some(price) = self.price {
            part.price = price;
        }
        if let Some(category) = &self.category {
            part.category = category.clone();
        }
        if let Some(min_stock) = self.min_stock {
            part.min_stock = min_stock;
        }
        if let Some(image_url) = &self.image_url {
            part.image_url = image_url.clone();
        }
    }

    /// The present fields as a partial server record.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = &self.name {
            fields.insert("name".to_string(), json!(name));
        }
        if let Some(description) = &self.description {
            fields.insert("description".to_string(), json!(description));
        }
        if let Some(quantity) = self.quantity {
            fields.insert("quantity".to_string(), json!(quantity));
        }
        if let Some(price) = self.price {
            fields.insert("price".to_string(), json!(price));
        }
        if let Some(category) = &self.category {
            fields.insert("category".to_string(), json!(category));
        }
        if let Some(min_stock) = self.min_stock {
            fields.insert("min_stock".to_string(), json!(min_stock));
        }
        if let Some(image_url) = &self.image_url {
            fields.insert("image_url".to_string(), json!(image_url));
        }
        fields
    }
}

/// A part category. Parts reference categories by name only; nothing enforces
/// that a part's category string matches an existing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn from_draft(draft: CategoryDraft, id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            color: draft.color,
            created_at: now,
        }
    }

    pub fn from_document(id: String, fields: &Map<String, Value>) -> Self {
        Self {
            id,
            name: str_field(fields, "name"),
            description: fields
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            color: str_field(fields, "color"),
            created_at: time_field(fields, "created_at", Utc::now()),
        }
    }
}

/// Caller-supplied fields for creating a category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
}

impl CategoryDraft {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StockroomError::InvalidInput(
                "Name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fields(&self, now: DateTime<Utc>) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("name".to_string(), json!(self.name));
        fields.insert("description".to_string(), json!(self.description));
        fields.insert("color".to_string(), json!(self.color));
        fields.insert("created_at".to_string(), json!(now.to_rfc3339()));
        fields
    }
}

/// Partial-field merge for updating a category. No timestamp stamp on merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl CategoryPatch {
    pub fn apply(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(description) = &self.description {
            category.description = Some(description.clone());
        }
        if let Some(color) = &self.color {
            category.color = color.clone();
        }
    }

    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(name) = &self.name {
            fields.insert("name".to_string(), json!(name));
        }
        if let Some(description) = &self.description {
            fields.insert("description".to_string(), json!(description));
        }
        if let Some(color) = &self.color {
            fields.insert("color".to_string(), json!(color));
        }
        fields
    }
}

/// Ephemeral view filters. Never persisted; only parameterizes
/// [`crate::views::filter_parts`].
#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    pub search: String,
    pub category: String,
    pub min_price: f64,
    pub max_price: f64,
    pub min_quantity: u32,
    pub low_stock_only: bool,
}

impl Default for Filters {
    /// The no-op filter: matches every part.
    fn default() -> Self {
        Self {
            search: String::new(),
            category: String::new(),
            min_price: 0.0,
            max_price: f64::INFINITY,
            min_quantity: 0,
            low_stock_only: false,
        }
    }
}

/// Aggregate statistics over the current part list. Recomputed on demand,
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_quantity: u64,
    pub total_value: f64,
    pub low_stock_count: usize,
    pub top_category: String,
    pub average_price: f64,
}

fn normalize_category(category: String) -> String {
    if category.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        category
    }
}

fn str_field(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn u32_field(fields: &Map<String, Value>, key: &str, default: u32) -> u32 {
    fields
        .get(key)
        .and_then(Value::as_u64)
        .map(|v| v.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(default)
}

fn time_field(fields: &Map<String, Value>, key: &str, default: DateTime<Utc>) -> DateTime<Utc> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(default)
}
