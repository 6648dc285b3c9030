use chrono::NaiveDate;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use super::suppliers::SupplierId;
use crate::errors::ServiceError;

/// Wire format for `expiration`.
pub const EXPIRATION_FORMAT: &str = "%Y-%m-%d";

/// Store-assigned product identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Product record as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub supplier_id: SupplierId,
    pub name: String,
    /// Dose in mL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<i64>,
    pub quantity: i64,
    pub expiration: String,
    pub cost: f64,
    pub retail: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_sold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Product {
    /// Last known value of one editable attribute.
    pub fn field_value(&self, field: ProductField) -> FieldValue {
        match field {
            ProductField::Name => FieldValue::Text(self.name.clone()),
            ProductField::Dose => self.dose.map_or(FieldValue::Null, FieldValue::Integer),
            ProductField::Quantity => FieldValue::Integer(self.quantity),
            ProductField::Expiration => FieldValue::Text(self.expiration.clone()),
            ProductField::Cost => FieldValue::Decimal(self.cost),
            ProductField::Retail => FieldValue::Decimal(self.retail),
            ProductField::NumSold => self.num_sold.map_or(FieldValue::Null, FieldValue::Integer),
            ProductField::Notes => self
                .notes
                .clone()
                .map_or(FieldValue::Null, FieldValue::Text),
        }
    }

    /// Dose caption shown under the product name, e.g. `"5mL"`.
    pub fn dose_label(&self) -> String {
        match self.dose {
            Some(dose) if dose != 0 => format!("{}mL", dose),
            _ => String::new(),
        }
    }
}

/// The attributes a user can edit inline, one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductField {
    Name,
    Dose,
    Quantity,
    Expiration,
    Cost,
    Retail,
    NumSold,
    Notes,
}

impl ProductField {
    pub const ALL: [ProductField; 8] = [
        ProductField::Name,
        ProductField::Dose,
        ProductField::Quantity,
        ProductField::Expiration,
        ProductField::Cost,
        ProductField::Retail,
        ProductField::NumSold,
        ProductField::Notes,
    ];

    /// Attribute name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductField::Name => "name",
            ProductField::Dose => "dose",
            ProductField::Quantity => "quantity",
            ProductField::Expiration => "expiration",
            ProductField::Cost => "cost",
            ProductField::Retail => "retail",
            ProductField::NumSold => "numSold",
            ProductField::Notes => "notes",
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            ProductField::Dose | ProductField::NumSold | ProductField::Notes
        )
    }

    /// Parses text typed into an input for this field.
    ///
    /// Non-numeric text for a numeric field is rejected instead of being coerced.
    pub fn parse_input(&self, raw: &str) -> Result<FieldValue, ServiceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return if self.is_optional() {
                Ok(FieldValue::Null)
            } else {
                Err(invalid(*self, "a value is required"))
            };
        }

        match self {
            ProductField::Name => Ok(FieldValue::Text(trimmed.to_string())),
            ProductField::Notes => Ok(FieldValue::Text(raw.to_string())),
            ProductField::Dose | ProductField::Quantity | ProductField::NumSold => trimmed
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| invalid(*self, "expected a whole number")),
            ProductField::Cost | ProductField::Retail => match trimmed.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(FieldValue::Decimal(value)),
                _ => Err(invalid(*self, "expected a number")),
            },
            ProductField::Expiration => parse_expiration(trimmed)
                .map(|date| FieldValue::Text(date.format(EXPIRATION_FORMAT).to_string()))
                .ok_or_else(|| invalid(*self, "expected a YYYY-MM-DD date")),
        }
    }

    /// Form used for the unchanged-value check. Typed names are trimmed, so
    /// stored names are compared trimmed as well.
    pub fn comparable(&self, value: FieldValue) -> FieldValue {
        match (self, value) {
            (ProductField::Name, FieldValue::Text(text)) => {
                FieldValue::Text(text.trim().to_string())
            }
            (_, value) => value,
        }
    }

    /// Checks a typed value against this field and normalises it.
    ///
    /// Whole numbers are accepted for the currency fields.
    pub fn coerce(&self, value: FieldValue) -> Result<FieldValue, ServiceError> {
        match (self, value) {
            (field, FieldValue::Null) if field.is_optional() => Ok(FieldValue::Null),
            (ProductField::Name, FieldValue::Text(text)) if !text.trim().is_empty() => {
                Ok(FieldValue::Text(text))
            }
            (ProductField::Notes, FieldValue::Text(text)) => Ok(FieldValue::Text(text)),
            (
                ProductField::Dose | ProductField::Quantity | ProductField::NumSold,
                FieldValue::Integer(value),
            ) => Ok(FieldValue::Integer(value)),
            (ProductField::Cost | ProductField::Retail, FieldValue::Integer(value)) => {
                Ok(FieldValue::Decimal(value as f64))
            }
            (ProductField::Cost | ProductField::Retail, FieldValue::Decimal(value))
                if value.is_finite() =>
            {
                Ok(FieldValue::Decimal(value))
            }
            (ProductField::Expiration, FieldValue::Text(text)) => self.parse_input(&text),
            (field, value) => Err(invalid(*field, &format!("unsupported value {:?}", value))),
        }
    }
}

impl fmt::Display for ProductField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductField {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ServiceError::Validation(format!("unknown product field '{}'", s)))
    }
}

/// A single attribute value as sent to or read from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(value) => write!(f, "{}", value),
            FieldValue::Decimal(value) => write!(f, "{}", value),
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Null => f.write_str("null"),
        }
    }
}

/// Partial update carrying the product id and exactly one changed attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPatch {
    pub id: ProductId,
    pub field: ProductField,
    pub value: FieldValue,
}

impl Serialize for ProductPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry(self.field.as_str(), &self.value)?;
        map.end()
    }
}

/// Creation payload. `numSold` is left to the store default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub supplier_id: SupplierId,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose: Option<i64>,
    pub quantity: i64,
    #[validate(custom = "validate_expiration")]
    pub expiration: String,
    #[validate(custom = "validate_finite")]
    pub cost: f64,
    #[validate(custom = "validate_finite")]
    pub retail: f64,
}

/// Raw text as submitted from the add-product dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddProductForm {
    pub name: String,
    #[serde(default)]
    pub dose: String,
    pub quantity: String,
    pub expiration: String,
    pub cost: String,
    pub retail: String,
}

impl AddProductForm {
    /// Converts the dialog text into a creation payload for `supplier_id`.
    pub fn parse(&self, supplier_id: SupplierId) -> Result<NewProduct, ServiceError> {
        let name = match ProductField::Name.parse_input(&self.name)? {
            FieldValue::Text(name) => name,
            other => return Err(invalid(ProductField::Name, &other.to_string())),
        };
        let dose = match ProductField::Dose.parse_input(&self.dose)? {
            FieldValue::Integer(dose) => Some(dose),
            _ => None,
        };
        let quantity = match ProductField::Quantity.parse_input(&self.quantity)? {
            FieldValue::Integer(quantity) => quantity,
            other => return Err(invalid(ProductField::Quantity, &other.to_string())),
        };
        let expiration = match ProductField::Expiration.parse_input(&self.expiration)? {
            FieldValue::Text(date) => date,
            other => return Err(invalid(ProductField::Expiration, &other.to_string())),
        };
        let cost = decimal(ProductField::Cost, &self.cost)?;
        let retail = decimal(ProductField::Retail, &self.retail)?;

        let product = NewProduct {
            supplier_id,
            name,
            dose,
            quantity,
            expiration,
            cost,
            retail,
        };
        product.validate()?;
        Ok(product)
    }
}

fn decimal(field: ProductField, raw: &str) -> Result<f64, ServiceError> {
    match field.parse_input(raw)? {
        FieldValue::Decimal(value) => Ok(value),
        other => Err(invalid(field, &other.to_string())),
    }
}

fn invalid(field: ProductField, reason: &str) -> ServiceError {
    ServiceError::Validation(format!("{}: {}", field, reason))
}

fn parse_expiration(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, EXPIRATION_FORMAT).ok()
}

fn validate_expiration(value: &str) -> Result<(), ValidationError> {
    if parse_expiration(value).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("expiration");
        err.message = Some("expiration must be a YYYY-MM-DD date".into());
        Err(err)
    }
}

fn validate_finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        let mut err = ValidationError::new("finite");
        err.message = Some("value must be a finite number".into());
        Err(err)
    }
}
