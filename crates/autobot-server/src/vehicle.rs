//! Vehicle records
//!
//! A [`Vehicle`] is the unit the pipeline produces and the store indexes. Its
//! identity is the content hash of the business fields; everything in
//! [`VehicleMeta`] except `source` may change without changing identity.

use autobot_common::hash::ContentHasher;
use autobot_common::{AutobotError, ContentHash, Country, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date format used for first registration dates everywhere
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Bookkeeping attached to a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleMeta {
    pub hash: ContentHash,
    /// Register the record was created from
    pub source: String,
    /// Identifier assigned by the source register
    pub ident: u64,
    pub last_updated: DateTime<Utc>,
    pub disabled: bool,
    pub country: Country,
}

/// Core vehicle data managed by Autobot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub reg_nr: String,
    pub vin: String,
    pub brand: String,
    pub model: String,
    pub fuel_type: String,
    pub first_reg_date: NaiveDate,
    pub meta: VehicleMeta,
}

impl Vehicle {
    /// Compute the content hash over the business fields
    ///
    /// Field order is fixed: RegNr, VIN, Brand, Model, FuelType, FirstRegDate,
    /// Source. Ident, LastUpdated, Disabled and Country never participate.
    pub fn content_hash(&self) -> Result<ContentHash> {
        if self.reg_nr.is_empty() && self.vin.is_empty() {
            return Err(AutobotError::Hash(format!(
                "vehicle with ident {} has neither registration number nor VIN",
                self.meta.ident
            )));
        }

        let reg_date = self.first_reg_date.format(DATE_FORMAT).to_string();
        let mut hasher = ContentHasher::new();
        hasher
            .field(&self.reg_nr)
            .field(&self.vin)
            .field(&self.brand)
            .field(&self.model)
            .field(&self.fuel_type)
            .field(&reg_date)
            .field(&self.meta.source);
        Ok(hasher.finish())
    }

    /// Compute and store the content hash in the metadata
    pub fn with_content_hash(mut self) -> Result<Self> {
        self.meta.hash = self.content_hash()?;
        Ok(self)
    }

    pub fn hash(&self) -> ContentHash {
        self.meta.hash
    }

    pub fn country(&self) -> Country {
        self.meta.country
    }

    pub fn is_disabled(&self) -> bool {
        self.meta.disabled
    }

    /// Multi-line human readable representation
    ///
    /// `line_break` separates fields and `pad` indents every field line, so
    /// `render("", " ")` gives a single line.
    pub fn render(&self, line_break: &str, pad: &str) -> String {
        Rendered {
            vehicle: self,
            line_break,
            pad,
        }
        .to_string()
    }
}

struct Rendered<'a> {
    vehicle: &'a Vehicle,
    line_break: &'a str,
    pad: &'a str,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.vehicle;
        let reg_date = v.first_reg_date.format(DATE_FORMAT);
        let fields: [(&str, &dyn fmt::Display); 8] = [
            ("Ident", &v.meta.ident),
            ("Country", &v.meta.country),
            ("RegNr", &v.reg_nr),
            ("VIN", &v.vin),
            ("Brand", &v.brand),
            ("Model", &v.model),
            ("FuelType", &v.fuel_type),
            ("RegDate", &reg_date),
        ];

        write!(
            f,
            "#{} ({}){}",
            v.meta.hash,
            status_label(v.meta.disabled),
            self.line_break
        )?;
        for (label, value) in fields {
            write!(f, "{}{}: {}{}", self.pad, label, value, self.line_break)?;
        }
        Ok(())
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.render("", " ").trim_end())
    }
}

/// "Disabled" or "Active"
pub fn status_label(disabled: bool) -> &'static str {
    if disabled {
        "Disabled"
    } else {
        "Active"
    }
}

/// Normalise a brand name
///
/// Short names (three characters or fewer, e.g. "BMW", "VW") are acronyms and
/// upper-cased; everything else is title-cased.
pub fn pretty_brand_name(brand: &str) -> String {
    let brand = brand.trim();
    if brand.chars().count() <= 3 {
        brand.to_uppercase()
    } else {
        title_case(brand)
    }
}

/// Normalise a fuel type, e.g. "BENZIN" -> "Benzin"
pub fn pretty_fuel_type(fuel_type: &str) -> String {
    title_case(fuel_type.trim())
}

/// Upper-case the first letter of every word and lower-case the rest
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Normalise a lookup identifier (registration number or VIN)
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_uppercase()
}
