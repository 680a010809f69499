//! DMR statistics record parser

use autobot_common::{AutobotError, ContentHash, Country, ParseError, Result};
use chrono::{NaiveDate, Utc};
use std::borrow::Cow;

use super::models::VehicleStat;
use crate::ingest::framework::RecordParser;
use crate::vehicle::{
    normalize_identifier, pretty_brand_name, pretty_fuel_type, Vehicle, VehicleMeta, DATE_FORMAT,
};

/// Parses `<Statistik>` excerpts from the Danish Motor Register
#[derive(Debug, Clone)]
pub struct DmrParser {
    country: Country,
    primary_type: u32,
    /// Used when a record does not name the register it came from
    default_source: String,
}

impl Default for DmrParser {
    fn default() -> Self {
        Self {
            country: Country::Dk,
            primary_type: 1,
            default_source: "DMR".to_string(),
        }
    }
}

impl DmrParser {
    pub fn new(country: Country, primary_type: u32, default_source: impl Into<String>) -> Self {
        Self {
            country,
            primary_type,
            default_source: default_source.into(),
        }
    }

    /// Decode an excerpt without deciding whether it is kept
    pub fn decode(&self, excerpt: &str) -> Result<VehicleStat> {
        let xml = strip_prefixes(excerpt);
        quick_xml::de::from_str(&xml).map_err(|e| {
            AutobotError::Parse(ParseError::Fatal(format!("undecodable record: {}", e)))
        })
    }

    fn to_vehicle(&self, stat: VehicleStat) -> Result<Vehicle> {
        let first_reg_date = parse_reg_date(&stat.info.first_reg_date).ok_or_else(|| {
            AutobotError::Parse(ParseError::Recoverable(format!(
                "vehicle {} has unparseable first registration date '{}'",
                stat.ident, stat.info.first_reg_date
            )))
        })?;

        let source = match stat.info.source.trim() {
            "" => self.default_source.clone(),
            named => named.to_string(),
        };

        Vehicle {
            reg_nr: normalize_identifier(&stat.reg_nr),
            vin: normalize_identifier(&stat.info.vin),
            brand: pretty_brand_name(&stat.info.designation.brand),
            model: stat.info.designation.model.name.trim().to_string(),
            fuel_type: pretty_fuel_type(&stat.info.engine.fuel.name),
            first_reg_date,
            meta: VehicleMeta {
                hash: ContentHash::new(0),
                source,
                ident: stat.ident,
                last_updated: Utc::now(),
                disabled: false,
                country: self.country,
            },
        }
        .with_content_hash()
    }
}

impl RecordParser for DmrParser {
    fn parse_excerpt(&self, excerpt: &str) -> Result<Option<Vehicle>> {
        let stat = self.decode(excerpt)?;
        if stat.kind != self.primary_type {
            return Ok(None);
        }
        self.to_vehicle(stat).map(Some)
    }

    fn record_type(&self) -> &str {
        "dmr-statistik"
    }
}

/// `YYYY-MM-DD` taken from the first ten characters
fn parse_reg_date(value: &str) -> Option<NaiveDate> {
    let head = value.trim().get(..10)?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

/// Drop namespace prefixes from element names: `<ns:Tag>` becomes `<Tag>`
fn strip_prefixes(xml: &str) -> Cow<'_, str> {
    if !xml.contains(':') {
        return Cow::Borrowed(xml);
    }

    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(at) = rest.find('<') {
        out.push_str(&rest[..at]);
        let tag = &rest[at..];
        let name_start = if tag.starts_with("</") { 2 } else { 1 };
        let name_end = tag[name_start..]
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .map(|i| i + name_start)
            .unwrap_or(tag.len());

        out.push_str(&tag[..name_start]);
        let name = &tag[name_start..name_end];
        out.push_str(name.rsplit(':').next().unwrap_or(name));
        rest = &tag[name_end..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}
