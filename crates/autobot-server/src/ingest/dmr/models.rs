//! XML shape of one record in a DMR statistics export
//!
//! Only the elements needed to build a vehicle are modelled; everything else
//! in a record is skipped by the deserializer.

use serde::Deserialize;

/// One `<Statistik>` record
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VehicleStat {
    #[serde(rename = "KoeretoejIdent")]
    pub ident: u64,

    /// Statistical kind of the record; kind 1 describes a registered vehicle
    #[serde(rename = "KoeretoejArtNummer")]
    pub kind: u32,

    #[serde(rename = "RegistreringNummerNummer", default)]
    pub reg_nr: String,

    #[serde(rename = "KoeretoejOplysningGrundStruktur", default)]
    pub info: VehicleInfo,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct VehicleInfo {
    /// Register the record was created from
    #[serde(rename = "KoeretoejOplysningOprettetUdFra", default)]
    pub source: String,

    #[serde(rename = "KoeretoejOplysningStelNummer", default)]
    pub vin: String,

    /// Timestamp whose first ten characters are `YYYY-MM-DD`
    #[serde(rename = "KoeretoejOplysningFoersteRegistreringDato", default)]
    pub first_reg_date: String,

    #[serde(rename = "KoeretoejBetegnelseStruktur", default)]
    pub designation: Designation,

    #[serde(rename = "KoeretoejMotorStruktur", default)]
    pub engine: Engine,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Designation {
    #[serde(rename = "KoeretoejMaerkeTypeNavn", default)]
    pub brand: String,

    #[serde(rename = "Model", default)]
    pub model: ModelType,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ModelType {
    #[serde(rename = "KoeretoejModelTypeNavn", default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Engine {
    #[serde(rename = "DrivkraftTypeStruktur", default)]
    pub fuel: FuelType,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FuelType {
    #[serde(rename = "DrivkraftTypeNavn", default)]
    pub name: String,
}
