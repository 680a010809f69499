//! Export fixtures for integration tests
//!
//! Builders for DMR statistics records and for export files in the layouts
//! providers serve: plain XML, gzip and zip.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

/// Export filename prefix used throughout the tests
pub const PREFIX: &str = "ESStatistikListeModtag-";

// ============================================================================
// Record Fixtures
// ============================================================================

/// Builder for one `<Statistik>` record
#[derive(Debug, Clone)]
pub struct RecordFixture {
    ident: u64,
    kind: u32,
    reg_nr: String,
    vin: String,
    brand: String,
    model: String,
    fuel: String,
    first_reg: String,
}

impl RecordFixture {
    /// A registered passenger car with the given identifiers
    pub fn new(ident: u64, reg_nr: impl Into<String>, vin: impl Into<String>) -> Self {
        Self {
            ident,
            kind: 1,
            reg_nr: reg_nr.into(),
            vin: vin.into(),
            brand: "TOYOTA".to_string(),
            model: "Yaris".to_string(),
            fuel: "Benzin".to_string(),
            first_reg: "2012-06-01T00:00:00.000+02:00".to_string(),
        }
    }

    pub fn with_kind(mut self, kind: u32) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    pub fn with_first_reg(mut self, first_reg: impl Into<String>) -> Self {
        self.first_reg = first_reg.into();
        self
    }

    pub fn to_xml(&self) -> String {
        format!(
            r#"  <ns:Statistik>
    <ns:KoeretoejIdent>{ident}</ns:KoeretoejIdent>
    <ns:KoeretoejArtNummer>{kind}</ns:KoeretoejArtNummer>
    <ns:KoeretoejArtNavn>Personbil</ns:KoeretoejArtNavn>
    <ns:RegistreringNummerNummer>{reg_nr}</ns:RegistreringNummerNummer>
    <ns:KoeretoejOplysningGrundStruktur>
      <ns:KoeretoejOplysningOprettetUdFra>DMR</ns:KoeretoejOplysningOprettetUdFra>
      <ns:KoeretoejOplysningFoersteRegistreringDato>{first_reg}</ns:KoeretoejOplysningFoersteRegistreringDato>
      <ns:KoeretoejOplysningStelNummer>{vin}</ns:KoeretoejOplysningStelNummer>
      <ns:KoeretoejBetegnelseStruktur>
        <ns:KoeretoejMaerkeTypeNavn>{brand}</ns:KoeretoejMaerkeTypeNavn>
        <ns:Model>
          <ns:KoeretoejModelTypeNavn>{model}</ns:KoeretoejModelTypeNavn>
        </ns:Model>
      </ns:KoeretoejBetegnelseStruktur>
      <ns:KoeretoejMotorStruktur>
        <ns:DrivkraftTypeStruktur>
          <ns:DrivkraftTypeNavn>{fuel}</ns:DrivkraftTypeNavn>
        </ns:DrivkraftTypeStruktur>
      </ns:KoeretoejMotorStruktur>
    </ns:KoeretoejOplysningGrundStruktur>
  </ns:Statistik>
"#,
            ident = self.ident,
            kind = self.kind,
            reg_nr = self.reg_nr,
            vin = self.vin,
            brand = self.brand,
            model = self.model,
            fuel = self.fuel,
            first_reg = self.first_reg,
        )
    }
}

/// Wrap record bodies in the export envelope
pub fn export_document(records: &[String]) -> String {
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <ns:ESStatistikListe xmlns:ns=\"http://skat.dk/dmr/2007/05/31/\">\n",
    );
    for record in records {
        doc.push_str(record);
    }
    doc.push_str("</ns:ESStatistikListe>\n");
    doc
}

/// The four-record scenario: two distinct cars, a duplicate and a non-car
pub fn scenario_records() -> Vec<String> {
    vec![
        RecordFixture::new(1, "AB12345", "WVWZZZ1KZAW000001").to_xml(),
        RecordFixture::new(2, "CD67890", "VF1AAAAA000000002").to_xml(),
        RecordFixture::new(3, "AB12345", "WVWZZZ1KZAW000001").to_xml(),
        RecordFixture::new(4, "EF11111", "TRAILER000000004").with_kind(2).to_xml(),
    ]
}

// ============================================================================
// Export Files
// ============================================================================

/// `<PREFIX><date>-<time>.<ext>`
pub fn export_name(date: &str, time: &str, ext: &str) -> String {
    format!("{}{}-{}.{}", PREFIX, date, time, ext)
}

/// Write `document` zipped under `name` into `dir`
pub fn write_zip_export(dir: &Path, name: &str, document: &str) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file(
        name.trim_end_matches(".zip").to_string() + ".xml",
        zip::write::SimpleFileOptions::default(),
    )
    .unwrap();
    zip.write_all(document.as_bytes()).unwrap();
    zip.finish().unwrap();
    path
}

/// Write `document` gzipped under `name` into `dir`
pub fn write_gz_export(dir: &Path, name: &str, document: &str) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(document.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}
