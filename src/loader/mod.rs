//! Dataset loading from delimited text.
//!
//! This module reads the annual intervention file into a [`Dataset`]. The
//! file is read once; cells that cannot be parsed are kept as
//! [`Field::Invalid`] so the quality pass can report them.

use crate::dataset::Dataset;
use crate::error::LoadError;
use crate::models::{Field, InterventionRecord, TerritoryType};
use crate::quality::SpecialUnitMarkers;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// The columns of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Year,
    Region,
    DepartmentCode,
    Department,
    TerritoryType,
    DemographicCategory,
    VictimRescue,
    PersonRescue,
    Fires,
    HabitationFires,
    TrafficAccidents,
    VitalEmergencies,
    Carences,
    OtherOperations,
    TotalInterventions,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header())
    }
}

impl Column {
    /// Every expected column, in source file order.
    pub const ALL: [Column; 15] = [
        Column::Year,
        Column::Region,
        Column::DepartmentCode,
        Column::Department,
        Column::TerritoryType,
        Column::DemographicCategory,
        Column::HabitationFires,
        Column::Fires,
        Column::VictimRescue,
        Column::PersonRescue,
        Column::VitalEmergencies,
        Column::Carences,
        Column::TrafficAccidents,
        Column::OtherOperations,
        Column::TotalInterventions,
    ];

    /// Header name in the published source file.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Year => "Année",
            Column::Region => "Région",
            Column::DepartmentCode => "Numéro",
            Column::Department => "Département",
            Column::TerritoryType => "Zone",
            Column::DemographicCategory => "Catégorie A",
            Column::VictimRescue => "Secours à victime",
            Column::PersonRescue => "Secours à personne",
            Column::Fires => "Incendies",
            Column::HabitationFires => "Feux d'habitations-bureaux",
            Column::TrafficAccidents => "Accidents de circulation",
            Column::VitalEmergencies => "Malaises à domicile : urgence vitale",
            Column::Carences => "Malaises à domicile : carence",
            Column::OtherOperations => "Opérations diverses",
            Column::TotalInterventions => "Total interventions",
        }
    }

    /// Other accepted header names: unaccented and snake_case spellings.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Column::Year => &["annee", "year"],
            Column::Region => &["region"],
            Column::DepartmentCode => &["numero", "code_dept", "department_code"],
            Column::Department => &["departement", "department"],
            Column::TerritoryType => &["territory_type", "type de zone"],
            Column::DemographicCategory => &["categorie_a", "categorie a", "demographic_category"],
            Column::VictimRescue => &["secours_victime", "victim_rescue"],
            Column::PersonRescue => &["secours_personne", "person_rescue"],
            Column::Fires => &["fires", "fire_count"],
            Column::HabitationFires => &["feux_habitations", "habitation_fires"],
            Column::TrafficAccidents => &[
                "accidents_circulation",
                "traffic_accidents",
                "traffic_accident_count",
            ],
            Column::VitalEmergencies => &["malaises_urgence", "vital_emergencies"],
            Column::Carences => &["malaises_carence", "carences", "carence_count"],
            Column::OtherOperations => &[
                "operations_diverses",
                "other_operations",
                "other_operations_count",
            ],
            Column::TotalInterventions => &["total_interventions"],
        }
    }

    /// Match a header cell against the known names, ignoring case and
    /// surrounding whitespace.
    pub fn from_header(header: &str) -> Option<Column> {
        let normalized = header.trim().to_lowercase();

        Column::ALL.into_iter().find(|column| {
            column.header().to_lowercase() == normalized
                || column.aliases().iter().any(|alias| *alias == normalized)
        })
    }
}

/// Configuration for dataset loading.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Markers used to annotate military-operated brigade rows.
    pub markers: SpecialUnitMarkers,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: b';',
            markers: SpecialUnitMarkers::default(),
        }
    }
}

impl From<&crate::config::Config> for LoaderConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            delimiter: u8::try_from(config.data.delimiter).unwrap_or(b';'),
            markers: SpecialUnitMarkers {
                bspp: config.quality.bspp_markers.clone(),
                bmpm: config.quality.bmpm_markers.clone(),
            },
        }
    }
}

/// Reads intervention files into datasets.
pub struct DatasetLoader {
    config: LoaderConfig,
}

impl DatasetLoader {
    /// Create a new loader.
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Load a dataset from a file.
    ///
    /// Fails only when the file cannot be read or has no usable header.
    pub fn load(&self, path: &Path) -> Result<Dataset, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());

        let (records, missing_columns) = self.parse_records(&bytes)?;
        info!("Loaded {} records from {}", records.len(), path.display());

        Ok(Dataset::new(
            records,
            Some(path.to_path_buf()),
            missing_columns,
        ))
    }

    /// Parse a dataset from raw file contents.
    pub fn parse(&self, bytes: &[u8]) -> Result<Dataset, LoadError> {
        let (records, missing_columns) = self.parse_records(bytes)?;
        Ok(Dataset::new(records, None, missing_columns))
    }

    fn parse_records(
        &self,
        bytes: &[u8],
    ) -> Result<(Vec<InterventionRecord>, Vec<Column>), LoadError> {
        let text = decode(bytes);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(LoadError::MissingHeader);
        }

        let mut index: HashMap<Column, usize> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            match Column::from_header(header) {
                Some(column) => {
                    index.entry(column).or_insert(i);
                }
                None => debug!("Ignoring unknown column '{}'", header),
            }
        }

        if index.is_empty() {
            return Err(LoadError::UnrecognizedHeader {
                delimiter: char::from(self.config.delimiter),
                header: headers.join("|"),
            });
        }

        let missing_columns: Vec<Column> = Column::ALL
            .into_iter()
            .filter(|column| !index.contains_key(column))
            .collect();

        for column in &missing_columns {
            warn!("Column '{}' not found in dataset header", column.header());
        }

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            records.push(self.parse_row(&row, &index));
        }

        Ok((records, missing_columns))
    }

    /// Convert one row into a typed record.
    fn parse_row(&self, row: &StringRecord, index: &HashMap<Column, usize>) -> InterventionRecord {
        let get = |column: Column| cell(row, index, column);

        let mut record = InterventionRecord {
            year: parse_year(get(Column::Year)),
            region: parse_text(get(Column::Region)),
            department_code: parse_department_code(get(Column::DepartmentCode)),
            department: parse_text(get(Column::Department)),
            territory_type: parse_territory(get(Column::TerritoryType)),
            demographic_category: parse_text(get(Column::DemographicCategory)),
            victim_rescue: parse_count(get(Column::VictimRescue)),
            person_rescue: parse_count(get(Column::PersonRescue)),
            fires: parse_count(get(Column::Fires)),
            habitation_fires: parse_count(get(Column::HabitationFires)),
            traffic_accidents: parse_count(get(Column::TrafficAccidents)),
            vital_emergencies: parse_count(get(Column::VitalEmergencies)),
            carences: parse_count(get(Column::Carences)),
            other_operations: parse_count(get(Column::OtherOperations)),
            total_interventions: parse_count(get(Column::TotalInterventions)),
            special_unit: None,
        };
        record.special_unit = self.config.markers.detect(&record);

        record
    }
}

/// Decode file contents: UTF-8 when valid, Windows-1252 otherwise.
///
/// Windows-1252 is a superset of Latin-1 that also maps 0x80-0x9F to
/// printable characters (`’`, `œ`, `€`), as found in spreadsheet exports.
fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_owned(),
        Err(_) => {
            debug!("Dataset is not valid UTF-8, decoding as Windows-1252");
            let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}

/// Trimmed, non-empty cell for a column.
fn cell<'r>(row: &'r StringRecord, index: &HashMap<Column, usize>, column: Column) -> Option<&'r str> {
    index
        .get(&column)
        .and_then(|&i| row.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_text(raw: Option<&str>) -> Field<String> {
    match raw {
        Some(value) => Field::Value(value.to_owned()),
        None => Field::Missing,
    }
}

/// Parse a count. Thousands separators (spaces) are ignored and whole
/// decimals such as `12.0` are accepted.
fn parse_count(raw: Option<&str>) -> Field<u64> {
    let Some(raw) = raw else {
        return Field::Missing;
    };

    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if let Ok(value) = compact.parse::<u64>() {
        return Field::Value(value);
    }

    match compact.replace(',', ".").parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 => {
            Field::Value(value as u64)
        }
        _ => Field::Invalid(raw.to_owned()),
    }
}

fn parse_year(raw: Option<&str>) -> Field<u16> {
    match raw {
        Some(value) => value
            .parse::<u16>()
            .map(Field::Value)
            .unwrap_or_else(|_| Field::Invalid(value.to_owned())),
        None => Field::Missing,
    }
}

/// Numeric department codes are zero-padded to two digits (`1` → `01`).
fn parse_department_code(raw: Option<&str>) -> Field<String> {
    match raw {
        Some(value) if value.chars().all(|c| c.is_ascii_digit()) => {
            Field::Value(format!("{:0>2}", value))
        }
        Some(value) => Field::Value(value.to_uppercase()),
        None => Field::Missing,
    }
}

fn parse_territory(raw: Option<&str>) -> Field<TerritoryType> {
    match raw {
        Some(value) => TerritoryType::from_label(value)
            .map(Field::Value)
            .unwrap_or_else(|| Field::Invalid(value.to_owned())),
        None => Field::Missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MilitaryUnit;
    use std::io::Write;

    const SAMPLE: &str = "\
Année;Région;Numéro;Département;Zone;Catégorie A;Feux d'habitations-bureaux;Incendies;Secours à victime;Secours à personne;Malaises à domicile : urgence vitale;Malaises à domicile : carence;Accidents de circulation;Opérations diverses;Total interventions
2023;Bretagne;29;Finistère;Rural;B;450;2 100;6000;14000;3000;400;1500;4000;27600
2023;Île-de-France;75;BSPP;Urbain;A;5000;12000;90000;250000;60000;8000;15000;30000;397000
2023;Bretagne;35;Ille-et-Vilaine;Mixte;A;600;abc;7000;16000;;500;1800;4200;31000
";

    fn loader() -> DatasetLoader {
        DatasetLoader::new(LoaderConfig::default())
    }

    #[test]
    fn test_column_from_header() {
        assert_eq!(Column::from_header(" Région "), Some(Column::Region));
        assert_eq!(Column::from_header("TOTAL INTERVENTIONS"), Some(Column::TotalInterventions));
        assert_eq!(Column::from_header("Secours_victime"), Some(Column::VictimRescue));
        assert_eq!(Column::from_header("carence_count"), Some(Column::Carences));
        assert_eq!(Column::from_header("Unrelated"), None);
    }

    #[test]
    fn test_parse_french_headers() {
        let dataset = loader().parse(SAMPLE.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert!(dataset.missing_columns().is_empty());

        let first = &dataset.records()[0];
        assert_eq!(first.year, Field::Value(2023));
        assert_eq!(first.region.label(), "Bretagne");
        assert_eq!(first.territory_type, Field::Value(TerritoryType::Rural));
        assert_eq!(first.fires, Field::Value(2100));
        assert_eq!(first.medical_assistance(), 20000);
        assert_eq!(first.total_interventions.count(), 27600);
        assert_eq!(first.special_unit, None);
    }

    #[test]
    fn test_invalid_and_missing_cells_are_kept() {
        let dataset = loader().parse(SAMPLE.as_bytes()).unwrap();
        let third = &dataset.records()[2];

        assert_eq!(third.fires, Field::Invalid("abc".to_string()));
        assert_eq!(third.vital_emergencies, Field::Missing);
        assert_eq!(third.carences, Field::Value(500));
    }

    #[test]
    fn test_military_units_are_annotated() {
        let dataset = loader().parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.records()[1].special_unit, Some(MilitaryUnit::Bspp));
    }

    #[test]
    fn test_latin1_is_decoded() {
        let mut bytes: Vec<u8> = b"R\xe9gion;D\xe9partement;Total interventions\n".to_vec();
        bytes.extend_from_slice(b"Auvergne-Rh\xf4ne-Alpes;Is\xe8re;120\n");

        let dataset = loader().parse(&bytes).unwrap();
        let record = &dataset.records()[0];

        assert_eq!(record.region.label(), "Auvergne-Rhône-Alpes");
        assert_eq!(record.department.label(), "Isère");
        assert_eq!(record.total_interventions.count(), 120);
    }

    #[test]
    fn test_windows_1252_punctuation_is_decoded() {
        let mut bytes: Vec<u8> = b"R\xe9gion;D\xe9partement;Total interventions\n".to_vec();
        bytes.extend_from_slice(b"Provence;C\x92te d\x92Azur;10\n");

        let dataset = loader().parse(&bytes).unwrap();
        let record = &dataset.records()[0];

        assert_eq!(record.department.label(), "C\u{2019}te d\u{2019}Azur");
        assert_eq!(record.total_interventions.count(), 10);
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let text = "Région;Département;Total interventions\nBretagne;Morbihan;100\n";
        let dataset = loader().parse(text.as_bytes()).unwrap();

        assert!(dataset.missing_columns().contains(&Column::Fires));
        assert!(!dataset.missing_columns().contains(&Column::Region));
        assert_eq!(dataset.records()[0].fires, Field::Missing);
    }

    #[test]
    fn test_empty_input_has_no_header() {
        assert!(matches!(loader().parse(b""), Err(LoadError::MissingHeader)));
    }

    #[test]
    fn test_wrong_delimiter_is_rejected() {
        let text = "Région,Département,Total interventions\nBretagne,Morbihan,100\n";
        let result = loader().parse(text.as_bytes());

        assert!(matches!(result, Err(LoadError::UnrecognizedHeader { .. })));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(Some("1 234")), Field::Value(1234));
        assert_eq!(parse_count(Some("12.0")), Field::Value(12));
        assert_eq!(parse_count(Some("-3")), Field::Invalid("-3".to_string()));
        assert_eq!(parse_count(Some("1.5")), Field::Invalid("1.5".to_string()));
        assert_eq!(parse_count(None), Field::Missing);
    }

    #[test]
    fn test_department_code_padding() {
        assert_eq!(parse_department_code(Some("1")), Field::Value("01".to_string()));
        assert_eq!(parse_department_code(Some("974")), Field::Value("974".to_string()));
        assert_eq!(parse_department_code(Some("2a")), Field::Value("2A".to_string()));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let dataset = loader().load(file.path()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.source(), Some(file.path()));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = loader().load(Path::new("/nonexistent/interventions.csv"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
