//! Column layouts for metric and imperial task exports
//!
//! Exports from every region share one header vocabulary, but unit-bearing
//! headers carry a suffix (`㎡`, `ft²`, `L`, `gal`). A [`ColumnLayout`] names the
//! exact headers one unit system uses together with the conversions applied to
//! them. It is plain data handed to the pipeline stages.

use serde::{Deserialize, Serialize};

/// 1 US gallon in liters
pub const LITERS_PER_GALLON: f64 = 3.785411784;
/// 1 square foot in square meters
pub const SQUARE_METERS_PER_SQUARE_FOOT: f64 = 0.09290304;

pub const ID_COLUMN: &str = "Id";
pub const SERIAL_COLUMN: &str = "S/N";
pub const REPORT_TIME_COLUMN: &str = "Receive task report time";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn layout(self) -> ColumnLayout {
        match self {
            UnitSystem::Metric => ColumnLayout::metric(),
            UnitSystem::Imperial => ColumnLayout::imperial(),
        }
    }

    fn area_suffix(self) -> &'static str {
        match self {
            UnitSystem::Metric => "㎡",
            UnitSystem::Imperial => "ft²",
        }
    }

    fn volume_suffix(self) -> &'static str {
        match self {
            UnitSystem::Metric => "L",
            UnitSystem::Imperial => "gal",
        }
    }
}

/// Multiply a column by a constant and round the result
#[derive(Debug, Clone, PartialEq)]
pub struct UnitConversion {
    pub column: String,
    pub factor: f64,
    pub decimals: u32,
}

/// Headers and cleanup rules for one unit system
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub system: UnitSystem,
    pub serial_column: String,
    pub report_time_column: String,
    /// Administrative columns removed before normalization; all must be present
    pub dropped_columns: Vec<String>,
    /// Retained source columns in output order, `Id` first
    pub column_order: Vec<String>,
    /// Columns overwritten with the run's adjusted timestamp
    pub timestamp_columns: Vec<String>,
    /// Text-or-number columns cleaned of thousands separators and coerced to floats
    pub numeric_columns: Vec<String>,
    /// Whole-cell literal rewrites applied before numeric coercion
    pub literal_rewrites: Vec<(String, String)>,
    /// Unit conversions, applied after numeric coercion
    pub conversions: Vec<UnitConversion>,
}

impl ColumnLayout {
    pub fn metric() -> Self {
        Self::build(UnitSystem::Metric)
    }

    pub fn imperial() -> Self {
        Self::build(UnitSystem::Imperial)
    }

    pub fn actual_area_column(&self) -> String {
        format!("Actual cleaning area({})", self.system.area_suffix())
    }

    pub fn planned_area_column(&self) -> String {
        format!("Cleaning plan area ({})", self.system.area_suffix())
    }

    pub fn efficiency_column(&self) -> String {
        format!("Work efficiency ({}/h)", self.system.area_suffix())
    }

    pub fn water_column(&self) -> String {
        format!("Water usage ({})", self.system.volume_suffix())
    }

    fn build(system: UnitSystem) -> Self {
        let area = system.area_suffix();
        let volume = system.volume_suffix();

        let dropped_columns = vec![
            "Total time".to_string(),
            "Task status".to_string(),
            "Plan running time (s)".to_string(),
            format!("Uncleaned area ({area})"),
            "Task start mode".to_string(),
            "Remarks".to_string(),
        ];

        let column_order = vec![
            ID_COLUMN.to_string(),
            "Robot name".to_string(),
            SERIAL_COLUMN.to_string(),
            "Map name".to_string(),
            "Cleaning plan".to_string(),
            "User".to_string(),
            "Task start time".to_string(),
            "End time".to_string(),
            "Task completion (%)".to_string(),
            format!("Actual cleaning area({area})"),
            "Total time (h)".to_string(),
            format!("Water usage ({volume})"),
            "Brush (%)".to_string(),
            "Filter (%)".to_string(),
            "Squeegee(%)".to_string(),
            format!("Planned crystallization area ({area})"),
            format!("Actual crystallization area ({area})"),
            format!("Cleaning plan area ({area})"),
            "Start battery level (%)".to_string(),
            "End battery level (%)".to_string(),
            REPORT_TIME_COLUMN.to_string(),
            "Task type".to_string(),
            "Download link".to_string(),
            format!("Work efficiency ({area}/h)"),
        ];

        let timestamp_columns = vec![
            format!("Planned crystallization area ({area})"),
            format!("Actual crystallization area ({area})"),
        ];

        let area_columns = vec![
            format!("Work efficiency ({area}/h)"),
            format!("Actual cleaning area({area})"),
            format!("Cleaning plan area ({area})"),
        ];

        let mut numeric_columns = area_columns.clone();
        numeric_columns.extend(
            ["Brush (%)", "Filter (%)", "Squeegee(%)"]
                .iter()
                .map(|c| c.to_string()),
        );

        let mut literal_rewrites = vec![
            ("0.00".to_string(), "0".to_string()),
            ("100.00".to_string(), "100".to_string()),
        ];

        let conversions = match system {
            UnitSystem::Metric => Vec::new(),
            UnitSystem::Imperial => {
                // Imperial consoles also print an empty consumable as "0.0"
                literal_rewrites.push(("0.0".to_string(), "0".to_string()));

                let mut conversions = vec![UnitConversion {
                    column: format!("Water usage ({volume})"),
                    factor: LITERS_PER_GALLON,
                    decimals: 4,
                }];
                conversions.extend(area_columns.into_iter().map(|column| UnitConversion {
                    column,
                    factor: SQUARE_METERS_PER_SQUARE_FOOT,
                    decimals: 3,
                }));
                conversions
            }
        };

        Self {
            system,
            serial_column: SERIAL_COLUMN.to_string(),
            report_time_column: REPORT_TIME_COLUMN.to_string(),
            dropped_columns,
            column_order,
            timestamp_columns,
            numeric_columns,
            literal_rewrites,
            conversions,
        }
    }
}
