//! Domain types shared by the store, the matching core and the HTTP layer.
//!
//! JSON uses camelCase field and axis names (`teamId`); SQL rows use
//! snake_case (`team_id`). Both spellings parse.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// =============================================================================
// Employees
// =============================================================================

/// An employee and the four group identifiers they can be matched through.
///
/// `team_name`, `city_name`, `country_name` and `location` are display
/// projections and never take part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub team_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub area_id: String,
    pub city_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    pub country_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Employee {
    /// The employee's value on a matching axis.
    pub fn axis_value(&self, axis: MappingType) -> &str {
        match axis {
            MappingType::EmployeeId => &self.id,
            MappingType::TeamId => &self.team_id,
            MappingType::AreaId => &self.area_id,
            MappingType::CityId => &self.city_id,
            MappingType::CountryId => &self.country_id,
        }
    }
}

// =============================================================================
// Mapping axes
// =============================================================================

/// The identity axis a mapping rule matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MappingType {
    #[serde(alias = "employee_id")]
    EmployeeId,
    #[serde(alias = "team_id")]
    TeamId,
    #[serde(alias = "area_id")]
    AreaId,
    #[serde(alias = "city_id")]
    CityId,
    #[serde(alias = "country_id")]
    CountryId,
}

impl MappingType {
    pub const ALL: [MappingType; 5] = [
        MappingType::EmployeeId,
        MappingType::TeamId,
        MappingType::AreaId,
        MappingType::CityId,
        MappingType::CountryId,
    ];

    /// String label for SQL storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingType::EmployeeId => "employee_id",
            MappingType::TeamId => "team_id",
            MappingType::AreaId => "area_id",
            MappingType::CityId => "city_id",
            MappingType::CountryId => "country_id",
        }
    }

    /// Parse either the SQL label or the camelCase wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "employee_id" | "employeeId" => Some(MappingType::EmployeeId),
            "team_id" | "teamId" => Some(MappingType::TeamId),
            "area_id" | "areaId" => Some(MappingType::AreaId),
            "city_id" | "cityId" => Some(MappingType::CityId),
            "country_id" | "countryId" => Some(MappingType::CountryId),
            _ => None,
        }
    }
}

impl std::str::FromStr for MappingType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("Invalid mapping type: {}", s)))
    }
}

impl std::fmt::Display for MappingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Mapping rules
// =============================================================================

/// Activation marker on a mapping row. A NULL column reads as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InclusionFlag {
    Yes,
    No,
}

impl InclusionFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            InclusionFlag::Yes => "Yes",
            InclusionFlag::No => "No",
        }
    }

    /// Parse from SQL string. Anything other than `Yes`/`No` is treated as absent.
    pub fn from_str_lossy(s: &str) -> Option<Self> {
        match s {
            "Yes" => Some(InclusionFlag::Yes),
            "No" => Some(InclusionFlag::No),
            _ => None,
        }
    }
}

/// A row from the `mappings` table: employees whose `mapping_type` field
/// equals `mapping_id` belong to `report_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRule {
    pub report_name: String,
    pub mapping_type: MappingType,
    pub mapping_id: String,
    pub inclusion_flag: Option<InclusionFlag>,
}

impl MappingRule {
    /// Only an explicit `Yes` counts. NULL and `No` are inactive everywhere.
    pub fn is_active(&self) -> bool {
        self.inclusion_flag == Some(InclusionFlag::Yes)
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    #[serde(rename = "AMER")]
    Amer,
    #[serde(rename = "EMEA")]
    Emea,
    #[serde(rename = "APAC")]
    Apac,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Amer => "AMER",
            Region::Emea => "EMEA",
            Region::Apac => "APAC",
        }
    }

    /// Case-insensitive parse, `None` for anything outside the known set.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AMER" => Some(Region::Amer),
            "EMEA" => Some(Region::Emea),
            "APAC" => Some(Region::Apac),
            _ => None,
        }
    }
}

/// One rule as the dashboard shows it under a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMapping {
    #[serde(rename = "type")]
    pub mapping_type: MappingType,
    pub value: String,
}

/// A saved report. `name` is unique and is what mapping rows reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub name: String,
    pub region: Region,
    #[serde(default)]
    pub supervisors: Vec<String>,
    /// Active rules only.
    #[serde(default)]
    pub mappings: Vec<ReportMapping>,
}

// =============================================================================
// Operation results
// =============================================================================

/// An employee together with the distinct reports they are matched into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeCoverage {
    pub employee: Employee,
    pub report_count: usize,
    /// Sorted, deduplicated.
    pub mapped_report_names: Vec<String>,
}

/// Outcome of a mapping write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingWriteResult {
    pub report_count: usize,
}
