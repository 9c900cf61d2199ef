// Mappings service
// The mapping writer: add (upsert to Yes) and exclude (flag to No) a rule
// derived from one employee's identity, then report their fresh coverage.

use crate::error::ServiceError;
use crate::store::MappingStore;
use crate::types::{Employee, InclusionFlag, MappingType, MappingWriteResult};

/// A write request as it arrives from a caller, before validation.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingRequest {
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub report_name: Option<String>,
    #[serde(default)]
    pub mapping_type: Option<String>,
}

impl MappingRequest {
    /// All three fields, or `InvalidArgument` naming the first one missing.
    fn required(&self) -> Result<(&str, &str, &str), ServiceError> {
        fn field<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ServiceError> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ServiceError::InvalidArgument(format!("Missing required field: {}", name)))
        }
        Ok((
            field(&self.employee_id, "employeeId")?,
            field(&self.report_name, "reportName")?,
            field(&self.mapping_type, "mappingType")?,
        ))
    }
}

/// Make `report_name` include the employee through `mapping_type`.
///
/// The rule value is the employee's own value on that axis. Re-adding an
/// existing rule changes nothing beyond keeping it active.
pub fn add_mapping(
    store: &dyn MappingStore,
    employee_id: &str,
    report_name: &str,
    mapping_type: &str,
) -> Result<MappingWriteResult, ServiceError> {
    let (employee, axis) = resolve_target(store, employee_id, mapping_type)?;
    let mapping_id = employee.axis_value(axis);

    let inserted = store.upsert_rule(report_name, axis, mapping_id)?;
    log::info!(
        "Mapping {} {}={} for '{}' (via {})",
        if inserted { "added" } else { "reactivated" },
        axis,
        mapping_id,
        report_name,
        employee.id
    );

    refreshed_count(store, &employee)
}

/// Stop `report_name` including employees through this employee's value on
/// `mapping_type`. The row is kept with flag `No`.
pub fn exclude_mapping(
    store: &dyn MappingStore,
    employee_id: &str,
    report_name: &str,
    mapping_type: &str,
) -> Result<MappingWriteResult, ServiceError> {
    let (employee, axis) = resolve_target(store, employee_id, mapping_type)?;
    let mapping_id = employee.axis_value(axis);

    if !store.set_rule_flag(report_name, axis, mapping_id, InclusionFlag::No)? {
        return Err(ServiceError::NotFound(format!(
            "No {} mapping for '{}' on report '{}'",
            axis, mapping_id, report_name
        )));
    }
    log::info!(
        "Mapping excluded {}={} for '{}' (via {})",
        axis,
        mapping_id,
        report_name,
        employee.id
    );

    refreshed_count(store, &employee)
}

/// Validate and run `add_mapping` for a raw request.
pub fn add_mapping_request(
    store: &dyn MappingStore,
    req: &MappingRequest,
) -> Result<MappingWriteResult, ServiceError> {
    let (employee_id, report_name, mapping_type) = req.required()?;
    add_mapping(store, employee_id, report_name, mapping_type)
}

/// Validate and run `exclude_mapping` for a raw request.
pub fn exclude_mapping_request(
    store: &dyn MappingStore,
    req: &MappingRequest,
) -> Result<MappingWriteResult, ServiceError> {
    let (employee_id, report_name, mapping_type) = req.required()?;
    exclude_mapping(store, employee_id, report_name, mapping_type)
}

/// Look up the employee first, then the axis, so an unknown employee is
/// reported as `NotFound` even when the axis is also bad.
fn resolve_target(
    store: &dyn MappingStore,
    employee_id: &str,
    mapping_type: &str,
) -> Result<(Employee, MappingType), ServiceError> {
    let employee = store
        .get_employee(employee_id)?
        .ok_or_else(|| ServiceError::NotFound(format!("Employee not found: {}", employee_id)))?;
    let axis: MappingType = mapping_type.parse()?;
    Ok((employee, axis))
}

fn refreshed_count(
    store: &dyn MappingStore,
    employee: &Employee,
) -> Result<MappingWriteResult, ServiceError> {
    let names = crate::services::coverage::employee_report_names(store, employee)?;
    Ok(MappingWriteResult {
        report_count: names.len(),
    })
}
