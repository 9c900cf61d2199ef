// Coverage service
// Distinct-report counts per employee and the under-covered list.

use crate::error::ServiceError;
use crate::matching;
use crate::store::MappingStore;
use crate::types::{Employee, EmployeeCoverage};

/// Employees matched into fewer than this many distinct reports are flagged.
pub const DEFAULT_COVERAGE_THRESHOLD: usize = 2;

/// Employees whose distinct report count is below `threshold`, fewest first,
/// ties by name (byte order, case-sensitive) then id.
pub fn list_under_covered(
    store: &dyn MappingStore,
    threshold: usize,
) -> Result<Vec<EmployeeCoverage>, ServiceError> {
    let employees = store.list_employees()?;
    let rules = store.list_active_rules()?;
    let out = matching::under_covered(&employees, &rules, threshold);
    log::debug!(
        "Coverage: {} of {} employees below {}",
        out.len(),
        employees.len(),
        threshold
    );
    Ok(out)
}

/// Distinct report names currently selecting `employee`.
pub fn employee_report_names(
    store: &dyn MappingStore,
    employee: &Employee,
) -> Result<Vec<String>, ServiceError> {
    let candidates = store.active_rules_for_employee(employee)?;
    Ok(matching::reports_for(employee, &candidates)
        .into_iter()
        .collect())
}
