// Employees service

use crate::error::ServiceError;
use crate::store::MappingStore;
use crate::types::Employee;

/// All employees, ordered by name.
pub fn list_employees(store: &dyn MappingStore) -> Result<Vec<Employee>, ServiceError> {
    let mut employees = store.list_employees()?;
    employees.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    Ok(employees)
}
