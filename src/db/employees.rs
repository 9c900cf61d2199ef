use super::*;

impl MappingDb {
    // =========================================================================
    // Employees
    // =========================================================================

    /// Insert or update an employee. Display fields are overwritten only when
    /// the incoming record provides them.
    pub fn upsert_employee(&self, employee: &Employee) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO employees (
                employee_id, employee_name, team_id, team_name, area_id,
                city_id, city_name, country_id, country_name, location, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(employee_id) DO UPDATE SET
                employee_name = excluded.employee_name,
                team_id = excluded.team_id,
                team_name = COALESCE(excluded.team_name, employees.team_name),
                area_id = excluded.area_id,
                city_id = excluded.city_id,
                city_name = COALESCE(excluded.city_name, employees.city_name),
                country_id = excluded.country_id,
                country_name = COALESCE(excluded.country_name, employees.country_name),
                location = COALESCE(excluded.location, employees.location),
                updated_at = excluded.updated_at",
            params![
                employee.id,
                employee.name,
                employee.team_id,
                employee.team_name,
                employee.area_id,
                employee.city_id,
                employee.city_name,
                employee.country_id,
                employee.country_name,
                employee.location,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Get an employee by ID.
    pub fn get_employee(&self, id: &str) -> Result<Option<Employee>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, employee_name, team_id, team_name, area_id,
                    city_id, city_name, country_id, country_name, location
             FROM employees WHERE employee_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], Self::map_employee_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Get all employees ordered by name.
    pub fn get_employees(&self) -> Result<Vec<Employee>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, employee_name, team_id, team_name, area_id,
                    city_id, city_name, country_id, country_name, location
             FROM employees ORDER BY employee_name, employee_id",
        )?;
        let rows = stmt.query_map([], Self::map_employee_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_employee_row(row: &rusqlite::Row) -> rusqlite::Result<Employee> {
        Ok(Employee {
            id: row.get(0)?,
            name: row.get(1)?,
            team_id: row.get(2)?,
            team_name: row.get(3)?,
            area_id: row.get(4)?,
            city_id: row.get(5)?,
            city_name: row.get(6)?,
            country_id: row.get(7)?,
            country_name: row.get(8)?,
            location: row.get(9)?,
        })
    }
}
