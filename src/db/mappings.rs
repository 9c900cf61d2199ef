use super::*;

const RULE_COLUMNS: &str = "report_name, mapping_type, mapping_id, inclusion_flag";

impl MappingDb {
    // =========================================================================
    // Mapping rules
    // =========================================================================

    /// Make the rule `(report_name, axis, mapping_id)` active.
    ///
    /// A single `INSERT ... ON CONFLICT` against the UNIQUE triple, so two
    /// concurrent writers of the same rule end with one row flagged `Yes`.
    /// Returns true if a new row was inserted (an existing row keeps its
    /// first `created_at`).
    pub fn upsert_rule(
        &self,
        report_name: &str,
        axis: MappingType,
        mapping_id: &str,
    ) -> Result<bool, DbError> {
        let now = Utc::now().to_rfc3339();
        let inserted: bool = self.conn.query_row(
            "INSERT INTO mappings (report_name, mapping_type, mapping_id, inclusion_flag,
                                   created_at, updated_at)
             VALUES (?1, ?2, ?3, 'Yes', ?4, ?4)
             ON CONFLICT(report_name, mapping_type, mapping_id) DO UPDATE SET
                inclusion_flag = 'Yes',
                updated_at = CASE
                    WHEN mappings.inclusion_flag IS 'Yes' THEN mappings.updated_at
                    ELSE excluded.updated_at
                END
             RETURNING created_at = ?4",
            params![report_name, axis.as_str(), mapping_id, now],
            |row| row.get(0),
        )?;
        Ok(inserted)
    }

    /// Set the inclusion flag on an existing rule. Returns false if no such rule exists.
    pub fn set_rule_flag(
        &self,
        report_name: &str,
        axis: MappingType,
        mapping_id: &str,
        flag: InclusionFlag,
    ) -> Result<bool, DbError> {
        let rows = self.conn.execute(
            "UPDATE mappings SET inclusion_flag = ?4, updated_at = ?5
             WHERE report_name = ?1 AND mapping_type = ?2 AND mapping_id = ?3",
            params![
                report_name,
                axis.as_str(),
                mapping_id,
                flag.as_str(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(rows > 0)
    }

    /// All rules for a report regardless of flag.
    pub fn get_rules_for_report(&self, report_name: &str) -> Result<Vec<MappingRule>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM mappings
             WHERE report_name = ?1
             ORDER BY mapping_type, mapping_id"
        ))?;
        let rows = stmt.query_map(params![report_name], Self::map_rule_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Rules for a report with `inclusion_flag = 'Yes'`.
    pub fn get_active_rules_for_report(
        &self,
        report_name: &str,
    ) -> Result<Vec<MappingRule>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM mappings
             WHERE report_name = ?1 AND inclusion_flag = 'Yes'
             ORDER BY mapping_type, mapping_id"
        ))?;
        let rows = stmt.query_map(params![report_name], Self::map_rule_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every active rule in the store.
    pub fn get_active_rules(&self) -> Result<Vec<MappingRule>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM mappings
             WHERE inclusion_flag = 'Yes'
             ORDER BY report_name, mapping_type, mapping_id"
        ))?;
        let rows = stmt.query_map([], Self::map_rule_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Active rules that could select this employee: one `(type, id)` pair per axis.
    pub fn get_active_rules_for_employee(
        &self,
        employee: &Employee,
    ) -> Result<Vec<MappingRule>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM mappings
             WHERE inclusion_flag = 'Yes' AND (
                (mapping_type = 'employee_id' AND mapping_id = ?1) OR
                (mapping_type = 'team_id' AND mapping_id = ?2) OR
                (mapping_type = 'area_id' AND mapping_id = ?3) OR
                (mapping_type = 'city_id' AND mapping_id = ?4) OR
                (mapping_type = 'country_id' AND mapping_id = ?5)
             )
             ORDER BY report_name"
        ))?;
        let rows = stmt.query_map(
            params![
                employee.id,
                employee.team_id,
                employee.area_id,
                employee.city_id,
                employee.country_id
            ],
            Self::map_rule_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Raw rows for a report including bookkeeping columns.
    #[cfg(test)]
    pub fn get_mapping_rows(&self, report_name: &str) -> Result<Vec<DbMappingRow>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RULE_COLUMNS}, id, created_at, updated_at FROM mappings
             WHERE report_name = ?1 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![report_name], |row| {
            Ok(DbMappingRow {
                rule: Self::map_rule_row(row)?,
                id: row.get(4)?,
                created_at: row.get(5)?,
                updated_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Map the first four columns (`RULE_COLUMNS`) of a row.
    fn map_rule_row(row: &rusqlite::Row) -> rusqlite::Result<MappingRule> {
        let mapping_type: String = row.get(1)?;
        let axis = MappingType::parse(&mapping_type).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                Box::new(DbError::BadColumn {
                    column: "mapping_type",
                    value: mapping_type.clone(),
                }),
            )
        })?;
        let flag: Option<String> = row.get(3)?;
        Ok(MappingRule {
            report_name: row.get(0)?,
            mapping_type: axis,
            mapping_id: row.get(2)?,
            inclusion_flag: flag.as_deref().and_then(InclusionFlag::from_str_lossy),
        })
    }
}
