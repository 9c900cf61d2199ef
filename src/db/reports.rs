use super::*;
use crate::types::ReportMapping;

/// A `reports` row before supervisors and mappings are attached.
struct ReportHeader {
    id: String,
    name: String,
    region: Region,
}

impl MappingDb {
    // =========================================================================
    // Reports
    // =========================================================================

    /// Insert or update a report and replace its supervisor list.
    ///
    /// Mapping rules are not touched; seed them with `upsert_rule`.
    pub fn upsert_report(&self, report: &Report) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO reports (report_id, report_name, region, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(report_id) DO UPDATE SET
                report_name = excluded.report_name,
                region = excluded.region,
                updated_at = excluded.updated_at",
            params![
                report.id,
                report.name,
                report.region.as_str(),
                Utc::now().to_rfc3339()
            ],
        )?;

        self.conn.execute(
            "DELETE FROM report_supervisors WHERE report_id = ?1",
            params![report.id],
        )?;
        for (position, employee_id) in report.supervisors.iter().enumerate() {
            self.conn.execute(
                "INSERT OR IGNORE INTO report_supervisors (report_id, employee_id, position)
                 VALUES (?1, ?2, ?3)",
                params![report.id, employee_id, position as i64],
            )?;
        }
        Ok(())
    }

    /// Whether a report with this name exists.
    pub fn report_exists(&self, name: &str) -> Result<bool, DbError> {
        Ok(self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM reports WHERE report_name = ?1)",
            params![name],
            |row| row.get(0),
        )?)
    }

    /// Get all reports ordered by name, optionally limited to one region.
    pub fn get_reports(&self, region: Option<Region>) -> Result<Vec<Report>, DbError> {
        let headers = match region {
            Some(region) => {
                let mut stmt = self.conn.prepare(
                    "SELECT report_id, report_name, region FROM reports
                     WHERE region = ?1 ORDER BY report_name",
                )?;
                let rows = stmt.query_map(params![region.as_str()], Self::map_report_header)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT report_id, report_name, region FROM reports ORDER BY report_name",
                )?;
                let rows = stmt.query_map([], Self::map_report_header)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        let mut reports = Vec::with_capacity(headers.len());
        for header in headers {
            reports.push(self.hydrate_report(header)?);
        }
        Ok(reports)
    }

    fn hydrate_report(&self, header: ReportHeader) -> Result<Report, DbError> {
        let supervisors = self.get_report_supervisors(&header.id)?;
        let mappings = self
            .get_active_rules_for_report(&header.name)?
            .into_iter()
            .map(|r| ReportMapping {
                mapping_type: r.mapping_type,
                value: r.mapping_id,
            })
            .collect();
        Ok(Report {
            id: header.id,
            name: header.name,
            region: header.region,
            supervisors,
            mappings,
        })
    }

    /// Supervisor employee ids in the order they were given.
    pub fn get_report_supervisors(&self, report_id: &str) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id FROM report_supervisors WHERE report_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![report_id], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn map_report_header(row: &rusqlite::Row) -> rusqlite::Result<ReportHeader> {
        let region: String = row.get(2)?;
        let parsed = Region::parse(&region).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                Box::new(DbError::BadColumn {
                    column: "region",
                    value: region.clone(),
                }),
            )
        })?;
        Ok(ReportHeader {
            id: row.get(0)?,
            name: row.get(1)?,
            region: parsed,
        })
    }
}
