//! Loading employees, reports and their rules from a JSON fixture.
//!
//! Employees and reports are managed outside this service; a seed file is
//! how they get into the database. The demo fixture is embedded so a fresh
//! install has something to show.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::db::{DbError, MappingDb};
use crate::types::{Employee, Report};

const DEMO_SEED: &str = include_str!("../seeds/demo.json");

#[derive(Debug, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub employees: Vec<Employee>,
    /// `mappings` on each report are written as active rules.
    #[serde(default)]
    pub reports: Vec<Report>,
}

/// Counts of what a seed run wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub employees: usize,
    pub reports: usize,
    pub rules: usize,
}

/// Parse the embedded demo dataset.
pub fn demo_seed() -> Result<SeedData, String> {
    serde_json::from_str(DEMO_SEED).map_err(|e| format!("Failed to parse demo seed: {}", e))
}

/// Load a seed file from disk.
pub fn load_seed_file(path: &Path) -> Result<SeedData, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read seed file {}: {}", path.display(), e))?;
    let seed: SeedData =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse seed file: {}", e))?;
    validate_seed(&seed)?;
    Ok(seed)
}

/// Reject seeds that would violate the store's uniqueness rules.
pub fn validate_seed(seed: &SeedData) -> Result<(), String> {
    let mut ids = HashSet::new();
    for e in &seed.employees {
        if e.id.trim().is_empty() {
            return Err("Employee id is required".into());
        }
        if !ids.insert(e.id.as_str()) {
            return Err(format!("Duplicate employee id: {}", e.id));
        }
    }

    let mut names = HashSet::new();
    let mut report_ids = HashSet::new();
    for r in &seed.reports {
        if r.name.trim().is_empty() {
            return Err(format!("Report {} has no name", r.id));
        }
        if !names.insert(r.name.as_str()) {
            return Err(format!("Duplicate report name: {}", r.name));
        }
        if !report_ids.insert(r.id.as_str()) {
            return Err(format!("Duplicate report id: {}", r.id));
        }
    }
    Ok(())
}

/// Write a seed into the database in one transaction.
pub fn apply_seed(db: &MappingDb, seed: &SeedData) -> Result<SeedSummary, DbError> {
    db.with_transaction(|tx| {
        let mut summary = SeedSummary::default();
        for employee in &seed.employees {
            tx.upsert_employee(employee)?;
            summary.employees += 1;
        }
        for report in &seed.reports {
            tx.upsert_report(report)?;
            summary.reports += 1;
            for mapping in &report.mappings {
                tx.upsert_rule(&report.name, mapping.mapping_type, &mapping.value)?;
                summary.rules += 1;
            }
        }
        Ok(summary)
    })
}
