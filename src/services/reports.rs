// Reports service
// Report listing and the mapping resolver (report name -> matched employees).

use crate::error::ServiceError;
use crate::matching;
use crate::store::MappingStore;
use crate::types::{Employee, Region, Report};

/// List reports, optionally filtered by region (`AMER`, `EMEA`, `APAC`).
pub fn list_reports(
    store: &dyn MappingStore,
    region: Option<&str>,
) -> Result<Vec<Report>, ServiceError> {
    let region = match region.map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => Some(
            Region::parse(raw)
                .ok_or_else(|| ServiceError::InvalidArgument(format!("Unknown region: {}", raw)))?,
        ),
        None => None,
    };
    Ok(store.list_reports(region)?)
}

/// All employees selected by at least one active rule of the named report.
///
/// Each employee appears once, sorted by name then id. A report with no
/// active rules yields an empty list; an unknown report is `NotFound`.
pub fn resolve_employees(
    store: &dyn MappingStore,
    report_name: &str,
) -> Result<Vec<Employee>, ServiceError> {
    if report_name.trim().is_empty() {
        return Err(ServiceError::InvalidArgument(
            "Report name is required".to_string(),
        ));
    }

    if !store.report_exists(report_name)? {
        return Err(ServiceError::NotFound(format!(
            "Report not found: {}",
            report_name
        )));
    }

    let rules: Vec<_> = store
        .get_rules_for_report(report_name)?
        .into_iter()
        .filter(|r| r.is_active())
        .collect();
    if rules.is_empty() {
        return Ok(Vec::new());
    }

    let mut matched: Vec<Employee> = store
        .list_employees()?
        .into_iter()
        .filter(|e| matching::matches_any(e, &rules))
        .collect();
    matched.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    matched.dedup_by(|a, b| a.id == b.id);
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::seeded_db;
    use crate::store::memory::MemoryStore;
    use crate::types::{InclusionFlag, MappingType};

    fn ids(employees: &[Employee]) -> Vec<&str> {
        employees.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_resolve_team_rule_includes_member() {
        let db = seeded_db();
        let got = resolve_employees(&db, "Q1 Sales Performance").unwrap();
        // team-sales OR country usa
        assert!(ids(&got).contains(&"emp-101"));
        assert!(ids(&got).contains(&"emp-104"), "usa via countryId");
        assert!(ids(&got).contains(&"emp-301"), "team-sales via teamId");
        assert!(!ids(&got).contains(&"emp-203"));
    }

    #[test]
    fn test_resolve_dedups_employee_matched_twice() {
        let db = seeded_db();
        let got = resolve_employees(&db, "Q1 Sales Performance").unwrap();
        // emp-101 is team-sales and usa: two rules, one row
        assert_eq!(ids(&got).iter().filter(|id| **id == "emp-101").count(), 1);
        let names: Vec<&str> = got.iter().map(|e| e.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_resolve_membership_matches_rule_definition() {
        let db = seeded_db();
        let employees = db.get_employees().unwrap();
        for report in db.get_reports(None).unwrap() {
            let rules = db.get_active_rules_for_report(&report.name).unwrap();
            let got = resolve_employees(&db, &report.name).unwrap();
            for e in &employees {
                let expected = rules.iter().any(|r| e.axis_value(r.mapping_type) == r.mapping_id);
                assert_eq!(
                    ids(&got).contains(&e.id.as_str()),
                    expected,
                    "{} in {}",
                    e.id,
                    report.name
                );
            }
        }
    }

    #[test]
    fn test_resolve_unknown_report_is_not_found() {
        let db = seeded_db();
        let err = resolve_employees(&db, "No Such Report").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_resolve_report_without_active_rules_is_empty() {
        let db = seeded_db();
        db.set_rule_flag("Tokyo Office Metrics", MappingType::CityId, "tokyo", InclusionFlag::No)
            .unwrap();
        let got = resolve_employees(&db, "Tokyo Office Metrics").unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_resolve_blank_name_is_invalid() {
        let db = seeded_db();
        let err = resolve_employees(&db, "  ").unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[test]
    fn test_resolve_against_memory_store() {
        use crate::matching::fixtures::{employee, rule};
        let store = MemoryStore {
            employees: vec![
                employee("emp-101", "John Smith", "team-sales", "area-na", "nyc", "usa"),
                employee("emp-203", "Daniel Martinez", "team-marketing", "area-eu", "london", "uk"),
            ],
            reports: vec![Report {
                id: "r1".to_string(),
                name: "Q1 Sales".to_string(),
                region: Region::Amer,
                supervisors: Vec::new(),
                mappings: Vec::new(),
            }],
            rules: std::cell::RefCell::new(vec![rule("Q1 Sales", MappingType::TeamId, "team-sales")]),
        };
        let got = resolve_employees(&store, "Q1 Sales").unwrap();
        assert_eq!(ids(&got), vec!["emp-101"]);

        let err = resolve_employees(&store, "Q2 Sales").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_list_reports_region_filter() {
        let db = seeded_db();
        assert_eq!(list_reports(&db, None).unwrap().len(), 7);
        let apac = list_reports(&db, Some("apac")).unwrap();
        assert_eq!(apac.len(), 2);
        assert!(apac.iter().all(|r| r.region == Region::Apac));
        assert!(matches!(
            list_reports(&db, Some("LATAM")).unwrap_err(),
            ServiceError::InvalidArgument(_)
        ));
    }
}
