//! Data-access seam between the mapping services and storage.
//!
//! Services only see `MappingStore`; `MappingDb` is the SQLite implementation.

use crate::db::{DbError, MappingDb};
use crate::types::{Employee, InclusionFlag, MappingRule, MappingType, Region, Report};

pub trait MappingStore {
    fn get_employee(&self, id: &str) -> Result<Option<Employee>, DbError>;

    fn list_employees(&self) -> Result<Vec<Employee>, DbError>;

    fn list_reports(&self, region: Option<Region>) -> Result<Vec<Report>, DbError>;

    /// Whether a report with this name exists, without loading it.
    fn report_exists(&self, name: &str) -> Result<bool, DbError>;

    /// Every rule for the report, whatever its flag.
    fn get_rules_for_report(&self, report_name: &str) -> Result<Vec<MappingRule>, DbError>;

    /// Every rule with `inclusion_flag = Yes`.
    fn list_active_rules(&self) -> Result<Vec<MappingRule>, DbError>;

    /// Active rules that may select `employee`. Callers still run them
    /// through `matching`, so an implementation may over-return.
    fn active_rules_for_employee(&self, employee: &Employee) -> Result<Vec<MappingRule>, DbError> {
        let _ = employee;
        self.list_active_rules()
    }

    /// Insert the rule flagged `Yes`, or flip an existing one to `Yes`.
    /// Must be atomic against concurrent identical upserts.
    fn upsert_rule(
        &self,
        report_name: &str,
        axis: MappingType,
        mapping_id: &str,
    ) -> Result<bool, DbError>;

    /// Returns false when the rule does not exist.
    fn set_rule_flag(
        &self,
        report_name: &str,
        axis: MappingType,
        mapping_id: &str,
        flag: InclusionFlag,
    ) -> Result<bool, DbError>;
}

impl MappingStore for MappingDb {
    fn get_employee(&self, id: &str) -> Result<Option<Employee>, DbError> {
        MappingDb::get_employee(self, id)
    }

    fn list_employees(&self) -> Result<Vec<Employee>, DbError> {
        self.get_employees()
    }

    fn list_reports(&self, region: Option<Region>) -> Result<Vec<Report>, DbError> {
        self.get_reports(region)
    }

    fn report_exists(&self, name: &str) -> Result<bool, DbError> {
        MappingDb::report_exists(self, name)
    }

    fn get_rules_for_report(&self, report_name: &str) -> Result<Vec<MappingRule>, DbError> {
        MappingDb::get_rules_for_report(self, report_name)
    }

    fn list_active_rules(&self) -> Result<Vec<MappingRule>, DbError> {
        self.get_active_rules()
    }

    fn active_rules_for_employee(&self, employee: &Employee) -> Result<Vec<MappingRule>, DbError> {
        self.get_active_rules_for_employee(employee)
    }

    fn upsert_rule(
        &self,
        report_name: &str,
        axis: MappingType,
        mapping_id: &str,
    ) -> Result<bool, DbError> {
        MappingDb::upsert_rule(self, report_name, axis, mapping_id)
    }

    fn set_rule_flag(
        &self,
        report_name: &str,
        axis: MappingType,
        mapping_id: &str,
        flag: InclusionFlag,
    ) -> Result<bool, DbError> {
        MappingDb::set_rule_flag(self, report_name, axis, mapping_id, flag)
    }
}

/// Plain in-memory store for service tests.
#[cfg(test)]
pub(crate) mod memory {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    pub struct MemoryStore {
        pub employees: Vec<Employee>,
        pub reports: Vec<Report>,
        pub rules: RefCell<Vec<MappingRule>>,
    }

    impl MappingStore for MemoryStore {
        fn get_employee(&self, id: &str) -> Result<Option<Employee>, DbError> {
            Ok(self.employees.iter().find(|e| e.id == id).cloned())
        }

        fn list_employees(&self) -> Result<Vec<Employee>, DbError> {
            Ok(self.employees.clone())
        }

        fn report_exists(&self, name: &str) -> Result<bool, DbError> {
            Ok(self.reports.iter().any(|r| r.name == name))
        }

        fn list_reports(&self, region: Option<Region>) -> Result<Vec<Report>, DbError> {
            Ok(self
                .reports
                .iter()
                .filter(|r| region.map_or(true, |want| r.region == want))
                .cloned()
                .collect())
        }

        fn get_rules_for_report(&self, report_name: &str) -> Result<Vec<MappingRule>, DbError> {
            Ok(self
                .rules
                .borrow()
                .iter()
                .filter(|r| r.report_name == report_name)
                .cloned()
                .collect())
        }

        fn list_active_rules(&self) -> Result<Vec<MappingRule>, DbError> {
            Ok(self.rules.borrow().iter().filter(|r| r.is_active()).cloned().collect())
        }

        fn upsert_rule(
            &self,
            report_name: &str,
            axis: MappingType,
            mapping_id: &str,
        ) -> Result<bool, DbError> {
            let mut rules = self.rules.borrow_mut();
            if let Some(existing) = rules.iter_mut().find(|r| {
                r.report_name == report_name && r.mapping_type == axis && r.mapping_id == mapping_id
            }) {
                existing.inclusion_flag = Some(InclusionFlag::Yes);
                return Ok(false);
            }
            rules.push(MappingRule {
                report_name: report_name.to_string(),
                mapping_type: axis,
                mapping_id: mapping_id.to_string(),
                inclusion_flag: Some(InclusionFlag::Yes),
            });
            Ok(true)
        }

        fn set_rule_flag(
            &self,
            report_name: &str,
            axis: MappingType,
            mapping_id: &str,
            flag: InclusionFlag,
        ) -> Result<bool, DbError> {
            let mut rules = self.rules.borrow_mut();
            match rules.iter_mut().find(|r| {
                r.report_name == report_name && r.mapping_type == axis && r.mapping_id == mapping_id
            }) {
                Some(rule) => {
                    rule.inclusion_flag = Some(flag);
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }
}
