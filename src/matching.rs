//! Pure matching policy: which rules select which employees.
//!
//! Nothing here touches storage. A rule selects an employee when the
//! employee's value on the rule's axis equals the rule's `mapping_id`;
//! membership in a report is the OR over that report's active rules.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Employee, EmployeeCoverage, MappingRule, MappingType};

/// True if `rule` selects `employee` on its axis. Ignores the inclusion flag.
pub fn matches(employee: &Employee, rule: &MappingRule) -> bool {
    employee.axis_value(rule.mapping_type) == rule.mapping_id
}

/// True if any active rule selects `employee`.
pub fn matches_any(employee: &Employee, rules: &[MappingRule]) -> bool {
    rules.iter().any(|r| r.is_active() && matches(employee, r))
}

/// Distinct report names reachable from `employee` through active rules.
pub fn reports_for(employee: &Employee, rules: &[MappingRule]) -> BTreeSet<String> {
    rules
        .iter()
        .filter(|r| r.is_active() && matches(employee, r))
        .map(|r| r.report_name.clone())
        .collect()
}

/// Active rules indexed by `(axis, value)` so coverage over N employees and
/// M rules does not degrade to N×M comparisons.
pub struct RuleIndex<'a> {
    by_key: BTreeMap<(MappingType, &'a str), Vec<&'a str>>,
}

impl<'a> RuleIndex<'a> {
    pub fn new(rules: &'a [MappingRule]) -> Self {
        let mut by_key: BTreeMap<(MappingType, &'a str), Vec<&'a str>> = BTreeMap::new();
        for rule in rules.iter().filter(|r| r.is_active()) {
            by_key
                .entry((rule.mapping_type, rule.mapping_id.as_str()))
                .or_default()
                .push(rule.report_name.as_str());
        }
        Self { by_key }
    }

    /// Union of report names over the employee's five identity values.
    pub fn reports_for(&self, employee: &Employee) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for axis in MappingType::ALL {
            if let Some(reports) = self.by_key.get(&(axis, employee.axis_value(axis))) {
                names.extend(reports.iter().map(|n| n.to_string()));
            }
        }
        names
    }
}

/// Coverage for every employee, keeping those with fewer than `threshold`
/// distinct reports. Sorted by count, then name (byte order), then id.
pub fn under_covered(
    employees: &[Employee],
    rules: &[MappingRule],
    threshold: usize,
) -> Vec<EmployeeCoverage> {
    let index = RuleIndex::new(rules);
    let mut out: Vec<EmployeeCoverage> = employees
        .iter()
        .map(|e| {
            let names = index.reports_for(e);
            EmployeeCoverage {
                employee: e.clone(),
                report_count: names.len(),
                mapped_report_names: names.into_iter().collect(),
            }
        })
        .filter(|c| c.report_count < threshold)
        .collect();

    out.sort_by(|a, b| {
        a.report_count
            .cmp(&b.report_count)
            .then_with(|| a.employee.name.cmp(&b.employee.name))
            .then_with(|| a.employee.id.cmp(&b.employee.id))
    });
    out
}
