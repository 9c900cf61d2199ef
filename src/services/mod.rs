// Mapping services: resolver, coverage aggregator, writer.
// Each takes a `MappingStore` so storage can be swapped in tests.

pub mod coverage;
pub mod employees;
pub mod mappings;
pub mod reports;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::db::test_utils::test_db;
    use crate::db::MappingDb;

    /// A temporary database loaded with the demo dataset.
    pub fn seeded_db() -> MappingDb {
        let db = test_db();
        let seed = crate::seed::demo_seed().expect("demo seed");
        crate::seed::apply_seed(&db, &seed).expect("apply demo seed");
        db
    }
}
