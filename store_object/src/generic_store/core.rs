use crate::driver::SqlDriver;
use crate::schema::TableSchema;
use std::marker::PhantomData;
use std::sync::Arc;

/// Generic repository bound to one table and one entity type
///
/// Holds no state of its own beyond the table metadata and the injected
/// driver; cloning is cheap and every clone shares the same driver.
pub struct PersistentRepository<T> {
    pub(crate) table: Arc<TableSchema>,
    pub(crate) driver: Arc<dyn SqlDriver>,
    pub(crate) _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for PersistentRepository<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            driver: self.driver.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for PersistentRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentRepository")
            .field("table", &self.table.name())
            .field("columns", &self.table.columns().len())
            .field("entity", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> PersistentRepository<T> {
    pub fn new(table: Arc<TableSchema>, driver: Arc<dyn SqlDriver>) -> Self {
        Self {
            table,
            driver,
            _phantom: PhantomData,
        }
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.table
    }

    pub fn driver(&self) -> &Arc<dyn SqlDriver> {
        &self.driver
    }
}
