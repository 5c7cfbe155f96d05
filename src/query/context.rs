use parking_lot::RwLock;
use super::{FilterAttributes, SortAttributes};

/// Filter and sort settings shared between whoever edits them and the
/// projection refresh that reads them.
#[derive(Debug, Default)]
pub struct QueryContext {
    filter: RwLock<FilterAttributes>,
    sort:   RwLock<SortAttributes>,
}

impl QueryContext {
    pub fn new(filter: FilterAttributes, sort: SortAttributes) -> Self {
        Self {
            filter: RwLock::new(filter),
            sort:   RwLock::new(sort),
        }
    }

    pub fn filter(&self) -> FilterAttributes {
        self.filter.read().clone()
    }

    pub fn set_filter(&self, filter: FilterAttributes) {
        *self.filter.write() = filter;
    }

    pub fn sort(&self) -> SortAttributes {
        *self.sort.read()
    }

    pub fn set_sort(&self, sort: SortAttributes) {
        *self.sort.write() = sort;
    }
}
