use crate::error::StoreError;

/// Read-only access to contract state, as seen at one point in the order.
pub trait StateView {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

impl<T: StateView + ?Sized> StateView for &T {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }
}

impl StateView for std::collections::BTreeMap<String, Vec<u8>> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(std::collections::BTreeMap::get(self, key).cloned())
    }
}
