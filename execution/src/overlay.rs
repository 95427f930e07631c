use std::collections::BTreeMap;

use strata_store::{StateView, StoreError};

/// Pending writes layered over a base view.
pub struct Overlay<'a> {
    base: &'a dyn StateView,
    writes: &'a BTreeMap<String, Vec<u8>>,
}

impl<'a> Overlay<'a> {
    pub fn new(base: &'a dyn StateView, writes: &'a BTreeMap<String, Vec<u8>>) -> Self {
        Self { base, writes }
    }
}

impl StateView for Overlay<'_> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.writes.get(key) {
            Some(v) => Ok(Some(v.clone())),
            None => self.base.get(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_shadow_base() {
        let mut base: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        base.insert("a".to_string(), vec![1]);
        base.insert("b".to_string(), vec![2]);
        let mut writes = BTreeMap::new();
        writes.insert("a".to_string(), vec![9]);

        let view = Overlay::new(&base, &writes);
        assert_eq!(view.get("a").unwrap(), Some(vec![9]));
        assert_eq!(view.get("b").unwrap(), Some(vec![2]));
        assert_eq!(view.get("c").unwrap(), None);
    }
}
