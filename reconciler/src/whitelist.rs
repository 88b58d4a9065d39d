use std::collections::HashSet;

/// Ids the user restored during this session.
///
/// A restored id stays exempt from keyword auto-hide until the owning engine
/// is dropped. There is no removal.
#[derive(Debug, Clone, Default)]
pub struct SessionWhitelist {
    ids: HashSet<String>,
}

impl SessionWhitelist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut whitelist = SessionWhitelist::new();
        assert!(!whitelist.contains("1"));
        whitelist.add("1");
        whitelist.add("1");
        assert!(whitelist.contains("1"));
        assert!(!whitelist.contains("11"));
    }
}
