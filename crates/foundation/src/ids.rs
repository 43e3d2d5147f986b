/// Separator between a group id and a child key in composite ids.
pub const CHILD_SEPARATOR: char = '#';

/// Logical layer identifier as it appears in layer options.
///
/// Group children are addressed by a composite id `<group>#<child>`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        LayerId(id.into())
    }

    /// Composite id of the child `key` under this group.
    pub fn child(&self, key: &str) -> Self {
        LayerId(format!("{}{CHILD_SEPARATOR}{key}", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(value: &str) -> Self {
        LayerId::new(value)
    }
}

impl From<String> for LayerId {
    fn from(value: String) -> Self {
        LayerId(value)
    }
}

#[cfg(test)]
mod tests {
    use super::LayerId;

    #[test]
    fn child_ids_are_composite() {
        let group = LayerId::new("g");
        let child = group.child("a");
        assert_eq!(child.as_str(), "g#a");
        assert_eq!(child.child("b").to_string(), "g#a#b");
    }

    #[test]
    fn conversions_keep_the_text() {
        assert_eq!(LayerId::from("roads"), LayerId::new(String::from("roads")));
    }
}
