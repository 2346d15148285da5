use crate::util;

/// Reference to a table, with an optional short alias.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }

    /// A reference whose alias is derived from the table name
    /// (`"test_models"` becomes `tm`).
    pub fn aliased(name: impl Into<String>) -> Self {
        let name = name.into();
        let alias = util::table_alias(&name);
        Self { name, alias }
    }

    pub fn full_name(&self) -> String {
        if self.alias.is_empty() {
            self.name.clone()
        } else {
            self.alias.clone()
        }
    }
}
