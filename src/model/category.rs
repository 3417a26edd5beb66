//! The fixed expense category catalog and accounting-code derivation.

use crate::model::Location;
use serde::Serialize;

/// Accounting code that is used verbatim, never suffixed with a location.
const MISC_EXPENSE_CODE: &str = "Misc. Expense";

/// One entry in the fixed category catalog.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Category {
    id: &'static str,
    name: &'static str,
    accounting_code: &'static str,
}

/// All known expense categories. The catalog is fixed; there is no persistence or lifecycle
/// beyond process start.
const CATALOG: &[Category] = &[
    Category::new("1", "Gasoline", "6190-01"),
    Category::new("2", "Parking", "6160-01"),
    Category::new("3", "Misc. Auto", "6150-01"),
    Category::new("4", "Customer Relations", "6090-01"),
    Category::new("5", "Misc. Expense", MISC_EXPENSE_CODE),
    Category::new("6", "Sampling", "6080-05"),
    Category::new("7", "Travel/Lodging/Airfare", "6830-01"),
    Category::new("8", "Sales Training", "6250-01"),
    Category::new("9", "POS", "6080-04"),
    Category::new("10", "Office Supplies", "6570-01"),
    Category::new("11", "Computers", "6600-01"),
    Category::new("12", "Brand Promotion", "6080-05"),
];

impl Category {
    const fn new(id: &'static str, name: &'static str, accounting_code: &'static str) -> Self {
        Self {
            id,
            name,
            accounting_code,
        }
    }

    pub fn id(&self) -> &str {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// The base accounting code, without any location suffix.
    pub fn accounting_code(&self) -> &str {
        self.accounting_code
    }

    /// Derives the accounting code for a receipt. The miscellaneous-expense sentinel code is kept
    /// as is; any other code gets `-{location}` appended when the session has a submitter
    /// location.
    pub fn code_for(&self, location: Option<Location>) -> String {
        if self.accounting_code == MISC_EXPENSE_CODE {
            return self.accounting_code.to_string();
        }
        match location {
            Some(location) => format!("{}-{}", self.accounting_code, location),
            None => self.accounting_code.to_string(),
        }
    }
}

/// All categories, in catalog order.
pub fn catalog() -> &'static [Category] {
    CATALOG
}

/// Finds a category by its display name. The name is trimmed before lookup.
pub fn find_by_name(name: &str) -> Option<&'static Category> {
    let trimmed = name.trim();
    CATALOG.iter().find(|c| c.name == trimmed)
}
