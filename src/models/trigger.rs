use serde::{Deserialize, Serialize};

/// Trigger tokens arrive as free-form strings, with `food:` / `product:` /
/// `new_product:` prefixes marking food- and product-diary entries. They
/// are parsed once at this boundary so the analyzers never pattern-match
/// on prefixed strings.
///
/// Diary entries are excluded from generic trigger analysis — the reaction
/// analyzer already accounts for them and counting both would double-count
/// the same log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerToken {
    Food { name: String },
    Product { name: String, newly_added: bool },
    Generic { name: String },
}

impl TriggerToken {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix("food:") {
            Self::Food { name: normalize(rest) }
        } else if let Some(rest) = raw.strip_prefix("new_product:") {
            Self::Product { name: normalize(rest), newly_added: true }
        } else if let Some(rest) = raw.strip_prefix("product:") {
            Self::Product { name: normalize(rest), newly_added: false }
        } else {
            Self::Generic { name: raw.to_string() }
        }
    }

    /// True for food/product diary entries.
    pub fn is_diary_entry(&self) -> bool {
        !matches!(self, Self::Generic { .. })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Food { name } | Self::Product { name, .. } | Self::Generic { name } => name,
        }
    }
}

/// Food/product names match case-insensitively across check-ins.
fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
