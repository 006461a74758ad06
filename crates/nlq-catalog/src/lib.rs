//! Schema catalog: the static whitelist of tables and columns
//!
//! The catalog is loaded once at startup (from the embedded definition or a
//! YAML file) and shared read-only by every component afterwards. A catalog
//! that fails to parse or validate is a fatal startup error.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Catalog definition shipped with the engine
pub const BUILTIN_CATALOG_YAML: &str = include_str!("../catalog/olist.yaml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// What a column means, independent of its storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Identifier,
    Category,
    Money,
    Timestamp,
    Count,
    Measure,
    Text,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Identifier => "identifier",
            SemanticType::Category => "category",
            SemanticType::Money => "money",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Count => "count",
            SemanticType::Measure => "measure",
            SemanticType::Text => "text",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SemanticType::Money | SemanticType::Count | SemanticType::Measure
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: Vec<ColumnSpec>,
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Foreign-key style link, written as `table.column`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaCatalog {
    pub name: String,
    #[serde(default)]
    pub description: String,
    tables: Vec<TableSpec>,
    #[serde(default)]
    relationships: Vec<Relationship>,
    #[serde(default)]
    notes: Vec<String>,
}

impl SchemaCatalog {
    /// Parse and validate the embedded catalog
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG_YAML)
    }

    /// Load a catalog definition from a YAML file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "Loading catalog definition");
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: SchemaCatalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check internal consistency: unique well-formed names, non-empty
    /// tables, relationships that resolve
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.tables.is_empty() {
            return Err(CatalogError::Invalid("catalog declares no tables".to_string()));
        }

        let mut table_names = HashSet::new();
        for table in &self.tables {
            check_name(&table.name)?;
            if !table_names.insert(table.name.to_ascii_lowercase()) {
                return Err(CatalogError::Invalid(format!(
                    "duplicate table '{}'",
                    table.name
                )));
            }
            if table.columns.is_empty() {
                return Err(CatalogError::Invalid(format!(
                    "table '{}' has no columns",
                    table.name
                )));
            }

            let mut column_names = HashSet::new();
            for column in &table.columns {
                check_name(&column.name)?;
                if !column_names.insert(column.name.to_ascii_lowercase()) {
                    return Err(CatalogError::Invalid(format!(
                        "duplicate column '{}.{}'",
                        table.name, column.name
                    )));
                }
            }
        }

        for rel in &self.relationships {
            for end in [&rel.from, &rel.to] {
                let (table, column) = end.split_once('.').ok_or_else(|| {
                    CatalogError::Invalid(format!("relationship endpoint '{}' is not table.column", end))
                })?;
                if self.column(table, column).is_none() {
                    return Err(CatalogError::Invalid(format!(
                        "relationship endpoint '{}' does not resolve",
                        end
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&ColumnSpec> {
        self.table(table).and_then(|t| t.column(column))
    }

    /// Whether any table declares a column with this name
    pub fn has_column_anywhere(&self, column: &str) -> bool {
        self.tables.iter().any(|t| t.has_column(column))
    }

    /// Human-readable summary for LLM prompts: names and semantic types
    /// only, never row data
    pub fn summary(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# Database Catalog: {}\n\n", self.name));
        if !self.description.is_empty() {
            md.push_str(&format!("{}\n\n", self.description.trim()));
        }

        for table in &self.tables {
            md.push_str(&format!("## Table: `{}`\n\n", table.name));
            if let Some(desc) = &table.description {
                md.push_str(&format!("{}\n\n", desc));
            }

            md.push_str("| Column | Semantic type | Notes |\n");
            md.push_str("|--------|---------------|-------|\n");
            for col in &table.columns {
                md.push_str(&format!(
                    "| `{}` | {} | {} |\n",
                    col.name,
                    col.semantic_type,
                    col.description.as_deref().unwrap_or("")
                ));
            }
            md.push('\n');
        }

        if !self.relationships.is_empty() {
            md.push_str("## Relationships\n\n");
            for rel in &self.relationships {
                md.push_str(&format!("- {} → {}\n", rel.from, rel.to));
            }
            md.push('\n');
        }

        if !self.notes.is_empty() {
            md.push_str("## Notes\n\n");
            for note in &self.notes {
                md.push_str(&format!("- {}\n", note));
            }
        }

        md
    }
}

fn check_name(name: &str) -> Result<(), CatalogError> {
    let mut chars = name.chars();
    let well_formed = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(CatalogError::Invalid(format!(
            "'{}' is not a lowercase SQL identifier",
            name
        )))
    }
}
