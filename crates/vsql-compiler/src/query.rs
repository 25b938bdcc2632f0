//! `UNION ALL` query assembly

use crate::predicate::{PredicateSet, quote};
use crate::request::{CompileRequest, FieldMapping};

/// Wraps predicates into one `SELECT` branch per entry
#[derive(Debug, Clone, Copy)]
pub struct QueryAssembler<'a> {
    fields: &'a FieldMapping,
    source_table: &'a str,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(fields: &'a FieldMapping, source_table: &'a str) -> Self {
        Self {
            fields,
            source_table,
        }
    }

    pub fn from_request(request: &'a CompileRequest) -> Self {
        Self::new(&request.fields, &request.source_table)
    }

    /// Retained columns: other fields, then the code field, then the code-type field.
    pub fn select_columns(&self) -> String {
        let mut columns: Vec<&str> = self.fields.other_fields.iter().map(String::as_str).collect();
        columns.push(&self.fields.code_field);
        if let Some(code_type) = &self.fields.code_type_field {
            columns.push(code_type);
        }
        columns.join(",")
    }

    /// The `CD_DATE` expression; a single date field is used as is.
    pub fn date_expression(&self) -> String {
        match self.fields.date_fields.as_slice() {
            [single] => single.clone(),
            fields => format!("coalesce({})", fields.join(",")),
        }
    }

    /// One `SELECT` branch for an entry.
    pub fn branch(&self, name: &str, predicate: &str) -> String {
        format!(
            "SELECT {},{} as CD_DATE,{} as CD_GRP from {} where ({})",
            self.select_columns(),
            self.date_expression(),
            quote(name),
            self.source_table,
            predicate
        )
    }

    /// Joins the branches of the selected entries with `UNION ALL`.
    ///
    /// An empty `sel_keys` selects every entry. The result is empty when no
    /// entry is selected.
    pub fn assemble(&self, predicates: &PredicateSet, sel_keys: &[String]) -> String {
        predicates
            .iter()
            .filter(|(name, _)| sel_keys.is_empty() || sel_keys.iter().any(|k| k == name))
            .map(|(name, predicate)| self.branch(name, predicate))
            .collect::<Vec<_>>()
            .join(" UNION ALL ")
    }
}
