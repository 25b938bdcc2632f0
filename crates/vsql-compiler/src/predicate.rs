//! Predicate construction
//!
//! One predicate is built per value-set entry. Each include block whose
//! coding system is relevant to the requested domain contributes an optional
//! code-type gate, a code match chosen from its precision buckets, and value
//! bounds for continuous elements. Blocks are joined with `OR`.

use crate::code_type::CodeTypeMap;
use crate::concept::concept_codes;
use crate::filter::{FilterResolver, PrecisionBucket, Selection};
use crate::range::RangeExpander;
use crate::request::CompileRequest;
use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use vsql_diagnostics::{Diagnostic, Result, VSQL0105};
use vsql_model::{Criteria, IncludeBlock, RangeBound, ValueSetDocument, ValueSetEntry, ValueType};

/// Compiled predicates keyed by entry name, in document order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredicateSet {
    predicates: IndexMap<String, String>,
    #[serde(skip)]
    diagnostics: Vec<Diagnostic>,
}

impl PredicateSet {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.predicates.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.predicates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.predicates.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Warnings raised while building
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_map(self) -> IndexMap<String, String> {
        self.predicates
    }
}

/// Builds [`PredicateSet`]s for one request and code-type map
#[derive(Debug)]
pub struct PredicateBuilder<'a> {
    request: &'a CompileRequest,
    code_types: &'a CodeTypeMap,
    filters: FilterResolver,
}

impl<'a> PredicateBuilder<'a> {
    pub fn new(request: &'a CompileRequest, code_types: &'a CodeTypeMap) -> Self {
        let expander =
            RangeExpander::new(request.range_padding).with_max_len(request.max_range_len);
        Self {
            request,
            code_types,
            filters: FilterResolver::new(expander, request.filter_mode),
        }
    }

    /// Builds predicates for every entry of the document.
    ///
    /// Entries with no relevant include block are left out.
    pub fn build(&self, document: &ValueSetDocument) -> Result<PredicateSet> {
        let mut set = PredicateSet::default();
        for entry in document {
            let mut diagnostics = Vec::new();
            let predicate = self
                .build_entry(entry, &mut diagnostics)
                .map_err(|e| e.with_entry(&entry.name))?;
            set.diagnostics
                .extend(diagnostics.into_iter().map(|d| d.with_entry(&entry.name)));

            match predicate {
                Some(predicate) => {
                    set.predicates.insert(entry.name.clone(), predicate);
                }
                None => debug!("No relevant include blocks in '{}'", entry.name),
            }
        }
        Ok(set)
    }

    /// Builds the predicate for one entry, or `None` if every block was skipped.
    pub fn build_entry(
        &self,
        entry: &ValueSetEntry,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Option<String>> {
        let bounds = self.value_bounds(entry);
        let mut blocks = Vec::new();

        for (index, block) in entry.includes().iter().enumerate() {
            let Some(token) = self.code_types.get(block.system) else {
                debug!("Skipping {} block {} of '{}'", block.system, index, entry.name);
                continue;
            };
            match self.code_match(block, diagnostics)? {
                Some(code_match) => {
                    blocks.push(format!("{} {}{}", self.gate(token), code_match, bounds));
                }
                None => {
                    diagnostics.push(Diagnostic::warning(
                        VSQL0105,
                        format!("{} block {} yields no codes and was skipped", block.system, index),
                    ));
                }
            }
        }

        Ok(match blocks.len() {
            0 => None,
            1 => blocks.pop(),
            _ => Some(
                blocks
                    .iter()
                    .map(|b| format!("({})", b))
                    .collect::<Vec<_>>()
                    .join(" OR "),
            ),
        })
    }

    fn gate(&self, token: &str) -> String {
        match &self.request.fields.code_type_field {
            Some(field) => format!("{} = {} AND", field, quote(token)),
            None => String::new(),
        }
    }

    fn code_match(
        &self,
        block: &IncludeBlock,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Option<String>> {
        let field = self.request.fields.code_field.as_str();
        let dialect = self.request.dialect;

        let filters = match block.criteria() {
            Criteria::Filters(filters) => filters,
            Criteria::Concepts(concepts) => {
                let codes = concept_codes(concepts);
                return Ok((!codes.is_empty()).then(|| format!("{} in ({})", field, quote_list(codes))));
            }
            Criteria::Empty => return Ok(None),
        };

        let buckets = self.filters.resolve(filters, diagnostics)?;
        let Some(selection) = buckets.select() else {
            return Ok(None);
        };

        let code_match = match selection {
            Selection::Hierarchical {
                bucket: PrecisionBucket::Category,
                codes,
            } if block.system.is_dotted_diagnosis() => {
                debug!("{}: matching {} categories by dot prefix", block.system, codes.len());
                format!("{} in ({})", dialect.split_part(field, ".", 1), quote_list(codes))
            }
            Selection::Hierarchical { bucket, codes } => {
                let length = bucket
                    .prefix_len()
                    .unwrap_or_else(|| shortest(codes));
                debug!("{}: bucket {} matched on {}-character prefix", block.system, bucket, length);
                format!("{} in ({})", dialect.prefix(field, length), quote_list(codes))
            }
            Selection::Leaves(codes) => format!("{} in ({})", field, quote_list(codes)),
        };
        Ok(Some(code_match))
    }

    fn value_bounds(&self, entry: &ValueSetEntry) -> String {
        let (Some(field), Some(ValueType::Continuous)) =
            (&self.request.fields.value_field, entry.value_type())
        else {
            return String::new();
        };
        let Some(range) = entry.value_range() else {
            return String::new();
        };

        let mut bounds = String::new();
        if let Some(high) = &range.high {
            bounds.push_str(&bound(field, high, ">", ">="));
        }
        if let Some(low) = &range.low {
            bounds.push_str(&bound(field, low, "<", "<="));
        }
        bounds
    }
}

fn bound(field: &str, bound: &RangeBound, exclusive: &str, inclusive: &str) -> String {
    let op = if bound.is_inclusive() { inclusive } else { exclusive };
    format!(" AND {} {} {}", field, op, bound.value)
}

fn shortest(codes: &[String]) -> usize {
    codes.iter().map(|c| c.chars().count()).min().unwrap_or(0)
}

/// Quotes a SQL string literal.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_list<I, S>(codes: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    codes
        .into_iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterMode;
    use pretty_assertions::assert_eq;
    use vsql_diagnostics::VSQL0102;
    use vsql_model::CodingSystem;

    fn request(domain: &str, dialect: &str, code_type_field: &str) -> CompileRequest {
        CompileRequest::builder()
            .dialect(dialect)
            .domain(domain)
            .code_field("DX")
            .code_type_field(code_type_field)
            .value_field("RESULT_NUM")
            .date_fields(["DX_DATE"])
            .source_table("DIAGNOSIS")
            .build()
            .unwrap()
    }

    fn codes(table: &[(CodingSystem, &str)]) -> CodeTypeMap {
        table.iter().map(|(s, t)| (*s, t.to_string())).collect()
    }

    fn document(json: &str) -> ValueSetDocument {
        ValueSetDocument::from_json_str(json).unwrap()
    }

    const T2DM: &str = r#"[{
        "id": "CDE1", "name": "T2DM",
        "compose": {"include": [
            {"system": "icd9cm", "filter": [{"property": "codePrecision", "op": "descendent-of", "value": ["250", "357.2"]}]},
            {"system": "icd10cm", "filter": [{"property": "codeRange", "op": "in", "value": ["E11-E13"]}]}
        ]}
    }]"#;

    #[test]
    fn test_dotted_category_uses_split_part() {
        let request = request("dx", "snow", "DX_TYPE");
        let map = codes(&[(CodingSystem::Icd9Cm, "09"), (CodingSystem::Icd10Cm, "10")]);
        let set = PredicateBuilder::new(&request, &map).build(&document(T2DM)).unwrap();

        assert_eq!(
            set.get("T2DM").unwrap(),
            "(DX_TYPE = '09' AND split_part(DX,'.',1) in ('250')) OR \
             (DX_TYPE = '10' AND DX in ('E11','E12','E13'))"
        );
    }

    #[test]
    fn test_hierarchical_procedure_uses_shortest_prefix() {
        let json = r#"[{"id": "CDE2", "name": "Dialysis", "compose": {"include": [
            {"system": "icd10pcs", "filter": [{"property": "codePrecision", "op": "descendent-of", "value": ["5A1D", "5A1D7"]}]}
        ]}}]"#;
        let request = request("px", "oracle", "");
        let map = codes(&[(CodingSystem::Icd10Pcs, "10")]);
        let set = PredicateBuilder::new(&request, &map).build(&document(json)).unwrap();

        assert_eq!(set.get("Dialysis").unwrap(), " substr(DX,1,4) in ('5A1D','5A1D7')");
    }

    #[test]
    fn test_one_decimal_bucket_matches_five_characters() {
        let json = r#"[{"id": "CDE3", "name": "HTN", "compose": {"include": [
            {"system": "icd9cm", "filter": [{"property": "codePrecision", "op": "descendent-of", "value": ["401.1", "401.91"]}]}
        ]}}]"#;
        let request = request("dx", "postgres", "");
        let map = codes(&[(CodingSystem::Icd9Cm, "09")]);
        let set = PredicateBuilder::new(&request, &map).build(&document(json)).unwrap();

        assert_eq!(set.get("HTN").unwrap(), " substring(DX,1,5) in ('401.1')");
    }

    #[test]
    fn test_continuous_bounds() {
        let json = r#"[{"id": "CDE4", "name": "HbA1c",
            "relatedArtifact": {"valueType": "continuous", "valueRange": {
                "low": {"value": 10, "unit": "%", "incld": 1},
                "high": {"value": 6.5, "unit": "%", "incld": 0}}},
            "compose": {"include": [{"system": "loinc", "concept": [{"code": "4548-4"}]}]}}]"#;
        let request = request("lab", "snow", "");
        let map = codes(&[(CodingSystem::Loinc, "LC")]);
        let set = PredicateBuilder::new(&request, &map).build(&document(json)).unwrap();

        assert_eq!(
            set.get("HbA1c").unwrap(),
            " DX in ('4548-4') AND RESULT_NUM > 6.5 AND RESULT_NUM <= 10"
        );
    }

    #[test]
    fn test_quotes_are_escaped() {
        let json = r#"[{"id": "CDE5", "name": "Odd", "compose": {"include": [
            {"system": "ndc", "concept": [{"code": "O'1"}]}
        ]}}]"#;
        let request = request("rx", "snow", "RX_TYPE");
        let map = codes(&[(CodingSystem::Ndc, "N'D")]);
        let set = PredicateBuilder::new(&request, &map).build(&document(json)).unwrap();

        assert_eq!(set.get("Odd").unwrap(), "RX_TYPE = 'N''D' AND DX in ('O''1')");
    }

    #[test]
    fn test_empty_block_is_skipped_with_warning() {
        let json = r#"[{"id": "CDE6", "name": "Sparse", "compose": {"include": [
            {"system": "icd10cm", "filter": [{"property": "codeList", "op": "exists", "value": []}]},
            {"system": "icd10cm", "filter": [{"property": "codeList", "op": "exists", "value": ["N18.6"]}]}
        ]}}]"#;
        let request = request("dx", "snow", "");
        let map = codes(&[(CodingSystem::Icd10Cm, "10")]);
        let set = PredicateBuilder::new(&request, &map).build(&document(json)).unwrap();

        assert_eq!(set.get("Sparse").unwrap(), " DX in ('N18.6')");
        assert_eq!(set.diagnostics().len(), 1);
        assert_eq!(set.diagnostics()[0].code, VSQL0105);
        assert_eq!(set.diagnostics()[0].entry.as_deref(), Some("Sparse"));
    }

    #[test]
    fn test_unsupported_filter_names_entry() {
        let json = r#"[{"id": "CDE7", "name": "Regex", "compose": {"include": [
            {"system": "icd10cm", "filter": [{"property": "textRegex", "op": "regex", "value": ["^E11"]}]}
        ]}}]"#;
        let strict = request("dx", "snow", "");
        let map = codes(&[(CodingSystem::Icd10Cm, "10")]);
        let err = PredicateBuilder::new(&strict, &map).build(&document(json)).unwrap_err();
        assert_eq!(err.code(), VSQL0102);
        assert_eq!(err.entry(), Some("Regex"));

        let lenient = CompileRequest {
            filter_mode: FilterMode::Lenient,
            ..strict
        };
        let set = PredicateBuilder::new(&lenient, &map).build(&document(json)).unwrap();
        assert!(set.is_empty());
        let found: Vec<_> = set.diagnostics().iter().map(|d| d.code).collect();
        assert_eq!(found, vec![VSQL0102, VSQL0105]);
    }
}
