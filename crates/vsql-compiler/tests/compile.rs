//! End-to-end compile tests
//!
//! Covers:
//! - Single-branch procedure query text
//! - Domain gating of irrelevant coding systems
//! - `sel_keys` selection and branch order
//! - Deterministic output across repeated compiles
//! - Dialect-specific category matching
//! - Range padding and range length limits from the request

use pretty_assertions::assert_eq;
use rstest::rstest;
use vsql_compiler::{CompileRequest, Compiler, RangePadding, StaticCodeTypes};
use vsql_diagnostics::VSQL0103;
use vsql_model::{CodingSystem, ValueSetDocument};

const KIDNEY: &str = r#"[
    {
        "id": "CDE0000101",
        "name": "KTx",
        "description": "kidney transplant",
        "topic": "treatment/intervention",
        "purpose": "precedures",
        "relatedArtifact": {"class": "core", "valueType": "boolean", "valueRange": {"0": "absence", "1": "presence"}},
        "compose": {"include": [
            {"system": "cpt4", "concept": [
                {"code": "50360", "display": "renal allotransplantation"},
                {"code": "50365", "display": "renal allotransplantation with recipient nephrectomy"}
            ]}
        ]}
    },
    {
        "id": "CDE0000102",
        "name": "Dialysis",
        "description": "maintenance dialysis",
        "topic": "treatment/intervention",
        "purpose": "procedures",
        "compose": {"include": [
            {"system": "cpt4", "filter": [{"property": "codeList", "op": "exists", "value": ["90935", "90937"]}]},
            {"system": "icd10pcs", "filter": [{"property": "codeList", "op": "exists", "value": ["5A1D70Z"]}]}
        ]}
    },
    {
        "id": "CDE0000103",
        "name": "ACEi",
        "description": "ACE inhibitors",
        "topic": "treatment/intervention",
        "purpose": "drugs",
        "compose": {"include": [
            {"system": "rxnorm", "concept": [{"code": "29046"}, {"code": "3827"}]}
        ]}
    },
    {
        "id": "CDE0000104",
        "name": "CKD",
        "description": "chronic kidney disease",
        "topic": "diease/injury related events",
        "purpose": "comorbidities",
        "compose": {"include": [
            {"system": "icd9cm", "filter": [{"property": "codePrecision", "op": "descendent-of", "value": ["585"]}]},
            {"system": "icd10cm", "filter": [{"property": "codeRange", "op": "in", "value": ["N18-N19"]}]}
        ]}
    }
]"#;

fn document() -> ValueSetDocument {
    ValueSetDocument::from_json_str(KIDNEY).unwrap()
}

fn procedure_request() -> CompileRequest {
    CompileRequest::builder()
        .dialect("snow")
        .domain("px")
        .code_field("PX")
        .date_fields(["PX_DATE", "ADMIT_DATE"])
        .other_fields(["PATID"])
        .source_table("PROC")
        .build()
        .unwrap()
}

fn procedure_codes() -> StaticCodeTypes {
    StaticCodeTypes::new()
        .with(CodingSystem::Icd9Proc, "09")
        .with(CodingSystem::Icd10Pcs, "10")
        .with(CodingSystem::Cpt4, "CH")
        .with(CodingSystem::Hcpcs, "CH")
}

#[test]
fn test_single_entry_procedure_query() {
    let request = CompileRequest {
        sel_keys: vec!["KTx".to_string()],
        ..procedure_request()
    };
    let query = Compiler::new(request)
        .unwrap()
        .compile(&document(), &mut procedure_codes())
        .unwrap();

    assert_eq!(
        query.sql,
        "SELECT PATID,PX,coalesce(PX_DATE,ADMIT_DATE) as CD_DATE,'KTx' as CD_GRP from PROC where ( PX in ('50360','50365'))"
    );
    assert!(!query.sql.contains("UNION ALL"));
    assert!(query.diagnostics.is_empty());
}

#[test]
fn test_code_list_without_gate() {
    let compiler = Compiler::new(procedure_request()).unwrap();
    let predicates = compiler.predicates(&document(), &mut procedure_codes()).unwrap();

    let dialysis = predicates.get("Dialysis").unwrap();
    assert!(dialysis.contains("PX in ('90935','90937')"));
    assert!(!dialysis.contains("PX_TYPE"));
    assert_eq!(dialysis, "( PX in ('90935','90937')) OR ( PX in ('5A1D70Z'))");
}

#[test]
fn test_code_type_gate() {
    let request = CompileRequest::builder()
        .dialect("snow")
        .domain("px")
        .code_field("PX")
        .code_type_field("PX_TYPE")
        .date_fields(["PX_DATE"])
        .source_table("PROC")
        .build()
        .unwrap();
    let predicates = Compiler::new(request)
        .unwrap()
        .predicates(&document(), &mut procedure_codes())
        .unwrap();

    assert_eq!(
        predicates.get("KTx").unwrap(),
        "PX_TYPE = 'CH' AND PX in ('50360','50365')"
    );
}

#[test]
fn test_irrelevant_entries_are_omitted() {
    let request = CompileRequest::builder()
        .dialect("postgres")
        .domain("dx")
        .code_field("DX")
        .date_fields(["DX_DATE"])
        .source_table("DIAGNOSIS")
        .build()
        .unwrap();
    let predicates = Compiler::new(request)
        .unwrap()
        .predicates(&document(), &mut |_: CodingSystem| "X".to_string())
        .unwrap();

    assert_eq!(predicates.names().collect::<Vec<_>>(), vec!["CKD"]);
    assert!(!predicates.contains("ACEi"));
}

#[test]
fn test_sel_keys_filter_branches() {
    let compiler = Compiler::new(procedure_request()).unwrap();
    let all = compiler.compile(&document(), &mut procedure_codes()).unwrap();
    assert_eq!(all.branch_count(), 2);
    assert_eq!(all.predicates.names().collect::<Vec<_>>(), vec!["KTx", "Dialysis"]);
    let first = all.sql.find("'KTx'").unwrap();
    let second = all.sql.find("'Dialysis'").unwrap();
    assert!(first < second);

    let only = Compiler::new(CompileRequest {
        sel_keys: vec!["Dialysis".to_string()],
        ..procedure_request()
    })
    .unwrap()
    .compile(&document(), &mut procedure_codes())
    .unwrap();
    assert_eq!(only.branch_count(), 1);
    assert!(only.sql.contains("'Dialysis' as CD_GRP"));
    assert!(!only.sql.contains("'KTx'"));
}

#[test]
fn test_compile_is_deterministic() {
    let compiler = Compiler::new(CompileRequest {
        domain: None,
        ..procedure_request()
    })
    .unwrap();
    let mut answers = |system: CodingSystem| system.as_str().to_uppercase();

    let first = compiler.compile(&document(), &mut answers).unwrap();
    let second = compiler.compile(&document(), &mut answers).unwrap();
    assert_eq!(first.sql, second.sql);
    assert_eq!(first.branch_count(), 4);
}

#[rstest]
#[case("snow", "split_part(DX,'.',1) in ('585')")]
#[case("spark", "substring_index(DX,'.',1) in ('585')")]
#[case("sqlserver", "(select value from string_split(DX,'.',1) where ordinal = 1) in ('585')")]
#[case("oracle", "regexp_substr(DX,'[^.]+',1,1) in ('585')")]
fn test_category_match_per_dialect(#[case] dialect: &str, #[case] expected: &str) {
    let request = CompileRequest::builder()
        .dialect(dialect)
        .domain("dx")
        .code_field("DX")
        .date_fields(["DX_DATE"])
        .source_table("DIAGNOSIS")
        .build()
        .unwrap();
    let predicates = Compiler::new(request)
        .unwrap()
        .predicates(&document(), &mut |_: CodingSystem| "X".to_string())
        .unwrap();

    assert_eq!(
        predicates.get("CKD").unwrap(),
        format!("( {}) OR ( DX in ('N18','N19'))", expected)
    );
}

#[test]
fn test_empty_result_is_not_an_error() {
    let request = CompileRequest {
        sel_keys: vec!["ACEi".to_string()],
        ..procedure_request()
    };
    let query = Compiler::new(request)
        .unwrap()
        .compile(&document(), &mut procedure_codes())
        .unwrap();
    assert!(query.is_empty());
    assert_eq!(query.sql, "");
}

const RANGED: &str = r#"[
    {
        "id": "CDE0000105",
        "name": "Ranged",
        "compose": {"include": [
            {"system": "hcpcs", "filter": [{"property": "codeRange", "op": "in", "value": ["A01-A03"]}]}
        ]}
    }
]"#;

#[rstest]
#[case(RangePadding::Unpadded, " PX in ('A1','A2','A3')")]
#[case(RangePadding::PreserveWidth, " PX in ('A01','A02','A03')")]
fn test_range_padding_reaches_predicate(#[case] padding: RangePadding, #[case] expected: &str) {
    let request = CompileRequest {
        range_padding: padding,
        ..procedure_request()
    };
    let document = ValueSetDocument::from_json_str(RANGED).unwrap();
    let predicates = Compiler::new(request)
        .unwrap()
        .predicates(&document, &mut procedure_codes())
        .unwrap();

    assert_eq!(predicates.get("Ranged").unwrap(), expected);
}

#[test]
fn test_max_range_len_reaches_predicate() {
    let request = CompileRequest {
        max_range_len: 2,
        ..procedure_request()
    };
    let document = ValueSetDocument::from_json_str(RANGED).unwrap();
    let err = Compiler::new(request)
        .unwrap()
        .predicates(&document, &mut procedure_codes())
        .unwrap_err();

    assert_eq!(err.code(), VSQL0103);
    assert_eq!(err.entry(), Some("Ranged"));
}
