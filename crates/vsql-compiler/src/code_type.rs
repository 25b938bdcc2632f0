//! Code-type resolution
//!
//! Sites store codes from several coding systems in one column and tell them
//! apart with a site-specific token (e.g. `PX_TYPE = 'CH'` for CPT). The
//! compiler asks a [`CodeTypeResolver`] for that token once per coding system
//! relevant to the requested domain.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use vsql_diagnostics::{Result, VSQL0200, VSQL0201, VsqlError};
use vsql_model::{CodingSystem, Domain};

const DIAGNOSIS_SYSTEMS: &[CodingSystem] = &[
    CodingSystem::Icd9Cm,
    CodingSystem::Icd10Cm,
    CodingSystem::SnomedCt,
    CodingSystem::Drg,
];
const PROCEDURE_SYSTEMS: &[CodingSystem] = &[
    CodingSystem::Icd9Proc,
    CodingSystem::Icd10Pcs,
    CodingSystem::Cpt4,
    CodingSystem::Hcpcs,
];
const LAB_SYSTEMS: &[CodingSystem] = &[CodingSystem::Loinc];
const MEDICATION_SYSTEMS: &[CodingSystem] = &[CodingSystem::RxNorm, CodingSystem::Ndc];

/// Coding systems relevant to a domain; `None` means every domain.
///
/// The unscoped list is sorted by label.
pub fn domain_systems(domain: Option<Domain>) -> Vec<CodingSystem> {
    match domain {
        Some(Domain::Diagnosis) => DIAGNOSIS_SYSTEMS.to_vec(),
        Some(Domain::Procedure) => PROCEDURE_SYSTEMS.to_vec(),
        Some(Domain::Lab) => LAB_SYSTEMS.to_vec(),
        Some(Domain::Medication) => MEDICATION_SYSTEMS.to_vec(),
        None => {
            let mut all: Vec<CodingSystem> = Domain::ALL
                .iter()
                .flat_map(|d| domain_systems(Some(*d)))
                .collect();
            all.sort_by_key(|s| s.as_str());
            all.dedup();
            all
        }
    }
}

/// Supplies the site-specific code-type token for a coding system
pub trait CodeTypeResolver {
    fn resolve(&mut self, system: CodingSystem) -> Result<String>;
}

impl<F> CodeTypeResolver for F
where
    F: FnMut(CodingSystem) -> String,
{
    fn resolve(&mut self, system: CodingSystem) -> Result<String> {
        Ok(self(system))
    }
}

/// Fixed system-to-token table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCodeTypes {
    tokens: IndexMap<CodingSystem, String>,
}

impl StaticCodeTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, system: CodingSystem, token: impl Into<String>) -> Self {
        self.insert(system, token);
        self
    }

    pub fn insert(&mut self, system: CodingSystem, token: impl Into<String>) {
        self.tokens.insert(system, token.into());
    }

    pub fn get(&self, system: CodingSystem) -> Option<&str> {
        self.tokens.get(&system).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Falls back to `secondary` for systems missing from this table.
    pub fn or_else<R: CodeTypeResolver>(self, secondary: R) -> FallbackResolver<Self, R> {
        FallbackResolver::new(self, secondary)
    }
}

impl CodeTypeResolver for StaticCodeTypes {
    fn resolve(&mut self, system: CodingSystem) -> Result<String> {
        self.get(system).map(str::to_string).ok_or_else(|| {
            VsqlError::resolution(
                VSQL0201,
                system.as_str(),
                format!("no code-type token configured for '{}'", system),
            )
        })
    }
}

impl FromIterator<(CodingSystem, String)> for StaticCodeTypes {
    fn from_iter<I: IntoIterator<Item = (CodingSystem, String)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

/// Asks `primary` first and `secondary` when `primary` has no answer
#[derive(Debug, Clone)]
pub struct FallbackResolver<P, S> {
    primary: P,
    secondary: S,
}

impl<P, S> FallbackResolver<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: CodeTypeResolver, S: CodeTypeResolver> CodeTypeResolver for FallbackResolver<P, S> {
    fn resolve(&mut self, system: CodingSystem) -> Result<String> {
        match self.primary.resolve(system) {
            Err(e) if e.code() == VSQL0201 => self.secondary.resolve(system),
            other => other,
        }
    }
}

/// Resolved tokens for the systems relevant to one compile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CodeTypeMap {
    tokens: IndexMap<CodingSystem, String>,
}

impl CodeTypeMap {
    pub fn get(&self, system: CodingSystem) -> Option<&str> {
        self.tokens.get(&system).map(String::as_str)
    }

    pub fn contains(&self, system: CodingSystem) -> bool {
        self.tokens.contains_key(&system)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CodingSystem, &str)> + '_ {
        self.tokens.iter().map(|(s, t)| (*s, t.as_str()))
    }
}

impl FromIterator<(CodingSystem, String)> for CodeTypeMap {
    fn from_iter<I: IntoIterator<Item = (CodingSystem, String)>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

/// Builds the code-type map for a domain, asking the resolver once per system.
pub fn resolve_code_types<R>(domain: Option<Domain>, resolver: &mut R) -> Result<CodeTypeMap>
where
    R: CodeTypeResolver + ?Sized,
{
    let mut map = CodeTypeMap::default();
    for system in domain_systems(domain) {
        let token = resolver.resolve(system)?;
        if token.contains('\n') {
            return Err(VsqlError::resolution(
                VSQL0200,
                system.as_str(),
                format!("code-type token for '{}' spans multiple lines", system),
            ));
        }
        debug!("Code type for {}: '{}'", system, token);
        map.tokens.insert(system, token);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Domain::Diagnosis, &["icd9cm", "icd10cm", "snomedct", "drg"])]
    #[case(Domain::Procedure, &["icd9proc", "icd10pcs", "cpt4", "hpc"])]
    #[case(Domain::Lab, &["loinc"])]
    #[case(Domain::Medication, &["rxnorm", "ndc"])]
    fn test_domain_table(#[case] domain: Domain, #[case] expected: &[&str]) {
        let labels: Vec<&str> = domain_systems(Some(domain)).iter().map(|s| s.as_str()).collect();
        assert_eq!(labels, expected);
    }

    #[test]
    fn test_unscoped_is_sorted_union() {
        let labels: Vec<&str> = domain_systems(None).iter().map(|s| s.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "cpt4", "drg", "hpc", "icd10cm", "icd10pcs", "icd9cm", "icd9proc", "loinc", "ndc",
                "rxnorm", "snomedct"
            ]
        );
    }

    #[test]
    fn test_closure_resolver_called_once_per_system() {
        let mut asked = Vec::new();
        let mut resolver = |system: CodingSystem| {
            asked.push(system);
            system.as_str().to_uppercase()
        };
        let map = resolve_code_types(Some(Domain::Medication), &mut resolver).unwrap();

        assert_eq!(asked, vec![CodingSystem::RxNorm, CodingSystem::Ndc]);
        assert_eq!(map.get(CodingSystem::Ndc), Some("NDC"));
        assert!(!map.contains(CodingSystem::Loinc));
    }

    #[test]
    fn test_static_table_missing_system() {
        let mut table = StaticCodeTypes::new().with(CodingSystem::Loinc, "LC");
        assert_eq!(resolve_code_types(Some(Domain::Lab), &mut table).unwrap().len(), 1);

        let err = resolve_code_types(Some(Domain::Medication), &mut table).unwrap_err();
        assert_eq!(err.code(), VSQL0201);
    }

    #[test]
    fn test_fallback_fills_gaps() {
        let table = StaticCodeTypes::new().with(CodingSystem::Cpt4, "CH");
        let mut resolver = table.or_else(|_: CodingSystem| "09".to_string());
        let map = resolve_code_types(Some(Domain::Procedure), &mut resolver).unwrap();

        assert_eq!(map.get(CodingSystem::Cpt4), Some("CH"));
        assert_eq!(map.get(CodingSystem::Icd9Proc), Some("09"));
    }

    #[test]
    fn test_multiline_token_rejected() {
        let mut resolver = |_: CodingSystem| "CH\nDROP".to_string();
        let err = resolve_code_types(Some(Domain::Lab), &mut resolver).unwrap_err();
        assert_eq!(err.code(), VSQL0200);
    }

    #[test]
    fn test_static_table_from_json() {
        let table: StaticCodeTypes = serde_json::from_str(r#"{"cpt": "CH", "icd10pcs": "10"}"#).unwrap();
        assert_eq!(table.get(CodingSystem::Cpt4), Some("CH"));
        assert_eq!(table.get(CodingSystem::Icd10Pcs), Some("10"));
    }
}
