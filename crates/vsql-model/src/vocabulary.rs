//! Closed vocabularies used by value-set documents.
//!
//! Every enumerated label a document may carry (topic, purpose, artifact
//! class, value type, coding system, filter property and operator) is a
//! closed enum here. Labels are decoded at the document boundary, so an
//! unknown label fails the load instead of surfacing later as a missing key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use vsql_diagnostics::{Result, VsqlError, decode_error};

/// Declares a closed vocabulary whose serde form is its document label.
///
/// The first label of each variant is canonical; any further labels are
/// accepted aliases.
macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $what:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $label:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "&'static str")]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every member of the vocabulary, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical document label.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Looks up a label (canonical or alias).
            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label $(| $alias)* => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = VsqlError;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_label(s).ok_or_else(|| decode_error(format!("unknown {} '{}'", $what, s)))
            }
        }

        impl TryFrom<String> for $name {
            type Error = VsqlError;

            fn try_from(s: String) -> Result<Self> {
                s.parse()
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.as_str()
            }
        }
    };
}

vocabulary! {
    /// Top-level classification of a common data element.
    pub enum Topic as "topic" {
        ParticipantCharacteristics => "participant characteristics",
        ParticipantHistory => "participant history and family history",
        DiseaseEvents => "diease/injury related events" | "disease/injury related events",
        Assessment => "assessment and examinations",
        Treatment => "treatment/intervention",
        Outcomes => "outcomes and endpoints",
    }
}

vocabulary! {
    /// Second-level classification; every purpose belongs to exactly one [`Topic`].
    pub enum Purpose as "purpose" {
        Demographics => "demographics",
        SocialStatus => "social status",
        FamilyHistory => "family history",
        MedicalHistory => "medical history",
        DiagnosisCriteria => "symptom/sign and diagnosis criteria",
        Genetics => "genetics",
        Comorbidities => "comorbidities",
        LaboratoryTests => "laboratory tests and biospecimens/biomarkers",
        ImagingDiagnostics => "imaging diagnostics",
        NonImagingDiagnostics => "non-imaging diagnostics",
        PhysicalExamination => "physical/neurological examination",
        VitalSigns => "vital signs and other body measures",
        Drugs => "drugs",
        Devices => "devices",
        Procedures => "precedures" | "procedures",
        MuscleStrength => "muscle strength testing",
        Cognitive => "cognitive",
        FunctionalOutcomes => "functional outcomes",
        PulmonaryFunction => "pulmonary function testing/respiratory status",
        ReportedOutcomes => "subjective assessments/patient and caregiver reported outcomes",
        UpperMotorNeuron => "upper motor neuron signs/neuromuscular excitability",
        MaternalMorbidity => "severe maternal morbidity",
    }
}

impl Purpose {
    /// The topic this purpose is filed under.
    pub const fn topic(self) -> Topic {
        match self {
            Self::Demographics | Self::SocialStatus => Topic::ParticipantCharacteristics,
            Self::FamilyHistory | Self::MedicalHistory => Topic::ParticipantHistory,
            Self::DiagnosisCriteria | Self::Genetics | Self::Comorbidities => Topic::DiseaseEvents,
            Self::LaboratoryTests
            | Self::ImagingDiagnostics
            | Self::NonImagingDiagnostics
            | Self::PhysicalExamination
            | Self::VitalSigns => Topic::Assessment,
            Self::Drugs | Self::Devices | Self::Procedures => Topic::Treatment,
            Self::MuscleStrength
            | Self::Cognitive
            | Self::FunctionalOutcomes
            | Self::PulmonaryFunction
            | Self::ReportedOutcomes
            | Self::UpperMotorNeuron
            | Self::MaternalMorbidity => Topic::Outcomes,
        }
    }
}

vocabulary! {
    /// Recommendation level of a value set.
    pub enum ArtifactClass as "artifact class" {
        Core => "core",
        Recommended => "recommended",
        Supplemental => "supplemental",
        Exploratory => "exploratory",
    }
}

vocabulary! {
    /// Measurement scale of the element's value.
    pub enum ValueType as "value type" {
        Nominal => "nominal",
        Ordinal => "ordinal",
        Discrete => "discrete",
        Continuous => "continuous",
        Boolean => "boolean",
    }
}

vocabulary! {
    /// Clinical terminology an include block draws its codes from.
    pub enum CodingSystem as "coding system" {
        Loinc => "loinc",
        Icd9Cm => "icd9cm",
        Icd9Proc => "icd9proc",
        Icd10Cm => "icd10cm",
        Icd10Pcs => "icd10pcs",
        SnomedCt => "snomedct" | "snomed",
        Cpt4 => "cpt4" | "cpt",
        /// HCPCS level II.
        Hcpcs => "hpc",
        Ndc => "ndc",
        Atc => "atc",
        RxNorm => "rxnorm",
        NdfRt => "ndfrt",
        Cvx => "cvx",
        Drg => "drg",
        NpiTaxonomy => "npiTaxonomy",
        CmsSpecialty => "cmsSpecialty",
        CmsTaxonomy => "cmsTaxonomy",
        Pcornet => "pcornet",
        Other => "other",
    }
}

impl CodingSystem {
    /// ICD diagnosis systems store codes with a dot after the category.
    pub const fn is_dotted_diagnosis(self) -> bool {
        matches!(self, Self::Icd9Cm | Self::Icd10Cm)
    }
}

vocabulary! {
    /// Property a filter constrains.
    pub enum FilterProperty as "filter property" {
        CodePrecision => "codePrecision",
        CodeRange => "codeRange",
        CodeList => "codeList",
        TextRegex => "textRegex",
    }
}

vocabulary! {
    /// Operator applied by a filter.
    pub enum FilterOperator as "filter operator" {
        Equals => "=",
        IsA => "is-a",
        DescendentOf => "descendent-of",
        IsNotA => "is-not-a",
        Regex => "regex",
        In => "in",
        NotIn => "not-in",
        Generalizes => "generalizes",
        ChildOf => "child-of",
        DescendentLeaf => "descendent-leaf",
        Exists => "exists",
    }
}

/// Clinical data category used to narrow the relevant coding systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Domain {
    /// Diagnoses (`dx`)
    Diagnosis,
    /// Procedures (`px`)
    Procedure,
    /// Laboratory results (`lab`)
    Lab,
    /// Medications (`rx`)
    Medication,
}

impl Domain {
    pub const ALL: &'static [Self] = &[Self::Diagnosis, Self::Procedure, Self::Lab, Self::Medication];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diagnosis => "dx",
            Self::Procedure => "px",
            Self::Lab => "lab",
            Self::Medication => "rx",
        }
    }

    /// Parses a domain scope where the empty string means "every domain".
    pub fn parse_scope(s: &str) -> Result<Option<Self>> {
        let s = s.trim();
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = VsqlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dx" => Ok(Self::Diagnosis),
            "px" => Ok(Self::Procedure),
            "lab" => Ok(Self::Lab),
            "rx" => Ok(Self::Medication),
            other => Err(VsqlError::unknown_domain(other)),
        }
    }
}

impl TryFrom<String> for Domain {
    type Error = VsqlError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Domain> for &'static str {
    fn from(value: Domain) -> Self {
        value.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsql_diagnostics::{VSQL0002, VSQL0100};

    #[test]
    fn test_aliases_resolve_to_canonical() {
        assert_eq!("cpt".parse::<CodingSystem>().unwrap(), CodingSystem::Cpt4);
        assert_eq!("snomed".parse::<CodingSystem>().unwrap(), CodingSystem::SnomedCt);
        assert_eq!(CodingSystem::Cpt4.as_str(), "cpt4");
        assert_eq!(Purpose::from_label("procedures"), Some(Purpose::Procedures));
    }

    #[test]
    fn test_unknown_label_is_decode_error() {
        let err = "icd11".parse::<CodingSystem>().unwrap_err();
        assert_eq!(err.code(), VSQL0002);
        assert!(err.to_string().contains("coding system 'icd11'"));
    }

    #[test]
    fn test_every_purpose_has_a_topic() {
        for purpose in Purpose::ALL {
            assert!(Topic::ALL.contains(&purpose.topic()));
        }
        assert_eq!(Purpose::VitalSigns.topic(), Topic::Assessment);
        assert_eq!(Purpose::Procedures.topic(), Topic::Treatment);
    }

    #[test]
    fn test_domain_scope() {
        assert_eq!(Domain::parse_scope("").unwrap(), None);
        assert_eq!(Domain::parse_scope("px").unwrap(), Some(Domain::Procedure));
        assert_eq!(Domain::parse_scope("vitals").unwrap_err().code(), VSQL0100);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&FilterOperator::DescendentOf).unwrap();
        assert_eq!(json, "\"descendent-of\"");
        let op: FilterOperator = serde_json::from_str("\"exists\"").unwrap();
        assert_eq!(op, FilterOperator::Exists);
        assert!(serde_json::from_str::<FilterOperator>("\"contains\"").is_err());
    }
}
