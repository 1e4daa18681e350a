//! Fuzzer registry and selection.

use std::collections::BTreeMap;

use crate::catalog::{
    FieldFuzzer, HeaderFuzzer, IterateThroughEnumValuesFieldsFuzzer,
    LeadingControlCharsInHeadersFuzzer, OnlyControlCharsInFieldsTrimValidateFuzzer,
    OnlyWhitespacesInFieldsTrimValidateFuzzer, OnlyWhitespacesInHeadersFuzzer, OperationFuzzer,
    OverflowArraySizeFieldsFuzzer, RemoveHeadersFuzzer, RemoveRequiredFieldsFuzzer,
    TrailingControlCharsInHeadersFuzzer,
};
use crate::error::FuzzError;
use crate::security_headers::CheckSecurityHeadersFuzzer;

/// A registered policy, tagged by what it iterates over.
pub enum Fuzzer {
    Field(Box<dyn FieldFuzzer>),
    Header(Box<dyn HeaderFuzzer>),
    Operation(Box<dyn OperationFuzzer>),
}

impl Fuzzer {
    pub fn name(&self) -> &'static str {
        match self {
            Fuzzer::Field(f) => f.name(),
            Fuzzer::Header(f) => f.name(),
            Fuzzer::Operation(f) => f.name(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Fuzzer::Field(f) => f.description(),
            Fuzzer::Header(f) => f.description(),
            Fuzzer::Operation(f) => f.description(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Fuzzer::Field(_) => "field",
            Fuzzer::Header(_) => "header",
            Fuzzer::Operation(_) => "operation",
        }
    }
}

impl std::fmt::Debug for Fuzzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fuzzer")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .finish()
    }
}

fn builtin() -> Vec<Fuzzer> {
    vec![
        Fuzzer::Field(Box::new(OverflowArraySizeFieldsFuzzer)),
        Fuzzer::Field(Box::new(IterateThroughEnumValuesFieldsFuzzer)),
        Fuzzer::Field(Box::new(OnlyWhitespacesInFieldsTrimValidateFuzzer)),
        Fuzzer::Field(Box::new(OnlyControlCharsInFieldsTrimValidateFuzzer)),
        Fuzzer::Field(Box::new(RemoveRequiredFieldsFuzzer)),
        Fuzzer::Header(Box::new(OnlyWhitespacesInHeadersFuzzer)),
        Fuzzer::Header(Box::new(TrailingControlCharsInHeadersFuzzer)),
        Fuzzer::Header(Box::new(LeadingControlCharsInHeadersFuzzer)),
        Fuzzer::Header(Box::new(RemoveHeadersFuzzer)),
        Fuzzer::Operation(Box::new(CheckSecurityHeadersFuzzer)),
    ]
}

/// Which fuzzers to run. Empty `only` means all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzerSelection {
    pub only: Vec<String>,
    pub skip: Vec<String>,
}

/// The fuzzers of a run, keyed and iterated by name.
#[derive(Debug)]
pub struct FuzzerRegistry {
    fuzzers: BTreeMap<&'static str, Fuzzer>,
}

impl FuzzerRegistry {
    /// Every built-in fuzzer.
    pub fn all() -> Self {
        Self {
            fuzzers: builtin().into_iter().map(|f| (f.name(), f)).collect(),
        }
    }

    /// Built-in fuzzers narrowed by `selection`; unknown names are rejected.
    pub fn from_selection(selection: &FuzzerSelection) -> Result<Self, FuzzError> {
        let mut registry = Self::all();
        for name in selection.only.iter().chain(&selection.skip) {
            if !registry.fuzzers.contains_key(name.as_str()) {
                return Err(FuzzError::UnknownFuzzer { name: name.clone() });
            }
        }

        if !selection.only.is_empty() {
            registry
                .fuzzers
                .retain(|name, _| selection.only.iter().any(|o| o.as_str() == *name));
        }
        registry
            .fuzzers
            .retain(|name, _| !selection.skip.iter().any(|s| s.as_str() == *name));
        Ok(registry)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fuzzer> {
        self.fuzzers.values()
    }

    pub fn get(&self, name: &str) -> Option<&Fuzzer> {
        self.fuzzers.get(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.fuzzers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.fuzzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fuzzers.is_empty()
    }
}
