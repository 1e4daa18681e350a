//! Where operations come from.

use anyhow::Result;
use apifuzz_types::{ContractViolation, OperationView};

/// One operation of a loaded contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractEntry {
    Ready(OperationView),
    /// The entry could not be turned into an operation; only this operation
    /// is aborted.
    Malformed(ContractViolation),
}

impl ContractEntry {
    /// `METHOD /path` when known.
    pub fn operation_id(&self) -> String {
        match self {
            ContractEntry::Ready(view) => view.id(),
            ContractEntry::Malformed(violation) => violation.operation.clone(),
        }
    }
}

impl From<OperationView> for ContractEntry {
    fn from(view: OperationView) -> Self {
        ContractEntry::Ready(view)
    }
}

/// Supplies the operations to fuzz.
///
/// `load` fails only when the contract as a whole is unreadable; problems with
/// individual operations come back as [`ContractEntry::Malformed`].
pub trait ContractSource {
    fn load(&self) -> Result<Vec<ContractEntry>>;

    /// Field paths that act as polymorphic discriminators.
    fn discriminators(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// A contract already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticContract {
    pub entries: Vec<ContractEntry>,
    pub discriminators: Vec<String>,
}

impl ContractSource for StaticContract {
    fn load(&self) -> Result<Vec<ContractEntry>> {
        Ok(self.entries.clone())
    }

    fn discriminators(&self) -> Result<Vec<String>> {
        Ok(self.discriminators.clone())
    }
}
