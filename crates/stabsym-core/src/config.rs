//! Options that control how a binary's symbols are loaded.

use crate::types::MachineType;

/// Options for [`load_symbols`](crate::loader::load_symbols) and
/// [`load_symbols_from_bytes`](crate::loader::load_symbols_from_bytes).
///
/// ```rust
/// use stabsym_core::config::LoadOptions;
/// use stabsym_core::types::MachineType;
///
/// let options = LoadOptions::default()
///     .with_expected_machine(MachineType::X86)
///     .with_native_enrichment(false);
/// assert_eq!(options.expected_machine, Some(MachineType::X86));
/// assert!(!options.enrich_from_native_symbols);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions
{
    /// Reject images built for any other machine
    pub expected_machine: Option<MachineType>,
    /// Merge the COFF/ELF symbol table after STABS parsing
    pub enrich_from_native_symbols: bool,
}

impl Default for LoadOptions
{
    fn default() -> Self
    {
        Self {
            expected_machine: None,
            enrich_from_native_symbols: true,
        }
    }
}

impl LoadOptions
{
    #[must_use]
    pub fn with_expected_machine(mut self, machine: MachineType) -> Self
    {
        self.expected_machine = Some(machine);
        self
    }

    #[must_use]
    pub fn with_native_enrichment(mut self, enabled: bool) -> Self
    {
        self.enrich_from_native_symbols = enabled;
        self
    }
}
