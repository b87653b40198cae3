//! Container parsing and section extraction.
//!
//! PE and ELF images are opened with the `object` crate; only `.stab`,
//! `.stabstr` and a few header fields are needed from them.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use object::{Object, ObjectSection};
use tracing::{debug, info};

use crate::config::LoadOptions;
use crate::database::SymbolDatabase;
use crate::error::{Result, StabResult, SymbolError};
use crate::native::enrich_from_object;
use crate::stabs::{parse_stabs, StabStats};
use crate::types::{ImageFormat, MachineType};

const STAB_SECTION: &str = ".stab";
const STAB_STRING_SECTION: &str = ".stabstr";

/// Raw STABS buffers plus the image metadata the parser needs.
#[derive(Debug, Clone, Default)]
pub struct StabSections
{
    /// Contents of `.stab`
    pub stabs: Vec<u8>,
    /// Contents of `.stabstr`
    pub strings: Vec<u8>,
    /// Machine the image was built for
    pub machine: MachineType,
    /// Container format of the image
    pub format: ImageFormat,
    /// Preferred load address
    pub image_base: u64,
    /// Byte order of the records
    pub big_endian: bool,
}

impl StabSections
{
    /// Copy the STABS sections out of a parsed image.
    ///
    /// ## Errors
    ///
    /// [`SymbolError::MissingSection`] when either section is absent or empty,
    /// [`SymbolError::InvalidImage`] when a section cannot be read.
    pub fn from_object(file: &object::File<'_>) -> Result<Self>
    {
        let machine = match file.architecture() {
            object::Architecture::I386 => MachineType::X86,
            object::Architecture::X86_64 => MachineType::X64,
            object::Architecture::Arm => MachineType::Arm32,
            _ => MachineType::Unknown,
        };

        let format = match file.format() {
            object::BinaryFormat::Pe => ImageFormat::Pe32,
            object::BinaryFormat::Elf => ImageFormat::Elf32,
            _ => ImageFormat::Unknown,
        };

        Ok(Self {
            stabs: load_section_bytes(file, STAB_SECTION)?,
            strings: load_section_bytes(file, STAB_STRING_SECTION)?,
            machine,
            format,
            image_base: file.relative_address_base(),
            big_endian: !file.is_little_endian(),
        })
    }
}

fn load_section_bytes(file: &object::File<'_>, name: &'static str) -> Result<Vec<u8>>
{
    let section = file.section_by_name(name).ok_or(SymbolError::MissingSection(name))?;
    let data = section
        .uncompressed_data()
        .map_err(|err| SymbolError::InvalidImage(format!("failed to read {name}: {err}")))?;

    if data.is_empty() {
        return Err(SymbolError::MissingSection(name));
    }

    Ok(match data {
        Cow::Borrowed(bytes) => bytes.to_vec(),
        Cow::Owned(vec) => vec,
    })
}

impl SymbolDatabase
{
    /// Build a database from sections that are already in memory.
    ///
    /// ## Errors
    ///
    /// Fails only on allocation failure; the partial database is dropped.
    pub fn from_stabs(filename: impl Into<String>, sections: &StabSections) -> StabResult<(Self, StabStats)>
    {
        let mut db = Self::new(filename, sections.machine, sections.format, sections.image_base);
        let stats = parse_stabs(&mut db, &sections.stabs, &sections.strings, sections.big_endian)?;
        Ok((db, stats))
    }
}

/// Load the STABS symbols of the binary at `path`.
///
/// ## Errors
///
/// See [`load_symbols_from_bytes`]; also [`SymbolError::Io`] when the file
/// cannot be read.
pub fn load_symbols(path: impl AsRef<Path>, options: &LoadOptions) -> Result<SymbolDatabase>
{
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    load_symbols_from_bytes(&path.display().to_string(), &bytes, options)
}

/// Load STABS symbols from an image held in memory.
///
/// ## Errors
///
/// - [`SymbolError::InvalidArgument`] if `options.expected_machine` is [`MachineType::Unknown`]
/// - [`SymbolError::InvalidImage`] if `bytes` is not a PE or ELF image
/// - [`SymbolError::MissingSection`] if `.stab` or `.stabstr` is missing or empty
/// - [`SymbolError::MachineMismatch`] if `options.expected_machine` does not match
/// - [`SymbolError::Stab`] if parsing ran out of memory
pub fn load_symbols_from_bytes(filename: &str, bytes: &[u8], options: &LoadOptions) -> Result<SymbolDatabase>
{
    if options.expected_machine == Some(MachineType::Unknown) {
        return Err(SymbolError::InvalidArgument("expected machine must be a known machine".to_string()));
    }

    let file = object::File::parse(bytes)
        .map_err(|err| SymbolError::InvalidImage(format!("failed to parse {filename}: {err}")))?;

    let sections = StabSections::from_object(&file)?;
    if let Some(expected) = options.expected_machine {
        if expected != sections.machine {
            return Err(SymbolError::MachineMismatch {
                expected,
                actual: sections.machine,
            });
        }
    }

    debug!(
        file = filename,
        machine = %sections.machine,
        format = %sections.format,
        stab_bytes = sections.stabs.len(),
        string_bytes = sections.strings.len(),
        "Loading STABS"
    );

    let (mut db, _stats) = SymbolDatabase::from_stabs(filename, &sections)?;
    if options.enrich_from_native_symbols {
        let changed = enrich_from_object(&mut db, &file);
        info!(file = filename, changed, "Merged native symbols");
    }

    Ok(db)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_rejects_non_image()
    {
        let result = load_symbols_from_bytes("junk", b"definitely not an image", &LoadOptions::default());
        assert!(matches!(result, Err(SymbolError::InvalidImage(_))));
    }

    #[test]
    fn test_missing_file()
    {
        let result = load_symbols("/nonexistent/stabsym/binary", &LoadOptions::default());
        assert!(matches!(result, Err(SymbolError::Io(_))));
    }
}
