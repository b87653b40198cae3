//! Target machine and image format tags.

use std::fmt;

/// DWARF register number of `ebp` on x86.
pub const X86_EBP: u32 = 5;

/// DWARF register number of `rbp` on x86-64.
pub const X64_RBP: u32 = 6;

/// ARM `r7`, the Thumb frame pointer.
pub const ARM_R7: u32 = 7;

/// ARM `r11`, the ARM-state frame pointer.
pub const ARM_R11: u32 = 11;

/// Machine the image was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MachineType
{
    /// 32-bit x86
    X86,
    /// x86-64
    X64,
    /// 32-bit ARM (ARM or Thumb state)
    Arm32,
    /// Anything else
    #[default]
    Unknown,
}

impl MachineType
{
    /// Register that frame-relative locals and parameters are addressed from.
    ///
    /// ARM code uses `r7` in Thumb functions and `r11` otherwise; a function
    /// is Thumb when bit 0 of its start address is set. Returns `None` for
    /// [`MachineType::Unknown`].
    ///
    /// ```rust
    /// use stabsym_core::types::MachineType;
    /// use stabsym_core::types::machine::{ARM_R11, ARM_R7, X86_EBP};
    ///
    /// assert_eq!(MachineType::X86.frame_pointer_register(0x1000), Some(X86_EBP));
    /// assert_eq!(MachineType::Arm32.frame_pointer_register(0x8001), Some(ARM_R7));
    /// assert_eq!(MachineType::Arm32.frame_pointer_register(0x8000), Some(ARM_R11));
    /// ```
    #[must_use]
    pub const fn frame_pointer_register(self, function_start: u64) -> Option<u32>
    {
        match self {
            MachineType::X86 => Some(X86_EBP),
            MachineType::X64 => Some(X64_RBP),
            MachineType::Arm32 => {
                if function_start & 1 != 0 {
                    Some(ARM_R7)
                } else {
                    Some(ARM_R11)
                }
            }
            MachineType::Unknown => None,
        }
    }
}

impl fmt::Display for MachineType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            MachineType::X86 => "x86",
            MachineType::X64 => "x64",
            MachineType::Arm32 => "arm",
            MachineType::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Container format of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat
{
    /// PE32 / COFF
    Pe32,
    /// ELF (32-bit images carry STABS)
    Elf32,
    /// Anything else
    #[default]
    Unknown,
}

impl fmt::Display for ImageFormat
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            ImageFormat::Pe32 => "pe32",
            ImageFormat::Elf32 => "elf32",
            ImageFormat::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Map a STABS register number onto the general register numbering.
///
/// GCC emits DBX register numbers that coincide with the DWARF numbering
/// used throughout this crate.
#[must_use]
pub const fn stab_register_to_general(register: u32) -> u32
{
    register
}
