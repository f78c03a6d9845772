//! evotrace-core: data model, error taxonomy and disassemblers.
//!
//! This crate defines the **stable boundary** shared by the evotrace crates:
//! - the trace data model (`TraceHeader`, `GenerationRecord`, `RecordLayout`, …),
//! - the typed stream error taxonomy (`TraceError`), and
//! - the two total decoders for evolved bytecode (packed nibble ISA and the
//!   printable character ISA).
//!
//! ```
//! use evotrace_core::{isa, Instruction};
//!
//! let ops = isa::disassemble_packed(&[0x08, 0x1F, 0x20, 0xFF]);
//! assert_eq!(
//!     ops,
//!     vec![
//!         Instruction::Push(-8),
//!         Instruction::ShiftPush(15),
//!         Instruction::Copy,
//!         Instruction::Nop,
//!     ]
//! );
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Typed stream-level errors (`TraceError`).
pub mod error;
/// Packed-byte and character-ISA decoders plus glyph rendering.
pub mod isa;
/// Canonical data model shared across the workspace.
pub mod types;

// ---- Re-exports for workspace convenience ----
pub use error::{RecordField, TraceError, TraceResult};
pub use isa::Instruction;
pub use types::*;

/// Commonly-used items for quick imports.
///
/// ```rust
/// use evotrace_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{TraceError, TraceResult};
    pub use crate::isa::{disassemble_packed, disassemble_text, Instruction};
    pub use crate::types::*;
}
