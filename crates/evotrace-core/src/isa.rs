//! Decoders for the evolved-program instruction set.
//!
//! Two surface encodings of the same stack machine:
//!
//! | packed byte      | char        | instruction                      |
//! |------------------|-------------|----------------------------------|
//! | `0000 xxxx`      | `A`..=`P`   | `Push`, nibble sign-extended     |
//! | `0001 xxxx`      | `a`..=`p`   | `ShiftPush`                      |
//! | `0010 0000`      | `=`         | `Copy`                           |
//! | `0010 0001`      | `>`         | `Inc`                            |
//! | `0010 0010`      | `<`         | `Dec`                            |
//! | `0010 0011`      | `^`         | `Jnz`                            |
//! | anything else    | anything else | `Nop`                          |
//!
//! The packed `ShiftPush` immediate is unsigned `[0, 15]`, whereas the
//! character form sign-extends it exactly like `Push`. The two decoders keep
//! that difference; do not harmonize them.
//!
//! Decoding is total: every byte/char maps to exactly one [`Instruction`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// High-nibble class of `Push`.
pub const OP_PUSH: u8 = 0x00;
/// High-nibble class of `ShiftPush`.
pub const OP_SHIFT_PUSH: u8 = 0x10;
/// Exact byte for `Copy`.
pub const OP_COPY: u8 = 0x20;
/// Exact byte for `Inc`.
pub const OP_INC: u8 = 0x21;
/// Exact byte for `Dec`.
pub const OP_DEC: u8 = 0x22;
/// Exact byte for `Jnz`.
pub const OP_JNZ: u8 = 0x23;
/// Highest byte value that decodes to a real operation.
pub const MAX_OP: u8 = OP_JNZ;
/// Byte the runner fills fresh programs with; decodes to `Nop`.
pub const NOP_FILL: u8 = 0x3F;

const CLASS_MASK: u8 = 0xF0;
const NIBBLE_MASK: u8 = 0x0F;

/// One decoded instruction. Pure data: `Jnz` is represented, never taken.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "op", content = "imm", rename_all = "snake_case")]
pub enum Instruction {
    /// Push a sign-extended nibble, `[-8, 7]`.
    Push(i8),
    /// `top = (top << 4) + imm`. `[0, 15]` from packed bytes, `[-8, 7]` from text.
    ShiftPush(i8),
    /// Copy a program cell relative to the pc.
    Copy,
    /// Increment the top of stack.
    Inc,
    /// Decrement the top of stack.
    Dec,
    /// Relative jump if the top of stack is non-zero.
    Jnz,
    /// No operation (every unassigned code).
    Nop,
}

/// Sign-extend a 4-bit value (`0x8..=0xF` → `-8..=-1`).
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn sign_extend_nibble(nibble: u8) -> i8 {
    let n = (nibble & NIBBLE_MASK) as i8;
    if nibble & 0x08 == 0x08 {
        n - 16
    } else {
        n
    }
}

/// Decode one packed byte.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn decode_byte(op: u8) -> Instruction {
    match op & CLASS_MASK {
        OP_PUSH => Instruction::Push(sign_extend_nibble(op)),
        OP_SHIFT_PUSH => Instruction::ShiftPush((op & NIBBLE_MASK) as i8),
        _ => match op {
            OP_COPY => Instruction::Copy,
            OP_INC => Instruction::Inc,
            OP_DEC => Instruction::Dec,
            OP_JNZ => Instruction::Jnz,
            _ => Instruction::Nop,
        },
    }
}

/// Decode one character of the printable ISA.
#[inline]
#[must_use]
pub const fn decode_char(c: char) -> Instruction {
    match c {
        'A'..='P' => Instruction::Push(sign_extend_nibble(c as u8 - b'A')),
        'a'..='p' => Instruction::ShiftPush(sign_extend_nibble(c as u8 - b'a')),
        '=' => Instruction::Copy,
        '>' => Instruction::Inc,
        '<' => Instruction::Dec,
        '^' => Instruction::Jnz,
        _ => Instruction::Nop,
    }
}

/// Lazily decode a packed program.
pub fn decode_packed(program: &[u8]) -> impl Iterator<Item = Instruction> + '_ {
    program.iter().copied().map(decode_byte)
}

/// Decode a packed program, one instruction per byte.
#[must_use]
pub fn disassemble_packed(program: &[u8]) -> Vec<Instruction> {
    decode_packed(program).collect()
}

/// Decode a character-ISA program, one instruction per `char`.
#[must_use]
pub fn disassemble_text(text: &str) -> Vec<Instruction> {
    text.chars().map(decode_char).collect()
}

/// Render a packed program as character-ISA glyphs.
///
/// Note that a packed `ShiftPush(n)` with `n > 7` round-trips through text as
/// `ShiftPush(n - 16)`.
#[must_use]
pub fn render_glyphs(program: &[u8]) -> String {
    decode_packed(program).map(Instruction::glyph).collect()
}

impl Instruction {
    /// Canonical packed byte for this instruction (`Nop` → [`NOP_FILL`]).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Push(n) => OP_PUSH | (n as u8 & NIBBLE_MASK),
            Self::ShiftPush(n) => OP_SHIFT_PUSH | (n as u8 & NIBBLE_MASK),
            Self::Copy => OP_COPY,
            Self::Inc => OP_INC,
            Self::Dec => OP_DEC,
            Self::Jnz => OP_JNZ,
            Self::Nop => NOP_FILL,
        }
    }

    /// Single-character glyph in the printable ISA (`Nop` → `'.'`).
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn glyph(self) -> char {
        match self {
            Self::Push(n) => (b'A' + (n as u8 & NIBBLE_MASK)) as char,
            Self::ShiftPush(n) => (b'a' + (n as u8 & NIBBLE_MASK)) as char,
            Self::Copy => '=',
            Self::Inc => '>',
            Self::Dec => '<',
            Self::Jnz => '^',
            Self::Nop => '.',
        }
    }

    /// Upper-case mnemonic without the immediate.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Push(_) => "PUSH",
            Self::ShiftPush(_) => "SHIFT_PUSH",
            Self::Copy => "COPY",
            Self::Inc => "INC",
            Self::Dec => "DEC",
            Self::Jnz => "JNZ",
            Self::Nop => "NOP",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Push(n) | Self::ShiftPush(n) => write!(f, "{} {n}", self.mnemonic()),
            _ => f.write_str(self.mnemonic()),
        }
    }
}
