//! Proc-macro crate for the `register_block!` MMIO register DSL.
//!
//! Generates typed register accessors from a declarative definition. The
//! generated struct is generic over a `stylus_mmio::RegisterIo` backend, so
//! the same block drives real hardware through `stylus_mmio::Mmio` and a
//! device model in host tests.

mod codegen;
mod parse;

use proc_macro::TokenStream;
use syn::parse_macro_input;

use crate::parse::RegisterBlock;

/// Generates a typed register block struct with safe accessors.
///
/// # Syntax
///
/// ```ignore
/// register_block! {
///     /// Doc comment for the struct.
///     pub StructName {
///         /// Doc comment for the register.
///         [offset; width; access_mode] name => OptionalBitflagsType,
///         /// A run of equally sized registers.
///         [offset; width; access_mode; count] array_name,
///     }
/// }
/// ```
///
/// - `offset` -- byte offset from base (integer literal, e.g. `0x70`)
/// - `width` -- `u8`, `u16`, or `u32`
/// - `access_mode` -- `ro` (read-only), `wo` (write-only), `rw` (read-write)
/// - `count` -- optional element count; turns the register into an indexed array
/// - `=> Type` -- optional bitflags type (must have `from_bits_retain`/`.bits()`)
///
/// # Generated Code
///
/// `struct StructName<B: RegisterIo = Mmio>` with `new(io)` and, per register:
/// - `ro`/`rw`: `fn name(&self) -> Type` (`fn name(&self, index: usize)` for arrays)
/// - `wo`/`rw`: `fn set_name(&self, value: Type)` (`index` first for arrays)
#[proc_macro]
pub fn register_block(input: TokenStream) -> TokenStream {
    let block = parse_macro_input!(input as RegisterBlock);
    codegen::generate(&block).into()
}
