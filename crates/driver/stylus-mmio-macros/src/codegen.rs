//! Code generation for the `register_block!` macro.
//!
//! Every generated accessor routes through the block's `RegisterIo` backend,
//! which owns volatility and barrier ordering.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::parse::{AccessMode, RegisterBlock, RegisterDef};

/// Generates the complete output for a register block definition.
pub fn generate(block: &RegisterBlock) -> TokenStream {
    let vis = &block.vis;
    let name = &block.name;
    let attrs = &block.attrs;

    let methods: Vec<TokenStream> = block.registers.iter().map(generate_methods).collect();

    quote! {
        #(#attrs)*
        #vis struct #name<B: ::stylus_mmio::RegisterIo = ::stylus_mmio::Mmio> {
            io: B,
        }

        impl<B: ::stylus_mmio::RegisterIo> #name<B> {
            /// Wraps a register backend positioned at the block's base.
            #vis const fn new(io: B) -> Self {
                Self { io }
            }

            /// Returns the register backend.
            #[must_use]
            #vis fn io(&self) -> &B {
                &self.io
            }

            #(#methods)*
        }
    }
}

/// Generates accessor methods for a single register.
fn generate_methods(reg: &RegisterDef) -> TokenStream {
    let mut methods = TokenStream::new();

    if reg.access != AccessMode::WriteOnly {
        methods.extend(generate_read(reg));
    }
    if reg.access != AccessMode::ReadOnly {
        methods.extend(generate_write(reg));
    }

    methods
}

/// Generates the read accessor for a register.
fn generate_read(reg: &RegisterDef) -> TokenStream {
    let name = &reg.name;
    let offset = &reg.offset;
    let width_ty = width_type(reg);
    let read_fn = format_ident!("read_{}", reg.width.type_name());
    let attrs = &reg.attrs;

    if let Some(count) = &reg.count {
        let stride = reg.width.bytes();
        let panic_msg = format!("{name}: index out of range");
        return quote! {
            #(#attrs)*
            #[inline]
            pub fn #name(&self, index: usize) -> #width_ty {
                assert!(index < #count, #panic_msg);
                self.io.#read_fn(#offset + index * #stride)
            }
        };
    }

    if let Some(bf_type) = &reg.bitflags_type {
        quote! {
            #(#attrs)*
            #[inline]
            pub fn #name(&self) -> #bf_type {
                #bf_type::from_bits_retain(self.io.#read_fn(#offset))
            }
        }
    } else {
        quote! {
            #(#attrs)*
            #[inline]
            pub fn #name(&self) -> #width_ty {
                self.io.#read_fn(#offset)
            }
        }
    }
}

/// Generates the write accessor for a register.
fn generate_write(reg: &RegisterDef) -> TokenStream {
    let name = &reg.name;
    let setter_name = format_ident!("set_{}", name);
    let offset = &reg.offset;
    let width_ty = width_type(reg);
    let write_fn = format_ident!("write_{}", reg.width.type_name());

    let set_doc = format!("Writes the `{name}` register.");

    if let Some(count) = &reg.count {
        let stride = reg.width.bytes();
        let panic_msg = format!("{name}: index out of range");
        return quote! {
            #[doc = #set_doc]
            #[inline]
            pub fn #setter_name(&self, index: usize, value: #width_ty) {
                assert!(index < #count, #panic_msg);
                self.io.#write_fn(#offset + index * #stride, value);
            }
        };
    }

    if let Some(bf_type) = &reg.bitflags_type {
        quote! {
            #[doc = #set_doc]
            #[inline]
            pub fn #setter_name(&self, value: #bf_type) {
                self.io.#write_fn(#offset, value.bits());
            }
        }
    } else {
        quote! {
            #[doc = #set_doc]
            #[inline]
            pub fn #setter_name(&self, value: #width_ty) {
                self.io.#write_fn(#offset, value);
            }
        }
    }
}

/// Returns the token stream for the register's width type.
fn width_type(reg: &RegisterDef) -> TokenStream {
    let ident = format_ident!("{}", reg.width.type_name());
    quote! { #ident }
}
