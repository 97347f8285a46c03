//! Parser for the `register_block!` input.
//!
//! ```text
//! block    := attrs vis Name '{' (register ','?)* '}'
//! register := attrs '[' offset ';' width ';' access (';' count)? ']' name ('=>' Flags)?
//! ```

use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Ident, LitInt, Token, Visibility, braced, bracketed};

/// A parsed `register_block!` invocation.
pub struct RegisterBlock {
    /// Outer attributes (docs) for the generated struct.
    pub attrs: Vec<Attribute>,
    /// Visibility of the generated struct.
    pub vis: Visibility,
    /// Name of the generated struct.
    pub name: Ident,
    /// Registers in declaration order.
    pub registers: Vec<RegisterDef>,
}

/// Which accessors a register gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Getter only.
    ReadOnly,
    /// Setter only.
    WriteOnly,
    /// Getter and setter.
    ReadWrite,
}

/// Access width of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegWidth {
    /// One byte.
    U8,
    /// Two bytes.
    U16,
    /// Four bytes.
    U32,
}

impl RegWidth {
    /// Returns the primitive type name (`u8`, `u16` or `u32`).
    pub fn type_name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
        }
    }

    /// Returns the width in bytes, used as the stride of register arrays.
    pub fn bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

impl Parse for RegWidth {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ident: Ident = input.parse()?;
        [Self::U8, Self::U16, Self::U32]
            .into_iter()
            .find(|w| ident == w.type_name())
            .ok_or_else(|| syn::Error::new(ident.span(), "register width must be u8, u16 or u32"))
    }
}

impl Parse for AccessMode {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ident: Ident = input.parse()?;
        match ident.to_string().as_str() {
            "ro" => Ok(Self::ReadOnly),
            "wo" => Ok(Self::WriteOnly),
            "rw" => Ok(Self::ReadWrite),
            _ => Err(syn::Error::new(ident.span(), "access must be ro, wo or rw")),
        }
    }
}

/// One register line.
pub struct RegisterDef {
    /// Outer attributes (docs) copied onto the getter.
    pub attrs: Vec<Attribute>,
    /// Byte offset from the block base.
    pub offset: LitInt,
    /// Access width.
    pub width: RegWidth,
    /// Generated accessors.
    pub access: AccessMode,
    /// Element count of an indexed register array.
    pub count: Option<LitInt>,
    /// Accessor base name.
    pub name: Ident,
    /// Bitflags type the value is wrapped in.
    pub bitflags_type: Option<Ident>,
}

impl Parse for RegisterDef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;

        let layout;
        bracketed!(layout in input);
        let offset: LitInt = layout.parse()?;
        layout.parse::<Token![;]>()?;
        let width: RegWidth = layout.parse()?;
        layout.parse::<Token![;]>()?;
        let access: AccessMode = layout.parse()?;
        let count = parse_count(&layout)?;

        let name: Ident = input.parse()?;
        let bitflags_type = match input.parse::<Option<Token![=>]>>()? {
            Some(_) => Some(input.parse::<Ident>()?),
            None => None,
        };
        if let (Some(count), Some(_)) = (&count, &bitflags_type) {
            return Err(syn::Error::new(
                count.span(),
                "a register array cannot be wrapped in a bitflags type",
            ));
        }
        input.parse::<Option<Token![,]>>()?;

        Ok(Self {
            attrs,
            offset,
            width,
            access,
            count,
            name,
            bitflags_type,
        })
    }
}

/// Parses the optional `; count` suffix of a register layout.
fn parse_count(layout: ParseStream) -> syn::Result<Option<LitInt>> {
    if layout.parse::<Option<Token![;]>>()?.is_none() {
        return Ok(None);
    }
    let count: LitInt = layout.parse()?;
    if count.base10_parse::<usize>()? == 0 {
        return Err(syn::Error::new(count.span(), "register array needs at least one element"));
    }
    Ok(Some(count))
}

impl Parse for RegisterBlock {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        let name: Ident = input.parse()?;

        let body;
        braced!(body in input);
        let mut registers = Vec::new();
        while !body.is_empty() {
            registers.push(body.parse()?);
        }

        Ok(Self {
            attrs,
            vis,
            name,
            registers,
        })
    }
}
