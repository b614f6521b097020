//! Procedural macros for ChatOverflow plugins.
//!
//! This crate provides three declarative markers.  Each leaves the annotated
//! item in place, implements the matching metadata trait and appends a
//! declaration to the link-time `DECLARATIONS` slice, so that
//! `MetadataRegistry::register_declared()` picks it up at startup.
//!
//! - `#[contract(...)]` on a trait
//! - `#[implementation(...)]` on an `impl Contract for Type` block
//! - `#[connector(...)]` on a connector struct
//!
//! # Example
//!
//! ```rust,ignore
//! use chatoverflow::prelude::*;
//!
//! #[contract(input)]
//! pub trait Input {}
//!
//! #[contract(input, parent = Input)]
//! pub trait ChatInput {
//!     fn messages(&self) -> Vec<String>;
//! }
//!
//! #[connector(id = "TwitchConnector")]
//! pub struct TwitchConnector { /* ... */ }
//!
//! #[contract(requirement)]
//! pub trait ChatRequirement {}
//!
//! #[implementation(connector = TwitchConnector)]
//! impl ChatRequirement for TwitchChatRequirementImpl {}
//! ```
//!
//! Generated code refers to the `chatoverflow` facade crate, which must be a
//! dependency of the crate using the macros.

mod connector;
mod contract;
mod implementation;
mod util;

use proc_macro::TokenStream;
use syn::{ItemImpl, ItemStruct, ItemTrait, parse_macro_input};

/// Declares a trait as a contract.
///
/// # Arguments
///
/// | Argument | Required | Description |
/// |----------|----------|-------------|
/// | `input` / `output` / `requirement` | **Yes** | Contract kind |
/// | `parent = Path` | No | Parent contract trait |
/// | `id = "..."` | No | Identifier (default: trait name) |
///
/// `Send + Sync + 'static` are added as supertraits so the contract can be
/// used as `Arc<dyn Trait>`.
#[proc_macro_attribute]
pub fn contract(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = contract::ContractArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);
    let item = parse_macro_input!(item as ItemTrait);

    match contract::expand(args, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Declares a concrete implementation of a contract.
///
/// Apply it to the `impl Contract for Type` block.  `Type` must also
/// implement `Plugin`.
///
/// # Arguments
///
/// | Argument | Required | Description |
/// |----------|----------|-------------|
/// | `connector = Path` | For requirements | Connector struct declared with `#[connector]` |
/// | `id = "..."` | No | Identifier (default: type name) |
#[proc_macro_attribute]
pub fn implementation(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = implementation::ImplementationArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);
    let item = parse_macro_input!(item as ItemImpl);

    match implementation::expand(args, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Declares a connector type.
///
/// # Arguments
///
/// | Argument | Required | Description |
/// |----------|----------|-------------|
/// | `id = "..."` | No | Identifier (default: struct name) |
#[proc_macro_attribute]
pub fn connector(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut args = connector::ConnectorArgs::default();
    let parser = syn::meta::parser(|meta| args.parse(meta));
    parse_macro_input!(attr with parser);
    let item = parse_macro_input!(item as ItemStruct);

    match connector::expand(args, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
