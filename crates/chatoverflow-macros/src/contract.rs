//! `#[contract(kind, parent = Path, id = "...")]` on a trait.
//!
//! Generates:
//!
//! 1. the trait, with `Send + Sync + 'static` supertraits added
//! 2. `impl ContractMeta for dyn Trait`
//! 3. a `DECLARATIONS` entry producing the contract declaration

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Ident, ItemTrait, LitStr, Path, meta::ParseNestedMeta, parse_quote};

use crate::util::{declaration_static, id_or, private, reject_generics, static_ident};

#[derive(Default)]
pub struct ContractArgs {
    kind: Option<Ident>,
    parent: Option<Path>,
    id: Option<LitStr>,
}

impl ContractArgs {
    pub fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("input")
            || meta.path.is_ident("output")
            || meta.path.is_ident("requirement")
        {
            if self.kind.is_some() {
                return Err(meta.error("contract kind given more than once"));
            }
            self.kind = meta.path.get_ident().cloned();
            Ok(())
        } else if meta.path.is_ident("parent") {
            self.parent = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("id") {
            self.id = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unknown argument; expected input, output, requirement, parent, or id"))
        }
    }
}

pub fn expand(args: ContractArgs, mut item: ItemTrait) -> syn::Result<TokenStream> {
    reject_generics(&item.generics, "contract")?;

    let kind = args.kind.ok_or_else(|| {
        syn::Error::new(
            Span::call_site(),
            "#[contract] requires a kind: `input`, `output` or `requirement`",
        )
    })?;

    let private = private();
    let kind_variant = match kind.to_string().as_str() {
        "input" => quote!(#private::ContractKind::Input),
        "output" => quote!(#private::ContractKind::Output),
        _ => quote!(#private::ContractKind::Requirement),
    };

    let parent = match &args.parent {
        Some(path) => quote!(::core::option::Option::Some(
            <dyn #path as #private::ContractMeta>::ID
        )),
        None => quote!(::core::option::Option::None),
    };

    if item.colon_token.is_none() {
        item.colon_token = Some(Default::default());
    }
    item.supertraits.push(parse_quote!(::core::marker::Send));
    item.supertraits.push(parse_quote!(::core::marker::Sync));
    item.supertraits.push(parse_quote!('static));

    let ident = item.ident.clone();
    let id = id_or(args.id, &ident);
    let static_name = static_ident("CONTRACT", &[&ident]);

    let registration = declaration_static(
        &static_name,
        quote! {
            #private::Declaration::Contract(#private::ContractDeclaration {
                id: #private::ContractId::from_static(<dyn #ident as #private::ContractMeta>::ID),
                kind: <dyn #ident as #private::ContractMeta>::KIND,
                parent: <dyn #ident as #private::ContractMeta>::PARENT
                    .map(#private::ContractId::from_static),
            })
        },
    );

    Ok(quote! {
        #item

        impl #private::ContractMeta for dyn #ident {
            const ID: &'static str = #id;
            const KIND: #private::ContractKind = #kind_variant;
            const PARENT: ::core::option::Option<&'static str> = #parent;
        }

        #registration
    })
}
