//! `#[implementation(connector = Path, id = "...")]` on `impl Contract for Type`.
//!
//! Generates `impl ImplementationMeta for Type` and a `DECLARATIONS` entry
//! whose factory builds `Type` through `Plugin::create` and exposes it as
//! `Arc<dyn Contract>`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{ItemImpl, LitStr, Path, Type, meta::ParseNestedMeta};

use crate::util::{
    declaration_static, id_or, last_ident, private, reject_generics, static_ident,
};

#[derive(Default)]
pub struct ImplementationArgs {
    connector: Option<Path>,
    id: Option<LitStr>,
}

impl ImplementationArgs {
    pub fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("connector") {
            self.connector = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("id") {
            self.id = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unknown argument; expected connector or id"))
        }
    }
}

pub fn expand(args: ImplementationArgs, item: ItemImpl) -> syn::Result<TokenStream> {
    reject_generics(&item.generics, "implementation")?;

    let Some((None, contract, _)) = &item.trait_ else {
        return Err(syn::Error::new_spanned(
            &item.self_ty,
            "#[implementation] must be placed on an `impl Contract for Type` block",
        ));
    };

    let self_path = match item.self_ty.as_ref() {
        Type::Path(tp) if tp.qself.is_none() => &tp.path,
        other => {
            return Err(syn::Error::new_spanned(
                other,
                "#[implementation] requires a named type",
            ));
        }
    };
    let self_ident = last_ident(self_path)?;
    let contract_ident = last_ident(contract)?;
    let self_ty = &item.self_ty;

    let private = private();
    let id = id_or(args.id, self_ident);
    let connector = match &args.connector {
        Some(path) => quote!(::core::option::Option::Some(
            <#path as #private::ConnectorMeta>::ID
        )),
        None => quote!(::core::option::Option::None),
    };

    let static_name = static_ident("IMPL", &[self_ident, contract_ident]);
    let registration = declaration_static(
        &static_name,
        quote! {
            #private::Declaration::Implementation(#private::ImplementationDeclaration {
                id: #private::ImplementationId::from_static(
                    <#self_ty as #private::ImplementationMeta>::ID
                ),
                contract: #private::ContractId::from_static(
                    <#self_ty as #private::ImplementationMeta>::CONTRACT
                ),
                connector: <#self_ty as #private::ImplementationMeta>::CONNECTOR
                    .map(#private::ConnectorTypeId::from_static),
                factory: #private::plugin_factory!(#self_ty => dyn #contract),
            })
        },
    );

    Ok(quote! {
        #item

        impl #private::ImplementationMeta for #self_ty {
            const ID: &'static str = #id;
            const CONTRACT: &'static str = <dyn #contract as #private::ContractMeta>::ID;
            const CONNECTOR: ::core::option::Option<&'static str> = #connector;
        }

        #registration
    })
}
