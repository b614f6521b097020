//! `#[connector(id = "...")]` on a connector struct.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{ItemStruct, LitStr, meta::ParseNestedMeta};

use crate::util::{declaration_static, id_or, private, reject_generics, static_ident};

#[derive(Default)]
pub struct ConnectorArgs {
    id: Option<LitStr>,
}

impl ConnectorArgs {
    pub fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("id") {
            self.id = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unknown argument; expected id"))
        }
    }
}

pub fn expand(args: ConnectorArgs, item: ItemStruct) -> syn::Result<TokenStream> {
    reject_generics(&item.generics, "connector")?;

    let private = private();
    let ident = &item.ident;
    let id = id_or(args.id, ident);
    let static_name = static_ident("CONNECTOR", &[ident]);

    let registration = declaration_static(
        &static_name,
        quote! {
            #private::Declaration::ConnectorType(#private::ConnectorTypeDeclaration {
                id: #private::ConnectorTypeId::from_static(<#ident as #private::ConnectorMeta>::ID),
            })
        },
    );

    Ok(quote! {
        #item

        impl #private::ConnectorMeta for #ident {
            const ID: &'static str = #id;
        }

        #registration
    })
}
