use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Generics, Ident, LitStr, Path};

/// Path prefix of the facade's hidden re-exports.
pub fn private() -> TokenStream {
    quote!(::chatoverflow::__private)
}

/// `("IMPL", ["TwitchChatInputImpl", "ChatInput"])` → `__CHATOVERFLOW_IMPL_TWITCHCHATINPUTIMPL_CHATINPUT`.
pub fn static_ident(prefix: &str, parts: &[&Ident]) -> Ident {
    let mut name = format!("__CHATOVERFLOW_{prefix}");
    for part in parts {
        name.push('_');
        name.push_str(&part.to_string().to_uppercase());
    }
    Ident::new(&name, Span::call_site())
}

/// Emits the linkme static contributing one declaration.
pub fn declaration_static(name: &Ident, body: TokenStream) -> TokenStream {
    let private = private();
    quote! {
        #[#private::linkme::distributed_slice(#private::DECLARATIONS)]
        #[linkme(crate = #private::linkme)]
        #[doc(hidden)]
        static #name: fn() -> #private::Declaration = || #body;
    }
}

/// Last segment of a path, used for default identifiers.
pub fn last_ident(path: &Path) -> syn::Result<&Ident> {
    path.segments
        .last()
        .map(|s| &s.ident)
        .ok_or_else(|| syn::Error::new_spanned(path, "expected a non-empty path"))
}

/// The `id = "..."` override, or the item name.
pub fn id_or(id: Option<LitStr>, ident: &Ident) -> LitStr {
    id.unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()))
}

pub fn reject_generics(generics: &Generics, what: &str) -> syn::Result<()> {
    if generics.params.is_empty() && generics.where_clause.is_none() {
        Ok(())
    } else {
        Err(syn::Error::new_spanned(
            generics,
            format!("#[{what}] does not support generic items"),
        ))
    }
}
