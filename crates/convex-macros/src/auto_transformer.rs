use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Generics, Ident, Item, Visibility};

pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(
            attr,
            "#[auto_transformer] takes no arguments",
        ));
    }

    let item: Item = syn::parse2(item)?;
    let (ident, vis, generics) = target(&item)?;

    if !matches!(vis, Visibility::Public(_)) {
        return Err(syn::Error::new(
            ident.span(),
            format!("transformer `{}` must be declared `pub`", ident),
        ));
    }
    if !generics.params.is_empty() {
        return Err(syn::Error::new(
            generics.span(),
            format!(
                "transformer `{}` cannot have generic parameters; the registry constructs it by name",
                ident
            ),
        ));
    }

    Ok(quote! {
        #item

        impl ::convex::Identified for #ident {
            const ID: &'static str =
                ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#ident));
        }

        const _: fn() = || {
            fn assert_auto_transformer<T: ::convex::Transformer + ::core::default::Default>() {}
            assert_auto_transformer::<#ident>();
        };
    })
}

fn target(item: &Item) -> syn::Result<(&Ident, &Visibility, &Generics)> {
    match item {
        Item::Struct(s) => Ok((&s.ident, &s.vis, &s.generics)),
        Item::Enum(e) => Ok((&e.ident, &e.vis, &e.generics)),
        Item::Trait(t) => Err(syn::Error::new(
            t.ident.span(),
            format!(
                "`{}` is a trait; #[auto_transformer] needs a concrete struct or enum",
                t.ident
            ),
        )),
        other => Err(syn::Error::new_spanned(
            other,
            "#[auto_transformer] only applies to structs and enums",
        )),
    }
}
