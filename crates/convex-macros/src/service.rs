//! `#[service]` / `#[transformer(..)]` on traits
//!
//! Marker attributes inside the trait are consumed here and never reach the compiler. What they
//! said is recorded in a `SHOUTY_TRAIT_NAME: convex::InterfaceDecl` constant emitted next to the
//! trait.

use heck::ToShoutySnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Item, ItemTrait, Meta, Path, TraitItem};

const SELECT: &str = "transformer";
const DISABLE: &str = "disable_transformer";
const SERVICE: &str = "service";

/// `#[transformer(Path)]`: a service trait with a service-level selection
pub(crate) fn expand_marked(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let marker: Path = syn::parse2(attr).map_err(|e| {
        syn::Error::new(
            e.span(),
            "expected a transformer type, e.g. #[transformer(WanTransformer)]",
        )
    })?;
    match syn::parse2::<Item>(item)? {
        Item::Trait(item_trait) => expand(Some(marker), item_trait),
        other => Err(syn::Error::new_spanned(
            other,
            "#[transformer(..)] applies to a service trait or to a method inside one",
        )),
    }
}

/// `#[service]`: a service trait whose selections are all method-level
pub(crate) fn expand_unmarked(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(
            attr,
            "#[service] takes no arguments; use #[transformer(..)] to select a transformer",
        ));
    }
    match syn::parse2::<Item>(item)? {
        Item::Trait(item_trait) => expand(None, item_trait),
        other => Err(syn::Error::new_spanned(other, "#[service] applies to traits")),
    }
}

#[derive(Default)]
struct Markers {
    select: Option<Path>,
    disable: bool,
}

struct MethodMarkers {
    name: String,
    markers: Markers,
}

fn expand(marker: Option<Path>, mut item_trait: ItemTrait) -> syn::Result<TokenStream> {
    // `#[service] #[transformer(X)] trait ..` and friends
    let outer = take_markers(&mut item_trait.attrs, true)?;
    if outer.disable {
        return Err(syn::Error::new_spanned(
            &item_trait.ident,
            "#[disable_transformer] applies to methods, not to a whole service",
        ));
    }
    let marker = match (marker, outer.select) {
        (Some(_), Some(extra)) => {
            return Err(syn::Error::new_spanned(
                extra,
                "service already selects a transformer",
            ))
        }
        (marker, extra) => marker.or(extra),
    };

    let mut methods = Vec::new();
    for trait_item in &mut item_trait.items {
        if let TraitItem::Fn(method) = trait_item {
            let markers = take_markers(&mut method.attrs, false)?;
            methods.push(MethodMarkers {
                name: method.sig.ident.to_string(),
                markers,
            });
        }
    }

    let name = item_trait.ident.to_string();
    let vis = &item_trait.vis;
    let const_ident = format_ident!("{}", name.to_shouty_snake_case());
    let doc = format!("Transformer markers declared on [`{}`].", name);

    let marker_tokens = match &marker {
        Some(path) => quote!(::core::option::Option::Some(<#path as ::convex::Identified>::ID)),
        None => quote!(::core::option::Option::None),
    };
    let method_tokens = methods.iter().map(method_decl);

    Ok(quote! {
        #item_trait

        #[doc = #doc]
        #vis const #const_ident: ::convex::InterfaceDecl = ::convex::InterfaceDecl::new(
            #name,
            #marker_tokens,
            &[#(#method_tokens),*],
        );
    })
}

fn method_decl(method: &MethodMarkers) -> TokenStream {
    let name = &method.name;
    let mut decl = quote!(::convex::MethodDecl::new(#name));
    if let Some(path) = &method.markers.select {
        decl = quote!(#decl.select(<#path as ::convex::Identified>::ID));
    }
    if method.markers.disable {
        decl = quote!(#decl.disable());
    }
    decl
}

fn is_marker(attr: &Attribute, name: &str) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == name)
}

/// Strip marker attributes from `attrs`, returning what they selected
fn take_markers(attrs: &mut Vec<Attribute>, on_trait: bool) -> syn::Result<Markers> {
    let mut markers = Markers::default();
    let mut kept = Vec::with_capacity(attrs.len());

    for attr in attrs.drain(..) {
        if is_marker(&attr, SELECT) {
            let path: Path = attr.parse_args()?;
            if markers.select.is_some() {
                return Err(syn::Error::new_spanned(
                    attr,
                    "only one #[transformer(..)] may be given",
                ));
            }
            markers.select = Some(path);
        } else if is_marker(&attr, DISABLE) {
            if !matches!(attr.meta, Meta::Path(_)) {
                return Err(syn::Error::new_spanned(
                    attr,
                    "#[disable_transformer] takes no arguments",
                ));
            }
            markers.disable = true;
        } else if is_marker(&attr, SERVICE) {
            if !on_trait {
                return Err(syn::Error::new_spanned(
                    attr,
                    "#[service] applies to traits, not methods",
                ));
            }
        } else {
            kept.push(attr);
        }
    }

    *attrs = kept;
    Ok(markers)
}
