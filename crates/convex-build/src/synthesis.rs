//! Registry synthesis
//!
//! Turns the assembled manifest into the generated source unit: a `REGISTRY` table with one
//! freshly constructed instance per id, plus the `install()` hook merging it into the global
//! registry. Every id is checked before anything is emitted, so a bad id never leaves a partial
//! registry behind.

use convex_manifest::{Manifest, TransformerId};
use proc_macro2::TokenStream;
use quote::quote;

use crate::errors::SynthesisError;

/// File name of the generated unit inside `OUT_DIR`
pub const REGISTRY_FILE_NAME: &str = "convex_registry.rs";

/// Type path of `id` as seen from `current_crate`
pub fn type_path(id: &TransformerId, current_crate: &str) -> Result<syn::Path, SynthesisError> {
    let invalid = |reason: &str| SynthesisError::InvalidPath {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    let segments: Vec<&str> = id.segments().collect();
    let Some((krate, rest)) = segments.split_first() else {
        return Err(invalid("empty id"));
    };
    if rest.is_empty() {
        return Err(invalid("expected `crate_name::Type`, found a bare name"));
    }

    let rest = rest.join("::");
    let text = if *krate == current_crate {
        format!("crate::{}", rest)
    } else {
        format!("::{}::{}", krate, rest)
    };
    syn::parse_str::<syn::Path>(&text).map_err(|e| invalid(&e.to_string()))
}

/// The `REGISTRY` static
pub fn synthesize_table(manifest: &Manifest, current_crate: &str) -> Result<TokenStream, SynthesisError> {
    let paths = manifest
        .iter()
        .map(|id| type_path(id, current_crate))
        .collect::<Result<Vec<_>, _>>()?;

    let init = if paths.is_empty() {
        quote!(::convex::GeneratedTable::new())
    } else {
        quote! {{
            let mut table = ::convex::GeneratedTable::new();
            #( table.insert(<#paths as ::core::default::Default>::default()); )*
            table
        }}
    };

    Ok(quote! {
        /// Every transformer listed in the assembled manifest, constructed on first access.
        pub static REGISTRY: ::convex::__private::Lazy<::convex::GeneratedTable> =
            ::convex::__private::Lazy::new(|| #init);
    })
}

/// The `install()` hook merging `REGISTRY` into the global registry exactly once
pub fn synthesize_install() -> TokenStream {
    quote! {
        static INSTALLED: ::convex::__private::OnceCell<usize> = ::convex::__private::OnceCell::new();

        /// Merge [`REGISTRY`] into the process-wide registry and return it.
        ///
        /// Only the first call merges; later calls just return the registry.
        pub fn install() -> &'static ::convex::Registry {
            let registry = ::convex::global();
            INSTALLED.get_or_init(|| registry.merge(&REGISTRY));
            registry
        }
    }
}

/// Full text of the generated unit
pub fn render_unit(manifest: &Manifest, current_crate: &str) -> Result<String, SynthesisError> {
    let table = synthesize_table(manifest, current_crate)?;
    let install = synthesize_install();

    let mut out = String::from("// @generated by convex-build. Do not edit.\n");
    out.push_str(&format!("// {} transformer(s):\n", manifest.len()));
    for id in manifest {
        out.push_str(&format!("//   {}\n", id));
    }
    out.push('\n');
    out.push_str(&table.to_string());
    out.push('\n');
    out.push_str(&install.to_string());
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::ToTokens;

    fn manifest(raw: &[&str]) -> Manifest {
        raw.iter()
            .filter_map(|r| TransformerId::parse(r).ok())
            .collect()
    }

    fn path_str(raw: &str, current: &str) -> Option<String> {
        let id = TransformerId::parse(raw).ok()?;
        type_path(&id, current)
            .ok()
            .map(|p| p.to_token_stream().to_string())
    }

    #[test]
    fn test_type_paths_for_local_and_foreign_ids() {
        assert_eq!(
            path_str("my_app::net::Wan", "my_app").as_deref(),
            Some("crate :: net :: Wan")
        );
        assert_eq!(
            path_str("wan_lib::Raw", "my_app").as_deref(),
            Some(":: wan_lib :: Raw")
        );
    }

    #[test]
    fn test_rejects_ids_that_are_not_paths() {
        for raw in ["Bare", "my_app::type::Wan"] {
            let Ok(id) = TransformerId::parse(raw) else {
                continue;
            };
            match type_path(&id, "my_app") {
                Err(SynthesisError::InvalidPath { id, .. }) => assert_eq!(id, raw),
                Ok(path) => panic!("{raw} produced {}", path.to_token_stream()),
            }
        }
    }

    #[test]
    fn test_table_has_one_entry_per_id() -> syn::Result<()> {
        let manifest = manifest(&["my_app::C", "lib::B", "my_app::net::A"]);
        let tokens = synthesize_table(&manifest, "my_app").map_err(|e| syn::Error::new(proc_macro2::Span::call_site(), e))?;

        let item: syn::ItemStatic = syn::parse2(tokens.clone())?;
        assert_eq!(item.ident, "REGISTRY");

        let text = tokens.to_string();
        assert_eq!(text.matches("table . insert").count(), 3);
        // manifest order is lexical
        let a = text.find(":: lib :: B");
        let b = text.find("crate :: C");
        let c = text.find("crate :: net :: A");
        assert!(a < b && b < c, "{text}");
        Ok(())
    }

    #[test]
    fn test_empty_manifest_builds_an_empty_table() -> syn::Result<()> {
        let tokens = synthesize_table(&Manifest::new(), "my_app")
            .map_err(|e| syn::Error::new(proc_macro2::Span::call_site(), e))?;
        let _: syn::ItemStatic = syn::parse2(tokens.clone())?;
        assert!(!tokens.to_string().contains("insert"));
        Ok(())
    }

    #[test]
    fn test_rendered_unit_parses_as_a_file() -> syn::Result<()> {
        let manifest = manifest(&["my_app::Wan", "lib::Raw"]);
        let text = render_unit(&manifest, "my_app")
            .map_err(|e| syn::Error::new(proc_macro2::Span::call_site(), e))?;

        assert!(text.starts_with("// @generated"));
        assert!(text.contains("//   lib::Raw\n//   my_app::Wan\n"));
        let file = syn::parse_file(&text)?;
        // REGISTRY, INSTALLED, install
        assert_eq!(file.items.len(), 3);
        Ok(())
    }

    #[test]
    fn test_one_bad_id_emits_nothing() {
        let manifest = manifest(&["my_app::Good", "Bare"]);
        assert!(render_unit(&manifest, "my_app").is_err());
    }
}
