//! Service descriptors and marker propagation
//!
//! `#[service]` and `#[transformer(..)]` emit an [`InterfaceDecl`] constant next to the trait
//! they annotate. The declaration records exactly what was written in source; resolving it into
//! an [`Interface`] runs [`propagate`] so every method without its own selection inherits the
//! service-level one.

use tracing::debug;

use crate::markers::{CallAnnotations, TransformerId};

/// Markers written on one trait method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: &'static str,
    pub select: Option<&'static str>,
    pub disable: bool,
}

impl MethodDecl {
    pub const fn new(name: &'static str) -> Self {
        MethodDecl {
            name,
            select: None,
            disable: false,
        }
    }

    pub const fn select(self, id: &'static str) -> Self {
        MethodDecl {
            select: Some(id),
            ..self
        }
    }

    pub const fn disable(self) -> Self {
        MethodDecl {
            disable: true,
            ..self
        }
    }

    fn annotations(&self) -> CallAnnotations {
        CallAnnotations {
            select: self.select.map(TransformerId::from_static),
            disable: self.disable,
        }
    }
}

/// Compile-time description of a service trait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub name: &'static str,
    pub marker: Option<&'static str>,
    pub methods: &'static [MethodDecl],
}

impl InterfaceDecl {
    pub const fn new(
        name: &'static str,
        marker: Option<&'static str>,
        methods: &'static [MethodDecl],
    ) -> Self {
        InterfaceDecl {
            name,
            marker,
            methods,
        }
    }

    /// The declaration as written, without propagation
    pub fn to_interface(&self) -> Interface {
        Interface {
            name: self.name.to_string(),
            marker: self.marker.map(TransformerId::from_static),
            methods: self
                .methods
                .iter()
                .map(|method| Method {
                    name: method.name.to_string(),
                    annotations: method.annotations(),
                })
                .collect(),
        }
    }

    /// The declaration with the service marker propagated onto its methods
    pub fn resolve(&self) -> Interface {
        let mut interface = self.to_interface();
        propagate(&mut interface);
        interface
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub annotations: CallAnnotations,
}

/// A service whose calls can be dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub marker: Option<TransformerId>,
    pub methods: Vec<Method>,
}

impl Interface {
    /// Annotations of the named call
    pub fn call(&self, method: &str) -> Option<&CallAnnotations> {
        self.methods
            .iter()
            .find(|m| m.name == method)
            .map(|m| &m.annotations)
    }
}

/// Copy the service-level selection onto every method lacking one.
///
/// Returns how many methods were updated. Running it again updates nothing.
pub fn propagate(interface: &mut Interface) -> usize {
    let Some(marker) = interface.marker.clone() else {
        return 0;
    };

    let updated = interface
        .methods
        .iter_mut()
        .map(|method| usize::from(method.annotations.inherit(Some(&marker))))
        .sum::<usize>();

    if updated > 0 {
        debug!(
            "Propagated {} onto {} method(s) of {}",
            marker, updated, interface.name
        );
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::Route;

    const WAN: &str = "app::WanTransformer";
    const RAW: &str = "app::RawTransformer";

    const METHODS: &[MethodDecl] = &[
        MethodDecl::new("articles"),
        MethodDecl::new("banner").select(RAW),
        MethodDecl::new("login").disable(),
    ];

    const SERVICE: InterfaceDecl = InterfaceDecl::new("WanService", Some(WAN), METHODS);
    const PLAIN: InterfaceDecl = InterfaceDecl::new("PlainService", None, METHODS);

    #[test]
    fn test_resolve_propagates_to_unmarked_methods() {
        let interface = SERVICE.resolve();
        let wan = TransformerId::from_static(WAN);
        let raw = TransformerId::from_static(RAW);

        assert_eq!(
            interface.call("articles").map(CallAnnotations::route),
            Some(Route::Transform(&wan))
        );
        assert_eq!(
            interface.call("banner").map(CallAnnotations::route),
            Some(Route::Transform(&raw))
        );
        // Disable-only methods still inherit, disable wins at dispatch
        let login = interface.call("login");
        assert_eq!(login.and_then(|a| a.select.clone()), Some(wan));
        assert_eq!(login.map(CallAnnotations::route), Some(Route::PassThrough));
        assert!(interface.call("missing").is_none());
    }

    #[test]
    fn test_propagate_is_idempotent() {
        let mut interface = SERVICE.to_interface();
        assert_eq!(propagate(&mut interface), 2);
        let once = interface.clone();
        assert_eq!(propagate(&mut interface), 0);
        assert_eq!(interface, once);
    }

    #[test]
    fn test_unmarked_service_is_unchanged() {
        let mut interface = PLAIN.to_interface();
        let before = interface.clone();
        assert_eq!(propagate(&mut interface), 0);
        assert_eq!(interface, before);
        assert_eq!(
            interface.call("articles").map(CallAnnotations::route),
            Some(Route::PassThrough)
        );
    }
}
