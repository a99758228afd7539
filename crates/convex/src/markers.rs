//! Per-call transformer markers

use std::borrow::{Borrow, Cow};
use std::fmt;

use crate::transformer::Identified;

/// Fully-qualified id of a transformer type, e.g. `my_app::wan::WanTransformer`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransformerId(Cow<'static, str>);

impl TransformerId {
    pub const fn from_static(id: &'static str) -> Self {
        TransformerId(Cow::Borrowed(id))
    }

    pub fn new(id: impl Into<String>) -> Self {
        TransformerId(Cow::Owned(id.into()))
    }

    /// Id of a type carrying [`Identified`]
    pub const fn of<T: Identified>() -> Self {
        Self::from_static(T::ID)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransformerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TransformerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TransformerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TransformerId {
    fn from(value: &'static str) -> Self {
        Self::from_static(value)
    }
}

impl From<String> for TransformerId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A marker attached to a service or to one of its calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// Run the named transformer on the response
    Select(TransformerId),
    /// Never transform this call, whatever else is selected
    Disable,
}

/// Markers visible on one call, its own plus whatever it inherited from its service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallAnnotations {
    pub select: Option<TransformerId>,
    pub disable: bool,
}

/// What dispatch does with a call's response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    PassThrough,
    Transform(&'a TransformerId),
}

impl CallAnnotations {
    pub fn none() -> Self {
        CallAnnotations::default()
    }

    pub fn selecting(id: impl Into<TransformerId>) -> Self {
        CallAnnotations {
            select: Some(id.into()),
            disable: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disable = true;
        self
    }

    pub fn from_markers<I: IntoIterator<Item = Marker>>(markers: I) -> Self {
        markers
            .into_iter()
            .fold(CallAnnotations::none(), |mut annotations, marker| {
                match marker {
                    Marker::Select(id) => annotations.select = Some(id),
                    Marker::Disable => annotations.disable = true,
                }
                annotations
            })
    }

    pub fn markers(&self) -> Vec<Marker> {
        let mut markers = Vec::with_capacity(2);
        if let Some(id) = &self.select {
            markers.push(Marker::Select(id.clone()));
        }
        if self.disable {
            markers.push(Marker::Disable);
        }
        markers
    }

    /// Take the service-level selection if this call has none of its own.
    ///
    /// Returns whether anything changed.
    pub fn inherit(&mut self, service: Option<&TransformerId>) -> bool {
        match (&self.select, service) {
            (None, Some(id)) => {
                self.select = Some(id.clone());
                true
            }
            _ => false,
        }
    }

    pub fn route(&self) -> Route<'_> {
        match (&self.select, self.disable) {
            (Some(id), false) => Route::Transform(id),
            _ => Route::PassThrough,
        }
    }
}
