use std::ops::Range;

use miette::SourceSpan;

/// A value along with the byte range it was parsed from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Located<T> {
    pub inner: T,
    pub location: Range<usize>,
}

impl<T> Located<T> {
    /// The location as a span usable in diagnostics
    #[must_use]
    pub fn span(&self) -> SourceSpan {
        self.location.clone().into()
    }
}

pub(crate) trait Locatable: Sized {
    fn with_location(self, location: Range<usize>) -> Located<Self> {
        Located {
            inner: self,
            location,
        }
    }
}

impl<T> Locatable for T {}
