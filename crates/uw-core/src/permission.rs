//! Usage-access gate checked before every query.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::source::UsageDataSource;

/// A boolean capability check.
///
/// Implementations must be side-effect free and must not cache: the grant
/// can change out of band between calls.
pub trait PermissionGate {
    fn is_granted(&self) -> bool;
}

/// Gate backed by a source's own permission check.
///
/// Errors from the source count as "not granted" and are reported.
pub struct SourceGate<'a, S: ?Sized> {
    source: &'a S,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a, S: UsageDataSource + ?Sized> SourceGate<'a, S> {
    pub fn new(source: &'a S, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            source,
            diagnostics,
        }
    }
}

impl<S: UsageDataSource + ?Sized> PermissionGate for SourceGate<'_, S> {
    fn is_granted(&self) -> bool {
        match self.source.is_permission_granted() {
            Ok(granted) => granted,
            Err(error) => {
                self.diagnostics
                    .record(&Diagnostic::PermissionCheckFailed { error: &error });
                false
            }
        }
    }
}
