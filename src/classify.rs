//! Partitioning of merged fields into correlation slots and attributes.

use crate::correlation::Correlation;
use crate::field::Field;

/// Result of [`classify`]. Borrows from the input groups.
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub trace_id: Option<&'a Field>,
    pub span_id: Option<&'a Field>,
    pub resource: Option<&'a Field>,
    pub attributes: Vec<&'a Field>,
}

/// Split `groups` into at most one trace, span and resource field plus the
/// remaining attributes.
///
/// Groups are scanned in order and each group front to back. The first
/// correlation field of each kind wins; later ones of the same kind become
/// ordinary attributes. With groups passed as `[context, call_site]` this
/// means a trace or span id bound to a logger's context cannot be replaced
/// from a single call site.
pub fn classify<'a>(groups: &[&'a [Field]]) -> Classified<'a> {
    let total = groups.iter().map(|g| g.len()).sum();
    classify_with_capacity(groups, total)
}

pub(crate) fn classify_with_capacity<'a>(groups: &[&'a [Field]], capacity: usize) -> Classified<'a> {
    let mut out = Classified {
        attributes: Vec::with_capacity(capacity),
        ..Classified::default()
    };

    for field in groups.iter().flat_map(|g| g.iter()) {
        let slot = match field.correlation() {
            Some(Correlation::TraceId(_)) => &mut out.trace_id,
            Some(Correlation::SpanId(_)) => &mut out.span_id,
            Some(Correlation::Resource(_)) => &mut out.resource,
            None => {
                out.attributes.push(field);
                continue;
            }
        };

        if slot.is_none() {
            *slot = Some(field);
        } else {
            out.attributes.push(field);
        }
    }

    out
}
