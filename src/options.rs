//! Per-call options: expiry, read ranges, and collection kind.

use std::time::Duration;

/// Time-to-live policy for written keys.
///
/// `Never` leaves the key without a TTL. A zero `After` span collapses to
/// `Never`, so callers can pass computed durations without special-casing
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    Never,
    After(Duration),
}

impl Default for Expiry {
    fn default() -> Self {
        Expiry::Never
    }
}

impl Expiry {
    /// TTL to arm on the remote key, if any.
    pub fn ttl(self) -> Option<Duration> {
        match self {
            Expiry::Never => None,
            Expiry::After(span) if span.is_zero() => None,
            Expiry::After(span) => Some(span),
        }
    }

    fn normalize(self) -> Self {
        match self.ttl() {
            Some(span) => Expiry::After(span),
            None => Expiry::Never,
        }
    }
}

impl From<Duration> for Expiry {
    fn from(span: Duration) -> Self {
        Expiry::After(span).normalize()
    }
}

/// Element range for ranged list reads, inclusive on both ends. Negative
/// indices count back from the end of the stored list, so `Range::new(0, -1)`
/// is the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: i64,
    pub stop: i64,
}

impl Range {
    pub fn new(start: i64, stop: i64) -> Self {
        Self { start, stop }
    }
}

/// How sequence values are laid out on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Ordered list, read back in insertion order.
    List,
    /// Unordered set of distinct members.
    Set,
}

impl Default for CollectionKind {
    fn default() -> Self {
        CollectionKind::List
    }
}

/// Baseline options a client applies to every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub expiry: Expiry,
    /// Explicit range for list reads. When unset, reads cover positions
    /// `0..=len - 1` where `len` is the destination's current element count,
    /// so an empty destination reads the whole stored list.
    pub range: Option<Range>,
    pub collection: CollectionKind,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry.normalize();
        self
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_collection(mut self, collection: CollectionKind) -> Self {
        self.collection = collection;
        self
    }

    /// Snapshot of these options with any overrides laid on top.
    pub(crate) fn apply(&self, overrides: &Overrides) -> Options {
        Options {
            expiry: overrides.expiry.unwrap_or(self.expiry),
            range: overrides.range.or(self.range),
            collection: overrides.collection.unwrap_or(self.collection),
        }
    }
}

/// Call-scoped overrides. Unset fields fall back to the client's baseline
/// [`Options`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    expiry: Option<Expiry>,
    range: Option<Range>,
    collection: Option<CollectionKind>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = Some(expiry.normalize());
        self
    }

    pub fn range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn collection(mut self, collection: CollectionKind) -> Self {
        self.collection = Some(collection);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_expiry_collapses_to_never() {
        assert_eq!(Expiry::After(Duration::ZERO).ttl(), None);
        assert_eq!(Expiry::from(Duration::ZERO), Expiry::Never);
        assert_eq!(
            Expiry::from(Duration::from_secs(5)),
            Expiry::After(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_defaults() {
        let options = Options::new();
        assert_eq!(options.expiry, Expiry::Never);
        assert_eq!(options.range, None);
        assert_eq!(options.collection, CollectionKind::List);
    }

    #[test]
    fn test_builders_replace_fields() {
        let options = Options::new()
            .with_expiry(Expiry::After(Duration::from_secs(30)))
            .with_range(Range::new(0, 9))
            .with_collection(CollectionKind::Set);

        assert_eq!(options.expiry.ttl(), Some(Duration::from_secs(30)));
        assert_eq!(options.range, Some(Range::new(0, 9)));
        assert_eq!(options.collection, CollectionKind::Set);
    }

    #[test]
    fn test_overrides_fall_back_to_baseline() {
        let baseline = Options::new()
            .with_expiry(Expiry::After(Duration::from_secs(60)))
            .with_collection(CollectionKind::Set);

        let effective = baseline.apply(&Overrides::new().range(Range::new(0, 4)));
        assert_eq!(effective.expiry.ttl(), Some(Duration::from_secs(60)));
        assert_eq!(effective.range, Some(Range::new(0, 4)));
        assert_eq!(effective.collection, CollectionKind::Set);

        let effective = baseline.apply(&Overrides::new().expiry(Expiry::Never));
        assert_eq!(effective.expiry, Expiry::Never);
        assert_eq!(effective.range, None);
        assert_eq!(effective.collection, CollectionKind::Set);
    }

    #[test]
    fn test_zero_override_expiry_normalizes() {
        let baseline = Options::new().with_expiry(Expiry::After(Duration::from_secs(60)));
        let effective = baseline.apply(&Overrides::new().expiry(Expiry::After(Duration::ZERO)));
        assert_eq!(effective.expiry, Expiry::Never);
    }
}
