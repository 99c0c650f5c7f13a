//! Gateway identifiers accumulated while an attempt progresses.

use serde::{Deserialize, Serialize};

/// What a provider identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderRefKind {
    PaymentIntent,
    SetupIntent,
    PaymentMethod,
    Order,
    Payment,
    Subscription,
}

/// One provider identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderRef {
    pub kind: ProviderRefKind,
    pub value: String,
}

impl ProviderRef {
    pub fn new(kind: ProviderRefKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Append-only list of provider identifiers.
///
/// There is no removal or replacement API: once a step has produced an
/// identifier it stays for the life of the attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderRefs(Vec<ProviderRef>);

impl ProviderRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `provider_ref` unless the identical ref is already present.
    ///
    /// Returns true if the list grew.
    pub fn append(&mut self, provider_ref: ProviderRef) -> bool {
        if self.0.contains(&provider_ref) {
            return false;
        }
        self.0.push(provider_ref);
        true
    }

    pub fn extend(&mut self, refs: impl IntoIterator<Item = ProviderRef>) {
        for provider_ref in refs {
            self.append(provider_ref);
        }
    }

    /// Most recently appended value of the given kind.
    pub fn latest(&self, kind: ProviderRefKind) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|r| r.kind == kind)
            .map(|r| r.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderRef> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn latest_returns_newest_of_kind() {
        let mut refs = ProviderRefs::new();
        refs.append(ProviderRef::new(ProviderRefKind::Order, "ord_1"));
        refs.append(ProviderRef::new(ProviderRefKind::Payment, "pay_1"));
        refs.append(ProviderRef::new(ProviderRefKind::Order, "ord_2"));

        assert_eq!(refs.latest(ProviderRefKind::Order), Some("ord_2"));
        assert_eq!(refs.latest(ProviderRefKind::Subscription), None);
        assert_eq!(refs.len(), 3);
    }

    #[test]
    fn duplicate_append_is_noop() {
        let mut refs = ProviderRefs::new();
        assert!(refs.append(ProviderRef::new(ProviderRefKind::Order, "ord_1")));
        assert!(!refs.append(ProviderRef::new(ProviderRefKind::Order, "ord_1")));
        assert_eq!(refs.len(), 1);
    }

    fn any_ref() -> impl Strategy<Value = ProviderRef> {
        let kind = prop::sample::select(vec![
            ProviderRefKind::PaymentIntent,
            ProviderRefKind::Order,
            ProviderRefKind::Subscription,
        ]);
        (kind, "[a-c]{1,2}").prop_map(|(kind, value)| ProviderRef::new(kind, value))
    }

    proptest! {
        #[test]
        fn appends_never_lose_earlier_refs(batches in prop::collection::vec(prop::collection::vec(any_ref(), 0..4), 0..6)) {
            let mut refs = ProviderRefs::new();
            for batch in batches {
                let before: Vec<ProviderRef> = refs.iter().cloned().collect();
                refs.extend(batch);
                let after: Vec<ProviderRef> = refs.iter().cloned().collect();
                prop_assert!(after.len() >= before.len());
                prop_assert_eq!(&after[..before.len()], &before[..]);
            }
        }
    }
}
