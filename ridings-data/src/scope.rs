//! Restricting a run to a subset of source features.

use std::collections::BTreeSet;

use ridings_core::{Feature, IdentityResolver};

/// Which features of a collection a run processes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FeatureScope {
    /// Every feature.
    #[default]
    All,
    /// Only features whose source code is in the set.
    SourceCodes(BTreeSet<String>),
}

impl FeatureScope {
    /// Scope to the given source codes; an empty list selects every feature.
    ///
    /// # Examples
    /// ```
    /// use ridings_data::FeatureScope;
    ///
    /// assert_eq!(FeatureScope::from_codes(Vec::<String>::new()), FeatureScope::All);
    /// assert!(!FeatureScope::from_codes(["35082"]).is_all());
    /// ```
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes: BTreeSet<String> = codes
            .into_iter()
            .map(Into::into)
            .map(|code| code.trim().to_owned())
            .filter(|code| !code.is_empty())
            .collect();
        if codes.is_empty() {
            Self::All
        } else {
            Self::SourceCodes(codes)
        }
    }

    /// Whether the scope selects every feature.
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether `feature` falls inside the scope.
    pub fn includes(&self, resolver: &IdentityResolver, feature: &Feature) -> bool {
        match self {
            Self::All => true,
            Self::SourceCodes(codes) => resolver
                .source_code(&feature.attributes)
                .is_some_and(|code| codes.contains(&code)),
        }
    }
}
