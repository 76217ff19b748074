//! Cluster identifiers: separate collocation namespaces sharing one schema

use crate::text::StemMethod;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A corpus partition with its own collocation statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClusterId {
    /// Computer science articles
    #[serde(rename = "CS_COLLOCS")]
    ComputerScience,
    /// ScienceWISE articles
    #[serde(rename = "SW_COLLOCS")]
    ScienceWise,
    /// ScienceWISE articles indexed without lemmatization
    #[serde(rename = "SW_COLLOCS_NO_LEMMAS")]
    ScienceWiseNoLemmas,
}

impl ClusterId {
    pub const ALL: [ClusterId; 3] = [
        ClusterId::ComputerScience,
        ClusterId::ScienceWise,
        ClusterId::ScienceWiseNoLemmas,
    ];

    /// Stable identifier stored on articles.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterId::ComputerScience => "CS_COLLOCS",
            ClusterId::ScienceWise => "SW_COLLOCS",
            ClusterId::ScienceWiseNoLemmas => "SW_COLLOCS_NO_LEMMAS",
        }
    }

    /// Table holding this cluster's aggregate collocation rows.
    pub fn collocation_table(&self) -> &'static str {
        match self {
            ClusterId::ComputerScience => "collocations_cs",
            ClusterId::ScienceWise => "collocations_sw",
            ClusterId::ScienceWiseNoLemmas => "collocations_sw_no_lemmas",
        }
    }

    /// Stem method used for articles of this cluster unless overridden.
    pub fn default_stem_method(&self) -> StemMethod {
        match self {
            ClusterId::ScienceWiseNoLemmas => StemMethod::Lowercase,
            _ => StemMethod::Lemma,
        }
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClusterId::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown cluster '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identifiers_case_insensitively() {
        assert_eq!("CS_COLLOCS".parse::<ClusterId>().unwrap(), ClusterId::ComputerScience);
        assert_eq!("sw_collocs".parse::<ClusterId>().unwrap(), ClusterId::ScienceWise);
        assert!("BIO_COLLOCS".parse::<ClusterId>().is_err());
    }

    #[test]
    fn clusters_have_distinct_tables() {
        let tables: std::collections::HashSet<_> =
            ClusterId::ALL.iter().map(|c| c.collocation_table()).collect();
        assert_eq!(tables.len(), ClusterId::ALL.len());
    }

    #[test]
    fn serde_uses_stored_identifier() {
        let json = serde_json::to_string(&ClusterId::ScienceWiseNoLemmas).unwrap();
        assert_eq!(json, "\"SW_COLLOCS_NO_LEMMAS\"");
    }
}
