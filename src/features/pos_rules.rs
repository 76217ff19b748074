//! Compression of tag patterns into start/end codes

/// Which end of a tag pattern a rule looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPosition {
    Start,
    End,
}

/// Maps a tag at one end of a pattern to a code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosRule {
    /// Tag prefix, so `NN` also covers `NNP`
    pub prefix: &'static str,
    pub code: &'static str,
}

/// An ordered rule table; the first matching rule wins
#[derive(Debug, Clone, Copy)]
pub struct PosRules {
    pub position: TagPosition,
    pub rules: &'static [PosRule],
}

/// Code of patterns no rule matches
pub const OTHER: &str = "OTHER";

pub const RULES_START: PosRules = PosRules {
    position: TagPosition::Start,
    rules: &[
        PosRule { prefix: "NN", code: "NN_STARTS" },
        PosRule { prefix: "VB", code: "VB_STARTS" },
        PosRule { prefix: "JJ", code: "JJ_STARTS" },
    ],
};

pub const RULES_END: PosRules = PosRules {
    position: TagPosition::End,
    rules: &[
        PosRule { prefix: "NN", code: "NN_ENDS" },
        PosRule { prefix: "VB", code: "VB_ENDS" },
        PosRule { prefix: "JJ", code: "JJ_ENDS" },
    ],
};

/// Code of a space-separated tag pattern under `rules`
pub fn compress_pos_tag(pattern: &str, rules: &PosRules) -> &'static str {
    let tag = match rules.position {
        TagPosition::Start => pattern.split_whitespace().next(),
        TagPosition::End => pattern.split_whitespace().next_back(),
    };
    let Some(tag) = tag else {
        return OTHER;
    };

    rules
        .rules
        .iter()
        .find(|rule| tag.starts_with(rule.prefix))
        .map_or(OTHER, |rule| rule.code)
}
