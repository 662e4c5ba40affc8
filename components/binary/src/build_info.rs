mod built {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub use built::{PKG_AUTHORS as AUTHOR, PKG_VERSION, PROFILE, TARGET};

const COMMIT: &str = match built::GIT_COMMIT_HASH_SHORT {
    Some(hash) => hash,
    None => "unknown",
};

const DIRTY: &str = match built::GIT_DIRTY {
    Some(true) => "-dirty",
    _ => "",
};

/// `0.1.0 (1a2b3c4)`, or `0.1.0 (1a2b3c4-dirty)` for a modified tree.
pub const FULL_VERSION: &str = const_format::concatcp!(PKG_VERSION, " (", COMMIT, DIRTY, ")");
