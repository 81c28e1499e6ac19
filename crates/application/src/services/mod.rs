pub mod matcher;
pub mod nat64;
pub mod selection;
pub mod suffix_trie;
pub mod upstream_set;

pub use matcher::Matcher;
pub use selection::{primary_verdict, PrimaryVerdict, UntrustedReason};
pub use suffix_trie::SuffixTrie;
pub use upstream_set::{Exchange, UpstreamSet};
