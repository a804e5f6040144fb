use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::model::FootnoteLink;

/// Footnote links keyed by their number.
/// If the same number appears twice, the first record wins.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    by_number: HashMap<u64, FootnoteLink>,
    duplicates: Vec<u64>,
}

impl LinkIndex {
    pub fn new(links: &[FootnoteLink]) -> Self {
        links.iter().cloned().collect()
    }

    pub fn get(&self, number: u64) -> Option<&FootnoteLink> {
        self.by_number.get(&number)
    }

    /// Numbers that appeared more than once in the input, in input order.
    pub fn duplicates(&self) -> &[u64] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.by_number.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_number.is_empty()
    }
}

impl FromIterator<FootnoteLink> for LinkIndex {
    fn from_iter<I: IntoIterator<Item = FootnoteLink>>(iter: I) -> Self {
        let mut index = LinkIndex::default();
        for link in iter {
            match index.by_number.entry(link.footnote_number) {
                Entry::Occupied(_) => index.duplicates.push(link.footnote_number),
                Entry::Vacant(slot) => {
                    slot.insert(link);
                }
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(number: u64, url: &str) -> FootnoteLink {
        FootnoteLink {
            footnote_number: number,
            url: url.to_string(),
            title: String::new(),
            score: 0,
            comments: 0,
            subreddit: String::new(),
            author: String::new(),
            created_utc: String::new(),
        }
    }

    #[test]
    fn lookup_is_exact() {
        let index = LinkIndex::new(&[link(1, "a"), link(10, "b")]);
        assert_eq!(index.get(1).map(|l| l.url.as_str()), Some("a"));
        assert_eq!(index.get(10).map(|l| l.url.as_str()), Some("b"));
        assert!(index.get(0).is_none());
        assert!(index.get(2).is_none());
    }

    #[test]
    fn first_duplicate_wins() {
        let index = LinkIndex::new(&[link(2, "first"), link(2, "second"), link(2, "third")]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(2).map(|l| l.url.as_str()), Some("first"));
        assert_eq!(index.duplicates(), &[2, 2]);
    }
}
