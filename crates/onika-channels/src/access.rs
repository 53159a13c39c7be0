//! Sender allow-lists.

/// Users allowed to talk to a channel. Empty means everyone.
///
/// Senders are identified as `"<id>|<username>"`; an entry matching either
/// part (or the whole string) admits the sender.
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    entries: Vec<String>,
}

impl AllowList {
    pub fn new(entries: Vec<String>) -> Self {
        let entries = entries
            .into_iter()
            .map(|e| e.trim().trim_start_matches('@').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        Self { entries }
    }

    pub fn is_open(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_allowed(&self, sender_id: &str) -> bool {
        if self.is_open() || self.entries.iter().any(|e| e == sender_id) {
            return true;
        }
        sender_id
            .split('|')
            .filter(|part| !part.is_empty())
            .any(|part| self.entries.iter().any(|e| e == part))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restricted() -> AllowList {
        AllowList::new(vec!["123456".into(), "@johndoe".into(), "  ".into()])
    }

    #[test]
    fn test_empty_list_allows_everyone() {
        let list = AllowList::default();
        assert!(list.is_open());
        assert!(list.is_allowed("anyone"));
        assert!(list.is_allowed("1|x"));
    }

    #[test]
    fn test_blank_entries_do_not_close_the_list() {
        assert!(AllowList::new(vec!["".into()]).is_open());
    }

    #[test]
    fn test_match_by_id_or_username() {
        let list = restricted();
        assert!(list.is_allowed("123456|someuser"));
        assert!(list.is_allowed("999|johndoe"));
        assert!(list.is_allowed("123456"));
    }

    #[test]
    fn test_denied() {
        let list = restricted();
        assert!(!list.is_allowed("999|stranger"));
        assert!(!list.is_allowed("999|"));
        assert!(!list.is_allowed(""));
    }
}
