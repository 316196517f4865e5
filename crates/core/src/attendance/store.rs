use dashmap::DashMap;

/// Latest committed confirmed list per channel.
#[derive(Debug, Default)]
pub struct ConfirmedRosters {
    by_channel: DashMap<String, Vec<String>>,
}

impl ConfirmedRosters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever was committed for `channel_id` before.
    pub fn commit(&self, channel_id: &str, confirmed: Vec<String>) {
        self.by_channel.insert(channel_id.to_owned(), confirmed);
    }

    pub fn latest(&self, channel_id: &str) -> Option<Vec<String>> {
        self.by_channel.get(channel_id).map(|entry| entry.value().clone())
    }

    pub fn channel_count(&self) -> usize {
        self.by_channel.len()
    }
}

#[cfg(test)]
mod tests {
    use super::ConfirmedRosters;

    #[test]
    fn commit_overwrites_previous_list() {
        let store = ConfirmedRosters::new();
        assert_eq!(store.latest("C1"), None);

        store.commit("C1", vec!["Ana".to_owned(), "Rui".to_owned()]);
        store.commit("C1", vec!["Zé".to_owned()]);
        store.commit("C2", vec!["Ana".to_owned()]);

        assert_eq!(store.latest("C1"), Some(vec!["Zé".to_owned()]));
        assert_eq!(store.channel_count(), 2);
    }
}
