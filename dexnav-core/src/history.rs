//! Browser history contract and URL helpers.

use crate::ids::PartitionId;
use url::Url;

/// Query parameter carrying the selected partition.
pub const PARTITION_QUERY_PARAM: &str = "gen";

/// A URL in the history stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Url::parse(input).map(|url| Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Partition id carried in the query string, if present and numeric.
    pub fn partition(&self) -> Option<PartitionId> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == PARTITION_QUERY_PARAM)
            .and_then(|(_, value)| value.parse().ok())
    }

    /// Copy of this location with the partition parameter replaced.
    pub fn with_partition(&self, partition: PartitionId) -> Location {
        let retained: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(key, _)| key != PARTITION_QUERY_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        let mut url = self.url.clone();
        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &retained {
                pairs.append_pair(key, value);
            }
            pairs.append_pair(PARTITION_QUERY_PARAM, &partition.to_string());
        }
        Location { url }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// A back/forward transition. `previous` is the URL that was left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopEvent {
    pub previous: Location,
}

/// Browser history as seen by the navigation controller.
pub trait History: Send + Sync {
    /// The URL currently shown.
    fn location(&self) -> Location;

    /// Push a new entry without reloading the page.
    fn push(&self, location: Location);
}
