use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use rosterwatch_core::{CategoryResultSet, ExclusionSet};
use rosterwatch_engine::{
    CategoryMap, CategorySource, FailureKind, LeaderEntry, LeaderSource, LeadersCategory,
    NameSource, NamesCategory, SearchAggregator, SearchSettings, SourceError,
};

struct FixedSource {
    names: Vec<String>,
    delay: Duration,
    fail: bool,
    calls: Arc<Mutex<Vec<(String, usize)>>>,
}

impl FixedSource {
    fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|name| name.to_string()).collect(),
            delay: Duration::ZERO,
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl CategorySource for FixedSource {
    async fn candidates(&self, query: &str, limit: usize) -> Result<Vec<String>, SourceError> {
        self.calls.lock().unwrap().push((query.to_string(), limit));
        tokio::time::sleep(self.delay).await;
        if self.fail {
            return Err(SourceError::new(FailureKind::HttpStatus(500), "boom"));
        }
        Ok(self.names.clone())
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

const JO_PLAYERS: [&str; 9] = [
    "Joel Embiid",
    "Josh Giddey",
    "Jordan Poole",
    "Nikola Jokic",
    "Jonas Valanciunas",
    "Johnny Juzang",
    "Jock Landale",
    "Jose Alvarado",
    "Stephen Curry",
];

#[tokio::test]
async fn caps_each_category_in_source_order() {
    let aggregator = SearchAggregator::new(SearchSettings::default())
        .with_category("players", Arc::new(FixedSource::new(&JO_PLAYERS)));

    let results = aggregator.query("jo", &ExclusionSet::none()).await;

    assert_eq!(
        results.get("players").unwrap(),
        names(&[
            "Joel Embiid",
            "Josh Giddey",
            "Jordan Poole",
            "Nikola Jokic",
            "Jonas Valanciunas",
        ])
    );
}

#[tokio::test]
async fn passes_trimmed_query_and_lookup_limit() {
    let source = FixedSource::new(&JO_PLAYERS);
    let calls = source.calls.clone();
    let settings = SearchSettings {
        lookup_limit: 40,
        ..SearchSettings::default()
    };
    let aggregator = SearchAggregator::new(settings).with_category("players", Arc::new(source));

    aggregator.query("  jo ", &ExclusionSet::none()).await;

    assert_eq!(*calls.lock().unwrap(), vec![("jo".to_string(), 40)]);
}

#[tokio::test]
async fn watched_names_are_excluded() {
    let aggregator = SearchAggregator::new(SearchSettings::default())
        .with_category("players", Arc::new(FixedSource::new(&JO_PLAYERS)));
    let exclusions = ExclusionSet::from_names(["joel embiid", "Nikola Jokic"]);

    let results = aggregator.query("jo", &exclusions).await;

    assert_eq!(
        results.get("players").unwrap(),
        names(&[
            "Josh Giddey",
            "Jordan Poole",
            "Jonas Valanciunas",
            "Johnny Juzang",
            "Jock Landale",
        ])
    );
}

#[tokio::test]
async fn failing_category_is_empty_while_others_succeed() {
    let aggregator = SearchAggregator::new(SearchSettings::default())
        .with_category("players", Arc::new(FixedSource::new(&["Joel Embiid"])))
        .with_category("leaders", Arc::new(FixedSource::failing()));

    let results = aggregator.query("joel", &ExclusionSet::none()).await;

    let mut expected = CategoryResultSet::new();
    expected.push("players", names(&["Joel Embiid"]));
    expected.push("leaders", Vec::new());
    assert_eq!(results, expected);
}

#[tokio::test]
async fn combined_query_fails_whole_attempt_on_any_error() {
    let aggregator = SearchAggregator::new(SearchSettings::default())
        .with_category("players", Arc::new(FixedSource::new(&["Joel Embiid"])))
        .with_category("leaders", Arc::new(FixedSource::failing()));

    let results = aggregator.query_combined("joel").await;

    assert!(results.is_empty());
    assert_eq!(results, CategoryResultSet::empty_for(["players", "leaders"]));
}

#[tokio::test]
async fn combined_query_applies_no_exclusion() {
    let aggregator = SearchAggregator::new(SearchSettings::default())
        .with_category("players", Arc::new(FixedSource::new(&JO_PLAYERS)))
        .with_category("leaders", Arc::new(FixedSource::new(&["Joel Embiid"])));

    let results = aggregator.query_combined("embiid").await;

    assert_eq!(results.get("players").unwrap(), names(&["Joel Embiid"]));
    assert_eq!(results.get("leaders").unwrap(), names(&["Joel Embiid"]));
}

#[tokio::test]
async fn blank_query_skips_lookups() {
    let source = FixedSource::new(&JO_PLAYERS);
    let calls = source.calls.clone();
    let aggregator =
        SearchAggregator::new(SearchSettings::default()).with_category("players", Arc::new(source));

    let results = aggregator.query("   ", &ExclusionSet::none()).await;

    assert!(results.is_empty());
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn category_lookups_run_concurrently() {
    let aggregator = SearchAggregator::new(SearchSettings::default())
        .with_category(
            "players",
            Arc::new(FixedSource::new(&["Joel Embiid"]).delayed(Duration::from_millis(300))),
        )
        .with_category(
            "leaders",
            Arc::new(FixedSource::new(&["Joel Embiid"]).delayed(Duration::from_millis(300))),
        );

    let started = tokio::time::Instant::now();
    let results = aggregator.query("joel", &ExclusionSet::none()).await;

    assert_eq!(results.total(), 2);
    assert!(started.elapsed() < Duration::from_millis(600));
}

struct StaticNames(Vec<String>);

#[async_trait::async_trait]
impl NameSource for StaticNames {
    async fn lookup(&self, _query: &str, limit: usize) -> Result<Vec<String>, SourceError> {
        Ok(self.0.iter().take(limit).cloned().collect())
    }
}

struct StaticLeaders(CategoryMap);

#[async_trait::async_trait]
impl LeaderSource for StaticLeaders {
    async fn leaders(&self) -> Result<CategoryMap, SourceError> {
        Ok(self.0.clone())
    }
}

fn leader(name: &str) -> LeaderEntry {
    LeaderEntry {
        name: name.to_string(),
        value: Some(1.0),
        games: Some(10),
    }
}

#[tokio::test]
async fn names_and_leaders_categories_feed_the_aggregator() {
    let mut boards = BTreeMap::new();
    boards.insert(
        "assists".to_string(),
        vec![leader("Trae Young"), leader("Luka Doncic")],
    );
    boards.insert(
        "points".to_string(),
        vec![leader("Luka Doncic"), leader("Giannis Antetokounmpo")],
    );

    let aggregator = SearchAggregator::new(SearchSettings::default())
        .with_category(
            "players",
            Arc::new(NamesCategory::new(Arc::new(StaticNames(names(&[
                "Luka Doncic",
                "Luka Garza",
            ]))))),
        )
        .with_category(
            "leaders",
            Arc::new(LeadersCategory::new(Arc::new(StaticLeaders(boards)))),
        );

    let results = aggregator.query("luka", &ExclusionSet::none()).await;

    assert_eq!(
        results.get("players").unwrap(),
        names(&["Luka Doncic", "Luka Garza"])
    );
    // Doncic leads two boards but is offered once.
    assert_eq!(results.get("leaders").unwrap(), names(&["Luka Doncic"]));
}
