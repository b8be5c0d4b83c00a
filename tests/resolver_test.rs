mod common;

use common::{game_page, init_logger, pool, ScriptedFetcher};
use sanegames::ad_filter::AdFilter;
use sanegames::resolver::{AdBlockFetcher, AttemptFailure, ConfigResolver, RelayFailure};
use sanegames::{GameSlug, ResolutionOutcome};
use std::sync::Arc;
use std::time::{Duration, Instant};

const OPTIONS: &str = r#"{"url":"https://games.example/g/index.html","gameName":"Test Game"}"#;

fn slug(s: &str) -> GameSlug {
    GameSlug::parse(s).unwrap()
}

fn resolver(fetcher: &Arc<ScriptedFetcher>, hosts: &[&str]) -> ConfigResolver {
    ConfigResolver::new(fetcher.clone(), pool(hosts)).with_timeout(Duration::from_millis(200))
}

#[tokio::test]
async fn first_healthy_relay_wins_and_later_relays_are_skipped() {
    init_logger();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("a.test", 200, game_page(OPTIONS))
            .page("b.test", 200, game_page(OPTIONS)),
    );

    let outcome = resolver(&fetcher, &["a.test", "b.test"])
        .resolve(&slug("tiny-fishing"))
        .await;

    let config = outcome.into_config().expect("config");
    assert_eq!(config.url(), Some("https://games.example/g/index.html"));
    assert_eq!(config.game_name(), Some("Test Game"));
    assert_eq!(fetcher.calls(), vec!["a.test"]);
}

#[tokio::test]
async fn falls_through_failures_in_pool_order() {
    init_logger();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("a.test", 503, "")
            .page("b.test", 200, "<html>no options here</html>")
            .page("c.test", 200, game_page(OPTIONS)),
    );

    let outcome = resolver(&fetcher, &["a.test", "b.test", "c.test"])
        .resolve(&slug("tiny-fishing"))
        .await;

    assert!(outcome.config().is_some());
    assert_eq!(fetcher.calls(), vec!["a.test", "b.test", "c.test"]);
}

#[tokio::test]
async fn exhaustion_reports_every_relay_in_order() {
    init_logger();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("a.test", 404, "")
            .network_error("b.test")
            .page("c.test", 200, "<script>var options = {broken: true};</script>"),
    );

    let outcome = resolver(&fetcher, &["a.test", "b.test", "c.test"])
        .resolve(&slug("missing-game"))
        .await;

    let ResolutionOutcome::Exhausted(failures) = outcome else {
        panic!("expected exhaustion");
    };
    assert_eq!(failures.len(), 3);
    assert_eq!(
        failures[0],
        RelayFailure {
            relay: 0,
            failure: AttemptFailure::HttpError(404)
        }
    );
    assert!(matches!(failures[1].failure, AttemptFailure::Network(_)));
    assert!(matches!(failures[2].failure, AttemptFailure::ParseError(_)));
    assert_eq!(
        failures.iter().map(|f| f.relay).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[tokio::test]
async fn all_non_2xx_is_exhausted() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("a.test", 500, "")
            .page("b.test", 403, "")
            .page("c.test", 301, ""),
    );

    let outcome = resolver(&fetcher, &["a.test", "b.test", "c.test"])
        .resolve(&slug("x"))
        .await;

    assert!(outcome.is_exhausted());
    assert_eq!(fetcher.calls().len(), 3);
}

#[tokio::test]
async fn slow_relay_is_abandoned_at_the_timeout() {
    init_logger();
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("slow.test", 200, game_page(OPTIONS))
            .delayed("slow.test", Duration::from_secs(10))
            .page("fast.test", 200, game_page(OPTIONS)),
    );
    let resolver = ConfigResolver::new(fetcher.clone(), pool(&["slow.test", "fast.test"]))
        .with_timeout(Duration::from_millis(150));

    let started = Instant::now();
    let outcome = resolver.resolve(&slug("tiny-fishing")).await;
    let elapsed = started.elapsed();

    assert!(outcome.config().is_some());
    assert!(elapsed >= Duration::from_millis(150));
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
    assert_eq!(fetcher.calls(), vec!["slow.test", "fast.test"]);
}

#[tokio::test]
async fn timeout_is_recorded_as_such() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .page("slow.test", 200, game_page(OPTIONS))
            .delayed("slow.test", Duration::from_secs(10)),
    );
    let resolver = ConfigResolver::new(fetcher.clone(), pool(&["slow.test"]))
        .with_timeout(Duration::from_millis(100));

    let ResolutionOutcome::Exhausted(failures) = resolver.resolve(&slug("x")).await else {
        panic!("expected exhaustion");
    };
    assert_eq!(failures[0].failure, AttemptFailure::Timeout);
}

#[tokio::test]
async fn repeated_resolution_yields_equal_configs() {
    let fetcher = Arc::new(ScriptedFetcher::new().page("a.test", 200, game_page(OPTIONS)));
    let resolver = resolver(&fetcher, &["a.test"]);

    let first = resolver.resolve(&slug("tiny-fishing")).await;
    let second = resolver.resolve(&slug("tiny-fishing")).await;

    assert_eq!(first, second);
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn ad_relays_are_answered_locally_and_skipped() {
    init_logger();
    let inner = ScriptedFetcher::new()
        .page("doubleclick.net", 200, game_page(OPTIONS))
        .page("b.test", 200, game_page(OPTIONS));
    let fetcher = Arc::new(AdBlockFetcher::new(inner, AdFilter::default()));
    let resolver = ConfigResolver::new(fetcher.clone(), pool(&["doubleclick.net", "b.test"]));

    let outcome = resolver.resolve(&slug("tiny-fishing")).await;

    assert!(outcome.config().is_some());
    assert_eq!(fetcher.inner().calls(), vec!["b.test"]);
}

#[tokio::test]
async fn canonical_target_encodes_the_slug() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let resolver = resolver(&fetcher, &["a.test"]);
    assert_eq!(
        resolver.canonical_target(&slug("  a b/c ")),
        "https://games.crazygames.com/en_US/a%20b%2Fc/index.html"
    );
}

#[test]
fn target_template_requires_slug_placeholder() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let result = ConfigResolver::new(fetcher, pool(&["a.test"]))
        .with_target_template("https://games.example/index.html");
    tokio_test::assert_err!(result);
}
