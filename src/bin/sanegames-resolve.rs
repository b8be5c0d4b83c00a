use sanegames::core::{app_state::build_resolver, config};
use sanegames::launch::exhausted_message;
use sanegames::resolver::ResolverError;
use sanegames::{GameSlug, ResolutionOutcome};

fn parse_args() -> anyhow::Result<(String, Option<u64>)> {
    let mut slug = None;
    let mut timeout_ms = None;
    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        if a == "--timeout-ms" {
            let v = args
                .next()
                .ok_or_else(|| anyhow::anyhow!("--timeout-ms needs a value"))?;
            timeout_ms = Some(v.parse::<u64>()?);
        } else if let Some(rest) = a.strip_prefix("--timeout-ms=") {
            timeout_ms = Some(rest.parse::<u64>()?);
        } else if slug.is_none() {
            slug = Some(a);
        } else {
            anyhow::bail!("unexpected argument: {}", a);
        }
    }
    let slug =
        slug.ok_or_else(|| anyhow::anyhow!("usage: sanegames-resolve <slug> [--timeout-ms N]"))?;
    Ok((slug, timeout_ms))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .ok();

    let (raw_slug, timeout_ms) = parse_args()?;
    let slug = GameSlug::parse(&raw_slug).map_err(ResolverError::from)?;

    let sane_config = config::load_sane_config();
    let (http_timeout, connect_timeout) = config::http_timeouts();
    let http_client = reqwest::Client::builder()
        .timeout(http_timeout)
        .connect_timeout(connect_timeout)
        .build()?;

    let mut resolver = build_resolver(&http_client, &sane_config)?;
    if let Some(ms) = timeout_ms {
        resolver = resolver.with_timeout(std::time::Duration::from_millis(
            ms.max(config::MIN_RELAY_TIMEOUT_MS),
        ));
    }

    match resolver.resolve(&slug).await {
        ResolutionOutcome::Success(config) => {
            let out = serde_json::json!({
                "slug": slug,
                "outcome": "success",
                "config": config,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            Ok(())
        }
        ResolutionOutcome::Exhausted(failures) => {
            let out = serde_json::json!({
                "slug": slug,
                "outcome": "exhausted",
                "failures": failures,
                "message": exhausted_message(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
            std::process::exit(2);
        }
    }
}
