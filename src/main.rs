use anyhow::{bail, Context};
use futures::future::join_all;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xtream_api::{
    with_category_id, with_filter, with_filter_raw, with_limit, with_retries, with_sort,
    CancellationToken, Config, SortDirection, XtreamClient,
};

/// Streams shown per listing
const PREVIEW_LIMIT: usize = 10;

fn print_usage() {
    println!("Usage: xtream-cli <command> [args]");
    println!("\nCommands:");
    println!("  live [pattern]     - Live streams matching pattern (by name), sorted by name");
    println!("  vod                - VOD categories and the first streams of each");
    println!("  epg                - Current programmes for the first live streams");
    println!("  filter <pattern>   - Raw-filter VOD categories against every field");
    println!("\nConfiguration is read from XTREAM_URL, XTREAM_USERNAME, XTREAM_PASSWORD");
    println!("(and optional XTREAM_* tuning variables), or a .env file.");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "xtream_api=info".into());
    if std::env::var("XTREAM_LOG_JSON").is_ok_and(|v| v == "1") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        bail!("missing command");
    };

    let client = XtreamClient::new(Config::from_env()).context("Error creating client")?;
    tracing::info!("Using Xtream server {}", client.base_url());

    // Ctrl+C cancels whatever is in flight
    let ctx = CancellationToken::new();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    match command.as_str() {
        "live" => run_live(&client, &ctx, args.get(2).map(String::as_str)).await,
        "vod" => run_vod(&client, &ctx).await,
        "epg" => run_epg(&client, &ctx).await,
        "filter" => {
            let Some(pattern) = args.get(2) else {
                print_usage();
                bail!("filter needs a pattern");
            };
            run_raw_filter(&client, &ctx, pattern).await
        }
        _ => {
            print_usage();
            bail!("unknown command '{}'", command);
        }
    }
}

async fn run_live(
    client: &XtreamClient,
    ctx: &CancellationToken,
    pattern: Option<&str>,
) -> anyhow::Result<()> {
    println!("\nFetching live streams...");
    let policy = client.retry_policy();
    let streams = with_retries(&policy, ctx, |_| {
        let mut options = vec![
            with_sort("name", SortDirection::Ascending),
            with_limit(PREVIEW_LIMIT),
        ];
        if let Some(pattern) = pattern {
            options.push(with_filter("name", pattern));
        }
        async move { client.streams().live(ctx, options).await }
    })
    .await
    .context("Error getting live streams")?;

    for stream in &streams {
        println!("\nStream: {} (ID: {})", stream.name, stream.id);
        println!("URL: {}", client.stream_url("live", stream.id, "m3u8"));
    }
    Ok(())
}

async fn run_vod(client: &XtreamClient, ctx: &CancellationToken) -> anyhow::Result<()> {
    println!("\nFetching VOD categories...");
    let categories = client
        .categories()
        .vod(ctx, [with_sort("name", SortDirection::Ascending)])
        .await
        .context("Error getting VOD categories")?;

    for category in categories.iter().take(PREVIEW_LIMIT) {
        println!("\nCategory: {}", category.name);

        let streams = match client
            .streams()
            .vod(
                ctx,
                [with_category_id(category.id.as_str()), with_limit(PREVIEW_LIMIT)],
            )
            .await
        {
            Ok(streams) => streams,
            Err(e) if e.is_cancelled() => return Err(e.into()),
            Err(e) => {
                println!("Error getting streams: {}", e);
                continue;
            }
        };

        println!("Showing {} streams", streams.len());
        for stream in &streams {
            println!("- {}", stream.name);
        }
    }
    Ok(())
}

async fn run_epg(client: &XtreamClient, ctx: &CancellationToken) -> anyhow::Result<()> {
    println!("\nFetching live streams for EPG...");
    let streams = client
        .streams()
        .live(ctx, [with_limit(PREVIEW_LIMIT)])
        .await
        .context("Error getting live streams")?;

    // Requests run concurrently; the shared rate limiter paces them
    let lookups = streams
        .iter()
        .map(|s| async move { client.epg().short(ctx, s.id, Some(3)).await });
    let results = join_all(lookups).await;

    for (stream, result) in streams.iter().zip(results) {
        println!("\nEPG for {}:", stream.name);
        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                println!("Error getting EPG: {}", e);
                continue;
            }
        };

        for entry in &entries {
            println!("- {}", entry.decoded_title());
            if let (Some(start), Some(end)) = (entry.start_time(), entry.end_time()) {
                println!("  {} - {}", start.format("%H:%M"), end.format("%H:%M"));
            }
            let description = entry.decoded_description();
            if !description.is_empty() {
                println!("  {}", description);
            }
        }
    }
    Ok(())
}

async fn run_raw_filter(
    client: &XtreamClient,
    ctx: &CancellationToken,
    pattern: &str,
) -> anyhow::Result<()> {
    println!("\nVOD categories matching '{}' in any field:", pattern);
    let categories = client
        .categories()
        .vod(ctx, [with_filter_raw(pattern)])
        .await
        .context("Error getting VOD categories with raw filtering")?;

    for category in &categories {
        println!("Category: {} (ID: {})", category.name, category.id);
    }
    Ok(())
}
