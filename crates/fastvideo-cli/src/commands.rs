//! CLI command implementations

use crate::output::{
    self, AnalyticsRow, ClassificationRow, LinkRow, OutputFormat, PromotionRow,
};
use fastvideo_core::{
    build_surface, classify, is_video_link, AnalyticsService, HistoryEntry, HttpFeedSource,
    MediaSnapshot, OverlayConfig, OverlayId, PromotionService, Surface, VideoReference,
};
use tracing::{debug, info};
use url::Url;

/// Classify one reference (all URLs are alternates of the same video)
pub fn classify_reference(urls: Vec<String>, title: &str, config: &OverlayConfig, format: &str) -> anyhow::Result<()> {
    let reference = VideoReference::new(urls, title)?;
    let classification = classify(&reference, &config.locale());
    debug!(provider = %classification.provider(), "Classified reference");

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", output::to_json(&classification)),
        OutputFormat::Table => {
            let rows = classification.playback_urls().iter().map(|playback| ClassificationRow {
                url: reference.primary_url().to_string(),
                provider: classification.provider().to_string(),
                playback: playback.clone(),
                start_offset: classification.start_offset(),
            });
            println!("{}", output::table(rows));
        }
        OutputFormat::Text => {
            println!("Reference: {}", reference.title());
            println!("  Provider: {}", classification.provider());
            println!("  Start offset: {}s", classification.start_offset());
            println!("  Playback URLs:");
            for (i, url) in classification.playback_urls().iter().enumerate() {
                println!("    {}. {}", i + 1, url);
            }
        }
    }
    Ok(())
}

/// Report which URLs open in an overlay and which navigate
pub fn check(urls: &[String], format: &str) -> anyhow::Result<()> {
    let rows: Vec<LinkRow> = urls
        .iter()
        .map(|url| LinkRow {
            url: url.clone(),
            video: is_video_link(url),
        })
        .collect();

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", output::to_json(&rows)),
        OutputFormat::Table => println!("{}", output::table(rows)),
        OutputFormat::Text => {
            for row in &rows {
                let verdict = if row.video { "overlay" } else { "navigate" };
                println!("{:<9} {}", verdict, row.url);
            }
        }
    }
    Ok(())
}

/// Describe the surface the overlay would mount
pub fn surface(url: &str, title: &str, autoplay: bool, config: &OverlayConfig, format: &str) -> anyhow::Result<()> {
    let reference = VideoReference::single(url, title)?;
    let classification = classify(&reference, &config.locale());
    let Some(player) = build_surface(&classification, title, autoplay) else {
        anyhow::bail!("nothing to play for {url}");
    };

    if OutputFormat::from(format) == OutputFormat::Json {
        println!("{}", output::to_json(&player));
        return Ok(());
    }

    println!("Surface: {} (class \"{}\")", player.provider, player.class_name);
    match &player.surface {
        Surface::Native {
            sources,
            start_offset,
            autoplay,
            ..
        } => {
            println!("  <video controls playsinline> autoplay={autoplay} start={start_offset}s");
            for source in sources {
                println!("    <source src=\"{}\" type=\"{}\">", source.src, source.mime);
            }
        }
        Surface::Iframe { src, attributes, .. } => {
            println!("  <iframe src=\"{src}\">");
            for (name, value) in attributes {
                if value.is_empty() {
                    println!("    {name}");
                } else {
                    println!("    {name}=\"{value}\"");
                }
            }
        }
    }
    Ok(())
}

/// Print the history entry opening `url` would push
pub fn history(url: &str, title: &str, config: &OverlayConfig, format: &str) -> anyhow::Result<()> {
    let entry = HistoryEntry::new(url, title, &config.document_title);
    if OutputFormat::from(format) == OutputFormat::Json {
        println!("{}", output::to_json(&entry));
    } else {
        println!("Title: {}", entry.page_title);
        println!("Hash:  {}", entry.hash);
        println!("State: {}", serde_json::to_string(&entry.state)?);
    }
    Ok(())
}

/// Subtitle language for the configured locale
pub fn subtitle(config: &OverlayConfig) -> anyhow::Result<()> {
    println!("{}", config.locale().subtitle_language());
    Ok(())
}

/// Fetch the analytics feed; with `page` and `src`, resolve the event parameters instead
pub async fn analytics(
    origin: &str,
    page: Option<&str>,
    src: Option<&str>,
    config: &OverlayConfig,
    format: &str,
) -> anyhow::Result<()> {
    let source = HttpFeedSource::new(Url::parse(origin)?, config.request_timeout_ms)?;
    let service = AnalyticsService::new(
        Box::new(source),
        config.analytics_feed.clone(),
        config.product.clone(),
    );
    info!(origin, feed = %config.analytics_feed, "Fetching analytics feed");

    if let (Some(page), Some(src)) = (page, src) {
        let media = MediaSnapshot {
            current_src: src.to_string(),
            duration: None,
        };
        match service.resolve(&OverlayId::from_title("cli"), page, &media).await {
            Some(detail) => println!("{}", output::to_json(&detail.parameters)),
            None => println!("No analytics entry for {src} on {page}"),
        }
        return Ok(());
    }

    let cache = service.get().await;
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", output::to_json(cache.entries())),
        OutputFormat::Table => {
            let rows = cache.entries().iter().map(|e| AnalyticsRow {
                page: e.page.clone(),
                filenames: e.filenames.join(", "),
                name: e.video_name.clone().unwrap_or_default(),
                id: e.video_id.clone().unwrap_or_default(),
            });
            println!("{}", output::table(rows));
        }
        OutputFormat::Text => {
            println!("Analytics entries: {}", cache.len());
            for entry in cache.entries() {
                println!(
                    "  {} -> {} [{}]",
                    entry.page,
                    entry.video_name.as_deref().unwrap_or("-"),
                    entry.filenames.join(", ")
                );
            }
        }
    }
    Ok(())
}

/// Fetch the locale's promotions feed; with `video`, print that video's promotion
pub async fn promotions(origin: &str, video: Option<&str>, config: &OverlayConfig, format: &str) -> anyhow::Result<()> {
    let source = HttpFeedSource::new(Url::parse(origin)?, config.request_timeout_ms)?;
    let path = config.promotions_feed_path();
    let service = PromotionService::new(Box::new(source), path.clone());
    info!(origin, feed = %path, "Fetching promotions feed");

    if let Some(video) = video {
        match service.resolve(video).await {
            Some(html) => println!("{html}"),
            None => println!("No promotion for {video}"),
        }
        return Ok(());
    }

    let cache = service.get().await;
    let mut rows: Vec<PromotionRow> = cache
        .iter()
        .map(|(video, promotion)| PromotionRow {
            video: video.to_string(),
            promotion: promotion.to_string(),
        })
        .collect();
    rows.sort_by(|a, b| a.video.cmp(&b.video));

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", output::to_json(&rows)),
        OutputFormat::Table => {
            for row in &mut rows {
                row.promotion = output::truncate(&row.promotion, 60);
            }
            println!("{}", output::table(rows));
        }
        OutputFormat::Text => {
            println!("Promotions: {}", rows.len());
            for row in &rows {
                println!("  {} ({} bytes)", row.video, row.promotion.len());
            }
        }
    }
    Ok(())
}
