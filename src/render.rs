use std::fmt::{Display, Write as _};
use std::fs;
use std::path::Path;

use crate::models::VideoRecord;
use crate::report::Report;
use crate::stats::FunniestResult;

use anyhow::{Context, Result};
use colored::Colorize;
use html_escape::{encode_double_quoted_attribute, encode_text};

const MIN_TAG_PX: usize = 12;
const MAX_TAG_PX: usize = 48;

// ---------------------------------------------------------------------------
// HTML page
// ---------------------------------------------------------------------------

/// Writes the report as a single self-contained HTML page.
pub fn write_html(report: &Report<'_>, path: &Path) -> Result<()> {
    let html = render_html(report);
    fs::write(path, html).with_context(|| format!("failed to write report: {}", path.display()))
}

pub fn render_html(report: &Report<'_>) -> String {
    let mut body = String::new();

    section(&mut body, "Total watch time", |out| {
        let _ = write!(
            out,
            "<p class=\"big\">{}</p><p>across {} videos</p>",
            encode_text(or_dash(&report.formatted_time)),
            report.video_count
        );
    });

    section(&mut body, "Most viewed", |out| {
        video_link(out, report.most_viewed);
        let _ = write!(
            out,
            " <span class=\"dim\">{} views</span>",
            views_label(report.most_viewed.view_count)
        );
    });

    section(&mut body, "Hidden gems (fewer than 100 views)", |out| {
        video_list(out, report.least_viewed.iter().copied());
    });

    section(&mut body, "Best and worst liked per view decile", |out| {
        out.push_str("<table><tr><th>Decile</th><th>Most liked</th><th>Least liked</th></tr>");
        for pick in &report.deciles {
            let _ = write!(out, "<tr><td>{}</td><td>", pick.decile + 1);
            video_link(out, pick.best);
            out.push_str("</td><td>");
            video_link(out, pick.worst);
            out.push_str("</td></tr>");
        }
        out.push_str("</table>");
    });

    section(&mut body, "Most emoji in a description", |out| {
        video_link(out, report.most_emojis);
    });

    section(&mut body, "Funniest description", |out| match report.funniest {
        FunniestResult::Found { record, count } => {
            video_link(out, record);
            let _ = write!(out, " <span class=\"dim\">said \"funny\" {count} times</span>");
        }
        FunniestResult::NoneFound => {
            let _ = write!(out, "<p>{}</p>", encode_text(report.funniest.title()));
        }
    });

    section(&mut body, "Oldest videos in your history", |out| {
        video_list(out, report.oldest_videos.iter());
    });

    section(&mut body, "Oldest upload", |out| {
        video_link(out, report.oldest_upload);
        let _ = write!(
            out,
            " <span class=\"dim\">uploaded {}</span>",
            report.oldest_upload.upload_date.format("%Y-%m-%d")
        );
    });

    section(&mut body, "Resolution", |out| {
        let _ = write!(
            out,
            "<p>{} HD videos, {} UHD videos</p>",
            report.hd, report.uhd
        );
    });

    section(&mut body, "Most played uploader", |out| {
        let _ = write!(
            out,
            "<p class=\"big\">{}</p><p>{} of watch time</p>",
            encode_text(&report.most_played_artist),
            encode_text(or_dash(&report.most_played_watchtime))
        );
    });

    if !report.top_uploaders.is_empty() {
        section(&mut body, "Top uploaders", |out| {
            out.push_str("<ol class=\"uploaders\">");
            for uploader in &report.top_uploaders {
                let _ = write!(
                    out,
                    "<li><img src=\"{}\" alt=\"\"> <a href=\"https://www.youtube.com/channel/{}\">{}</a> \
                     <span class=\"dim\">{} videos</span></li>",
                    encode_double_quoted_attribute(&uploader.thumbnail_url),
                    encode_double_quoted_attribute(&uploader.channel_id),
                    encode_text(&uploader.display_name),
                    uploader.watch_count
                );
            }
            out.push_str("</ol>");
        });
    }

    if !report.uploads_by_year.is_empty() {
        section(&mut body, "Upload year of watched videos", |out| {
            bar_chart(out, &report.uploads_by_year);
        });
    }

    if report.duration_distribution.iter().any(|(_, n)| *n > 0) {
        section(&mut body, "Video length", |out| {
            bar_chart(out, &report.duration_distribution);
        });
    }

    if report.view_distribution.iter().any(|(_, n)| *n > 0) {
        section(&mut body, "View counts of watched videos", |out| {
            bar_chart(out, &report.view_distribution);
        });
    }

    if !report.top_tags.is_empty() {
        section(&mut body, "Tag cloud", |out| {
            let max = report.top_tags.first().map(|(_, c)| *c).unwrap_or(1).max(1);
            out.push_str("<p class=\"cloud\">");
            // Alphabetical so the cloud does not read as a ranking
            let mut tags: Vec<&(String, usize)> = report.top_tags.iter().collect();
            tags.sort_by(|a, b| a.0.cmp(&b.0));
            for (tag, n) in tags {
                let px = MIN_TAG_PX + (MAX_TAG_PX - MIN_TAG_PX) * n / max;
                let _ = write!(out, "<span style=\"font-size:{px}px\">{}</span> ", encode_text(tag));
            }
            out.push_str("</p>");
        });
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Your YouTube history</title>\n\
         <style>{STYLE}</style></head>\n<body><h1>Your YouTube history</h1>\n{body}</body></html>\n"
    )
}

const STYLE: &str = "body{font-family:sans-serif;max-width:60em;margin:auto;padding:1em}\
section{margin:2em 0}.big{font-size:2em;margin:0}.dim{color:#777}\
table{border-collapse:collapse}td,th{padding:.2em .6em;text-align:left}\
.uploaders img{width:32px;height:32px;border-radius:50%;vertical-align:middle}\
.chart .row{display:flex;gap:.5em;align-items:center}.chart .row span:first-child{width:6em}\
.bar{background:#c00;height:1em}.cloud span{margin:0 .2em}";

fn section(out: &mut String, title: &str, fill: impl FnOnce(&mut String)) {
    let _ = write!(out, "<section><h2>{}</h2>", encode_text(title));
    fill(out);
    out.push_str("</section>\n");
}

fn video_link(out: &mut String, video: &VideoRecord) {
    let _ = write!(
        out,
        "<a href=\"{}\">{}</a>",
        encode_double_quoted_attribute(&video.webpage_url),
        encode_text(&video.title)
    );
}

fn video_list<'a>(out: &mut String, videos: impl Iterator<Item = &'a VideoRecord>) {
    out.push_str("<ul>");
    for video in videos {
        out.push_str("<li>");
        video_link(out, video);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

fn bar_chart<L: Display>(out: &mut String, rows: &[(L, usize)]) {
    let max = rows.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);
    out.push_str("<div class=\"chart\">");
    for (label, n) in rows {
        let pct = n * 100 / max;
        let _ = write!(
            out,
            "<div class=\"row\"><span>{}</span><div class=\"bar\" style=\"width:{pct}%\"></div><span>{n}</span></div>",
            encode_text(&label.to_string())
        );
    }
    out.push_str("</div>");
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn views_label(n: Option<u64>) -> String {
    n.map_or_else(|| "N/A".to_string(), |n| n.to_string())
}

// ---------------------------------------------------------------------------
// Terminal summary
// ---------------------------------------------------------------------------

pub fn print_summary(report: &Report<'_>) {
    println!("{}", "YouTube History Recap".bold());
    println!("------------------------------");

    println!("Videos Watched:      {}", report.video_count);
    println!("Total Watch Time:    {}", or_dash(&report.formatted_time));
    println!(
        "Most Viewed:         {} ({} views)",
        truncate(&report.most_viewed.title, 40),
        views_label(report.most_viewed.view_count)
    );
    println!(
        "Oldest Upload:       {} ({})",
        truncate(&report.oldest_upload.title, 40),
        report.oldest_upload.upload_date.format("%Y-%m-%d")
    );
    println!(
        "Most Emoji:          {}",
        truncate(&report.most_emojis.title, 40)
    );
    match report.funniest {
        FunniestResult::Found { record, count } => println!(
            "Funniest:            {} ({count}x \"funny\")",
            truncate(&record.title, 40)
        ),
        FunniestResult::NoneFound => {
            println!("Funniest:            {}", report.funniest.title().dimmed())
        }
    }
    println!("HD / UHD:            {} / {}", report.hd, report.uhd);

    println!();
    println!(
        "Most Played:         {} ({})",
        report.most_played_artist.cyan().bold(),
        or_dash(&report.most_played_watchtime)
    );

    if !report.top_uploaders.is_empty() {
        println!();
        println!("{}", "Top Uploaders".bold());
        let items: Vec<(String, usize)> = report
            .top_uploaders
            .iter()
            .map(|u| (u.display_name.clone(), u.watch_count))
            .collect();
        print_leaderboard(&items);
    }

    if !report.uploads_by_year.is_empty() {
        println!();
        println!("{}", "Upload Year".bold());
        let max_count = report.uploads_by_year.iter().map(|(_, c)| *c).max().unwrap_or(1);
        for (year, n) in &report.uploads_by_year {
            println!("  {year}  {} {n}", make_bar(*n, max_count, 20));
        }
    }
}

fn make_bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 {
        return " ".repeat(width);
    }
    let filled = (value as f64 / max as f64 * width as f64).round() as usize;
    let filled = filled.min(width);
    let empty = width - filled;
    format!("{}{}", "\u{2588}".repeat(filled), " ".repeat(empty))
}

fn print_leaderboard(items: &[(String, usize)]) {
    if items.is_empty() {
        return;
    }
    let max_count = items.first().map(|(_, c)| *c).unwrap_or(1);
    let name_width = items
        .iter()
        .map(|(n, _)| n.chars().count())
        .max()
        .unwrap_or(10)
        .min(30);
    for (i, (name, count)) in items.iter().enumerate() {
        let bar = make_bar(*count, max_count, 20);
        println!(
            "  {:>2}. {:<width$}  {} {}",
            i + 1,
            truncate(name, name_width),
            bar,
            count,
            width = name_width
        );
    }
}

/// Truncates a string to a maximum character width, appending "..." if truncated.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
