use std::path::PathBuf;

use crate::paths::AppPaths;
use crate::report::Report;
use crate::store::RecordStore;
use crate::youtube_api::YouTubeChannels;
use crate::{downloader, paths, render, store, takeout};

use anyhow::{Result, bail};
use colored::Colorize;

pub struct RunOptions {
    pub takeout: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub delay: f64,
    pub refresh: bool,
    pub no_open: bool,
}

pub fn run(opts: RunOptions) -> Result<()> {
    let paths = paths::AppPaths::init(opts.out.as_deref())?;
    let cfg = store::load_config(&paths.config_file);

    // Fetch metadata first if this output dir has none yet
    let downloaded = !store::has_raw_data(&paths.raw_dir);
    if downloaded {
        let Some(takeout_dir) = &opts.takeout else {
            bail!(
                "no video metadata in {}.\n\
                 Pass --takeout <path to unzipped Google Takeout folder> to download it.",
                paths.raw_dir.display()
            );
        };

        println!("Extracting video urls from Takeout.");
        let urls = takeout::read_watch_urls(takeout_dir)?;
        takeout::write_url_list(&paths.urls_file, &urls)?;
        println!(
            "Urls extracted. Downloading data for {} videos now.",
            urls.len()
        );

        downloader::download_metadata(cfg.downloader(), &paths.urls_file, &paths.raw_dir, opts.delay)?;

        if !store::has_raw_data(&paths.raw_dir) {
            bail!("No data was downloaded.");
        }
    }

    let records = load_history(&paths, opts.refresh, downloaded)?;

    let api_key = cfg.effective_api_key();
    if api_key.is_none() {
        eprintln!(
            "{} no YouTube Data API key configured; top uploaders will be skipped.\n  \
             Set it via: ytrecap config youtube_api_key <key>",
            "Warning:".yellow()
        );
    }
    let lookup = YouTubeChannels::new(api_key, cfg.lookup_timeout());

    let report = Report::assemble(&records, &lookup)?;

    render::write_html(&report, &paths.report_file)?;
    render::print_summary(&report);

    println!();
    println!("{} {}", "Report:".green(), paths.report_file.display());

    if !opts.no_open {
        open::that(&paths.report_file)?;
    }

    Ok(())
}

/// A snapshot from an earlier run never describes freshly downloaded files.
fn load_history(paths: &AppPaths, refresh: bool, downloaded: bool) -> Result<RecordStore> {
    Ok(store::load_or_build(paths, refresh || downloaded)?)
}

pub fn config(key: &str, value: &str) -> Result<()> {
    let paths = paths::AppPaths::init(None)?;
    let mut cfg = store::load_config(&paths.config_file);

    match key {
        "youtube_api_key" => {
            cfg.youtube_api_key = Some(value.to_string());
        }
        "downloader" => {
            cfg.downloader = Some(value.to_string());
        }
        "lookup_timeout_secs" => {
            let secs: u64 = value
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid timeout '{value}': expected whole seconds"))?;
            cfg.lookup_timeout_secs = Some(secs);
        }
        _ => bail!(
            "unknown config key '{key}': available keys are 'youtube_api_key', 'downloader', 'lookup_timeout_secs'"
        ),
    }

    store::save_config(&paths.config_file, &cfg)?;
    println!("{}", "Config updated.".green());
    Ok(())
}

pub fn info(out: Option<PathBuf>) -> Result<()> {
    let paths = paths::AppPaths::init(out.as_deref())?;

    println!("{}", "Data Paths".bold());
    println!("---------------");
    println!("Config:     {}", paths.config_file.display());
    println!("Output:     {}", paths.out_dir.display());
    println!("Raw:        {}", paths.raw_dir.display());
    println!("Cache:      {}", paths.cache_dir.display());
    println!("Urls:       {}", paths.urls_file.display());
    println!("Report:     {}", paths.report_file.display());

    let has_data = store::has_raw_data(&paths.raw_dir);
    println!("Raw Data Present? {has_data}");

    Ok(())
}
