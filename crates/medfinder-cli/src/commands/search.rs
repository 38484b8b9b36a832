//! Search commands

use crate::app::{FindArgs, OutputFormat, SearchArgs};
use crate::output::{format_matches, format_search_results};
use anyhow::Result;
use medfinder_core::{Category, MedfinderError, SearchOptions, SyncCoordinator};

pub fn run(args: SearchArgs, sync: &SyncCoordinator, format: OutputFormat) -> Result<()> {
    let query = args.query.join(" ");
    let options = build_options(&args, sync)?;

    if sync.index().is_empty() {
        eprintln!("Warning: search index is empty. Run 'medfinder sync' first.");
    }

    let hits = sync.search(&query, &options);
    print!("{}", format_search_results(&hits, format));
    Ok(())
}

pub fn run_find(args: FindArgs, sync: &SyncCoordinator, format: OutputFormat) -> Result<()> {
    let query = args.query.join(" ");
    let matches = sync.find(&query);
    print!("{}", format_matches(&matches, format));
    Ok(())
}

fn build_options(args: &SearchArgs, sync: &SyncCoordinator) -> Result<SearchOptions> {
    let mut options = sync.config().search.options();

    if let Some(limit) = args.limit {
        options.max_results = limit;
    }
    options.category = args
        .category
        .as_deref()
        .map(Category::from_key)
        .transpose()?;
    if args.no_fuzzy {
        options.fuzzy_enabled = false;
    }
    if args.no_excerpts {
        options.include_excerpts = false;
    }
    if let Some(threshold) = args.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(MedfinderError::InvalidInput(format!(
                "threshold must be between 0 and 1, got {}",
                threshold
            ))
            .into());
        }
        options.fuzzy_threshold = threshold;
    }

    Ok(options)
}
