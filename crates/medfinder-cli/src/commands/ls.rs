//! List command

use crate::app::{LsArgs, OutputFormat};
use crate::output::{self, format_modules};
use anyhow::Result;
use medfinder_core::{Category, SyncCoordinator, ALL_CATEGORIES};

pub fn run(args: LsArgs, sync: &SyncCoordinator, format: OutputFormat) -> Result<()> {
    let registry = sync.registry();

    match args.category {
        None => {
            let counts = registry.category_counts();
            match format {
                OutputFormat::Json => {
                    let categories: Vec<serde_json::Value> = ALL_CATEGORIES
                        .iter()
                        .map(|c| {
                            serde_json::json!({
                                "key": c.key(),
                                "name": c.display_name(),
                                "modules": counts.get(c).copied().unwrap_or(0),
                            })
                        })
                        .collect();
                    print!("{}", output::to_json(&categories));
                }
                OutputFormat::Cli => {
                    for category in ALL_CATEGORIES {
                        println!(
                            "{:<26} {:>3}  {}",
                            category.key(),
                            counts.get(&category).copied().unwrap_or(0),
                            category.display_name()
                        );
                    }
                }
            }
        }
        Some(key) => {
            let category = Category::from_key(&key)?;
            print!("{}", format_modules(registry.list(category), format));
        }
    }
    Ok(())
}
