// Basic search example using medfinder as a library

use medfinder_core::config::Config;
use medfinder_core::{MemoryFetcher, StoreHandle, SyncCoordinator};
use std::sync::Arc;

#[tokio::main]
async fn main() -> medfinder_core::Result<()> {
    println!("Medfinder Basic Search Example\n");

    let fetcher = Arc::new(
        MemoryFetcher::new()
            .with_document(
                "harnstoffzyklus/hyperammonaemie.html",
                "<html><head><title>Hyperammonämie</title></head><body>\
                 <h2>Notfalltherapie</h2>\
                 <p>Bei Ammoniakwerten über 200 µmol/l ist eine Dialyse zu erwägen.</p>\
                 <ul><li>Proteinzufuhr stoppen</li><li>Glukose hochdosiert</li></ul>\
                 </body></html>",
            )
            .with_document(
                "fettsaeureoxidation/mcad.html",
                "<html><head><title>MCAD-Mangel</title></head><body>\
                 <p>Octanoylcarnitin ist im Acylcarnitinprofil erhöht.</p></body></html>",
            ),
    );

    let mut config = Config::default();
    config.probe.use_directory_listing = false;
    config.index.batch_pause_ms = 0;

    let sync = SyncCoordinator::new(config, fetcher, StoreHandle::in_memory());
    let report = sync.full_sync().await;
    println!(
        "Discovered {} modules, indexed {}\n",
        report.modules, report.build.indexed
    );

    let options = sync.config().search.options();
    for query in ["ammoniak", "octanoylkarnitin", "dialyse"] {
        println!("Query: {}", query);
        for hit in sync.search(query, &options) {
            println!("  {:>5.1} {} ({})", hit.score, hit.title, hit.category);
            for excerpt in &hit.excerpts {
                println!("        {}", excerpt);
            }
        }
        println!();
    }

    Ok(())
}
