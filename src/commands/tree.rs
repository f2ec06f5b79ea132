use anyhow::Result;
use tracing::{info, warn};

use ramas::model::{ImportCounts, ImportManifest};
use ramas::state::AppState;
use ramas::taxonomy::{BucketPolicy, render_rows};
use ramas::util::{now_utc_string, write_json_pretty};

use super::{MANIFEST_FILE, load_categories, write_bundle, write_stdout};
use crate::cli::TreeArgs;

pub fn run(args: TreeArgs) -> Result<()> {
    let mut state = AppState::new(BucketPolicy::default())?;
    let source = load_categories(&mut state, &args.categories)?;
    let forest = state.forest();

    let outline = match args.search.as_deref() {
        Some(query) => {
            let hits = forest.search(query);
            info!(query, hits = hits.len(), "tree search");
            render_rows(hits.into_iter())
        }
        None => forest.render_text(),
    };
    write_stdout(&outline)?;

    info!(
        summary = %forest.summary(),
        roots = forest.roots().len(),
        nodes = forest.flat().len(),
        rutas = forest.ruta_to_codes().len(),
        "validation summary"
    );

    if args.dry_run {
        info!("tree dry-run complete");
        return Ok(());
    }

    let mut outputs = Vec::new();
    let mut warnings: Vec<String> = forest.issues().iter().map(|issue| issue.message()).collect();
    if forest.flat().is_empty() {
        warn!("category tree is empty; skipping flat exports");
        warnings.push("category tree is empty; flat exports skipped".to_string());
    } else {
        outputs = write_bundle(&args.out_dir, &state.category_exports()?)?;
    }

    let manifest = ImportManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        command: "tree".to_string(),
        category_generation: state.generation(),
        sources: vec![source],
        counts: ImportCounts {
            category_rows: state.category_rows().len(),
            tree_nodes: forest.flat().len(),
            validation_errors: forest.error_count(),
            validation_warnings: forest.warning_count(),
            ..ImportCounts::default()
        },
        outputs,
        warnings,
    };
    let manifest_path = args.out_dir.join(MANIFEST_FILE);
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote import manifest");

    Ok(())
}
