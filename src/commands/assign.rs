use std::fmt::Write as _;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use ramas::model::{ImportCounts, ImportManifest, SourceFileEntry};
use ramas::state::{AppState, Assignment};
use ramas::util::{now_utc_string, read_input, sha256_bytes, write_json_pretty};

use super::{MANIFEST_FILE, load_categories, write_bundle, write_stdout};
use crate::cli::AssignArgs;

pub fn run(args: AssignArgs) -> Result<()> {
    let mut state = AppState::new(args.bucket_policy.as_policy())?;
    let mut sources = vec![load_categories(&mut state, &args.categories)?];

    let (file_name, bytes) = read_input(&args.articles)?;
    let outcome = state
        .import_articles(&file_name, &bytes)
        .with_context(|| format!("failed to import articles from {}", args.articles.display()))?;
    for (genero, count) in &outcome.per_genero {
        info!(genero = %genero, articles = count, "articles per genero");
    }
    sources.push(SourceFileEntry {
        role: "articles".to_string(),
        file_name,
        sha256: sha256_bytes(&bytes),
        record_count: outcome.record_count,
        header_row_index: outcome.header_row_index,
    });

    let mut assignments = parse_assignment_args(&args.assignments)?;
    if let Some(path) = &args.assignments_file {
        let (file_name, bytes) = read_input(path)?;
        let from_file = state
            .read_assignments(&file_name, &bytes)
            .with_context(|| format!("failed to read assignments from {}", path.display()))?;
        sources.push(SourceFileEntry {
            role: "assignments".to_string(),
            file_name,
            sha256: sha256_bytes(&bytes),
            record_count: from_file.len(),
            header_row_index: None,
        });
        assignments.extend(from_file);
    }

    let mut warnings = Vec::new();
    for assignment in &assignments {
        if let Err(err) = state.assign_rama(&assignment.codigo, &assignment.rama) {
            warn!(error = %err, "assignment skipped");
            warnings.push(err.to_string());
        }
    }

    let assigned = state.assigned_count();
    info!(requested = assignments.len(), assigned, "assignments applied");

    if let Some(query) = args.filter.as_deref() {
        let mut table = String::new();
        for article in state.filter_articles(query) {
            writeln!(
                table,
                "{}\t{}\t{}\t{}",
                article.codigo, article.descripcion, article.genero, article.rama_seleccionada
            )?;
        }
        write_stdout(&table)?;
    }

    let mut outputs = Vec::new();
    if assigned == 0 {
        warn!("no article has a rama selected; skipping assignment exports");
        warnings.push("no assigned articles; assignment exports skipped".to_string());
    } else {
        outputs = write_bundle(&args.out_dir, &state.article_exports()?)?;
    }

    let level_lines = ramas::export::level_assignment_lines(
        state.articles(),
        state.forest().ruta_to_codes(),
    )
    .len();
    let manifest = ImportManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        command: "assign".to_string(),
        category_generation: state.generation(),
        sources,
        counts: ImportCounts {
            category_rows: state.category_rows().len(),
            tree_nodes: state.forest().flat().len(),
            validation_errors: state.forest().error_count(),
            validation_warnings: state.forest().warning_count(),
            articles: state.articles().len(),
            articles_assigned: assigned,
            level_lines,
        },
        outputs,
        warnings,
    };
    let manifest_path = args.out_dir.join(MANIFEST_FILE);
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote import manifest");

    Ok(())
}

pub(crate) fn parse_assignment_args(values: &[String]) -> Result<Vec<Assignment>> {
    let mut assignments = Vec::with_capacity(values.len());
    for value in values {
        let Some((codigo, rama)) = value.split_once('=') else {
            bail!("assignment must look like CODIGO=RAMA: {value}");
        };
        let codigo = codigo.trim();
        if codigo.is_empty() {
            bail!("assignment has an empty codigo: {value}");
        }
        assignments.push(Assignment {
            codigo: codigo.to_string(),
            rama: rama.trim().to_string(),
        });
    }
    Ok(assignments)
}
