use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use ramas::model::SourceFileEntry;
use ramas::state::{AppState, ExportBundle};
use ramas::util::{read_input, sha256_bytes, write_text};

pub mod assign;
pub mod options;
pub mod tree;


pub(crate) const MANIFEST_FILE: &str = "import_manifest.json";

pub(crate) fn load_categories(state: &mut AppState, path: &Path) -> Result<SourceFileEntry> {
    let (file_name, bytes) = read_input(path)?;
    let outcome = state
        .import_categories(&file_name, &bytes)
        .with_context(|| format!("failed to import categories from {}", path.display()))?;

    info!(
        file = %file_name,
        header_row = ?outcome.header_row_index,
        rows = outcome.record_count,
        nodes = outcome.node_count,
        "categories imported"
    );

    Ok(SourceFileEntry {
        role: "categories".to_string(),
        file_name,
        sha256: sha256_bytes(&bytes),
        record_count: outcome.record_count,
        header_row_index: outcome.header_row_index,
    })
}

pub(crate) fn write_bundle(out_dir: &Path, bundle: &ExportBundle) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(bundle.files.len());
    for (file_name, contents) in &bundle.files {
        let path = out_dir.join(file_name);
        write_text(&path, contents)?;
        info!(path = %path.display(), bytes = contents.len(), "wrote export");
        written.push(path.display().to_string());
    }
    Ok(written)
}

pub(crate) fn write_stdout(text: &str) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    output.write_all(text.as_bytes())?;
    output.flush()?;
    Ok(())
}
