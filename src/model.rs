use std::fmt;

use serde::{Deserialize, Serialize};

use crate::taxonomy::{GenderClassifier, MappedRecord};

/// Canonical category row, independent of the source file's headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRow {
    pub codigo: String,
    pub categoria: String,
    pub parent_code: String,
    pub rama: String,
    pub codcat1: String,
    pub codcat2: String,
    pub codcat3: String,
    pub codcat4: String,
}

impl CategoryRow {
    pub fn from_mapped(record: &MappedRecord) -> Self {
        Self {
            codigo: record.text("codigo").trim().to_string(),
            categoria: record.text("categoria").trim().to_string(),
            parent_code: record.text("es_subcategoria_de").trim().to_string(),
            rama: record.text("rama").trim().to_string(),
            codcat1: record.text("codcat1"),
            codcat2: record.text("codcat2"),
            codcat3: record.text("codcat3"),
            codcat4: record.text("codcat4"),
        }
    }

    pub fn level_codes(&self) -> [String; 4] {
        [
            self.codcat1.trim().to_string(),
            self.codcat2.trim().to_string(),
            self.codcat3.trim().to_string(),
            self.codcat4.trim().to_string(),
        ]
    }

    pub fn is_root_reference(&self) -> bool {
        matches!(self.parent_code.as_str(), "" | "0" | "-")
    }
}

/// One visited node of the category forest, in pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRow {
    pub codigo: String,
    pub nombre: String,
    pub padre: String,
    pub nivel: usize,
    pub ruta: String,
    pub codcat1: String,
    pub codcat2: String,
    pub codcat3: String,
    pub codcat4: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genero {
    Mujer,
    Hombre,
    #[serde(rename = "Niños")]
    Ninos,
}

impl Genero {
    pub const ALL: [Genero; 3] = [Genero::Mujer, Genero::Hombre, Genero::Ninos];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mujer => "Mujer",
            Self::Hombre => "Hombre",
            Self::Ninos => "Niños",
        }
    }
}

impl fmt::Display for Genero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticuloRow {
    pub codigo: String,
    pub descripcion: String,
    pub genero: Genero,
    pub rama_seleccionada: String,
}

impl ArticuloRow {
    /// Fresh, unassigned article from a mapped source record.
    pub fn from_mapped(record: &MappedRecord, classifier: &GenderClassifier) -> Self {
        Self {
            codigo: record.text("codigo").trim().to_string(),
            descripcion: record.text("descripcion").trim().to_string(),
            genero: classifier.classify(&record.text("genero")),
            rama_seleccionada: String::new(),
        }
    }

    pub fn is_assigned(&self) -> bool {
        !self.rama_seleccionada.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFileEntry {
    pub role: String,
    pub file_name: String,
    pub sha256: String,
    pub record_count: usize,
    pub header_row_index: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportCounts {
    pub category_rows: usize,
    pub tree_nodes: usize,
    pub validation_errors: usize,
    pub validation_warnings: usize,
    pub articles: usize,
    pub articles_assigned: usize,
    pub level_lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub command: String,
    pub category_generation: u64,
    pub sources: Vec<SourceFileEntry>,
    pub counts: ImportCounts,
    pub outputs: Vec<String>,
    pub warnings: Vec<String>,
}
