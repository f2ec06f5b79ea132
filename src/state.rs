use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::decode::{DecodeError, decode_grid};
use crate::export;
use crate::model::{ArticuloRow, CategoryRow, Genero};
use crate::taxonomy::{
    ARTICLE_ALIASES, ASSIGNMENT_ALIASES, BucketPolicy, CATEGORY_ALIASES, CategoryForest,
    Extraction, GenderClassifier, HeaderVocabulary, RamaIndex, RootSegmentClassifier,
    build_forest, extract_records, map_record,
};

#[derive(Debug, Error)]
#[error("no article with codigo '{codigo}'")]
pub struct NotFoundError {
    pub codigo: String,
}

#[derive(Debug, Clone)]
pub struct CategoryImportOutcome {
    pub header_row_index: Option<usize>,
    pub record_count: usize,
    pub node_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct ArticleImportOutcome {
    pub header_row_index: Option<usize>,
    pub record_count: usize,
    pub per_genero: Vec<(Genero, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub codigo: String,
    pub rama: String,
}

/// Contents of every export file, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct ExportBundle {
    pub files: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone, Default)]
struct CategoryState {
    rows: Vec<CategoryRow>,
    forest: CategoryForest,
    generation: u64,
}

#[derive(Debug, Clone)]
struct CachedRamaIndex {
    generation: u64,
    policy: BucketPolicy,
    index: RamaIndex,
}

/// In-memory session: the latest categories and articles plus the derived
/// lookup tables. Each import replaces the previous data wholesale.
#[derive(Debug)]
pub struct AppState {
    vocabulary: HeaderVocabulary,
    gender: GenderClassifier,
    root_segments: RootSegmentClassifier,
    policy: BucketPolicy,
    categories: CategoryState,
    articles: Vec<ArticuloRow>,
    rama_cache: Option<CachedRamaIndex>,
}

impl AppState {
    pub fn new(policy: BucketPolicy) -> Result<Self> {
        Ok(Self {
            vocabulary: HeaderVocabulary::default(),
            gender: GenderClassifier::new()?,
            root_segments: RootSegmentClassifier::new()?,
            policy,
            categories: CategoryState::default(),
            articles: Vec::new(),
            rama_cache: None,
        })
    }

    pub fn generation(&self) -> u64 {
        self.categories.generation
    }

    pub fn category_rows(&self) -> &[CategoryRow] {
        &self.categories.rows
    }

    pub fn forest(&self) -> &CategoryForest {
        &self.categories.forest
    }

    pub fn articles(&self) -> &[ArticuloRow] {
        &self.articles
    }

    pub fn gender_classifier(&self) -> &GenderClassifier {
        &self.gender
    }

    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<Extraction, DecodeError> {
        let grid = decode_grid(file_name, bytes)?;
        let extraction = extract_records(&grid, &self.vocabulary);
        debug!(
            file = file_name,
            grid_rows = grid.len(),
            header_row = ?extraction.header_row_index,
            header_score = extraction.header_score,
            records = extraction.records.len(),
            "extracted records"
        );
        Ok(extraction)
    }

    /// Replaces the category set and rebuilds the forest. A decode failure
    /// leaves the current state untouched.
    pub fn import_categories(
        &mut self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<CategoryImportOutcome, DecodeError> {
        let extraction = self.extract(file_name, bytes)?;
        let rows: Vec<CategoryRow> = extraction
            .records
            .iter()
            .map(|record| CategoryRow::from_mapped(&map_record(record, &CATEGORY_ALIASES)))
            .collect();

        Ok(self.replace_categories(rows, extraction.header_row_index))
    }

    pub fn replace_categories(
        &mut self,
        rows: Vec<CategoryRow>,
        header_row_index: Option<usize>,
    ) -> CategoryImportOutcome {
        let forest = build_forest(&rows);
        for issue in forest.issues() {
            warn!(severity = ?issue.severity(), "{}", issue.message());
        }

        let generation = self.categories.generation + 1;
        let outcome = CategoryImportOutcome {
            header_row_index,
            record_count: rows.len(),
            node_count: forest.flat().len(),
            error_count: forest.error_count(),
            warning_count: forest.warning_count(),
            generation,
        };
        info!(
            rows = outcome.record_count,
            nodes = outcome.node_count,
            errors = outcome.error_count,
            warnings = outcome.warning_count,
            generation,
            summary = %forest.summary(),
            "category tree rebuilt"
        );

        self.categories = CategoryState {
            rows,
            forest,
            generation,
        };
        outcome
    }

    /// Replaces the article list; previous selections are discarded.
    pub fn import_articles(
        &mut self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ArticleImportOutcome, DecodeError> {
        let extraction = self.extract(file_name, bytes)?;
        let articles: Vec<ArticuloRow> = extraction
            .records
            .iter()
            .map(|record| {
                ArticuloRow::from_mapped(&map_record(record, &ARTICLE_ALIASES), &self.gender)
            })
            .collect();

        let per_genero = Genero::ALL
            .iter()
            .map(|genero| {
                let count = articles.iter().filter(|a| a.genero == *genero).count();
                (*genero, count)
            })
            .collect();
        let outcome = ArticleImportOutcome {
            header_row_index: extraction.header_row_index,
            record_count: articles.len(),
            per_genero,
        };
        info!(articles = outcome.record_count, "article list loaded");

        self.articles = articles;
        Ok(outcome)
    }

    /// Reads `codigo`/`rama` pairs from a tabular file.
    pub fn read_assignments(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Vec<Assignment>, DecodeError> {
        let extraction = self.extract(file_name, bytes)?;
        Ok(extraction
            .records
            .iter()
            .map(|record| {
                let mapped = map_record(record, &ASSIGNMENT_ALIASES);
                Assignment {
                    codigo: mapped.text("codigo").trim().to_string(),
                    rama: mapped.text("rama").trim().to_string(),
                }
            })
            .filter(|assignment| !assignment.codigo.is_empty())
            .collect())
    }

    /// Sets the selected path of the first article with `codigo`; an empty
    /// path clears the selection.
    pub fn assign_rama(&mut self, codigo: &str, rama: &str) -> Result<(), NotFoundError> {
        let article = self
            .articles
            .iter_mut()
            .find(|article| article.codigo == codigo)
            .ok_or_else(|| NotFoundError {
                codigo: codigo.to_string(),
            })?;

        if !rama.is_empty() && self.categories.forest.ruta_to_codes().get(rama).is_none() {
            warn!(codigo, rama, "selected rama has no level codes in the current tree");
        }
        article.rama_seleccionada = rama.to_string();
        Ok(())
    }

    pub fn assigned_count(&self) -> usize {
        self.articles.iter().filter(|a| a.is_assigned()).count()
    }

    /// Rama index for the current category generation, rebuilt when the
    /// categories or the bucket policy changed since the last call.
    pub fn rama_index(&mut self) -> &RamaIndex {
        let generation = self.categories.generation;
        let policy = self.policy;
        if self
            .rama_cache
            .as_ref()
            .is_some_and(|cached| cached.generation != generation || cached.policy != policy)
        {
            self.rama_cache = None;
        }

        let cached = self.rama_cache.get_or_insert_with(|| {
            debug!(generation, "rebuilding rama index");
            CachedRamaIndex {
                generation,
                policy,
                index: RamaIndex::build(&self.categories.rows, &self.root_segments, policy),
            }
        });
        &cached.index
    }

    pub fn set_bucket_policy(&mut self, policy: BucketPolicy) {
        self.policy = policy;
    }

    pub fn ramas_por_genero(&mut self, genero: Genero) -> Vec<String> {
        self.rama_index().bucket(genero).to_vec()
    }

    pub fn option_list_for_genero(&mut self, genero: Genero) -> Vec<String> {
        self.rama_index().option_list(genero)
    }

    /// Articles whose `codigo descripcion` contains `query`, ignoring case.
    pub fn filter_articles(&self, query: &str) -> Vec<&ArticuloRow> {
        let query = query.to_lowercase();
        self.articles
            .iter()
            .filter(|article| {
                query.is_empty()
                    || format!("{} {}", article.codigo, article.descripcion)
                        .to_lowercase()
                        .contains(&query)
            })
            .collect()
    }

    pub fn category_exports(&self) -> Result<ExportBundle> {
        let flat = self.categories.forest.flat();
        Ok(ExportBundle {
            files: vec![
                (export::FLAT_JSON_FILE, export::flat_json(flat)?),
                (export::FLAT_CSV_FILE, export::flat_csv(flat)?),
            ],
        })
    }

    pub fn article_exports(&self) -> Result<ExportBundle> {
        Ok(ExportBundle {
            files: vec![
                (
                    export::ARTICLE_RAMAS_FILE,
                    export::article_ramas_csv(&self.articles)?,
                ),
                (
                    export::LEVEL_ASSIGNMENT_FILE,
                    export::level_assignment_text(
                        &self.articles,
                        self.categories.forest.ruta_to_codes(),
                    ),
                ),
            ],
        })
    }
}

#[cfg(test)]
mod tests;
