use std::collections::HashMap;

use serde::Serialize;

use super::normalize::collate;
use crate::model::{CategoryRow, FlatRow};

pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    MissingRequiredField { row_index: usize, codigo: String },
    DuplicateCode { row_index: usize, codigo: String },
    DanglingParent { codigo: String, parent_code: String },
    ParentCycle { codigo: String, parent_code: String },
}

impl ValidationIssue {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingRequiredField { .. } | Self::DuplicateCode { .. } => Severity::Error,
            Self::DanglingParent { .. } | Self::ParentCycle { .. } => Severity::Warning,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MissingRequiredField { row_index, codigo } => {
                format!("row {row_index} has an empty codigo or categoria (codigo '{codigo}')")
            }
            Self::DuplicateCode { row_index, codigo } => {
                format!("duplicate codigo '{codigo}' at row {row_index}")
            }
            Self::DanglingParent {
                codigo,
                parent_code,
            } => format!("parent '{parent_code}' not found for codigo '{codigo}'"),
            Self::ParentCycle {
                codigo,
                parent_code,
            } => format!("parent chain of codigo '{codigo}' loops back through '{parent_code}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub row: CategoryRow,
    pub children: Vec<usize>,
}

/// Full path string to its four per-level codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RutaToCodes {
    codes: HashMap<String, [String; 4]>,
}

impl RutaToCodes {
    pub fn insert(&mut self, ruta: String, codes: [String; 4]) {
        self.codes.insert(ruta, codes);
    }

    pub fn get(&self, ruta: &str) -> Option<&[String; 4]> {
        self.codes.get(ruta)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Category forest stored as an arena; nodes hold child indices only.
#[derive(Debug, Clone, Default)]
pub struct CategoryForest {
    nodes: Vec<CategoryNode>,
    index: HashMap<String, usize>,
    roots: Vec<usize>,
    issues: Vec<ValidationIssue>,
    flat: Vec<FlatRow>,
    ruta_to_codes: RutaToCodes,
}

impl CategoryForest {
    pub fn node(&self, index: usize) -> &CategoryNode {
        &self.nodes[index]
    }

    pub fn lookup(&self, codigo: &str) -> Option<&CategoryNode> {
        self.index.get(codigo).map(|index| &self.nodes[*index])
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn children(&self, index: usize) -> &[usize] {
        &self.nodes[index].children
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn error_count(&self) -> usize {
        self.count_severity(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count_severity(Severity::Warning)
    }

    fn count_severity(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == severity)
            .count()
    }

    pub fn flat(&self) -> &[FlatRow] {
        &self.flat
    }

    pub fn ruta_to_codes(&self) -> &RutaToCodes {
        &self.ruta_to_codes
    }

    pub fn summary(&self) -> String {
        let errors = self.error_count();
        let warnings = self.warning_count();
        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(format!("{errors} errors"));
        }
        if warnings > 0 {
            parts.push(format!("{warnings} warnings"));
        }
        if parts.is_empty() {
            "OK, no issues".to_string()
        } else {
            parts.join(" · ")
        }
    }

    /// Flat rows whose codigo, nombre or ruta contain `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<&FlatRow> {
        let query = query.trim().to_lowercase();
        self.flat
            .iter()
            .filter(|row| {
                query.is_empty()
                    || [&row.codigo, &row.nombre, &row.ruta]
                        .iter()
                        .any(|value| value.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn render_text(&self) -> String {
        render_rows(self.flat.iter())
    }
}

pub fn render_rows<'a>(rows: impl Iterator<Item = &'a FlatRow>) -> String {
    let mut output = String::new();
    for row in rows {
        let indent = "  ".repeat(row.nivel);
        let padre = if row.padre.is_empty() {
            String::new()
        } else {
            format!(" · padre {}", row.padre)
        };
        let tags: String = [&row.codcat1, &row.codcat2, &row.codcat3, &row.codcat4]
            .iter()
            .enumerate()
            .filter(|(_, code)| !code.is_empty())
            .map(|(level, code)| format!(" [CAT{}: {}]", level + 1, code))
            .collect();

        output.push_str(&format!(
            "{indent}{} (#{}{padre}) nivel {}{tags}\n",
            row.nombre, row.codigo, row.nivel
        ));
        output.push_str(&format!("{indent}  {}\n", row.ruta));
    }
    output
}

pub fn build_forest(rows: &[CategoryRow]) -> CategoryForest {
    let mut nodes: Vec<CategoryNode> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut issues = Vec::new();

    for (row_index, row) in rows.iter().enumerate() {
        if row.codigo.is_empty() || row.categoria.is_empty() {
            issues.push(ValidationIssue::MissingRequiredField {
                row_index,
                codigo: row.codigo.clone(),
            });
        }

        let node = CategoryNode {
            row: row.clone(),
            children: Vec::new(),
        };
        match index.get(&row.codigo) {
            Some(&existing) => {
                issues.push(ValidationIssue::DuplicateCode {
                    row_index,
                    codigo: row.codigo.clone(),
                });
                nodes[existing] = node;
            }
            None => {
                index.insert(row.codigo.clone(), nodes.len());
                nodes.push(node);
            }
        }
    }

    let mut roots = Vec::new();
    let mut parents: Vec<Option<usize>> = vec![None; nodes.len()];
    for child in 0..nodes.len() {
        if nodes[child].row.is_root_reference() {
            roots.push(child);
            continue;
        }

        match index.get(&nodes[child].row.parent_code) {
            Some(&parent) => {
                nodes[parent].children.push(child);
                parents[child] = Some(parent);
            }
            None => issues.push(ValidationIssue::DanglingParent {
                codigo: nodes[child].row.codigo.clone(),
                parent_code: nodes[child].row.parent_code.clone(),
            }),
        }
    }

    roots.sort_by(|a, b| collate(&nodes[*a].row.categoria, &nodes[*b].row.categoria));
    for position in 0..nodes.len() {
        let mut children = std::mem::take(&mut nodes[position].children);
        children.sort_by(|a, b| collate(&nodes[*a].row.categoria, &nodes[*b].row.categoria));
        nodes[position].children = children;
    }

    let mut visited = vec![false; nodes.len()];
    let (flat, ruta_to_codes) = flatten(&nodes, &roots, &mut visited);

    for node in cycle_members(&parents, &visited) {
        issues.push(ValidationIssue::ParentCycle {
            codigo: nodes[node].row.codigo.clone(),
            parent_code: nodes[node].row.parent_code.clone(),
        });
    }

    CategoryForest {
        nodes,
        index,
        roots,
        issues,
        flat,
        ruta_to_codes,
    }
}

/// Pre-order walk from every root. Each path extends its parent's flat row.
fn flatten(
    nodes: &[CategoryNode],
    roots: &[usize],
    visited: &mut [bool],
) -> (Vec<FlatRow>, RutaToCodes) {
    let mut flat: Vec<FlatRow> = Vec::with_capacity(nodes.len());
    let mut ruta_to_codes = RutaToCodes::default();
    // (node, depth, position of the parent's row in `flat`)
    let mut stack: Vec<(usize, usize, Option<usize>)> =
        roots.iter().rev().map(|&root| (root, 0, None)).collect();

    while let Some((current, depth, parent_row)) = stack.pop() {
        let row = &nodes[current].row;
        visited[current] = true;
        let ruta = match parent_row {
            Some(position) => format!("{}{PATH_SEPARATOR}{}", flat[position].ruta, row.categoria),
            None => row.categoria.clone(),
        };
        ruta_to_codes.insert(ruta.clone(), row.level_codes());

        let position = flat.len();
        flat.push(FlatRow {
            codigo: row.codigo.clone(),
            nombre: row.categoria.clone(),
            padre: row.parent_code.clone(),
            nivel: depth,
            ruta,
            codcat1: row.codcat1.clone(),
            codcat2: row.codcat2.clone(),
            codcat3: row.codcat3.clone(),
            codcat4: row.codcat4.clone(),
        });

        for &child in nodes[current].children.iter().rev() {
            stack.push((child, depth + 1, Some(position)));
        }
    }

    (flat, ruta_to_codes)
}

/// Nodes that lie on a loop of parent links, in index order. Nodes that only
/// hang off a loop are left out.
fn cycle_members(parents: &[Option<usize>], visited: &[bool]) -> Vec<usize> {
    const UNSEEN: u8 = 0;
    const ON_PATH: u8 = 1;
    const DONE: u8 = 2;

    let mut state: Vec<u8> = visited
        .iter()
        .map(|&seen| if seen { DONE } else { UNSEEN })
        .collect();
    let mut on_cycle = vec![false; parents.len()];
    let mut path = Vec::new();

    for start in 0..parents.len() {
        let mut current = Some(start);
        while let Some(node) = current {
            match state[node] {
                UNSEEN => {
                    state[node] = ON_PATH;
                    path.push(node);
                    current = parents[node];
                }
                ON_PATH => {
                    if let Some(entry) = path.iter().position(|&member| member == node) {
                        for &member in &path[entry..] {
                            on_cycle[member] = true;
                        }
                    }
                    break;
                }
                _ => break,
            }
        }
        for node in path.drain(..) {
            state[node] = DONE;
        }
    }

    (0..parents.len()).filter(|&node| on_cycle[node]).collect()
}
