use anyhow::{Context, Result};

use crate::model::{ArticuloRow, FlatRow};
use crate::taxonomy::RutaToCodes;

pub const FLAT_JSON_FILE: &str = "categorias_flat.json";
pub const FLAT_CSV_FILE: &str = "categorias_flat.csv";
pub const ARTICLE_RAMAS_FILE: &str = "articulos_ramas.csv";
pub const LEVEL_ASSIGNMENT_FILE: &str = "asignacion_categorias_por_nivel.csv";

const FLAT_COLUMNS: [&str; 9] = [
    "codigo", "nombre", "padre", "nivel", "ruta", "codcat1", "codcat2", "codcat3", "codcat4",
];
const ARTICLE_COLUMNS: [&str; 4] = ["codigo", "descripcion", "genero", "rama"];

/// Flattened tree as comma separated text, pre-order.
pub fn flat_csv(rows: &[FlatRow]) -> Result<String> {
    let mut writer = csv_writer();
    writer.write_record(FLAT_COLUMNS)?;
    for row in rows {
        let nivel = row.nivel.to_string();
        writer.write_record([
            row.codigo.as_str(),
            row.nombre.as_str(),
            row.padre.as_str(),
            nivel.as_str(),
            row.ruta.as_str(),
            row.codcat1.as_str(),
            row.codcat2.as_str(),
            row.codcat3.as_str(),
            row.codcat4.as_str(),
        ])?;
    }
    finish(writer)
}

pub fn flat_json(rows: &[FlatRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).context("failed to serialize flat category json")
}

/// Article to path mapping; unassigned articles are left out.
pub fn article_ramas_csv(articles: &[ArticuloRow]) -> Result<String> {
    let mut writer = csv_writer();
    writer.write_record(ARTICLE_COLUMNS)?;
    for article in articles.iter().filter(|article| article.is_assigned()) {
        writer.write_record([
            article.codigo.as_str(),
            article.descripcion.as_str(),
            article.genero.as_str(),
            article.rama_seleccionada.as_str(),
        ])?;
    }
    finish(writer)
}

/// One `codigo;codigo;code` line per non-empty level code of each assigned
/// article. The repeated codigo is part of the downstream import format.
pub fn level_assignment_lines(articles: &[ArticuloRow], codes: &RutaToCodes) -> Vec<String> {
    let mut lines = Vec::new();
    for article in articles.iter().filter(|article| article.is_assigned()) {
        let Some(levels) = codes.get(&article.rama_seleccionada) else {
            continue;
        };
        for code in levels.iter().filter(|code| !code.trim().is_empty()) {
            lines.push(format!("{};{};{}", article.codigo, article.codigo, code));
        }
    }
    lines
}

pub fn level_assignment_text(articles: &[ArticuloRow], codes: &RutaToCodes) -> String {
    level_assignment_lines(articles, codes).join("\n")
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .context("failed to flush csv output")?;
    String::from_utf8(bytes).context("csv output is not valid utf-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Genero;

    fn flat_row(codigo: &str, nombre: &str, nivel: usize, ruta: &str) -> FlatRow {
        FlatRow {
            codigo: codigo.to_string(),
            nombre: nombre.to_string(),
            padre: String::new(),
            nivel,
            ruta: ruta.to_string(),
            codcat1: String::new(),
            codcat2: String::new(),
            codcat3: String::new(),
            codcat4: String::new(),
        }
    }

    fn article(codigo: &str, rama: &str) -> ArticuloRow {
        ArticuloRow {
            codigo: codigo.to_string(),
            descripcion: format!("Articulo {codigo}"),
            genero: Genero::Mujer,
            rama_seleccionada: rama.to_string(),
        }
    }

    #[test]
    fn flat_csv_quotes_commas_and_doubles_quotes() {
        let rows = vec![
            flat_row("1", "Ropa, \"premium\"", 0, "Ropa, \"premium\""),
            flat_row("2", "Zapatos", 1, "Ropa > Zapatos"),
        ];

        let csv = flat_csv(&rows).expect("csv export should succeed");
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "codigo,nombre,padre,nivel,ruta,codcat1,codcat2,codcat3,codcat4");
        assert_eq!(
            lines[1],
            "1,\"Ropa, \"\"premium\"\"\",,0,\"Ropa, \"\"premium\"\"\",,,,"
        );
        assert_eq!(lines[2], "2,Zapatos,,1,Ropa > Zapatos,,,,");
    }

    #[test]
    fn flat_json_uses_export_field_names() {
        let json = flat_json(&[flat_row("1", "Mujer", 0, "Mujer")]).expect("json export");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value[0]["codigo"], "1");
        assert_eq!(value[0]["nivel"], 0);
        assert_eq!(value[0]["ruta"], "Mujer");
        assert!(json.contains("\n  {"));
    }

    #[test]
    fn article_csv_only_lists_assigned_articles() {
        let articles = vec![article("A1", "Mujer > Zapatos"), article("A2", "")];
        let csv = article_ramas_csv(&articles).expect("article export");
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines, vec![
            "codigo,descripcion,genero,rama",
            "A1,Articulo A1,Mujer,Mujer > Zapatos",
        ]);
    }

    #[test]
    fn level_lines_repeat_codigo_and_skip_empty_levels() {
        let mut codes = RutaToCodes::default();
        codes.insert(
            "Mujer > Zapatos".to_string(),
            ["10".to_string(), String::new(), "30".to_string(), String::new()],
        );
        let articles = vec![article("A1", "Mujer > Zapatos"), article("A2", "")];

        assert_eq!(
            level_assignment_text(&articles, &codes),
            "A1;A1;10\nA1;A1;30"
        );
    }

    #[test]
    fn level_lines_skip_paths_without_codes() {
        let codes = RutaToCodes::default();
        let articles = vec![article("A1", "Hombre > Camisas")];

        assert!(level_assignment_lines(&articles, &codes).is_empty());
    }
}
