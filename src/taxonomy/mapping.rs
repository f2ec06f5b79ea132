use super::extract::{CellValue, RawRecord};
use super::normalize::normalize_header;

#[derive(Debug)]
pub struct AliasField {
    pub name: &'static str,
    /// Already in normalized form.
    pub aliases: &'static [&'static str],
    /// Code-like column whose values must stay textual.
    pub identifier: bool,
}

#[derive(Debug)]
pub struct AliasTable {
    pub fields: &'static [AliasField],
}

pub const CATEGORY_ALIASES: AliasTable = AliasTable {
    fields: &[
        AliasField {
            name: "codigo",
            aliases: &["codigo", "code", "id"],
            identifier: true,
        },
        AliasField {
            name: "categoria",
            aliases: &["categoria", "name", "nombre"],
            identifier: false,
        },
        AliasField {
            name: "es_subcategoria_de",
            aliases: &[
                "es subcategoria de",
                "padre",
                "parent",
                "parent_id",
                "es_subcategoria_de",
            ],
            identifier: true,
        },
        AliasField {
            name: "rama",
            aliases: &["rama", "ruta", "path"],
            identifier: false,
        },
        AliasField {
            name: "codcat1",
            aliases: &["codcat1", "cat1", "nivel1"],
            identifier: true,
        },
        AliasField {
            name: "codcat2",
            aliases: &["codcat2", "cat2", "nivel2"],
            identifier: true,
        },
        AliasField {
            name: "codcat3",
            aliases: &["codcat3", "cat3", "nivel3"],
            identifier: true,
        },
        AliasField {
            name: "codcat4",
            aliases: &["codcat4", "cat4", "nivel4"],
            identifier: true,
        },
    ],
};

pub const ARTICLE_ALIASES: AliasTable = AliasTable {
    fields: &[
        AliasField {
            name: "codigo",
            aliases: &["codigo", "cod", "id", "articulo", "a"],
            identifier: true,
        },
        AliasField {
            name: "descripcion",
            aliases: &[
                "descripcion",
                "detalle",
                "nombre",
                "desc",
                "b",
                "descripcion del articulo",
            ],
            identifier: false,
        },
        AliasField {
            name: "genero",
            aliases: &["genero", "sexo", "l", "rubro", "target"],
            identifier: false,
        },
    ],
};

/// Assignment files only need the article code and the chosen path.
pub const ASSIGNMENT_ALIASES: AliasTable = AliasTable {
    fields: &[
        AliasField {
            name: "codigo",
            aliases: &["codigo", "cod", "id", "articulo"],
            identifier: true,
        },
        AliasField {
            name: "rama",
            aliases: &["rama", "ruta", "path"],
            identifier: false,
        },
    ],
};

/// Values of a record projected onto logical field names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappedRecord {
    values: Vec<(&'static str, CellValue)>,
}

impl MappedRecord {
    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// Display text of the field, empty when the source had no such column.
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(CellValue::display).unwrap_or_default()
    }
}

pub fn map_record(record: &RawRecord, table: &AliasTable) -> MappedRecord {
    let normalized: Vec<(String, &CellValue)> = record
        .iter()
        .map(|(header, value)| (normalize_header(header), value))
        .collect();

    let mut mapped = MappedRecord::default();
    for field in table.fields {
        let found = normalized
            .iter()
            .find(|(header, _)| field.aliases.contains(&header.as_str()));
        if let Some((_, value)) = found {
            mapped.values.push((field.name, (*value).clone()));
        }
    }

    mapped
}
