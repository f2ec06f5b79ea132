use super::*;
use crate::taxonomy::PLACEHOLDER_OPTION;

const CATEGORIES_CSV: &str = "\
Listado de categorias
Código,Categoría,Es subcategoría de,Rama,CodCat1,CodCat2,CodCat3,CodCat4
1,Mujer,,Mujer,1,,,
2,Zapatos,1,Mujer > Zapatos,1,10,,
3,Botas,2,Mujer > Zapatos > Botas,1,10,30,
4,Hombre,0,Hombre,2,,,
5,Camisas,4,Hombre > Camisas,2,20,,
6,Niños,-,Niños,3,,,
";

const ARTICLES_CSV: &str = "\
Artículo;Descripción;Género
A1;Bota de cuero;Femenino
A2;Camisa lino;Caballero
A3;Remera;M
";

fn loaded_state(policy: BucketPolicy) -> AppState {
    let mut state = AppState::new(policy).expect("state should build");
    state
        .import_categories("categorias.csv", CATEGORIES_CSV.as_bytes())
        .expect("categories should import");
    state
        .import_articles("articulos.csv", ARTICLES_CSV.as_bytes())
        .expect("articles should import");
    state
}

#[test]
fn category_import_builds_tree_below_title_row() {
    let state = loaded_state(BucketPolicy::Exclusive);

    let rutas: Vec<&str> = state
        .forest()
        .flat()
        .iter()
        .map(|row| row.ruta.as_str())
        .collect();
    assert_eq!(rutas, vec![
        "Hombre",
        "Hombre > Camisas",
        "Mujer",
        "Mujer > Zapatos",
        "Mujer > Zapatos > Botas",
        "Niños",
    ]);
    assert_eq!(state.forest().error_count(), 0);
    assert_eq!(state.generation(), 1);
}

#[test]
fn article_import_classifies_genero_and_starts_unassigned() {
    let state = loaded_state(BucketPolicy::Exclusive);

    let generos: Vec<Genero> = state.articles().iter().map(|a| a.genero).collect();
    assert_eq!(generos, vec![Genero::Mujer, Genero::Hombre, Genero::Ninos]);
    assert_eq!(state.articles()[0].descripcion, "Bota de cuero");
    assert_eq!(state.assigned_count(), 0);
}

#[test]
fn level_export_repeats_codigo_for_each_level_code() {
    let mut state = loaded_state(BucketPolicy::Exclusive);
    state
        .assign_rama("A1", "Mujer > Zapatos > Botas")
        .expect("article exists");

    let bundle = state.article_exports().expect("exports build");
    let (name, levels) = &bundle.files[1];
    assert_eq!(*name, export::LEVEL_ASSIGNMENT_FILE);
    assert_eq!(levels, "A1;A1;1\nA1;A1;10\nA1;A1;30");

    let (name, ramas) = &bundle.files[0];
    assert_eq!(*name, export::ARTICLE_RAMAS_FILE);
    assert_eq!(
        ramas,
        "codigo,descripcion,genero,rama\nA1,Bota de cuero,Mujer,Mujer > Zapatos > Botas\n"
    );
}

#[test]
fn assigning_unknown_article_is_not_found() {
    let mut state = loaded_state(BucketPolicy::Exclusive);

    let err = state
        .assign_rama("ZZZ", "Mujer")
        .expect_err("unknown article should fail");
    assert_eq!(err.codigo, "ZZZ");
    assert_eq!(state.assigned_count(), 0);
}

#[test]
fn empty_rama_clears_a_selection() {
    let mut state = loaded_state(BucketPolicy::Exclusive);
    state.assign_rama("A2", "Hombre > Camisas").expect("article exists");
    assert_eq!(state.assigned_count(), 1);

    state.assign_rama("A2", "").expect("article exists");
    assert_eq!(state.assigned_count(), 0);
}

#[test]
fn reimporting_articles_discards_assignments() {
    let mut state = loaded_state(BucketPolicy::Exclusive);
    state.assign_rama("A1", "Mujer").expect("article exists");

    state
        .import_articles("articulos.csv", ARTICLES_CSV.as_bytes())
        .expect("articles should import");
    assert_eq!(state.assigned_count(), 0);
}

#[test]
fn decode_failure_leaves_previous_state_untouched() {
    let mut state = loaded_state(BucketPolicy::Exclusive);

    let result = state.import_categories("categorias.xlsx", b"not a workbook");
    assert!(result.is_err());
    assert_eq!(state.generation(), 1);
    assert_eq!(state.forest().flat().len(), 6);
    assert_eq!(state.articles().len(), 3);
}

#[test]
fn option_lists_follow_category_generation() {
    let mut state = loaded_state(BucketPolicy::Exclusive);

    let options = state.option_list_for_genero(Genero::Mujer);
    assert_eq!(options[1], PLACEHOLDER_OPTION);
    assert_eq!(&options[2..], &["Mujer", "Mujer > Zapatos", "Mujer > Zapatos > Botas"]);

    state
        .import_categories("categorias.csv", "codigo,categoria,rama\n9,Hombre,Hombre > Gorras\n".as_bytes())
        .expect("categories should import");
    assert!(state.ramas_por_genero(Genero::Mujer).is_empty());
    assert_eq!(state.ramas_por_genero(Genero::Hombre), vec!["Hombre > Gorras"]);
}

#[test]
fn bucket_policy_change_rebuilds_the_index() {
    let mut state = AppState::new(BucketPolicy::Exclusive).expect("state should build");
    state
        .import_categories(
            "categorias.csv",
            "codigo,categoria,rama\n1,Unisex,Mujer y Hombre > Gorras\n".as_bytes(),
        )
        .expect("categories should import");
    assert!(state.ramas_por_genero(Genero::Mujer).is_empty());

    state.set_bucket_policy(BucketPolicy::Independent);
    assert_eq!(state.ramas_por_genero(Genero::Mujer).len(), 1);
    assert_eq!(state.ramas_por_genero(Genero::Hombre).len(), 1);
}

#[test]
fn exported_flat_csv_reimports_to_the_same_paths() {
    let state = loaded_state(BucketPolicy::Exclusive);
    let bundle = state.category_exports().expect("exports build");
    let (_, csv) = bundle
        .files
        .iter()
        .find(|(name, _)| *name == export::FLAT_CSV_FILE)
        .expect("flat csv present");

    let mut reloaded = AppState::new(BucketPolicy::Exclusive).expect("state should build");
    reloaded
        .import_categories("categorias_flat.csv", csv.as_bytes())
        .expect("flat csv should import");

    let summarize = |state: &AppState| -> Vec<(String, String, String)> {
        state
            .forest()
            .flat()
            .iter()
            .map(|row| (row.codigo.clone(), row.nombre.clone(), row.ruta.clone()))
            .collect()
    };
    assert_eq!(summarize(&reloaded), summarize(&state));
    assert_eq!(reloaded.forest().issues(), state.forest().issues());
}

#[test]
fn assignments_file_reads_codigo_and_rama_columns() {
    let state = loaded_state(BucketPolicy::Exclusive);
    let assignments = state
        .read_assignments(
            "asignaciones.csv",
            "codigo,rama\nA1,Mujer > Zapatos\n,Hombre\nA2,\n".as_bytes(),
        )
        .expect("assignments should decode");

    assert_eq!(assignments, vec![
        Assignment {
            codigo: "A1".to_string(),
            rama: "Mujer > Zapatos".to_string(),
        },
        Assignment {
            codigo: "A2".to_string(),
            rama: String::new(),
        },
    ]);
}

#[test]
fn filter_articles_matches_code_and_description() {
    let state = loaded_state(BucketPolicy::Exclusive);

    assert_eq!(state.filter_articles("cuero").len(), 1);
    assert_eq!(state.filter_articles("a2 cam").len(), 1);
    assert_eq!(state.filter_articles("").len(), 3);
}
