use std::fmt::Write as _;

use anyhow::Result;
use tracing::info;

use ramas::model::Genero;
use ramas::state::AppState;

use super::{load_categories, write_stdout};
use crate::cli::OptionsArgs;

pub fn run(args: OptionsArgs) -> Result<()> {
    let mut state = AppState::new(args.bucket_policy.as_policy())?;
    load_categories(&mut state, &args.categories)?;

    let mut output = String::new();
    match args.genero.as_deref() {
        Some(value) => {
            let genero = state.gender_classifier().classify(value);
            info!(input = value, genero = %genero, "classified genero");
            for (position, option) in state.option_list_for_genero(genero).iter().enumerate() {
                let label = if option.is_empty() { "(sin seleccionar)" } else { option.as_str() };
                writeln!(output, "{position}\t{label}")?;
            }
        }
        None => {
            for genero in Genero::ALL {
                let ramas = state.ramas_por_genero(genero);
                writeln!(output, "{genero} ({})", ramas.len())?;
                for rama in &ramas {
                    writeln!(output, "  {rama}")?;
                }
            }
        }
    }

    write_stdout(&output)
}
