pub mod decode;
pub mod export;
pub mod model;
pub mod state;
pub mod taxonomy;
pub mod util;
