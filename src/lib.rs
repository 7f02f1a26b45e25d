pub mod logging;
pub mod model;
pub mod remote;
pub mod state;
pub mod tui;
pub mod view_model;
pub mod worker;
