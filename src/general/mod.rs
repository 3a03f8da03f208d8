pub mod axis;
pub mod console;
pub mod control_board;
pub mod endpoint;
pub mod scene;
pub mod spatial;
pub mod status;
