mod ask;
mod ui;
mod upload;

pub use ask::*;
pub use ui::*;
pub use upload::*;
