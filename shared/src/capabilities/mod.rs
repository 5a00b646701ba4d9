mod file;

pub use self::file::{
    FileContents, FileOperation, FileReadError, FileReadResult, FileReader, FileRef,
};

// We use Crux's built-in Render and Http capabilities directly; only the file
// read needs a custom shell capability.
pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::event::Event;
use crate::App;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub file_reader: FileReader<Event>,
}
