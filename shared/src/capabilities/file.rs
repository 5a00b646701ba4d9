use crux_core::capability::{CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque reference to a file the user picked in the shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Shell-side handle; the core never interprets it.
    pub id: String,
    pub name: String,
    /// As reported by the picker. May be empty.
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileOperation {
    Read { file: FileRef },
}

impl Operation for FileOperation {
    type Output = FileReadResult;
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContents {
    pub mime_type: String,
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

// Keep image bytes out of logs.
impl std::fmt::Debug for FileContents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileContents")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileReadError {
    #[error("The file \"{name}\" could not be found.")]
    NotFound { name: String },

    #[error("Permission to read \"{name}\" was denied.")]
    PermissionDenied { name: String },

    #[error("Failed to read the file: {reason}")]
    Io { reason: String },
}

pub type FileReadResult = Result<FileContents, FileReadError>;

/// Asks the shell to read a picked file. One request per call; the core never
/// retries a read.
#[derive(crux_core::macros::Capability)]
pub struct FileReader<Ev> {
    context: CapabilityContext<FileOperation, Ev>,
}

impl<Ev> FileReader<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<FileOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn read<F>(&self, file: FileRef, make_event: F)
    where
        F: FnOnce(FileReadResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(FileOperation::Read { file })
                .await;
            context.update_app(make_event(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_debug_hides_bytes() {
        let contents = FileContents {
            mime_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        };
        let debug = format!("{contents:?}");
        assert!(debug.contains("len: 3"));
        assert!(!debug.contains("[1, 2, 3]"));
    }

    #[test]
    fn read_errors_are_human_readable() {
        let err = FileReadError::PermissionDenied {
            name: "cat.png".into(),
        };
        assert_eq!(err.to_string(), "Permission to read \"cat.png\" was denied.");
    }
}
