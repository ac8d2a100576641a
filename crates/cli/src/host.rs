//! Terminal stand-ins for the editor and the notification area.

use std::io::Write;
use std::path::PathBuf;

use mediadrop_gateway::{EditorError, EditorSink, Insertion, Notifier};
use parking_lot::Mutex;

/// Collects insertions and, when a vault root is set, appends each reference
/// to the end of its document.
pub struct NoteEditor {
    vault: Option<PathBuf>,
    inserted: Mutex<Vec<Insertion>>,
}

impl NoteEditor {
    pub fn new(vault: Option<PathBuf>) -> Self {
        Self {
            vault,
            inserted: Mutex::new(Vec::new()),
        }
    }

    pub fn inserted(&self) -> Vec<Insertion> {
        self.inserted.lock().clone()
    }

    fn append(&self, insertion: &Insertion) -> Result<(), EditorError> {
        let (Some(vault), Some(document)) = (&self.vault, &insertion.document_path) else {
            return Ok(());
        };
        let path = vault.join(document);
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| EditorError(format!("cannot open {}: {e}", path.display())))?;
        writeln!(file, "{}", insertion.markup)
            .map_err(|e| EditorError(format!("cannot write {}: {e}", path.display())))
    }
}

impl EditorSink for NoteEditor {
    fn insert(&self, insertion: &Insertion) -> Result<(), EditorError> {
        self.append(insertion)?;
        self.inserted.lock().push(insertion.clone());
        Ok(())
    }
}

/// Prints notifications to stderr and remembers how many were shown.
#[derive(Default)]
pub struct StderrNotifier {
    shown: Mutex<usize>,
}

impl StderrNotifier {
    pub fn shown(&self) -> usize {
        *self.shown.lock()
    }
}

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        *self.shown.lock() += 1;
        eprintln!("error: {message}");
    }
}

#[cfg(test)]
mod tests {
    use mediadrop_core::MediaKind;

    use super::*;

    fn insertion(document: Option<&str>) -> Insertion {
        Insertion {
            file_name: "cat.png".into(),
            url: "https://cdn/cat.png".into(),
            kind: MediaKind::Image,
            document_path: document.map(str::to_owned),
            markup: "![cat.png](https://cdn/cat.png)".into(),
        }
    }

    #[test]
    fn appends_to_note_in_vault() {
        let vault = tempfile::tempdir().unwrap();
        std::fs::write(vault.path().join("post.md"), "# Post\n").unwrap();
        let editor = NoteEditor::new(Some(vault.path().to_path_buf()));

        editor.insert(&insertion(Some("post.md"))).unwrap();

        let text = std::fs::read_to_string(vault.path().join("post.md")).unwrap();
        assert_eq!(text, "# Post\n![cat.png](https://cdn/cat.png)\n");
        assert_eq!(editor.inserted().len(), 1);
    }

    #[test]
    fn missing_note_is_an_editor_error() {
        let vault = tempfile::tempdir().unwrap();
        let editor = NoteEditor::new(Some(vault.path().to_path_buf()));
        let err = editor.insert(&insertion(Some("absent.md"))).unwrap_err();
        assert!(err.to_string().contains("absent.md"));
        assert!(editor.inserted().is_empty());
    }

    #[test]
    fn without_vault_only_records() {
        let editor = NoteEditor::new(None);
        editor.insert(&insertion(Some("post.md"))).unwrap();
        assert_eq!(editor.inserted().len(), 1);
    }
}
